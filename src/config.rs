use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::str::FromStr;

use crate::csv_writer::{OutputFormat, DEFAULT_LABEL};
use crate::report::{DEFAULT_SAMPLE_SIZE, DEFAULT_TOP_AREAS};
use crate::sink::{ClipboardSink, FileSink, SystemClipboard};
use crate::storage::DEFAULT_STORAGE_KEY;

const DEFAULT_STORAGE_FILE: &str = "local_storage.json";
const DEFAULT_OUTPUT_FILE: &str = "tasty_boys.csv";

/// Where the generated text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Clipboard,
    File(PathBuf),
}

impl SinkKind {
    pub fn build(&self) -> Box<dyn ClipboardSink> {
        match self {
            SinkKind::Clipboard => Box::new(SystemClipboard),
            SinkKind::File(path) => Box::new(FileSink::new(path.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub storage_file: PathBuf,
    pub storage_key: String,
    pub format: OutputFormat,
    pub label: String,
    pub sink: SinkKind,
    pub sample_size: usize,
    pub top_areas: usize,
}

impl ExtractConfig {
    /// Reads the `LISTING_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let format = OutputFormat::from_str(&var("LISTING_FORMAT", "legacy"))
            .context("Invalid LISTING_FORMAT")?;
        let output_file = PathBuf::from(var("LISTING_OUTPUT_FILE", DEFAULT_OUTPUT_FILE));
        let sink = match var("LISTING_SINK", "clipboard").trim().to_ascii_lowercase().as_str() {
            "clipboard" => SinkKind::Clipboard,
            "file" => SinkKind::File(output_file),
            other => {
                return Err(anyhow::anyhow!(
                    "Invalid LISTING_SINK '{}', expected 'clipboard' or 'file'",
                    other
                ))
            }
        };

        let config = ExtractConfig {
            storage_file: PathBuf::from(var("LISTING_STORAGE_FILE", DEFAULT_STORAGE_FILE)),
            storage_key: var("LISTING_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            format,
            label: var("LISTING_LABEL", DEFAULT_LABEL),
            sink,
            sample_size: parse_count(lookup("LISTING_SAMPLE_SIZE"), "LISTING_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE),
            top_areas: parse_count(lookup("LISTING_TOP_AREAS"), "LISTING_TOP_AREAS", DEFAULT_TOP_AREAS),
        };

        info!(
            "Extract config: Storage={:?}, Key={}, Format={}, Sink={:?}",
            config.storage_file, config.storage_key, config.format, config.sink
        );
        Ok(config)
    }

    /// Positional arguments: storage dump path, then output format.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(path) = args.first() {
            self.storage_file = PathBuf::from(path);
        }
        if let Some(format) = args.get(1) {
            self.format = format.parse::<OutputFormat>().context("Invalid format argument")?;
        }
        Ok(())
    }
}

fn parse_count(raw: Option<String>, key: &str, default: usize) -> usize {
    match raw {
        None => default,
        Some(s) => s.trim().parse::<usize>().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}='{}', using {}", key, s, default);
            default
        }),
    }
}
