use log::{error, info, warn};
use std::io::Write;

use crate::error::ExtractError;
use crate::extract::{extract, ExtractOptions};
use crate::report::{self, Summary, DEFAULT_SAMPLE_SIZE, DEFAULT_TOP_AREAS};
use crate::sink::ClipboardSink;
use crate::storage::KeyValueStore;

/// How a run that got as far as the sink ended.
#[derive(Debug)]
pub enum RunOutcome {
    Delivered(Summary),
    /// The sink refused the text; it was printed instead.
    Fallback { error: ExtractError, csv: String },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub extract: ExtractOptions,
    pub sample_size: usize,
    pub top_areas: usize,
}

impl RunOptions {
    pub fn new(extract: ExtractOptions) -> Self {
        Self {
            extract,
            sample_size: DEFAULT_SAMPLE_SIZE,
            top_areas: DEFAULT_TOP_AREAS,
        }
    }
}

/// Runs one extraction and hands the text to `sink`. Diagnostics go to `out`.
///
/// Missing or unreadable stored data aborts with an error and writes nothing.
/// A sink failure is not an error: the text is written to `out` instead.
pub async fn run<W: Write>(
    store: &dyn KeyValueStore,
    sink: &dyn ClipboardSink,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunOutcome, ExtractError> {
    let extraction = extract(store, &options.extract).map_err(|e| {
        error!("Extraction aborted: {}", e);
        e
    })?;

    info!("Handing {} bytes to {}", extraction.csv.len(), sink.describe());
    match sink.write(&extraction.csv).await {
        Ok(()) => {
            let summary = Summary::from_extraction(&extraction, options.sample_size, options.top_areas);
            if let Err(e) = report::write_summary(out, &summary) {
                warn!("Failed to write summary: {}", e);
            }
            Ok(RunOutcome::Delivered(summary))
        }
        Err(e) => {
            error!("{}", e);
            if let Err(io_err) = report::write_fallback(out, &e, &extraction.csv) {
                warn!("Failed to write fallback text: {}", io_err);
            }
            Ok(RunOutcome::Fallback {
                error: e,
                csv: extraction.csv,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_writer::{OutputFormat, RenderContext};
    use crate::storage::{MemoryStore, DEFAULT_STORAGE_KEY};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ClipboardSink for RecordingSink {
        async fn write(&self, text: &str) -> Result<(), ExtractError> {
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn describe(&self) -> String {
            "recording sink".to_string()
        }
    }

    struct DeniedSink;

    #[async_trait]
    impl ClipboardSink for DeniedSink {
        async fn write(&self, _text: &str) -> Result<(), ExtractError> {
            Err(ExtractError::ClipboardWriteFailed("document is not focused".into()))
        }

        fn describe(&self) -> String {
            "denied sink".to_string()
        }
    }

    fn options() -> RunOptions {
        RunOptions::new(ExtractOptions::new(
            OutputFormat::Legacy,
            RenderContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
        ))
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_entry(
            DEFAULT_STORAGE_KEY,
            r#"{"poi_section":{"list":[{"nm":"A","road_addr":"1","area":["X"]},{"nm":"B","addr":"2"}]}}"#,
        )
    }

    #[tokio::test]
    async fn delivered_text_reaches_sink() {
        let sink = RecordingSink::default();
        let mut out = Vec::new();
        let outcome = run(&store(), &sink, &options(), &mut out).await.unwrap();

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].lines().count(), 2);
        match outcome {
            RunOutcome::Delivered(summary) => {
                assert_eq!(summary.unique_records, 2);
                assert_eq!(summary.top_areas.len(), 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(String::from_utf8(out).unwrap().contains("Listings by area"));
    }

    #[tokio::test]
    async fn denied_sink_prints_full_text() {
        let mut out = Vec::new();
        let outcome = run(&store(), &DeniedSink, &options(), &mut out).await.unwrap();

        let RunOutcome::Fallback { error, csv } = outcome else {
            panic!("expected fallback");
        };
        assert!(matches!(error, ExtractError::ClipboardWriteFailed(_)));
        assert!(String::from_utf8(out).unwrap().contains(&csv));
    }

    #[tokio::test]
    async fn fatal_errors_skip_sink_and_output() {
        let sink = RecordingSink::default();
        let mut out = Vec::new();
        let err = run(&MemoryStore::new(), &sink, &options(), &mut out).await.unwrap_err();

        assert!(matches!(err, ExtractError::MissingSourceData { .. }));
        assert!(sink.written.lock().unwrap().is_empty());
        assert!(out.is_empty());
    }
}
