use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first env file found. Variables already set in the process
/// environment are left alone.
pub fn load_env() {
    for path in ENV_PATHS.iter() {
        if !Path::new(path).exists() {
            continue;
        }
        match load_env_from_file(Path::new(path)) {
            Ok(count) => {
                info!("Loaded {} variables from {}", count, path);
                return;
            }
            Err(e) => warn!("Failed to load environment from {}: {:#}", path, e),
        }
    }
    info!("No .env file found, using environment variables from system");
}

fn load_env_from_file(file_path: &Path) -> Result<usize> {
    let contents = std::fs::read_to_string(file_path)
        .with_context(|| format!("Could not read env file {:?}", file_path))?;

    let mut applied = 0;
    for (key, value) in parse_env_lines(&contents) {
        if std::env::var(&key).is_err() {
            debug!("Set env var from file: {} = {}", key, value);
            std::env::set_var(&key, &value);
            applied += 1;
        }
    }
    Ok(applied)
}

/// `KEY=value` pairs, skipping blank lines and `#` comments. Surrounding
/// double quotes on the value are dropped.
pub fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}
