use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;

use crate::error::ExtractError;

/// Destination for the generated text. Writing may fail on its own,
/// after extraction already succeeded.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write(&self, text: &str) -> Result<(), ExtractError>;

    /// Short name used in log lines.
    fn describe(&self) -> String;
}

/// The system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write(&self, text: &str) -> Result<(), ExtractError> {
        use cli_clipboard::{ClipboardContext, ClipboardProvider};

        let contents = text.to_owned();
        debug!("Writing {} bytes to the system clipboard", contents.len());
        tokio::task::spawn_blocking(move || {
            ClipboardContext::new()
                .and_then(|mut ctx| ctx.set_contents(contents))
                .map_err(|e| ExtractError::ClipboardWriteFailed(e.to_string()))
        })
        .await
        .map_err(|e| ExtractError::ClipboardWriteFailed(e.to_string()))?
    }

    fn describe(&self) -> String {
        "system clipboard".to_string()
    }
}

/// Writes the text straight to a file instead of the clipboard.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClipboardSink for FileSink {
    async fn write(&self, text: &str) -> Result<(), ExtractError> {
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| ExtractError::ClipboardWriteFailed(format!("{:?}: {}", self.path, e)))?;
        info!("Wrote {} bytes to {:?}", text.len(), self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {:?}", self.path)
    }
}
