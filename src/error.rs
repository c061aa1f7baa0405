use thiserror::Error;

/// Failures of a single extraction run. Every kind is terminal; only
/// `ClipboardWriteFailed` has a fallback (the text is printed instead).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Nothing stored under the storage key
    #[error("no data stored under key '{key}'")]
    MissingSourceData { key: String },

    /// Parsed blob has no `poi_section.list` array
    #[error("stored data has no poi_section.list")]
    MissingListingSection,

    #[error("stored data is not valid JSON: {0}")]
    MalformedSourceJson(#[from] serde_json::Error),

    #[error("clipboard write failed: {0}")]
    ClipboardWriteFailed(String),
}

impl ExtractError {
    /// True when the run can still degrade to printing the generated text.
    pub fn has_fallback(&self) -> bool {
        matches!(self, ExtractError::ClipboardWriteFailed(_))
    }
}
