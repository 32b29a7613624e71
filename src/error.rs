use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// No document was supplied to the extractor at all.
    #[error("no document supplied")]
    InputMissing,

    #[error("Failed to fetch page: {0}")]
    FetchFailed(String),

    #[error("Failed to extract contract: {0}")]
    ExtractionFailed(String),
}

impl ExtractError {
    /// Short, stable label used as the `error` field of failure reports.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractError::InputMissing => "URL or document is required",
            ExtractError::FetchFailed(_) => "Failed to fetch page",
            ExtractError::ExtractionFailed(_) => "Failed to extract contract",
        }
    }

    /// Lower-level diagnostic, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ExtractError::InputMissing => None,
            ExtractError::FetchFailed(m) | ExtractError::ExtractionFailed(m) => Some(m),
        }
    }
}
