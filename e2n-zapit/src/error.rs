/// Errors that can occur while writing Neutrino output trees and scanfiles.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] e2n_formats::FormatError),

    #[error("api_version must be either 3 or 4, got {0}")]
    ApiVersion(u8),

    #[error("invalid bouquet filter {pattern}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A scanfile table violates the strict policy.
    #[error("scanfile error: {0}")]
    Scanfile(String),
}

impl WriterError {
    pub fn scanfile(msg: impl Into<String>) -> Self {
        Self::Scanfile(msg.into())
    }
}
