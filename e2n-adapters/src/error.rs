use e2n_formats::FormatError;
use thiserror::Error;

/// Errors raised while ingesting a source.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed grammar, missing joining ids, unresolvable JSON pointer.
    #[error("parse error: {0}")]
    Parse(String),

    /// Disallowed host or domain, private address, blocked URL pattern.
    #[error("security violation: {0}")]
    Security(String),

    /// The adapter refuses to produce data for this source.
    #[error("{0}")]
    Blocked(String),

    /// No payload found where the adapter expects one.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("adapter {0} not registered")]
    UnknownAdapter(String),
}

impl AdapterError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the error is a hard refusal rather than a data problem.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::Security(_) | Self::Blocked(_))
    }
}
