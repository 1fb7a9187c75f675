use e2n_adapters::AdapterError;
use e2n_catalog::LoadError;
use e2n_formats::FormatError;
use e2n_zapit::WriterError;

/// Coarse failure class, used to pick a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, bad configuration or I/O.
    Parse,
    /// Data-quality escalations, staleness and structural output defects.
    Validation,
    /// Source policy refusals during ingest.
    Fetch,
}

/// Errors that can occur during conversion and ingest.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Catalog(#[from] LoadError),

    #[error(transparent)]
    Writer(WriterError),

    /// Source data older than the freshness threshold.
    #[error("{0}")]
    Stale(String),

    #[error("{0}")]
    Validation(String),

    /// A rendered table failed its structural check.
    #[error("schema validation failed: {0}")]
    Schema(String),

    #[error("{0}")]
    Scanfile(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Fetch(String),
}

impl From<WriterError> for ConvertError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Scanfile(msg) => Self::Scanfile(msg),
            other => Self::Writer(other),
        }
    }
}

impl ConvertError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stale(_) | Self::Validation(_) | Self::Schema(_) | Self::Scanfile(_) => {
                ErrorKind::Validation
            }
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Adapter(err) if err.is_policy() => ErrorKind::Fetch,
            _ => ErrorKind::Parse,
        }
    }
}
