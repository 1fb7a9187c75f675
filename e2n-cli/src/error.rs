use e2n_convert::{ConvertError, ErrorKind};
use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Pipeline or ingest failure
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Bad flag combination or settings
    #[error("Config error: {0}")]
    Config(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code: 1 for I/O, 2 parse/config, 3 validation, 4 fetch.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Convert(ConvertError::Io(_)) => 1,
            Self::Config(_) => 2,
            Self::Convert(err) => match err.kind() {
                ErrorKind::Parse => 2,
                ErrorKind::Validation => 3,
                ErrorKind::Fetch => 4,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CliError::from(ConvertError::Io(io)).exit_code(), 1);
        assert_eq!(CliError::config("bad").exit_code(), 2);
        assert_eq!(CliError::from(ConvertError::config("bad")).exit_code(), 2);
        assert_eq!(CliError::from(ConvertError::Stale("old".into())).exit_code(), 3);
        assert_eq!(CliError::from(ConvertError::schema("broken")).exit_code(), 3);
        assert_eq!(CliError::from(ConvertError::fetch("mock")).exit_code(), 4);
    }
}
