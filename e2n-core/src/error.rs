use thiserror::Error;

/// Errors raised when a composite key string does not follow its layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Invalid transponder key: {0}")]
    Transponder(String),

    #[error("Invalid service reference: {0}")]
    ServiceRef(String),
}

impl KeyError {
    pub fn transponder(value: impl Into<String>) -> Self {
        Self::Transponder(value.into())
    }

    pub fn service_ref(value: impl Into<String>) -> Self {
        Self::ServiceRef(value.into())
    }
}
