use thiserror::Error;

/// Top-level error type used across the entire workspace.
#[derive(Debug, Error)]
pub enum EmgError {
    #[error("config error: {0}")]
    Config(String),

    #[error("link error: {0}")]
    Link(String),

    #[error("malformed reading: {0:?}")]
    Reading(String),
}

pub type Result<T, E = EmgError> = std::result::Result<T, E>;
