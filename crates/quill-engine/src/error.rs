use thiserror::Error;

/// Load-bearing operations surface these to the caller; advisory subsystems
/// (relay, sweeps) catch and log their own failures instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl EngineError {
    pub fn validation(reason: impl Into<String>) -> Self {
        EngineError::Validation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
