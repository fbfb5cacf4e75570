//! Engine error types.

use ambimix_store::StoreError;
use thiserror::Error;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] ambimix_core::Error),

    #[error("Preset storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("Session runtime is not running")]
    SessionClosed,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
