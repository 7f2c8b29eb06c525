// src/error.rs
// Error types for pipeline construction, composition and execution

use thiserror::Error;

/// Errors raised while building or running a pipeline
///
/// Construction problems surface as [`IronPipeError::Validation`] the moment a
/// node is built. Resolution never fails.
#[derive(Debug, Error)]
pub enum IronPipeError {
    /// A node's field constraints were violated at construction time
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stage-ordering or composition rule was violated by the pipeline
    #[error("Composition error: {0}")]
    Composition(String),

    /// `run()` was called without a collection or database handle
    #[error("{0} is not defined")]
    MissingPrerequisite(&'static str),

    /// Raised by the execution collaborator, passed through untouched
    #[error(transparent)]
    Execution(#[from] anyhow::Error),

    /// Malformed configuration document
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IronPipeError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        IronPipeError::Validation(msg.into())
    }

    pub(crate) fn composition(msg: impl Into<String>) -> Self {
        IronPipeError::Composition(msg.into())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, IronPipeError>;
