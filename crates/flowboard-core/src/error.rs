//! Error types for the fallible boundaries of the core.
//!
//! Scene operations themselves never fail: a missing id or a degenerate gesture is
//! absorbed as a no-op. Only data crossing the crate boundary (snapshots, config,
//! generation results) is validated.

use thiserror::Error;

/// Errors raised at the edges of the scene core.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid generation result: {0}")]
    InvalidGeneration(String),
}

/// Result type for boundary operations.
pub type SceneResult<T> = Result<T, SceneError>;
