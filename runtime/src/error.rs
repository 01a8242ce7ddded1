//! Errors raised at the edges of the engine (config, I/O, insight replies).
//!
//! The extraction and layout core never fails; these only surface when
//! reading inputs or talking to collaborators.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MetroError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("insight provider error: {0}")]
    Insight(String),
}

pub type Result<T> = std::result::Result<T, MetroError>;
