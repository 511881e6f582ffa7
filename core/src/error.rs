//! Error types for opsdesk

use thiserror::Error;

/// Result type used throughout opsdesk-core
pub type Result<T> = std::result::Result<T, OpsdeskError>;

#[derive(Error, Debug)]
pub enum OpsdeskError {
    /// The upload is missing required columns; nothing was loaded.
    #[error("upload is missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("unknown ingestion mode: {0}")]
    UnknownMode(String),

    #[error("unknown edit target: {0}")]
    UnknownTarget(String),

    /// diff/apply called while no snapshot is open
    #[error("no snapshot is open; export a batch first")]
    NoSnapshot,

    /// The same post link was already submitted
    #[error("duplicate link: {0} has already been submitted")]
    DuplicateLink(String),

    /// The store rejected a write while applying a change batch. The whole
    /// batch was rolled back.
    #[error("apply failed: {message}")]
    Apply {
        message: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsdeskError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn missing_columns(columns: Vec<String>) -> Self {
        Self::MissingColumns { columns }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn apply(message: impl Into<String>, source: duckdb::Error) -> Self {
        Self::Apply {
            message: message.into(),
            source,
        }
    }
}
