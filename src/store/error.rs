//! Store Error Types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Could not create database directory {path}: {source}")]
    Location {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt value in column '{column}' for '{file_path}': {message}")]
    Corrupt {
        file_path: String,
        column: &'static str,
        message: String,
    },

    #[error("Could not encode license findings: {0}")]
    Encode(#[from] serde_json::Error),
}

impl crate::core::error_handling::ContextualError for StoreError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StoreError::Location { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StoreError::Location { .. } => Some("Database location is not writable"),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
