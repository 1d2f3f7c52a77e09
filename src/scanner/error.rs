//! Scanner Error Types

use crate::core::error_handling::ContextualError;
use crate::store::StoreError;
use std::path::PathBuf;

/// Scan pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Invalid configuration or arguments (bad glob pattern, missing source root)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external executable could not be started or exited unsuccessfully
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Could not parse scanner report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn tool(tool: &str, message: impl Into<String>) -> Self {
        ScanError::Tool {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

impl ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ScanError::Configuration { .. } => true,
            ScanError::Store(inner) => inner.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanError::Configuration { message } => Some(message),
            ScanError::Store(inner) => inner.user_message(),
            _ => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
