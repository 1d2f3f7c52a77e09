//! Audit Error Types

use crate::core::error_handling::ContextualError;
use crate::scanner::ScanError;
use crate::store::StoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Expected outcome of an audit that still has files to review
    #[error("Audit found {0} file(s) needing investigation")]
    FindingsPresent(usize),

    /// Exact accept/unaccept target with no matching record with findings
    #[error("Found no such file: {path}")]
    NoSuchFile { path: String },

    #[error("Invalid pattern: {message}")]
    Pattern { message: String },

    #[error("Could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for outcomes that are reported but are not failures of the tool
    pub fn is_graceful(&self) -> bool {
        matches!(self, AuditError::FindingsPresent(_))
    }
}

impl ContextualError for AuditError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AuditError::NoSuchFile { .. } | AuditError::Pattern { .. } => true,
            AuditError::Store(inner) => inner.is_user_actionable(),
            AuditError::Scan(inner) => inner.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AuditError::NoSuchFile { .. } => Some("Found no such file. Did you mean to use the wildcard (%)?"),
            AuditError::Pattern { message } => Some(message),
            AuditError::Store(inner) => inner.user_message(),
            AuditError::Scan(inner) => inner.user_message(),
            _ => None,
        }
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
