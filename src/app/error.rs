//! Application Error
//!
//! Wraps the subsystem errors at the process boundary and maps them to exit
//! codes.

use crate::app::cli::config::ConfigError;
use crate::audit::AuditError;
use crate::core::error_handling::ContextualError;
use crate::scanner::ScanError;
use crate::store::StoreError;
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("Could not start logging: {0}")]
    Logging(String),

    #[error("Could not start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Could not write output: {0}")]
    Output(#[source] std::io::Error),
}

impl AppError {
    /// Expected outcomes that end the process with a non-zero code but are not crashes
    pub fn is_graceful(&self) -> bool {
        matches!(self, AppError::Audit(inner) if inner.is_graceful())
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_graceful() {
            ExitCode::from(1)
        } else {
            ExitCode::from(2)
        }
    }
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config(inner) => inner.is_user_actionable(),
            AppError::Store(inner) => inner.is_user_actionable(),
            AppError::Scan(inner) => inner.is_user_actionable(),
            AppError::Audit(inner) => inner.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Config(inner) => inner.user_message(),
            AppError::Store(inner) => inner.user_message(),
            AppError::Scan(inner) => inner.user_message(),
            AppError::Audit(inner) => inner.user_message(),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
