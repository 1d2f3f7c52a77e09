//! Generic error handling utilities
//!
//! Every subsystem error (store, scan pipeline, audit, configuration) can tell
//! whether the user can act on it. The process boundary uses that to decide
//! between a specific message and a generic operation context.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` with a helpful, actionable message. When it returns `false`,
/// `user_message()` should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on
    /// (bad configuration, unknown path, invalid pattern)
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// User-actionable errors log their own message, system errors log the
/// operation context. Full details go to the debug level either way.
///
/// # Examples
/// ```rust,no_run
/// # use licaudit::core::error_handling::log_error_with_context;
/// # use licaudit::scanner::ScanError;
/// let err = ScanError::Configuration {
///     message: "Invalid glob pattern '['".to_string(),
/// };
/// log_error_with_context(&err, "Scanning source tree");
/// // Logs: "FATAL: Invalid glob pattern '['"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
