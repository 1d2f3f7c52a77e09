//! Application layer: CLI, configuration, command handlers and startup

pub mod cli;
pub mod commands;
pub mod error;
pub mod startup;

pub use error::{AppError, AppResult};
