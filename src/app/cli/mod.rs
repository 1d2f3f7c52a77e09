//! Command-line arguments and configuration file handling

pub mod args;
pub mod config;

pub use args::{Args, Command};
pub use config::{ConfigError, Settings};
