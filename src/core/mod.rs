//! Core services and infrastructure

pub mod error_handling;
pub mod logging;
pub mod pattern_parser;
pub mod styles; // terminal palette for reports and clap help
pub mod time;
