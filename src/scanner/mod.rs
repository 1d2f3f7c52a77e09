//! Incremental Scan Pipeline
//!
//! Four sequential stages turn a source tree into stored findings:
//!
//! - **Change detection**: hash matched files and stage the ones that changed
//! - **Archive expansion**: unpack archives among the staged files (best-effort)
//! - **License scan**: run the external scanner over the staging area (best-effort)
//! - **Ingestion**: merge the scanner report into the store
//!
//! External executables sit behind the `ArchiveExpander` and `LicenseScanner`
//! traits so tests can substitute fixture implementations.

pub mod api;
pub mod change_detector;
pub mod error;
pub mod extractor;
pub mod external;
pub mod ingest;
pub mod manager;
pub mod staging;
pub mod types;

pub use api::*;

#[cfg(test)]
pub(crate) mod tests;
