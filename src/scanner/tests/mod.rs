//! Test suites for the scan pipeline
//!
//! External tools are replaced by the fixture implementations in `helpers`.

pub mod helpers;
pub mod ingest;
