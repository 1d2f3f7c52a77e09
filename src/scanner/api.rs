//! Scanner API
//!
//! Public surface of the scan pipeline for the application layer.

pub use crate::scanner::change_detector::{hash_file, ChangeDetector};
pub use crate::scanner::error::{ScanError, ScanResult};
pub use crate::scanner::extractor::{ArchiveExpander, ExtractCode};
pub use crate::scanner::external::{LicenseScanner, ScanCode};
pub use crate::scanner::ingest::ResultIngester;
pub use crate::scanner::manager::{ScanOptions, ScanPipeline};
pub use crate::scanner::staging::{SessionLayout, StagingArea};
pub use crate::scanner::types::{ChangeSet, DirtyFile, IngestSummary, ScanOutcome};
