//! Persistent Store
//!
//! File records and the license policy live in a single SQLite database. The
//! pipeline and the audit engine only see the `FileStore` contract; the SQLite
//! implementation owns schema bootstrap and the connection lifecycle.

pub mod error;
pub mod models;
pub mod queries;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use models::{Acceptance, FileRecord, LicenseFinding, LicensePolicy, PolicyKind};
pub use sqlite::SqliteStore;

use std::collections::HashMap;

/// Read/write contract the scan pipeline and audit commands need from storage
pub trait FileStore {
    /// Every known record keyed by path, without retained content
    fn all_records(&self) -> StoreResult<HashMap<String, FileRecord>>;

    /// Records with findings and no active acceptance, ordered by path
    fn records_needing_review(&self) -> StoreResult<Vec<FileRecord>>;

    /// Records with findings, ordered by path, without retained content
    fn records_with_findings(&self) -> StoreResult<Vec<FileRecord>>;

    /// Records with an active acceptance, ordered by path
    fn accepted_records(&self) -> StoreResult<Vec<FileRecord>>;

    /// A single record including its retained content
    fn record(&self, path: &str) -> StoreResult<Option<FileRecord>>;

    /// Insert a fresh record, or update an existing one and reset its acceptance
    fn upsert_record(&self, record: &FileRecord, exists: bool) -> StoreResult<()>;

    /// Set (`Some`) or clear (`None`) the acceptance of a record with findings.
    ///
    /// The reason being replaced moves into the previous-reason slot. Returns
    /// false when no record with findings exists at `path`.
    fn set_acceptance(&self, path: &str, acceptance: Option<&Acceptance>) -> StoreResult<bool>;

    fn load_policy(&self) -> StoreResult<LicensePolicy>;

    fn allow_license(&self, kind: PolicyKind, name: &str) -> StoreResult<()>;

    /// Returns false when the name was not on the list
    fn unallow_license(&self, kind: PolicyKind, name: &str) -> StoreResult<bool>;

    /// Mark the start of a batch of writes that must land together
    fn begin_batch(&self, name: &str) -> StoreResult<()>;

    /// End a batch: keep its writes, or undo all of them
    fn end_batch(&self, name: &str, keep: bool) -> StoreResult<()>;
}
