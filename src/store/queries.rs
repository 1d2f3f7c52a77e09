//! FileStore implementation over the SQLite schema

use crate::store::error::{StoreError, StoreResult};
use crate::store::models::{Acceptance, FileRecord, LicenseFinding, LicensePolicy, PolicyKind};
use crate::store::sqlite::SqliteStore;
use crate::store::FileStore;
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, OptionalExtension, Params, Row};
use std::collections::{BTreeSet, HashMap};

// content_text is left out of bulk reads; it is large and only `record` needs it.
const RECORD_COLUMNS: &str = "file_path, content_sha256, NULL AS content_text, licenses, \
     previous_accepted_reason, current_accepted_reason, current_accepted_at, is_legal_document";

/// Raw column values of one `analysed_files` row
struct RecordRow {
    file_path: String,
    content_sha256: Option<String>,
    content_text: Option<String>,
    licenses: Option<String>,
    previous_accepted_reason: Option<String>,
    current_accepted_reason: Option<String>,
    current_accepted_at: Option<String>,
    is_legal_document: Option<i64>,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            file_path: row.get(0)?,
            content_sha256: row.get(1)?,
            content_text: row.get(2)?,
            licenses: row.get(3)?,
            previous_accepted_reason: row.get(4)?,
            current_accepted_reason: row.get(5)?,
            current_accepted_at: row.get(6)?,
            is_legal_document: row.get(7)?,
        })
    }
}

impl TryFrom<RecordRow> for FileRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> StoreResult<Self> {
        let licenses = match row.licenses.as_deref() {
            Some(json) => serde_json::from_str::<Vec<LicenseFinding>>(json).map_err(|e| {
                StoreError::Corrupt {
                    file_path: row.file_path.clone(),
                    column: "licenses",
                    message: e.to_string(),
                }
            })?,
            None => Vec::new(),
        };

        let acceptance = match (row.current_accepted_reason, row.current_accepted_at) {
            (Some(reason), Some(at)) => {
                let accepted_at = DateTime::parse_from_rfc3339(&at)
                    .map_err(|e| StoreError::Corrupt {
                        file_path: row.file_path.clone(),
                        column: "current_accepted_at",
                        message: e.to_string(),
                    })?
                    .with_timezone(&Utc);
                Some(Acceptance {
                    reason,
                    accepted_at,
                })
            }
            _ => None,
        };

        Ok(FileRecord {
            path: row.file_path,
            content_sha256: row.content_sha256.filter(|s| !s.is_empty()),
            content_text: row.content_text,
            licenses,
            is_legal_document: row.is_legal_document.unwrap_or(0) != 0,
            previous_accepted_reason: row.previous_accepted_reason,
            acceptance,
            detailed_report: None,
        })
    }
}

impl SqliteStore {
    fn query_records<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<FileRecord>> {
        let mut stmt = self.connection().prepare(sql)?;
        let rows = stmt
            .query_map(params, RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(FileRecord::try_from).collect()
    }

    fn policy_names(&self, kind: PolicyKind) -> StoreResult<BTreeSet<String>> {
        let sql = format!("SELECT name FROM {} ORDER BY name", kind.table());
        let mut stmt = self.connection().prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(names)
    }
}

/// Findings are stored as a JSON list, or NULL when the file is clean
fn encode_licenses(licenses: &[LicenseFinding]) -> StoreResult<Option<String>> {
    if licenses.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(licenses)?))
    }
}

impl FileStore for SqliteStore {
    fn all_records(&self) -> StoreResult<HashMap<String, FileRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM analysed_files");
        let records = self.query_records(&sql, [])?;
        Ok(records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect())
    }

    fn records_needing_review(&self) -> StoreResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM analysed_files \
             WHERE licenses IS NOT NULL AND current_accepted_reason IS NULL \
             ORDER BY file_path ASC"
        );
        self.query_records(&sql, [])
    }

    fn records_with_findings(&self) -> StoreResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM analysed_files \
             WHERE licenses IS NOT NULL ORDER BY file_path ASC"
        );
        self.query_records(&sql, [])
    }

    fn accepted_records(&self) -> StoreResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM analysed_files \
             WHERE current_accepted_reason IS NOT NULL ORDER BY file_path ASC"
        );
        self.query_records(&sql, [])
    }

    fn record(&self, path: &str) -> StoreResult<Option<FileRecord>> {
        let row = self
            .connection()
            .query_row(
                "SELECT file_path, content_sha256, content_text, licenses, \
                 previous_accepted_reason, current_accepted_reason, current_accepted_at, \
                 is_legal_document FROM analysed_files WHERE file_path = ?1",
                params![path],
                RecordRow::from_row,
            )
            .optional()?;
        row.map(FileRecord::try_from).transpose()
    }

    fn upsert_record(&self, record: &FileRecord, exists: bool) -> StoreResult<()> {
        let licenses = encode_licenses(&record.licenses)?;
        let is_legal = i64::from(record.is_legal_document);

        if exists {
            self.connection().execute(
                "UPDATE analysed_files SET \
                 content_sha256 = :content_sha256, \
                 content_text = :content_text, \
                 licenses = :licenses, \
                 previous_accepted_reason = current_accepted_reason, \
                 current_accepted_reason = NULL, \
                 current_accepted_at = NULL, \
                 is_legal_document = :is_legal_document \
                 WHERE file_path = :file_path",
                named_params! {
                    ":content_sha256": record.content_sha256,
                    ":content_text": record.content_text,
                    ":licenses": licenses,
                    ":is_legal_document": is_legal,
                    ":file_path": record.path,
                },
            )?;
        } else {
            self.connection().execute(
                "INSERT INTO analysed_files VALUES (\
                 :file_path, :content_sha256, :content_text, :licenses, \
                 NULL, NULL, NULL, :is_legal_document)",
                named_params! {
                    ":file_path": record.path,
                    ":content_sha256": record.content_sha256,
                    ":content_text": record.content_text,
                    ":licenses": licenses,
                    ":is_legal_document": is_legal,
                },
            )?;
        }
        Ok(())
    }

    fn set_acceptance(&self, path: &str, acceptance: Option<&Acceptance>) -> StoreResult<bool> {
        let changes = match acceptance {
            Some(acceptance) => self.connection().execute(
                "UPDATE analysed_files SET \
                 previous_accepted_reason = current_accepted_reason, \
                 current_accepted_reason = ?1, \
                 current_accepted_at = ?2 \
                 WHERE file_path = ?3 AND licenses IS NOT NULL",
                params![acceptance.reason, acceptance.accepted_at.to_rfc3339(), path],
            )?,
            // Clearing an already clear record must not wipe the previous reason.
            None => self.connection().execute(
                "UPDATE analysed_files SET \
                 previous_accepted_reason = COALESCE(current_accepted_reason, previous_accepted_reason), \
                 current_accepted_reason = NULL, \
                 current_accepted_at = NULL \
                 WHERE file_path = ?1 AND licenses IS NOT NULL",
                params![path],
            )?,
        };
        Ok(changes > 0)
    }

    fn load_policy(&self) -> StoreResult<LicensePolicy> {
        Ok(LicensePolicy {
            specific: self.policy_names(PolicyKind::Specific)?,
            categories: self.policy_names(PolicyKind::Category)?,
        })
    }

    fn allow_license(&self, kind: PolicyKind, name: &str) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            kind.table()
        );
        self.connection().execute(&sql, params![name])?;
        Ok(())
    }

    fn unallow_license(&self, kind: PolicyKind, name: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE name = ?1", kind.table());
        let changes = self.connection().execute(&sql, params![name])?;
        Ok(changes > 0)
    }

    fn begin_batch(&self, name: &str) -> StoreResult<()> {
        self.savepoint(name)
    }

    fn end_batch(&self, name: &str, keep: bool) -> StoreResult<()> {
        self.release_savepoint(name, keep)
    }
}
