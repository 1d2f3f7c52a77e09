//! Result Ingestion (Stage 4)
//!
//! Merges the scanner report into the store. Any file entry whose record
//! already exists is updated and loses its acceptance; new paths are inserted.

use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::staging::StagingArea;
use crate::scanner::types::{IngestSummary, ScanReport};
use crate::store::models::SHA256_EMPTY_CONTENT;
use crate::store::{FileRecord, FileStore};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const INGEST_BATCH: &str = "ingest_report";

pub struct ResultIngester<'a, S: FileStore> {
    store: &'a S,
    staging: StagingArea,
    report_path: PathBuf,
}

impl<'a, S: FileStore> ResultIngester<'a, S> {
    pub fn new(store: &'a S, staging: StagingArea, report_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging,
            report_path: report_path.into(),
        }
    }

    pub async fn run(&self) -> ScanResult<IngestSummary> {
        if !self.report_path.exists() {
            info!("Nothing to be done (no ScanCode report found).");
            return Ok(IngestSummary::default());
        }
        if !self.staging.exists() {
            info!("Nothing to be done (no dirty files).");
            return Ok(IngestSummary::default());
        }

        info!("Loading all previously analysed files from database ...");
        let previous = self.store.all_records()?;
        info!("  done (loaded {}).", previous.len());

        info!("Saving results of ScanCode report to database ...");
        let report = read_report(&self.report_path).await?;

        // A report is saved whole or not at all.
        self.store.begin_batch(INGEST_BATCH)?;
        match self.save_entries(&report, &previous).await {
            Ok(summary) => {
                self.store.end_batch(INGEST_BATCH, true)?;
                info!("  done (saved {}).", summary.saved);
                Ok(summary)
            }
            Err(e) => {
                if let Err(rollback) = self.store.end_batch(INGEST_BATCH, false) {
                    warn!("Could not undo partially saved report: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn save_entries(
        &self,
        report: &ScanReport,
        previous: &HashMap<String, FileRecord>,
    ) -> ScanResult<IngestSummary> {
        let mut summary = IngestSummary::default();
        for entry in report.files.iter().filter(|entry| entry.is_file()) {
            let mut record = FileRecord::new(entry.path.as_str());
            record.content_sha256 = Some(
                entry
                    .sha256
                    .clone()
                    .unwrap_or_else(|| SHA256_EMPTY_CONTENT.to_string()),
            );
            record.licenses = entry.findings();
            record.is_legal_document = entry.is_legal.unwrap_or(false);

            if record.has_findings() {
                record.content_text = Some(self.staging.read_text(&record.path).await?);
                summary.with_findings += 1;
            }

            let exists = previous.contains_key(&record.path);
            self.store.upsert_record(&record, exists)?;
            if exists {
                summary.updated += 1;
            } else {
                summary.inserted += 1;
            }
            summary.saved += 1;
            debug!(
                "Saved {} ({} findings)",
                record.path,
                record.licenses.len()
            );
        }

        Ok(summary)
    }
}

async fn read_report(path: &Path) -> ScanResult<ScanReport> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| ScanError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|source| ScanError::Report {
        path: path.to_path_buf(),
        source,
    })
}
