//! Auditor (the `audit` command)
//!
//! Rebuilds the audit tree from the records that still need review, prunes it
//! against the current license policy and writes what is left as the audit
//! artifact. Leftover leaves are reported as `AuditError::FindingsPresent`.

use crate::audit::error::{AuditError, AuditResult};
use crate::audit::policy::Detective;
use crate::audit::tree::{AuditTree, LeafVisitor};
use crate::core::time::format_elapsed;
use crate::scanner::external::LicenseScanner;
use crate::scanner::staging::SessionLayout;
use crate::store::{FileRecord, FileStore};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditOptions {
    /// Attach a detailed scanner entry to every remaining leaf
    pub verbose: bool,
    /// Also print the artifact to stdout
    pub print: bool,
}

/// Attaches detailed scanner output to leaves, one file at a time
struct DetailedScanVisitor<'a, S: FileStore> {
    store: &'a S,
    scanner: &'a dyn LicenseScanner,
    scratch_dir: PathBuf,
}

impl<S: FileStore> DetailedScanVisitor<'_, S> {
    async fn detailed_entry(&self, path: &str) -> AuditResult<Option<serde_json::Value>> {
        let content = self
            .store
            .record(path)?
            .and_then(|record| record.content_text)
            .unwrap_or_default();

        let input = self.scratch_dir.join("detailed-input");
        let report = self.scratch_dir.join("detailed-report.json");
        tokio::fs::write(&input, content.as_bytes())
            .await
            .map_err(|e| AuditError::io(&input, e))?;

        let entry = self.scanner.detailed_scan(&input, &report).await;
        let _ = tokio::fs::remove_file(&input).await;
        let _ = tokio::fs::remove_file(&report).await;
        Ok(entry?)
    }
}

#[async_trait(?Send)]
impl<S: FileStore> LeafVisitor for DetailedScanVisitor<'_, S> {
    type Error = AuditError;

    async fn visit(&self, leaf: &mut FileRecord) -> AuditResult<()> {
        info!("Running detailed on-the-fly ScanCode analysis for: {}", leaf.path);
        match self.detailed_entry(&leaf.path).await {
            Ok(entry) => leaf.detailed_report = entry,
            Err(e) => warn!("Detailed analysis failed for {}: {}", leaf.path, e),
        }
        Ok(())
    }
}

pub struct Auditor<'a, S: FileStore> {
    store: &'a S,
    scanner: &'a dyn LicenseScanner,
    layout: SessionLayout,
}

impl<'a, S: FileStore> Auditor<'a, S> {
    pub fn new(store: &'a S, scanner: &'a dyn LicenseScanner, layout: SessionLayout) -> Self {
        Self {
            store,
            scanner,
            layout,
        }
    }

    /// Records needing review, reduced by the policy
    pub fn pruned_tree(&self) -> AuditResult<AuditTree> {
        let policy = self.store.load_policy()?;
        let records = self.store.records_needing_review()?;
        debug!("{} record(s) need review before pruning", records.len());
        Ok(AuditTree::build(records).pruned(&Detective::new(&policy)))
    }

    /// Run the audit and write the artifact. Returns the artifact path when
    /// nothing needs investigation.
    pub async fn run(&self, options: AuditOptions) -> AuditResult<PathBuf> {
        let started = Instant::now();
        info!("=== STEP 5: Gather suspicious findings");
        info!("Analysing suspicious files in database ...");

        let mut tree = self.pruned_tree()?;
        let report_root = self.layout.report_root();
        create_dir(&report_root).await?;

        if options.verbose {
            let visitor = DetailedScanVisitor {
                store: self.store,
                scanner: self.scanner,
                scratch_dir: report_root.clone(),
            };
            tree.apply_to_leaves(&visitor).await?;
        }

        let found = tree.count_leaves();
        info!("  done (found {}).", found);

        let json = tree.to_json()?;
        let audit_path = self.layout.audit_report();
        tokio::fs::write(&audit_path, &json)
            .await
            .map_err(|e| AuditError::io(&audit_path, e))?;
        if options.print {
            print!("{}", json);
        }
        info!("Investigation saved to: {}", audit_path.display());
        info!("Audit took {}", format_elapsed(started.elapsed()));

        if found > 0 {
            return Err(AuditError::FindingsPresent(found));
        }
        Ok(audit_path)
    }
}

pub(crate) async fn create_dir(path: &Path) -> AuditResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| AuditError::io(path, e))
}
