//! Scan Pipeline
//!
//! Runs the four scan stages strictly in order. Change detection and
//! ingestion failures abort the run; archive expansion and the external
//! scanner are best-effort and their failures come back as warnings so
//! ingestion can still pick up whatever partial report exists.

use crate::core::time::format_elapsed;
use crate::scanner::change_detector::ChangeDetector;
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::extractor::ArchiveExpander;
use crate::scanner::external::LicenseScanner;
use crate::scanner::ingest::ResultIngester;
use crate::scanner::staging::SessionLayout;
use crate::scanner::types::ScanOutcome;
use crate::store::FileStore;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Knobs for a single `scan` invocation
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Glob relative to the source root
    pub pattern: String,
    pub verbose: bool,
    pub skip_dirty_check: bool,
    pub skip_extract_archives: bool,
    pub max_concurrency: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: "**".to_string(),
            verbose: false,
            skip_dirty_check: false,
            skip_extract_archives: false,
            max_concurrency: None,
        }
    }
}

pub struct ScanPipeline<'a, S: FileStore> {
    store: &'a S,
    source_root: PathBuf,
    layout: SessionLayout,
    expander: &'a dyn ArchiveExpander,
    scanner: &'a dyn LicenseScanner,
}

impl<'a, S: FileStore> ScanPipeline<'a, S> {
    pub fn new(
        store: &'a S,
        source_root: impl Into<PathBuf>,
        layout: SessionLayout,
        expander: &'a dyn ArchiveExpander,
        scanner: &'a dyn LicenseScanner,
    ) -> Self {
        Self {
            store,
            source_root: source_root.into(),
            layout,
            expander,
            scanner,
        }
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    pub async fn run(&self, options: &ScanOptions) -> ScanResult<ScanOutcome> {
        if !self.source_root.is_dir() {
            return Err(ScanError::Configuration {
                message: format!(
                    "Source root {} is not a directory",
                    self.source_root.display()
                ),
            });
        }

        let mut outcome = ScanOutcome::default();

        let started = Instant::now();
        info!("=== STEP 1: Collect dirty files for scanning");
        let mut detector =
            ChangeDetector::new(self.store, &self.source_root, self.layout.staging())
                .skip_dirty_check(options.skip_dirty_check);
        if let Some(limit) = options.max_concurrency {
            detector = detector.max_concurrency(limit);
        }
        outcome.changes = detector.run(&options.pattern).await?;
        info!("Step 1 finished in {}", format_elapsed(started.elapsed()));

        let started = Instant::now();
        info!("=== STEP 2: Extract any archives among dirty files");
        if let Err(e) = self.expand_archives(options).await {
            error!("Archive extraction failed: {}", e);
            outcome.warnings.push(format!("Archive extraction failed: {}", e));
        }
        info!("Step 2 finished in {}", format_elapsed(started.elapsed()));

        let started = Instant::now();
        info!("=== STEP 3: Run ScanCode on dirty files");
        if let Err(e) = self.run_scanner(options).await {
            error!("License scan failed: {}", e);
            outcome.warnings.push(format!("License scan failed: {}", e));
        }
        info!("Step 3 finished in {}", format_elapsed(started.elapsed()));

        let started = Instant::now();
        info!("=== STEP 4: Save results to database");
        let ingester = ResultIngester::new(
            self.store,
            self.layout.staging(),
            self.layout.scancode_report(),
        );
        outcome.ingest = ingester.run().await?;
        info!("Step 4 finished in {}", format_elapsed(started.elapsed()));

        for warning in &outcome.warnings {
            warn!("{}", warning);
        }
        Ok(outcome)
    }

    async fn expand_archives(&self, options: &ScanOptions) -> ScanResult<()> {
        let staging = self.layout.staging();
        if !staging.exists() {
            info!("Nothing to be done (no dirty files).");
            return Ok(());
        }
        if options.skip_extract_archives {
            warn!("SKIPPING extracting archives (due to config).");
            return Ok(());
        }
        if !self.expander.is_available().await {
            warn!(
                "SKIPPING extracting archives ({} not found).",
                self.expander.name()
            );
            return Ok(());
        }
        self.expander.expand(staging.root(), options.verbose).await
    }

    async fn run_scanner(&self, options: &ScanOptions) -> ScanResult<()> {
        let staging = self.layout.staging();
        if !staging.exists() {
            info!("Nothing to be done (no dirty files).");
            return Ok(());
        }

        let report_path = self.layout.scancode_report();
        if let Some(parent) = report_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::io(parent, e))?;
        }
        self.scanner
            .scan(staging.root(), &report_path, options.verbose)
            .await?;
        info!("ScanCode report saved to: {}", report_path.display());
        Ok(())
    }
}
