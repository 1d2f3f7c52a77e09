//! Common test utilities and helpers
//!
//! Fixture implementations of the external tool traits plus a workspace
//! holding a source tree, a database and a work directory.

#![allow(dead_code)]

use async_trait::async_trait;
use licaudit::app::cli::config::Settings;
use licaudit::app::commands::{dispatch, CommandContext};
use licaudit::app::startup::finish_transaction;
use licaudit::app::AppError;
use licaudit::app::cli::Command;
use licaudit::core::time::FixedTimeProvider;
use licaudit::scanner::{ArchiveExpander, LicenseScanner, ScanError, ScanResult, SessionLayout};
use licaudit::store::SqliteStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Every regular file under `root`, relative and `/`-separated, sorted
pub fn list_files(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                out.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut files = Vec::new();
    if root.is_dir() {
        walk(root, root, &mut files);
    }
    files.sort();
    files
}

/// Reports a license key for every file whose content contains its marker
pub struct MarkerScanner {
    rules: Vec<(&'static str, &'static str)>,
}

impl MarkerScanner {
    pub fn new(rules: &[(&'static str, &'static str)]) -> Self {
        Self {
            rules: rules.to_vec(),
        }
    }

    fn detections(&self, content: &str) -> Vec<Value> {
        self.rules
            .iter()
            .filter(|(marker, _)| content.contains(marker))
            .map(|(_, license)| json!({"matches": [{"license_expression": license}]}))
            .collect()
    }
}

#[async_trait]
impl LicenseScanner for MarkerScanner {
    fn name(&self) -> &str {
        "marker-scanner"
    }

    async fn scan(&self, input_dir: &Path, report_path: &Path, _verbose: bool) -> ScanResult<()> {
        let files: Vec<Value> = list_files(input_dir)
            .into_iter()
            .map(|relative| {
                let bytes = std::fs::read(input_dir.join(&relative)).unwrap();
                let content = String::from_utf8_lossy(&bytes);
                json!({
                    "path": relative,
                    "type": "file",
                    "sha256": format!("{:x}", Sha256::digest(&bytes)),
                    "license_detections": self.detections(&content),
                    "is_legal": relative.to_lowercase().contains("license"),
                })
            })
            .collect();
        std::fs::write(report_path, json!({ "files": files }).to_string())
            .map_err(|e| ScanError::Io {
                path: report_path.to_path_buf(),
                source: e,
            })
    }

    async fn detailed_scan(&self, file: &Path, _report_path: &Path) -> ScanResult<Option<Value>> {
        let content = std::fs::read_to_string(file).unwrap_or_default();
        Ok(Some(json!({"type": "file", "detections": self.detections(&content)})))
    }
}

/// Expander that is never installed
pub struct NoExpander;

#[async_trait]
impl ArchiveExpander for NoExpander {
    fn name(&self) -> &str {
        "no-extractor"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn expand(&self, _root: &Path, _verbose: bool) -> ScanResult<()> {
        Ok(())
    }
}

pub fn session_time(offset_minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(offset_minutes)
}

/// Source tree, database file and work directory in one temporary directory
pub struct Workspace {
    pub temp_dir: TempDir,
    pub settings: Settings,
    pub scanner: MarkerScanner,
    pub expander: NoExpander,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            db_path: temp_dir.path().join("db").join("db.sqlite"),
            source_root: temp_dir.path().join("src"),
            work_root: temp_dir.path().join("tmp"),
            ..Settings::default()
        };
        std::fs::create_dir_all(&settings.source_root).unwrap();
        Self {
            temp_dir,
            settings,
            scanner: MarkerScanner::new(&[
                ("GNU GENERAL PUBLIC LICENSE", "gpl-1.0"),
                ("Permission is hereby granted", "mit"),
            ]),
            expander: NoExpander,
        }
    }

    pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.settings.source_root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn open_store(&self) -> SqliteStore {
        SqliteStore::open(&self.settings.db_path).unwrap()
    }

    pub fn layout(&self, at: DateTime<Utc>) -> SessionLayout {
        SessionLayout::new(&self.settings.work_root, &at)
    }

    /// Run one command the way a process would: fresh store, one transaction
    pub async fn run(&self, command: Command, at: DateTime<Utc>) -> (Result<(), AppError>, String) {
        let store = self.open_store();
        store.begin_global_transaction().unwrap();
        let clock = FixedTimeProvider(at);
        let ctx = CommandContext {
            store: &store,
            settings: &self.settings,
            layout: self.layout(at),
            expander: &self.expander,
            scanner: &self.scanner,
            clock: &clock,
            color: false,
        };
        let mut out = Vec::new();
        let result = dispatch(&ctx, &command, &mut out).await;
        finish_transaction(&store, &result).unwrap();
        (result, String::from_utf8(out).unwrap())
    }
}
