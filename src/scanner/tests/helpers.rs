//! Fixture tools and filesystem helpers for scanner unit tests
//!
//! `FixtureScanner` stands in for ScanCode: it walks the staging directory and
//! writes a report in the same shape, detecting a license whenever a file's
//! content contains one of its configured marker strings.

use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::extractor::ArchiveExpander;
use crate::scanner::external::LicenseScanner;
use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Write `(relative path, content)` pairs under `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Every regular file under `root`, relative and `/`-separated, sorted
pub fn list_files(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
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

pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Scanner double producing ScanCode-shaped reports
pub struct FixtureScanner {
    /// `(marker, license)`: content containing `marker` is reported with `license`
    rules: Vec<(String, String)>,
    pub scans: AtomicUsize,
}

impl FixtureScanner {
    pub fn new(rules: &[(&str, &str)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(marker, license)| (marker.to_string(), license.to_string()))
                .collect(),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn licenses_for(&self, content: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|(marker, _)| content.contains(marker.as_str()))
            .map(|(_, license)| license.as_str())
            .collect()
    }

    /// Report for everything under `input_dir`, with directory entries included
    pub fn build_report(&self, input_dir: &Path) -> Value {
        let mut entries = Vec::new();
        let mut directories = std::collections::BTreeSet::new();
        for relative in list_files(input_dir) {
            let bytes = std::fs::read(input_dir.join(&relative)).unwrap();
            let content = String::from_utf8_lossy(&bytes);
            let detections: Vec<Value> = self
                .licenses_for(&content)
                .into_iter()
                .map(|license| json!({"matches": [{"license_expression": license}]}))
                .collect();
            let is_legal = relative.to_lowercase().contains("license");

            if let Some((parent, _)) = relative.rsplit_once('/') {
                directories.insert(parent.to_string());
            }
            entries.push(json!({
                "path": relative,
                "type": "file",
                "sha256": sha256_hex(&bytes),
                "license_detections": detections,
                "is_legal": is_legal,
            }));
        }
        for directory in directories {
            entries.push(json!({"path": directory, "type": "directory"}));
        }
        json!({"headers": [{"tool_name": "fixture"}], "files": entries})
    }
}

#[async_trait]
impl LicenseScanner for FixtureScanner {
    fn name(&self) -> &str {
        "fixture-scanner"
    }

    async fn scan(&self, input_dir: &Path, report_path: &Path, _verbose: bool) -> ScanResult<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let report = self.build_report(input_dir);
        std::fs::write(report_path, serde_json::to_vec_pretty(&report).unwrap())
            .map_err(|e| ScanError::io(report_path, e))
    }

    async fn detailed_scan(
        &self,
        file: &Path,
        _report_path: &Path,
    ) -> ScanResult<Option<Value>> {
        let content = std::fs::read_to_string(file).map_err(|e| ScanError::io(file, e))?;
        let licenses: Vec<Value> = self
            .licenses_for(&content)
            .into_iter()
            .map(|license| json!({"key": license, "matched_text": content.trim()}))
            .collect();
        Ok(Some(json!({"type": "file", "licenses": licenses})))
    }
}

/// Scanner that writes `partial` (if any) and then fails
pub struct FailingScanner {
    pub partial: Option<Value>,
}

#[async_trait]
impl LicenseScanner for FailingScanner {
    fn name(&self) -> &str {
        "failing-scanner"
    }

    async fn scan(&self, _input_dir: &Path, report_path: &Path, _verbose: bool) -> ScanResult<()> {
        if let Some(report) = &self.partial {
            std::fs::write(report_path, report.to_string())
                .map_err(|e| ScanError::io(report_path, e))?;
        }
        Err(ScanError::tool("failing-scanner", "exited with exit status: 1"))
    }

    async fn detailed_scan(&self, _file: &Path, _report_path: &Path) -> ScanResult<Option<Value>> {
        Err(ScanError::tool("failing-scanner", "exited with exit status: 1"))
    }
}

/// Archive expander double
pub struct FixtureExpander {
    pub available: bool,
    pub fail: bool,
    pub expanded: std::sync::Mutex<Vec<PathBuf>>,
}

impl FixtureExpander {
    pub fn available() -> Self {
        Self {
            available: true,
            fail: false,
            expanded: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::available()
        }
    }

    pub fn expansions(&self) -> usize {
        self.expanded.lock().unwrap().len()
    }
}

#[async_trait]
impl ArchiveExpander for FixtureExpander {
    fn name(&self) -> &str {
        "fixture-extractor"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn expand(&self, root: &Path, _verbose: bool) -> ScanResult<()> {
        self.expanded.lock().unwrap().push(root.to_path_buf());
        if self.fail {
            return Err(ScanError::tool("fixture-extractor", "corrupt archive"));
        }
        // Mimic extractcode: `x.zip` gains a sibling `x.zip-extract/` directory.
        for relative in list_files(root) {
            if relative.ends_with(".zip") {
                let content = std::fs::read_to_string(root.join(&relative)).unwrap_or_default();
                let target = root.join(format!("{}-extract", relative)).join("inner.txt");
                std::fs::create_dir_all(target.parent().unwrap()).unwrap();
                std::fs::write(target, content).unwrap();
            }
        }
        Ok(())
    }
}
