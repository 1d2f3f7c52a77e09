//! External License Scanner (Stage 3)
//!
//! License detection is delegated to an external executable that writes a
//! JSON report. The production implementation drives ScanCode; tests plug in
//! implementations that write fixture reports.

use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::extractor::run_tool;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

#[async_trait]
pub trait LicenseScanner: Send + Sync {
    fn name(&self) -> &str;

    /// Scan every file under `input_dir`, writing the report to `report_path`.
    /// Report paths are relative to `input_dir`.
    async fn scan(&self, input_dir: &Path, report_path: &Path, verbose: bool) -> ScanResult<()>;

    /// Scan a single file with matched license text included, returning its
    /// report entry without the (temporary) path. `None` when the report has
    /// no entry for the file.
    async fn detailed_scan(
        &self,
        file: &Path,
        report_path: &Path,
    ) -> ScanResult<Option<serde_json::Value>>;
}

#[derive(Debug, Clone)]
pub struct ScanCode {
    binary: String,
    processes: usize,
}

impl ScanCode {
    pub fn new(binary: impl Into<String>) -> Self {
        let processes = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            binary: binary.into(),
            processes,
        }
    }

    pub fn with_processes(mut self, processes: usize) -> Self {
        self.processes = processes.max(1);
        self
    }

    /// Arguments for a full scan of a staging directory
    pub fn scan_args(
        &self,
        input_dir: &Path,
        report_path: &Path,
        verbose: bool,
    ) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = Vec::new();
        if verbose {
            args.push("--verbose".into());
        }
        args.push("--processes".into());
        args.push(self.processes.to_string().into());
        for flag in ["--strip-root", "--info", "--license", "--classify", "--json"] {
            args.push(flag.into());
        }
        args.push(report_path.into());
        args.push(input_dir.into());
        args
    }

    /// Arguments for a detailed single-file scan
    pub fn detailed_args(&self, file: &Path, report_path: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = [
            "--quiet",
            "--full-root",
            "--license",
            "--classify",
            "--license-text",
            "--json",
        ]
        .into_iter()
        .map(Into::into)
        .collect();
        args.push(report_path.into());
        args.push(file.into());
        args
    }
}

impl Default for ScanCode {
    fn default() -> Self {
        Self::new("scancode")
    }
}

#[async_trait]
impl LicenseScanner for ScanCode {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn scan(&self, input_dir: &Path, report_path: &Path, verbose: bool) -> ScanResult<()> {
        let mut command = Command::new(&self.binary);
        command.args(self.scan_args(input_dir, report_path, verbose));
        run_tool(&self.binary, command).await
    }

    async fn detailed_scan(
        &self,
        file: &Path,
        report_path: &Path,
    ) -> ScanResult<Option<serde_json::Value>> {
        let mut command = Command::new(&self.binary);
        command.args(self.detailed_args(file, report_path));
        run_tool(&self.binary, command).await?;

        let raw = tokio::fs::read(report_path)
            .await
            .map_err(|e| ScanError::io(report_path, e))?;
        let report: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|source| ScanError::Report {
                path: report_path.to_path_buf(),
                source,
            })?;
        Ok(take_entry_for(report, file))
    }
}

/// Pull the entry for `file` out of a full-root report and drop its path.
/// Full-root reports omit the leading `/`.
pub fn take_entry_for(report: serde_json::Value, file: &Path) -> Option<serde_json::Value> {
    let wanted = file.to_string_lossy();
    let wanted = wanted.trim_start_matches('/');

    let serde_json::Value::Object(mut document) = report else {
        return None;
    };
    let serde_json::Value::Array(files) = document.remove("files")? else {
        return None;
    };

    files.into_iter().find_map(|entry| match entry {
        serde_json::Value::Object(mut fields) => {
            let matches = fields
                .get("path")
                .and_then(|p| p.as_str())
                .is_some_and(|p| p.trim_start_matches('/') == wanted);
            if matches {
                fields.remove("path");
                Some(serde_json::Value::Object(fields))
            } else {
                None
            }
        }
        _ => None,
    })
}
