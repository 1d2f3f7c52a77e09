//! Session Staging Area
//!
//! Every command invocation gets a session directory named after its start
//! time. Changed files are staged under `dirty/` with their path relative to
//! the source root preserved, and reports are written under `report/`.

use crate::core::time::session_slug;
use crate::scanner::error::{ScanError, ScanResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Directory layout of one session under the work root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    session_root: PathBuf,
}

impl SessionLayout {
    pub fn new(work_root: &Path, started_at: &DateTime<Utc>) -> Self {
        Self {
            session_root: work_root.join(session_slug(started_at)),
        }
    }

    pub fn session_root(&self) -> &Path {
        &self.session_root
    }

    /// Staging directory for changed files
    pub fn dirty_root(&self) -> PathBuf {
        self.session_root.join("dirty")
    }

    pub fn report_root(&self) -> PathBuf {
        self.session_root.join("report")
    }

    pub fn scancode_report(&self) -> PathBuf {
        self.report_root().join("scancode.json")
    }

    pub fn audit_report(&self) -> PathBuf {
        self.report_root().join("audit.json")
    }

    pub fn accepted_report(&self) -> PathBuf {
        self.report_root().join("accepted.json")
    }

    pub fn staging(&self) -> StagingArea {
        StagingArea::new(self.dirty_root())
    }
}

/// Mirror of the source tree holding only the files that need scanning
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True once at least one file has been staged
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn path_for(&self, relative_path: &str) -> PathBuf {
        relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Copy `source` byte-for-byte to `relative_path`, creating parent directories
    pub async fn stage(&self, source: &Path, relative_path: &str) -> ScanResult<PathBuf> {
        let target = self.path_for(relative_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::io(parent, e))?;
        }
        tokio::fs::copy(source, &target)
            .await
            .map_err(|e| ScanError::io(source, e))?;
        Ok(target)
    }

    /// Read a staged file as text, replacing invalid UTF-8 sequences
    pub async fn read_text(&self, relative_path: &str) -> ScanResult<String> {
        let path = self.path_for(relative_path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ScanError::io(&path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
