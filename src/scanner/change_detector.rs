//! Change Detection (Stage 1)
//!
//! Expands a glob under the source root, hashes every matched regular file
//! and stages the ones whose SHA-256 differs from the stored digest. Hashing
//! and copying run concurrently with a bounded fan-out.

use crate::core::pattern_parser::{relative_path_string, validate_glob_pattern};
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::staging::StagingArea;
use crate::scanner::types::{ChangeSet, DirtyFile};
use crate::store::FileStore;
use futures::stream::{self, StreamExt};
use indexmap::IndexSet;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// A progress line is logged every time this many dirty files have been staged
pub const PROGRESS_INTERVAL: usize = 5_000;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

pub struct ChangeDetector<'a, S: FileStore> {
    store: &'a S,
    source_root: PathBuf,
    staging: StagingArea,
    skip_dirty_check: bool,
    max_concurrency: usize,
}

impl<'a, S: FileStore> ChangeDetector<'a, S> {
    pub fn new(store: &'a S, source_root: impl Into<PathBuf>, staging: StagingArea) -> Self {
        Self {
            store,
            source_root: source_root.into(),
            staging,
            skip_dirty_check: false,
            max_concurrency: default_concurrency(),
        }
    }

    /// Treat every matched file as dirty, ignoring stored digests
    pub fn skip_dirty_check(mut self, skip: bool) -> Self {
        self.skip_dirty_check = skip;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    pub async fn run(&self, pattern: &str) -> ScanResult<ChangeSet> {
        let known = self.load_known_digests()?;

        let full_pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&self.source_root.to_string_lossy()),
            files_pattern(pattern)
        );
        info!("Finding all matches for glob {} ...", full_pattern);
        let matched = expand_glob(full_pattern).await?;
        info!("  done (found {}).", matched.len());

        info!("Staging dirty files (by comparing content hashes) ...");
        let dirty = self.stage_dirty_files(&matched, &known).await?;
        info!("  done (staged {}).", dirty.len());

        if dirty.is_empty() {
            info!("Found no dirty files in need of scanning.");
        } else {
            info!(
                "Copied dirty files to {} for scanning.",
                self.staging.root().display()
            );
        }

        Ok(ChangeSet {
            matched: matched.len(),
            dirty,
        })
    }

    fn load_known_digests(&self) -> ScanResult<HashMap<String, Option<String>>> {
        if self.skip_dirty_check {
            warn!("SKIPPING loading all previously analysed files from database.");
            return Ok(HashMap::new());
        }

        info!("Loading all previously analysed files from database ...");
        let known: HashMap<_, _> = self
            .store
            .all_records()?
            .into_iter()
            .map(|(path, record)| (path, record.content_sha256))
            .collect();
        info!("  done (found {}).", known.len());
        Ok(known)
    }

    async fn stage_dirty_files(
        &self,
        matched: &[PathBuf],
        known: &HashMap<String, Option<String>>,
    ) -> ScanResult<Vec<DirtyFile>> {
        let mut outcomes = stream::iter(matched)
            .map(|path| self.process_file(path, known))
            .buffer_unordered(self.max_concurrency);

        let mut dirty = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            if let Some(file) = outcome? {
                dirty.push(file);
                if dirty.len() % PROGRESS_INTERVAL == 0 {
                    info!("  staged {} dirty files ...", dirty.len());
                }
            }
        }

        dirty.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(dirty)
    }

    async fn process_file(
        &self,
        path: &Path,
        known: &HashMap<String, Option<String>>,
    ) -> ScanResult<Option<DirtyFile>> {
        let relative = relative_path_string(path, &self.source_root).ok_or_else(|| {
            ScanError::Configuration {
                message: format!(
                    "Matched path {} is outside source root {}",
                    path.display(),
                    self.source_root.display()
                ),
            }
        })?;

        let digest = hash_file(path).await?;
        let unchanged = matches!(known.get(&relative), Some(Some(stored)) if *stored == digest);
        if unchanged {
            return Ok(None);
        }

        self.staging.stage(path, &relative).await?;
        debug!("Staged {}", relative);
        Ok(Some(DirtyFile {
            path: relative,
            content_sha256: digest,
        }))
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

// A trailing `**` only yields directories; `**/*` yields their files too.
fn files_pattern(pattern: &str) -> String {
    let pattern = pattern.trim_start_matches('/').trim_end_matches('/');
    if pattern.is_empty() {
        "**/*".to_string()
    } else if pattern == "**" || pattern.ends_with("/**") {
        format!("{}/*", pattern)
    } else {
        pattern.to_string()
    }
}

/// Expand `pattern` on the blocking pool, keeping regular files only.
///
/// A matched directory stands for every file beneath it, unless the pattern
/// already descends with `**/*`.
async fn expand_glob(pattern: String) -> ScanResult<Vec<PathBuf>> {
    validate_glob_pattern(&pattern).map_err(|message| ScanError::Configuration { message })?;

    tokio::task::spawn_blocking(move || {
        let expand_directories = !pattern.ends_with("**/*");
        let mut files = IndexSet::new();
        for path in glob_entries(&pattern)? {
            let metadata =
                std::fs::symlink_metadata(&path).map_err(|e| ScanError::io(&path, e))?;
            let file_type = metadata.file_type();
            if file_type.is_file() {
                files.insert(path);
            } else if file_type.is_dir() && expand_directories {
                let nested = format!(
                    "{}/**/*",
                    glob::Pattern::escape(&path.to_string_lossy())
                );
                for inner in glob_entries(&nested)? {
                    let is_file = std::fs::symlink_metadata(&inner)
                        .map_err(|e| ScanError::io(&inner, e))?
                        .file_type()
                        .is_file();
                    if is_file {
                        files.insert(inner);
                    }
                }
            }
        }
        Ok(files.into_iter().collect())
    })
    .await?
}

fn glob_entries(pattern: &str) -> ScanResult<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| ScanError::Configuration {
        message: format!("Invalid glob pattern '{}': {}", pattern, e),
    })?;
    entries
        .map(|entry| {
            entry.map_err(|e| {
                let path = e.path().to_path_buf();
                ScanError::io(path, std::io::Error::from(e))
            })
        })
        .collect()
}

/// Streamed SHA-256 of a file's bytes as lowercase hex
pub async fn hash_file(path: &Path) -> ScanResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ScanError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| ScanError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
