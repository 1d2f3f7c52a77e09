//! Archive Expansion (Stage 2)

use crate::scanner::error::{ScanError, ScanResult};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Recursively expands archives found under a directory, in place
#[async_trait]
pub trait ArchiveExpander: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the expander can run at all on this machine
    async fn is_available(&self) -> bool;

    async fn expand(&self, root: &Path, verbose: bool) -> ScanResult<()>;
}

/// `extractcode` from the ScanCode toolkit
#[derive(Debug, Clone)]
pub struct ExtractCode {
    binary: String,
}

impl ExtractCode {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for ExtractCode {
    fn default() -> Self {
        Self::new("extractcode")
    }
}

#[async_trait]
impl ArchiveExpander for ExtractCode {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn is_available(&self) -> bool {
        let probe = Command::new(&self.binary)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match probe {
            Ok(_) => true,
            Err(e) => {
                debug!("Probe of {} failed: {}", self.binary, e);
                false
            }
        }
    }

    async fn expand(&self, root: &Path, verbose: bool) -> ScanResult<()> {
        let mut command = Command::new(&self.binary);
        if verbose {
            command.arg("--verbose");
        }
        command.arg(root);
        run_tool(&self.binary, command).await
    }
}

/// Run a prepared command to completion, mapping spawn failures and
/// unsuccessful exits to `ScanError::Tool`
pub(crate) async fn run_tool(tool: &str, mut command: Command) -> ScanResult<()> {
    debug!("Running {:?}", command.as_std());
    let status = command
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| ScanError::tool(tool, format!("could not start: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(ScanError::tool(tool, format!("exited with {}", status)))
    }
}
