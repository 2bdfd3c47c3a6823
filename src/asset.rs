//! Audio files tracked through a batch run.

use serde::Serialize;
use std::path::{Path, PathBuf};

const MIB: f64 = 1024.0 * 1024.0;

/// Where an asset is in its trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    /// Found by the scanner, not yet classified
    Discovered,
    /// Queued for an orchestrator
    Pending,
    Converting,
    Compacting,
    /// Replaced by a smaller encode
    Compacted,
    Failed,
    /// Nothing left to do
    Ok,
}

/// One audio file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioAsset {
    pub path: PathBuf,
    /// Size in bytes when last observed
    pub size: u64,
    /// Lowercased extension without the dot
    pub extension: String,
    pub state: AssetState,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            path,
            size,
            extension,
            state: AssetState::Discovered,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn exceeds(&self, ceiling_bytes: u64) -> bool {
        self.size > ceiling_bytes
    }
}

/// Format a byte count as MiB with two decimals, e.g. `23.00`.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / MIB)
}
