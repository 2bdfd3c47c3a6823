use audiosqueeze_av::Bitrate;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Final state of one asset in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetOutcome {
    Converted {
        path: PathBuf,
        output: PathBuf,
        size: u64,
        /// Output is larger than the ceiling; it is kept anyway
        over_ceiling: bool,
    },
    Compacted {
        path: PathBuf,
        bitrate: Bitrate,
        original_size: u64,
        size: u64,
    },
    /// Already within the ceiling
    Ok { path: PathBuf, size: u64 },
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, reason: String },
}

impl AssetOutcome {
    pub fn path(&self) -> &Path {
        match self {
            AssetOutcome::Converted { path, .. }
            | AssetOutcome::Compacted { path, .. }
            | AssetOutcome::Ok { path, .. }
            | AssetOutcome::Skipped { path, .. }
            | AssetOutcome::Failed { path, .. } => path,
        }
    }
}

/// Counters and outcomes for one pass.
///
/// Only assets the pass actually worked on are counted; `Ok` and `Skipped`
/// outcomes are listed but add to neither counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<AssetOutcome>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: AssetOutcome) {
        match outcome {
            AssetOutcome::Converted { .. } | AssetOutcome::Compacted { .. } => self.succeeded += 1,
            AssetOutcome::Failed { .. } => self.failed += 1,
            AssetOutcome::Ok { .. } | AssetOutcome::Skipped { .. } => {}
        }
        self.outcomes.push(outcome);
    }

    /// Number of assets the pass attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn outcome_for(&self, path: &Path) -> Option<&AssetOutcome> {
        self.outcomes.iter().find(|o| o.path() == path)
    }
}

/// Everything a batch run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// `None` when the conversion pass was not run
    pub conversion: Option<BatchSummary>,
    /// `None` when the compaction pass was not run
    pub compaction: Option<BatchSummary>,
}

impl BatchReport {
    pub fn total_failed(&self) -> usize {
        self.conversion.as_ref().map_or(0, |s| s.failed)
            + self.compaction.as_ref().map_or(0, |s| s.failed)
    }
}
