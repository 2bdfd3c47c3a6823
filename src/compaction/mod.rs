//! Size enforcement pass.
//!
//! Every asset above the ceiling is searched for a smaller encode, which is
//! then renamed over the original. The rename is the only point where an
//! original file is overwritten, and it only happens after the staged
//! artifact's size has been checked again on disk.

use crate::asset::{format_mib, AssetState, AudioAsset};
use crate::batch::{AssetOutcome, BatchSummary};
use crate::report::{Event, Reporter};
use crate::search::{BitrateSearch, SearchOutcome};
use audiosqueeze_av::{Bitrate, Encoder};
use tracing::{error, info};

/// Why an oversized asset could not be compacted.
#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    /// No candidate bitrate produced a small enough file.
    #[error("could not compress below {} MB with any bitrate", format_mib(*ceiling))]
    Exhausted { ceiling: u64 },

    /// The staged artifact grew past the ceiling between search and promotion.
    #[error("compressed file is still too large: {} MB", format_mib(*size))]
    StillOversized { size: u64, ceiling: u64 },

    /// Renaming the artifact over the original failed.
    #[error("failed to replace original file: {0}")]
    Promotion(#[source] audiosqueeze_av::Error),

    #[error(transparent)]
    Staging(#[from] audiosqueeze_av::Error),
}

/// A successful compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compacted {
    pub bitrate: Bitrate,
    pub original_size: u64,
    pub size: u64,
}

/// Runs the compaction pass over a set of assets.
pub struct Compactor<'a, E> {
    encoder: &'a E,
    candidates: &'a [Bitrate],
    reporter: &'a Reporter,
}

impl<'a, E: Encoder> Compactor<'a, E> {
    pub fn new(encoder: &'a E, candidates: &'a [Bitrate], reporter: &'a Reporter) -> Self {
        Self {
            encoder,
            candidates,
            reporter,
        }
    }

    /// Classify `assets` against `ceiling_bytes` and compact the oversized ones.
    ///
    /// Assets within the ceiling are reported as `Ok` and not touched; they do
    /// not count towards `succeeded` or `failed`.
    pub fn compact_all(&self, assets: &mut [AudioAsset], ceiling_bytes: u64) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut oversized = Vec::new();

        for (idx, asset) in assets.iter_mut().enumerate() {
            let is_oversized = asset.exceeds(ceiling_bytes);
            self.reporter.emit(Event::Classified {
                name: asset.name(),
                size: asset.size,
                oversized: is_oversized,
            });

            if is_oversized {
                asset.state = AssetState::Pending;
                oversized.push(idx);
            } else {
                asset.state = AssetState::Ok;
                summary.record(AssetOutcome::Ok {
                    path: asset.path.clone(),
                    size: asset.size,
                });
            }
        }

        info!(
            "{} of {} file(s) above {} MB",
            oversized.len(),
            assets.len(),
            format_mib(ceiling_bytes)
        );
        self.reporter.emit(Event::CompactionNeeded {
            count: oversized.len(),
        });

        for idx in oversized {
            let asset = &mut assets[idx];
            let outcome = match self.compact(asset, ceiling_bytes) {
                Ok(done) => AssetOutcome::Compacted {
                    path: asset.path.clone(),
                    bitrate: done.bitrate,
                    original_size: done.original_size,
                    size: done.size,
                },
                Err(e) => AssetOutcome::Failed {
                    path: asset.path.clone(),
                    reason: e.to_string(),
                },
            };
            summary.record(outcome);
        }

        summary
    }

    /// Compact one asset, leaving the original untouched on any failure.
    pub fn compact(
        &self,
        asset: &mut AudioAsset,
        ceiling_bytes: u64,
    ) -> Result<Compacted, CompactionError> {
        let name = asset.name();
        asset.state = AssetState::Compacting;
        self.reporter.emit(Event::CompactionStarted { name: name.clone() });

        match self.search_and_promote(asset, ceiling_bytes) {
            Ok(done) => {
                asset.state = AssetState::Compacted;
                asset.size = done.size;
                info!(
                    "Compressed {} from {} MB to {} MB using {}",
                    name,
                    format_mib(done.original_size),
                    format_mib(done.size),
                    done.bitrate
                );
                self.reporter.emit(Event::Compacted {
                    name,
                    bitrate: done.bitrate,
                    size: done.size,
                });
                Ok(done)
            }
            Err(e) => {
                asset.state = AssetState::Failed;
                error!("Failed to compress {}: {}", name, e);
                self.reporter.emit(Event::CompactionFailed {
                    name,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn search_and_promote(
        &self,
        asset: &AudioAsset,
        ceiling_bytes: u64,
    ) -> Result<Compacted, CompactionError> {
        let search = BitrateSearch::new(self.encoder, self.candidates, self.reporter);

        let (bitrate, workspace) = match search.search(asset, ceiling_bytes)? {
            SearchOutcome::Satisfied {
                bitrate, workspace, ..
            } => (bitrate, workspace),
            SearchOutcome::Exhausted => {
                return Err(CompactionError::Exhausted {
                    ceiling: ceiling_bytes,
                })
            }
        };

        // The search measured the artifact once already; measure again right
        // before it can replace the original
        let size = workspace.output_size()?;
        if size > ceiling_bytes {
            return Err(CompactionError::StillOversized {
                size,
                ceiling: ceiling_bytes,
            });
        }

        workspace.finalize().map_err(CompactionError::Promotion)?;

        Ok(Compacted {
            bitrate,
            original_size: asset.size,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use audiosqueeze_av::EncodeAttempt;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Output size grows linearly with the bitrate.
    struct LinearEncoder {
        bytes_per_kbps: u64,
    }

    impl Encoder for LinearEncoder {
        fn encode(
            &self,
            input: &Path,
            output: &Path,
            bitrate: Bitrate,
        ) -> audiosqueeze_av::Result<EncodeAttempt> {
            let size = self.bytes_per_kbps * u64::from(bitrate.kbps());
            fs::File::create(output)?.set_len(size)?;
            Ok(EncodeAttempt {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                bitrate,
                size,
            })
        }
    }

    /// Reports a size that fits but writes a file that does not.
    struct LyingEncoder;

    impl Encoder for LyingEncoder {
        fn encode(
            &self,
            input: &Path,
            output: &Path,
            bitrate: Bitrate,
        ) -> audiosqueeze_av::Result<EncodeAttempt> {
            fs::File::create(output)?.set_len(10_000)?;
            Ok(EncodeAttempt {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                bitrate,
                size: 1,
            })
        }
    }

    fn candidates() -> Vec<Bitrate> {
        [64, 56, 48, 40, 32, 24]
            .into_iter()
            .map(Bitrate::from_kbps)
            .collect()
    }

    fn write_asset(dir: &Path, name: &str, size: u64) -> AudioAsset {
        let path = dir.join(name);
        fs::File::create(&path).unwrap().set_len(size).unwrap();
        AudioAsset::new(path, size)
    }

    #[test]
    fn test_within_ceiling_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.webm");
        fs::write(&path, b"tiny but real").unwrap();
        let mut assets = vec![AudioAsset::new(&path, 13)];

        let encoder = LinearEncoder { bytes_per_kbps: 1 };
        let candidates = candidates();
        let reporter = Reporter::silent();
        let summary =
            Compactor::new(&encoder, &candidates, &reporter).compact_all(&mut assets, 100);

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert_matches!(summary.outcomes[0], AssetOutcome::Ok { size: 13, .. });
        assert_eq!(assets[0].state, AssetState::Ok);
        assert_eq!(fs::read(&path).unwrap(), b"tiny but real");
    }

    #[test]
    fn test_oversized_promoted() {
        let dir = tempdir().unwrap();
        let mut assets = vec![write_asset(dir.path(), "a.webm", 5_000)];

        // 64 -> 6400, 56 -> 5600, 48 -> 4800
        let encoder = LinearEncoder { bytes_per_kbps: 100 };
        let candidates = candidates();
        let reporter = Reporter::silent();
        let summary =
            Compactor::new(&encoder, &candidates, &reporter).compact_all(&mut assets, 4_900);

        assert_eq!(summary.succeeded, 1);
        assert_matches!(
            &summary.outcomes[0],
            AssetOutcome::Compacted { bitrate, original_size: 5_000, size: 4_800, .. }
                if *bitrate == Bitrate::from_kbps(48)
        );
        assert_eq!(assets[0].state, AssetState::Compacted);
        assert_eq!(assets[0].size, 4_800);
        assert_eq!(fs::metadata(dir.path().join("a.webm")).unwrap().len(), 4_800);
        assert!(!dir.path().join("a.webm.tmp").exists());
    }

    #[test]
    fn test_exhausted_keeps_original() {
        let dir = tempdir().unwrap();
        let mut assets = vec![write_asset(dir.path(), "a.webm", 5_000)];

        let encoder = LinearEncoder { bytes_per_kbps: 1_000 };
        let candidates = candidates();
        let reporter = Reporter::silent();
        let summary =
            Compactor::new(&encoder, &candidates, &reporter).compact_all(&mut assets, 4_900);

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(assets[0].state, AssetState::Failed);
        assert_eq!(fs::metadata(dir.path().join("a.webm")).unwrap().len(), 5_000);
        assert!(!dir.path().join("a.webm.tmp").exists());
    }

    #[test]
    fn test_reverify_rejects_grown_artifact() {
        let dir = tempdir().unwrap();
        let mut asset = write_asset(dir.path(), "a.webm", 5_000);

        let candidates = candidates();
        let reporter = Reporter::silent();
        let err = Compactor::new(&LyingEncoder, &candidates, &reporter)
            .compact(&mut asset, 4_900)
            .unwrap_err();

        assert_matches!(err, CompactionError::StillOversized { size: 10_000, .. });
        assert_eq!(fs::metadata(asset.path()).unwrap().len(), 5_000);
        assert!(!dir.path().join("a.webm.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_promotion_failure_keeps_original() {
        let dir = tempdir().unwrap();
        let mut asset = write_asset(dir.path(), "a.webm", 5_000);

        // A directory at the original path cannot be replaced by a file rename
        fs::remove_file(asset.path()).unwrap();
        fs::create_dir(asset.path()).unwrap();
        fs::write(asset.path().join("keep"), b"x").unwrap();

        let encoder = LinearEncoder { bytes_per_kbps: 1 };
        let candidates = candidates();
        let reporter = Reporter::silent();
        let err = Compactor::new(&encoder, &candidates, &reporter)
            .compact(&mut asset, 4_900)
            .unwrap_err();

        assert_matches!(err, CompactionError::Promotion(_));
        assert!(asset.path().join("keep").exists());
        assert!(!dir.path().join("a.webm.tmp").exists());
        assert_eq!(asset.state, AssetState::Failed);
    }

    #[test]
    fn test_second_run_is_noop() {
        let dir = tempdir().unwrap();
        let mut assets = vec![write_asset(dir.path(), "a.webm", 5_000)];
        let encoder = LinearEncoder { bytes_per_kbps: 50 };
        let candidates = candidates();
        let reporter = Reporter::silent();
        let compactor = Compactor::new(&encoder, &candidates, &reporter);

        let first = compactor.compact_all(&mut assets, 4_000);
        assert_eq!(first.succeeded, 1);
        let compacted = fs::read(dir.path().join("a.webm")).unwrap();

        let mut rescanned = vec![AudioAsset::new(
            dir.path().join("a.webm"),
            compacted.len() as u64,
        )];
        let second = compactor.compact_all(&mut rescanned, 4_000);

        assert_eq!(second.succeeded, 0);
        assert_eq!(second.failed, 0);
        assert_matches!(second.outcomes[0], AssetOutcome::Ok { .. });
        assert_eq!(fs::read(dir.path().join("a.webm")).unwrap(), compacted);
    }
}
