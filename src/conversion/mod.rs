//! Format conversion pass.
//!
//! Each source file is encoded once, at a fixed bitrate, to a sibling file
//! with the target extension. The source is never removed. There is no
//! fallback for results above the ceiling: they are kept and flagged, and
//! the compaction pass deals with them.

use crate::asset::{format_mib, AssetState, AudioAsset};
use crate::batch::{AssetOutcome, BatchSummary};
use crate::report::{Event, Reporter};
use audiosqueeze_av::{Bitrate, Encoder, Workspace};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Why a source file could not be converted.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("{} already exists", .0.display())]
    TargetExists(PathBuf),

    #[error(transparent)]
    Encode(#[from] audiosqueeze_av::Error),
}

/// Runs the conversion pass.
pub struct Converter<'a, E> {
    encoder: &'a E,
    bitrate: Bitrate,
    target_extension: &'a str,
    ceiling_bytes: u64,
    skip_existing: bool,
    reporter: &'a Reporter,
}

impl<'a, E: Encoder> Converter<'a, E> {
    pub fn new(
        encoder: &'a E,
        bitrate: Bitrate,
        target_extension: &'a str,
        ceiling_bytes: u64,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            encoder,
            bitrate,
            target_extension,
            ceiling_bytes,
            skip_existing: true,
            reporter,
        }
    }

    /// Whether a source whose target already exists is skipped (the default)
    /// or reported as a failure. The existing target is never overwritten.
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Path the converted file for `asset` is written to.
    pub fn target_path(&self, asset: &AudioAsset) -> PathBuf {
        asset.path.with_extension(self.target_extension)
    }

    /// Convert every source asset; failures are recorded, never fatal.
    pub fn convert_all(&self, sources: &mut [AudioAsset]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for asset in sources.iter_mut() {
            asset.state = AssetState::Pending;
        }

        for asset in sources.iter_mut() {
            let target = self.target_path(asset);

            if target.exists() && self.skip_existing {
                info!("Skipping {}: {:?} already exists", asset.name(), target);
                asset.state = AssetState::Ok;
                let reason = format!("{} already exists", display_name(&target));
                self.reporter.emit(Event::ConversionSkipped {
                    name: asset.name(),
                    reason: reason.clone(),
                });
                summary.record(AssetOutcome::Skipped {
                    path: asset.path.clone(),
                    reason,
                });
                continue;
            }

            let outcome = match self.convert(asset) {
                Ok(size) => AssetOutcome::Converted {
                    path: asset.path.clone(),
                    output: target,
                    size,
                    over_ceiling: size > self.ceiling_bytes,
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

    /// Convert a single asset, returning the size of the converted file.
    pub fn convert(&self, asset: &mut AudioAsset) -> Result<u64, ConversionError> {
        let name = asset.name();
        asset.state = AssetState::Converting;
        self.reporter.emit(Event::ConversionStarted { name: name.clone() });

        match self.encode_to_target(asset) {
            Ok((target, size)) => {
                asset.state = AssetState::Ok;
                if size > self.ceiling_bytes {
                    warn!(
                        "{} converted but is {} MB (above {} MB target)",
                        name,
                        format_mib(size),
                        format_mib(self.ceiling_bytes)
                    );
                } else {
                    info!("Converted {} ({} MB)", name, format_mib(size));
                }
                self.reporter.emit(Event::Converted {
                    name,
                    output: display_name(&target),
                    size,
                    ceiling: self.ceiling_bytes,
                });
                Ok(size)
            }
            Err(e) => {
                asset.state = AssetState::Failed;
                error!("Failed to convert {}: {}", name, e);
                self.reporter.emit(Event::ConversionFailed {
                    name,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn encode_to_target(&self, asset: &AudioAsset) -> Result<(PathBuf, u64), ConversionError> {
        let target = self.target_path(asset);
        if target.exists() {
            return Err(ConversionError::TargetExists(target));
        }

        let workspace = Workspace::new(&target)?;
        let attempt = self
            .encoder
            .encode(asset.path(), workspace.output(), self.bitrate)?;
        // The target may have appeared while the encoder ran; never replace it
        let target = workspace.finalize_new().map_err(|e| match e {
            audiosqueeze_av::Error::TargetExists { path } => ConversionError::TargetExists(path),
            other => ConversionError::Encode(other),
        })?;

        Ok((target, attempt.size))
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
