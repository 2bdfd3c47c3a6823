//! Bitrate search.
//!
//! Greedy first-fit over a fixed, descending list of bitrates: the first
//! candidate whose encode fits under the ceiling wins. Encoding is expensive
//! and the list is short, so the search stops at the first fit rather than
//! looking for an optimum. File size is assumed to shrink as the bitrate
//! drops; nothing here checks that.

use crate::asset::{format_mib, AudioAsset};
use crate::report::{Event, Reporter};
use audiosqueeze_av::{Bitrate, Encoder, Workspace};
use tracing::{debug, info, warn};

/// Terminal result of a search for one asset.
#[derive(Debug)]
pub enum SearchOutcome {
    /// `workspace` holds an artifact of `size <= ceiling` encoded at `bitrate`.
    ///
    /// The artifact is removed if the workspace is dropped without being
    /// finalized.
    Satisfied {
        bitrate: Bitrate,
        size: u64,
        workspace: Workspace,
    },
    /// No candidate fit; no artifact remains on disk.
    Exhausted,
}

impl SearchOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, SearchOutcome::Satisfied { .. })
    }
}

/// Drives an [`Encoder`] through a candidate list.
pub struct BitrateSearch<'a, E> {
    encoder: &'a E,
    candidates: &'a [Bitrate],
    reporter: &'a Reporter,
}

impl<'a, E: Encoder> BitrateSearch<'a, E> {
    /// `candidates` must be ordered highest quality first.
    pub fn new(encoder: &'a E, candidates: &'a [Bitrate], reporter: &'a Reporter) -> Self {
        Self {
            encoder,
            candidates,
            reporter,
        }
    }

    /// Find the highest candidate bitrate whose output fits in `ceiling_bytes`.
    ///
    /// # Errors
    ///
    /// Fails only when no staging path can be derived for the asset. Encoder
    /// failures move the search on to the next candidate.
    pub fn search(
        &self,
        asset: &AudioAsset,
        ceiling_bytes: u64,
    ) -> audiosqueeze_av::Result<SearchOutcome> {
        let name = asset.name();

        for &bitrate in self.candidates {
            // A fresh guard per candidate: whatever this step leaves behind is
            // removed before the next one starts
            let workspace = Workspace::new(asset.path())?;

            let attempt = match self.encoder.encode(asset.path(), workspace.output(), bitrate) {
                Ok(attempt) => attempt,
                Err(e) => {
                    warn!("Encoding {} at {} failed: {}", name, bitrate, e);
                    self.reporter.emit(Event::AttemptFailed {
                        name: name.clone(),
                        bitrate,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            info!("Tried {} for {}: {} MB", bitrate, name, format_mib(attempt.size));
            self.reporter.emit(Event::AttemptSized {
                name: name.clone(),
                bitrate,
                size: attempt.size,
            });

            if attempt.size <= ceiling_bytes {
                return Ok(SearchOutcome::Satisfied {
                    bitrate,
                    size: attempt.size,
                    workspace,
                });
            }

            debug!(
                "{} at {} is {} bytes, above ceiling of {} bytes",
                name, bitrate, attempt.size, ceiling_bytes
            );
        }

        Ok(SearchOutcome::Exhausted)
    }
}
