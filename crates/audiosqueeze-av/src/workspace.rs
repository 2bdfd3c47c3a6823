//! Staging workspace for encoder output.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to the target file name to form the staging path.
pub const STAGING_SUFFIX: &str = "tmp";

/// Staging area for a single encode target.
///
/// The encoder writes to a staging file next to the target (`song.webm` is
/// staged as `song.webm.tmp`), so promotion is a same-directory rename and
/// therefore atomic. Until it is promoted by [`Workspace::finalize`] or
/// [`Workspace::finalize_new`] the staging file
/// belongs to the workspace and is removed when it is dropped, whichever path
/// the caller leaves by.
///
/// # Example
///
/// ```no_run
/// use audiosqueeze_av::Workspace;
///
/// let workspace = Workspace::new("/music/song.webm")?;
/// // Encode into workspace.output(), verify it, then promote it.
/// workspace.finalize()?;
/// # Ok::<(), audiosqueeze_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    target_path: PathBuf,
    staging_path: PathBuf,
    finalized: bool,
}

impl Workspace {
    /// Create a workspace whose output will eventually replace `target`.
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();
        let staging_path = staging_path_for(target)?;

        Ok(Self {
            target_path: target.to_path_buf(),
            staging_path,
            finalized: false,
        })
    }

    /// Path the encoder should write to.
    pub fn output(&self) -> &Path {
        &self.staging_path
    }

    /// Size of the staged output as currently on disk.
    pub fn output_size(&self) -> Result<u64> {
        match std::fs::metadata(&self.staging_path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::file_not_found(&self.staging_path))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Atomically rename the staged output over the target.
    ///
    /// On failure the staging file is removed as the workspace drops and the
    /// target is left as it was.
    pub fn finalize(mut self) -> Result<PathBuf> {
        self.ensure_staged()?;

        std::fs::rename(&self.staging_path, &self.target_path).map_err(|e| {
            Error::Workspace(format!("Failed to move output to destination: {}", e))
        })?;

        self.finalized = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("Promoted {:?} to {:?}", self.staging_path, self.target_path);

        Ok(self.target_path.clone())
    }

    /// Promote the staged output only if nothing exists at the target.
    ///
    /// The staging file is hard-linked to the target, which fails rather than
    /// replacing a file that is already there, and the staging name is then
    /// removed. An existing target gives [`Error::TargetExists`] and is left
    /// as it was.
    pub fn finalize_new(mut self) -> Result<PathBuf> {
        self.ensure_staged()?;

        match std::fs::hard_link(&self.staging_path, &self.target_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::TargetExists {
                    path: self.target_path.clone(),
                });
            }
            Err(e) => {
                return Err(Error::Workspace(format!(
                    "Failed to link output to destination: {}",
                    e
                )));
            }
        }

        self.finalized = true;
        remove_if_exists(&self.staging_path);

        #[cfg(feature = "tracing")]
        tracing::debug!("Created {:?} from {:?}", self.target_path, self.staging_path);

        Ok(self.target_path.clone())
    }

    fn ensure_staged(&self) -> Result<()> {
        if self.staging_path.exists() {
            Ok(())
        } else {
            Err(Error::Workspace(format!(
                "Output file does not exist: {:?}",
                self.staging_path
            )))
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        remove_if_exists(&self.staging_path);
    }
}

/// Staging path used for `target`: same directory, `.tmp` appended.
pub fn staging_path_for(target: &Path) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Invalid target file path: {:?}", target)))?;

    let mut staged = file_name.to_os_string();
    staged.push(".");
    staged.push(STAGING_SUFFIX);

    Ok(target.with_file_name(staged))
}

/// Best-effort removal; a missing file is not an error.
pub(crate) fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Removed {:?}", path);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to remove {:?}: {}", path, _e);
        }
    }
}
