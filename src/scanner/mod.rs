//! Directory scanner.
//!
//! Lists the direct entries of one directory and picks out the audio files
//! with a given extension. Scanning never fails the batch: an unreadable
//! directory is logged and yields no assets.

use crate::asset::AudioAsset;
use crate::config::normalize_extension;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Check if `path` has `extension` (compared case-insensitively).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = normalize_extension(extension);
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase() == wanted)
        .unwrap_or(false)
}

/// Scan `directory` (non-recursively) for regular files ending in `extension`.
///
/// Results come back in directory-listing order, which is not stable.
pub fn scan(directory: &Path, extension: &str) -> Vec<AudioAsset> {
    let root = match directory.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            warn!("Error reading directory {:?}: {}", directory, e);
            return Vec::new();
        }
    };

    let mut assets = Vec::new();

    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                warn!("Error reading directory {:?}: {}", directory, e);
                return Vec::new();
            }
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", directory, e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Failed to stat {:?}: {}", entry.path(), e);
                continue;
            }
        };

        debug!("Found {:?} ({} bytes)", entry.path(), size);
        assets.push(AudioAsset::new(entry.path(), size));
    }

    assets
}
