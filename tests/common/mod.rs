//! Shared test harness for integration tests.
//!
//! Provides [`ScriptedEncoder`], an in-process [`Encoder`] whose output size
//! is looked up per input file and bitrate, plus helpers for building audio
//! directories with files of a given size.

#![allow(dead_code)]

use audiosqueeze::report::{Event, EventCallback};
use audiosqueeze_av::{Bitrate, EncodeAttempt, Encoder, Error};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const MIB: u64 = 1024 * 1024;

/// The default six-step search sequence.
pub fn default_candidates() -> Vec<Bitrate> {
    [64, 56, 48, 40, 32, 24]
        .into_iter()
        .map(Bitrate::from_kbps)
        .collect()
}

/// Deterministic encoder driven by a `(file name, kbps) -> size` table.
///
/// Combinations missing from the table fail like a non-zero ffmpeg exit.
#[derive(Default)]
pub struct ScriptedEncoder {
    sizes: HashMap<(String, u32), u64>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, name: &str, kbps: u32, size: u64) -> Self {
        self.sizes.insert((name.to_string(), kbps), size);
        self
    }

    /// Same size for every default candidate.
    pub fn with_all_sizes(mut self, name: &str, size: u64) -> Self {
        for bitrate in default_candidates() {
            self.sizes.insert((name.to_string(), bitrate.kbps()), size);
        }
        self
    }

    /// Every `(file name, kbps)` pair the encoder was asked for, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Encoder for ScriptedEncoder {
    fn encode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: Bitrate,
    ) -> audiosqueeze_av::Result<EncodeAttempt> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((name.clone(), bitrate.kbps()));

        let size = self
            .sizes
            .get(&(name, bitrate.kbps()))
            .copied()
            .ok_or_else(|| Error::tool_failed("ffmpeg", "exit status: 1"))?;

        fs::File::create(output)?.set_len(size)?;
        Ok(EncodeAttempt {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bitrate,
            size,
        })
    }
}

/// Create `dir/name` with `size` bytes, starting with the file name so
/// contents differ between files.
pub fn write_sized(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).unwrap();
    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(size)
        .unwrap();
    path
}

/// Sorted file names in `dir`.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Callback that stores every event for later inspection.
pub fn collect_events() -> (Arc<Mutex<Vec<Event>>>, EventCallback) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback: EventCallback = Box::new(move |e| sink.lock().unwrap().push(e.clone()));
    (events, callback)
}
