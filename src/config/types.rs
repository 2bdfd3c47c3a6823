use audiosqueeze_av::{AudioCodec, Bitrate, Container, EncodeSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default size ceiling: 25 MiB.
pub const DEFAULT_CEILING_BYTES: u64 = 25 * 1024 * 1024;

/// Default search sequence, highest quality first.
pub const DEFAULT_CANDIDATES_KBPS: [u32; 6] = [64, 56, 48, 40, 32, 24];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,
}

/// Settings for one batch run, passed explicitly into the driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Flat directory holding the audio files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Maximum acceptable size of a compacted file
    #[serde(default = "default_ceiling_bytes")]
    pub ceiling_bytes: u64,

    /// Extension of files that get converted (legacy format)
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension of converted and compacted files
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// Fixed bitrate used by the conversion pass
    #[serde(default = "default_conversion_bitrate")]
    pub conversion_bitrate_kbps: Bitrate,

    /// Bitrates tried by the compaction search, strictly descending
    #[serde(default = "default_candidates")]
    pub candidates_kbps: Vec<Bitrate>,

    /// Leave sources alone when their converted counterpart already exists
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
}

fn default_directory() -> PathBuf {
    PathBuf::from("static/audio")
}

fn default_ceiling_bytes() -> u64 {
    DEFAULT_CEILING_BYTES
}

fn default_source_extension() -> String {
    "wma".to_string()
}

fn default_target_extension() -> String {
    "webm".to_string()
}

fn default_conversion_bitrate() -> Bitrate {
    Bitrate::from_kbps(64)
}

fn default_candidates() -> Vec<Bitrate> {
    DEFAULT_CANDIDATES_KBPS
        .iter()
        .copied()
        .map(Bitrate::from_kbps)
        .collect()
}

fn default_skip_existing() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            ceiling_bytes: default_ceiling_bytes(),
            source_extension: default_source_extension(),
            target_extension: default_target_extension(),
            conversion_bitrate_kbps: default_conversion_bitrate(),
            candidates_kbps: default_candidates(),
            skip_existing: default_skip_existing(),
        }
    }
}

impl PipelineConfig {
    /// Default settings rooted at `directory`.
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn with_ceiling(mut self, ceiling_bytes: u64) -> Self {
        self.ceiling_bytes = ceiling_bytes;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<Bitrate>) -> Self {
        self.candidates_kbps = candidates;
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Explicit ffmpeg executable; PATH lookup when unset
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub codec: AudioCodec,

    /// 0 (fastest) to 10 (smallest output)
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    #[serde(default)]
    pub container: Container,

    #[serde(default = "default_vbr")]
    pub vbr: bool,
}

fn default_compression_level() -> u8 {
    10
}

fn default_vbr() -> bool {
    true
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            codec: AudioCodec::default(),
            compression_level: default_compression_level(),
            container: Container::default(),
            vbr: default_vbr(),
        }
    }
}

impl EncoderConfig {
    pub fn settings(&self) -> EncodeSettings {
        EncodeSettings {
            codec: self.codec,
            container: self.container,
            compression_level: self.compression_level,
            vbr: self.vbr,
        }
    }
}
