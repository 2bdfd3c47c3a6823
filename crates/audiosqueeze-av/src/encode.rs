//! Audio-only transcoding through the ffmpeg CLI.

use crate::workspace::remove_if_exists;
use crate::{tools, Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Number of trailing stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 5;

/// Target audio codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// Opus - modern, efficient codec
    #[default]
    Opus,
    /// Vorbis - older WebM audio codec
    Vorbis,
}

impl AudioCodec {
    /// Get the ffmpeg encoder name.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            AudioCodec::Opus => "libopus",
            AudioCodec::Vorbis => "libvorbis",
        }
    }

    /// Whether the encoder accepts `-vbr on`.
    pub fn supports_vbr_flag(&self) -> bool {
        matches!(self, AudioCodec::Opus)
    }
}

/// Output container passed to ffmpeg with `-f`.
///
/// The format is always given explicitly because staged outputs end in
/// `.tmp` and ffmpeg cannot guess the muxer from that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Webm,
    Ogg,
    Matroska,
}

impl Container {
    /// Get the ffmpeg muxer name.
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            Container::Webm => "webm",
            Container::Ogg => "ogg",
            Container::Matroska => "matroska",
        }
    }
}

/// Audio bitrate in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Bitrate(u32);

impl Bitrate {
    pub const fn from_kbps(kbps: u32) -> Self {
        Self(kbps)
    }

    pub fn kbps(&self) -> u32 {
        self.0
    }

    /// Value for ffmpeg's `-b:a`, e.g. `64k`.
    pub fn ffmpeg_arg(&self) -> String {
        format!("{}k", self.0)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kbps", self.0)
    }
}

/// Fixed encoder settings shared by every invocation in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub codec: AudioCodec,
    pub container: Container,
    /// Encoder effort, 0 (fastest) to 10 (smallest output).
    pub compression_level: u8,
    /// Variable bitrate mode.
    pub vbr: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            codec: AudioCodec::Opus,
            container: Container::Webm,
            compression_level: 10,
            vbr: true,
        }
    }
}

/// A successful encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeAttempt {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bitrate: Bitrate,
    /// Size of `output` in bytes, read back from disk.
    pub size: u64,
}

/// Something that can transcode an audio file at a given bitrate.
///
/// Implementations block until the output is complete. On error, no file
/// may remain at `output`.
pub trait Encoder {
    fn encode(&self, input: &Path, output: &Path, bitrate: Bitrate) -> Result<EncodeAttempt>;
}

impl<T: Encoder + ?Sized> Encoder for &T {
    fn encode(&self, input: &Path, output: &Path, bitrate: Bitrate) -> Result<EncodeAttempt> {
        (**self).encode(input, output, bitrate)
    }
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn encode(&self, input: &Path, output: &Path, bitrate: Bitrate) -> Result<EncodeAttempt> {
        (**self).encode(input, output, bitrate)
    }
}

/// [`Encoder`] backed by the ffmpeg command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    settings: EncodeSettings,
}

impl FfmpegEncoder {
    /// Use `program` as the ffmpeg executable.
    pub fn new(program: impl Into<PathBuf>, settings: EncodeSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    /// Locate ffmpeg, preferring `config_path` over PATH lookup.
    pub fn locate(config_path: Option<&Path>, settings: EncodeSettings) -> Result<Self> {
        let program = tools::get_tool_path("ffmpeg", config_path)?;
        Ok(Self::new(program, settings))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    /// Build the ffmpeg argument list for one invocation.
    pub fn args(&self, input: &Path, output: &Path, bitrate: Bitrate) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];

        args.push("-c:a".into());
        args.push(self.settings.codec.ffmpeg_name().into());
        args.push("-b:a".into());
        args.push(bitrate.ffmpeg_arg().into());

        if self.settings.vbr && self.settings.codec.supports_vbr_flag() {
            args.push("-vbr".into());
            args.push("on".into());
        }

        args.push("-compression_level".into());
        args.push(self.settings.compression_level.to_string().into());
        args.push("-f".into());
        args.push(self.settings.container.ffmpeg_format().into());
        // Drop cover art and any other video streams
        args.push("-vn".into());
        args.push(output.into());

        args
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&self, input: &Path, output: &Path, bitrate: Bitrate) -> Result<EncodeAttempt> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Encoding {:?} -> {:?} at {} ({})",
            input,
            output,
            bitrate,
            self.settings.codec.ffmpeg_name()
        );

        let result = Command::new(&self.program)
            .args(self.args(input, output, bitrate))
            .output();

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                remove_if_exists(output);
                return Err(if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(self.program.to_string_lossy())
                } else {
                    Error::Io(e)
                });
            }
        };

        if !result.status.success() {
            remove_if_exists(output);
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("exited with {}: {}", result.status, stderr_tail(&stderr)),
            ));
        }

        let size = match std::fs::metadata(output) {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(Error::tool_failed(
                    "ffmpeg",
                    format!("exited successfully but produced no output at {:?}", output),
                ))
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("ffmpeg wrote {} bytes to {:?}", size, output);

        Ok(EncodeAttempt {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bitrate,
            size,
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
