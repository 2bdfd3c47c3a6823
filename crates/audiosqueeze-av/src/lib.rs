//! # audiosqueeze-av
//!
//! Encoder adapter and staging workspace for audio transcoding.
//!
//! This crate provides:
//! - An [`Encoder`] trait with an ffmpeg CLI implementation ([`FfmpegEncoder`])
//!   for audio-only transcodes at a given bitrate
//! - A [`Workspace`] that stages encoder output next to its target and
//!   promotes it with an atomic rename
//! - External tool detection
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use audiosqueeze_av::{Bitrate, EncodeSettings, Encoder, FfmpegEncoder, Workspace};
//!
//! let encoder = FfmpegEncoder::locate(None, EncodeSettings::default())?;
//! let workspace = Workspace::new("/music/song.webm")?;
//! let attempt = encoder.encode(
//!     "/music/song.webm".as_ref(),
//!     workspace.output(),
//!     Bitrate::from_kbps(48),
//! )?;
//! if attempt.size <= 25 * 1024 * 1024 {
//!     workspace.finalize()?;
//! }
//! # Ok::<(), audiosqueeze_av::Error>(())
//! ```

pub mod encode;
mod error;
pub mod tools;
pub mod workspace;

// Re-exports
pub use encode::{
    AudioCodec, Bitrate, Container, EncodeAttempt, EncodeSettings, Encoder, FfmpegEncoder,
};
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use workspace::{staging_path_for, Workspace};
