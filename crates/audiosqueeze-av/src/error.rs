//! Failures of an encode attempt or of promoting its staged output.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// ffmpeg could not be found on PATH or at the configured location, or
    /// could not be spawned.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// ffmpeg exited non-zero. `message` holds the tail of its stderr.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// An input file, or the staged output the encoder should have written,
    /// is missing.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A promotion that must not replace anything found a file already at
    /// the target path.
    #[error("target already exists: {}", path.display())]
    TargetExists { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path with no file name, so no staging sibling can be derived.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The staged output could not be moved onto its target.
    #[error("workspace error: {0}")]
    Workspace(String),
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
