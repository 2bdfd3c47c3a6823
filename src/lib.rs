//! audiosqueeze - Audio conversion and size enforcement for a directory of
//! audio files
//!
//! This library crate exposes the pipeline for the CLI and for integration
//! testing.

pub mod asset;
pub mod batch;
pub mod compaction;
pub mod config;
pub mod conversion;
pub mod report;
pub mod scanner;
pub mod search;

pub use asset::{AssetState, AudioAsset};
pub use batch::{AssetOutcome, BatchDriver, BatchOptions, BatchPlan, BatchReport, BatchSummary};
pub use search::{BitrateSearch, SearchOutcome};
