//! Batch driver.
//!
//! Sequences one run over a directory: scan for sources, convert them, scan
//! for targets, then classify and compact. Assets are handled one at a time;
//! the only blocking point is the encoder subprocess.

mod summary;

pub use summary::{AssetOutcome, BatchReport, BatchSummary};

use crate::asset::AudioAsset;
use crate::compaction::Compactor;
use crate::config::PipelineConfig;
use crate::conversion::Converter;
use crate::report::{Event, EventCallback, Reporter};
use crate::scanner;
use audiosqueeze_av::Encoder;
use std::path::PathBuf;
use tracing::info;

/// Which passes a run includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub convert: bool,
    pub compact: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            convert: true,
            compact: true,
        }
    }
}

/// What a run would do, computed without invoking the encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// Sources with no converted counterpart yet
    pub to_convert: Vec<PathBuf>,
    /// Sources whose target already exists
    pub already_converted: Vec<PathBuf>,
    /// Targets above the ceiling
    pub to_compact: Vec<PathBuf>,
    /// Targets within the ceiling
    pub within_ceiling: Vec<PathBuf>,
}

/// Runs the pipeline over one directory with one configuration.
pub struct BatchDriver<E> {
    config: PipelineConfig,
    encoder: E,
    reporter: Reporter,
}

impl<E: Encoder> BatchDriver<E> {
    pub fn new(config: PipelineConfig, encoder: E) -> Self {
        Self {
            config,
            encoder,
            reporter: Reporter::silent(),
        }
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.reporter = Reporter::new(callback);
        self
    }

    /// Run the selected passes. Asset failures end up in the report; nothing
    /// here aborts the batch.
    pub fn run(&self, options: BatchOptions) -> BatchReport {
        info!(
            "Starting batch in {:?} (ceiling {} bytes)",
            self.config.directory, self.config.ceiling_bytes
        );

        let conversion = options.convert.then(|| self.convert());
        // Rescan so freshly converted files are considered for compaction
        let compaction = options.compact.then(|| self.compact());

        let report = BatchReport {
            conversion,
            compaction,
        };
        info!("Batch finished with {} failure(s)", report.total_failed());
        report
    }

    /// Conversion pass over the sources currently in the directory.
    pub fn convert(&self) -> BatchSummary {
        let mut sources = self.scan(&self.config.source_extension);
        if sources.is_empty() {
            return BatchSummary::default();
        }

        Converter::new(
            &self.encoder,
            self.config.conversion_bitrate_kbps,
            &self.config.target_extension,
            self.config.ceiling_bytes,
            &self.reporter,
        )
        .skip_existing(self.config.skip_existing)
        .convert_all(&mut sources)
    }

    /// Compaction pass over the targets currently in the directory.
    pub fn compact(&self) -> BatchSummary {
        let mut assets = self.scan(&self.config.target_extension);
        if assets.is_empty() {
            return BatchSummary::default();
        }

        Compactor::new(&self.encoder, &self.config.candidates_kbps, &self.reporter)
            .compact_all(&mut assets, self.config.ceiling_bytes)
    }

    /// Scan and classify without encoding anything.
    pub fn plan(&self) -> BatchPlan {
        let mut plan = BatchPlan::default();

        for source in scanner::scan(&self.config.directory, &self.config.source_extension) {
            let target = source.path.with_extension(&self.config.target_extension);
            if target.exists() {
                plan.already_converted.push(source.path);
            } else {
                plan.to_convert.push(source.path);
            }
        }

        for asset in scanner::scan(&self.config.directory, &self.config.target_extension) {
            if asset.exceeds(self.config.ceiling_bytes) {
                plan.to_compact.push(asset.path);
            } else {
                plan.within_ceiling.push(asset.path);
            }
        }

        for list in [
            &mut plan.to_convert,
            &mut plan.already_converted,
            &mut plan.to_compact,
            &mut plan.within_ceiling,
        ] {
            list.sort();
        }

        plan
    }

    /// Scan for `extension`, sorted by path so progress output is stable.
    fn scan(&self, extension: &str) -> Vec<AudioAsset> {
        let mut assets = scanner::scan(&self.config.directory, extension);
        assets.sort_by(|a, b| a.path.cmp(&b.path));

        self.reporter.emit(Event::ScanComplete {
            extension: extension.to_string(),
            count: assets.len(),
        });
        assets
    }
}
