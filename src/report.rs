//! Progress events emitted while a batch runs.
//!
//! The pipeline never prints; it hands [`Event`]s to whatever callback the
//! caller installed. The CLI turns them into the per-file progress lines.

use audiosqueeze_av::Bitrate;

/// Something observable happened to an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A scan finished.
    ScanComplete { extension: String, count: usize },

    ConversionStarted { name: String },
    Converted {
        name: String,
        output: String,
        size: u64,
        ceiling: u64,
    },
    ConversionSkipped { name: String, reason: String },
    ConversionFailed { name: String, reason: String },

    /// Size check ahead of compaction.
    Classified {
        name: String,
        size: u64,
        oversized: bool,
    },
    /// How many assets the compaction pass will search for.
    CompactionNeeded { count: usize },
    CompactionStarted { name: String },
    /// One search step produced an artifact of `size` bytes.
    AttemptSized {
        name: String,
        bitrate: Bitrate,
        size: u64,
    },
    /// One search step failed in the encoder.
    AttemptFailed {
        name: String,
        bitrate: Bitrate,
        reason: String,
    },
    Compacted {
        name: String,
        bitrate: Bitrate,
        size: u64,
    },
    CompactionFailed { name: String, reason: String },
}

/// Event callback type
pub type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;

/// Delivers events to an optional callback.
#[derive(Default)]
pub struct Reporter {
    callback: Option<EventCallback>,
}

impl Reporter {
    pub fn new(callback: EventCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Reporter that drops every event.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        if let Some(ref cb) = self.callback {
            cb(&event);
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = Reporter::new(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

        reporter.emit(Event::CompactionNeeded { count: 2 });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::CompactionNeeded { count: 2 }]
        );
    }

    #[test]
    fn test_silent_reporter_drops_events() {
        Reporter::silent().emit(Event::CompactionNeeded { count: 0 });
    }
}
