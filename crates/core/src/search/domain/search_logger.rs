use std::time::Instant;

use crate::search::domain::occurrence::{SearchOutcome, SearchPhase};
use crate::video::domain::frame_source::FrameReadError;

/// Observer for search events.
///
/// Lets callers see every probe, every phase change and, in particular,
/// every read failure that was silently counted as "absent", without the
/// search loop knowing where that output goes.
pub trait SearchLogger: Send {
    fn phase(&mut self, phase: SearchPhase);

    /// One completed probe and how long the oracle took for it.
    fn probe(&mut self, index: usize, present: bool, oracle_ms: f64);

    /// A probed frame could not be read; the probe counted as absent.
    fn read_failure(&mut self, index: usize, error: &FrameReadError);

    /// End-of-search report. Default: no-op.
    fn summary(&self, _outcome: &SearchOutcome) {}
}

/// Discards all events. Used by tests and callers that only want the outcome.
pub struct NullSearchLogger;

impl SearchLogger for NullSearchLogger {
    fn phase(&mut self, _phase: SearchPhase) {}
    fn probe(&mut self, _index: usize, _present: bool, _oracle_ms: f64) {}
    fn read_failure(&mut self, _index: usize, _error: &FrameReadError) {}
}

/// Writes search events through the `log` crate: probes at `debug`, read
/// failures at `warn`, phases and the summary at `info`.
pub struct LogSearchLogger {
    label: String,
    start_time: Instant,
    oracle_ms: Vec<f64>,
}

impl LogSearchLogger {
    /// `label` prefixes every line, e.g. the target class being searched.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start_time: Instant::now(),
            oracle_ms: Vec::new(),
        }
    }

    pub fn mean_oracle_ms(&self) -> Option<f64> {
        if self.oracle_ms.is_empty() {
            return None;
        }
        Some(self.oracle_ms.iter().sum::<f64>() / self.oracle_ms.len() as f64)
    }

    pub fn summary_string(&self, outcome: &SearchOutcome) -> String {
        let result = match outcome.interval {
            Some(interval) => format!("found in frames {interval}"),
            None => "not found".to_string(),
        };
        let mut line = format!(
            "[{}] {result}: {} probes, {} oracle calls, {} read failures, {:.1}s",
            self.label,
            outcome.stats.probes,
            outcome.stats.oracle_calls,
            outcome.stats.read_failures.len(),
            self.start_time.elapsed().as_secs_f64()
        );
        if let Some(mean) = self.mean_oracle_ms() {
            line.push_str(&format!(", oracle avg {mean:.1}ms"));
        }
        line
    }
}

impl SearchLogger for LogSearchLogger {
    fn phase(&mut self, phase: SearchPhase) {
        if phase == SearchPhase::SearchingFirst {
            self.start_time = Instant::now();
            self.oracle_ms.clear();
        }
        log::info!("[{}] {phase}", self.label);
    }

    fn probe(&mut self, index: usize, present: bool, oracle_ms: f64) {
        self.oracle_ms.push(oracle_ms);
        log::debug!(
            "[{}] frame {index}: {} ({oracle_ms:.1}ms)",
            self.label,
            if present { "present" } else { "absent" }
        );
    }

    fn read_failure(&mut self, index: usize, error: &FrameReadError) {
        log::warn!(
            "[{}] frame {index} unreadable, counted as absent: {error}",
            self.label
        );
    }

    fn summary(&self, outcome: &SearchOutcome) {
        log::info!("{}", self.summary_string(outcome));
    }
}
