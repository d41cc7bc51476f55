use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::frame_oracle::{FrameOracle, Interrupted};
use crate::detection::domain::target_class::TargetClass;
use crate::search::domain::occurrence::ProbeStats;
use crate::search::domain::search_logger::SearchLogger;
use crate::video::domain::frame_source::FrameSource;
use crate::BoxError;

/// A search that could not complete.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("oracle failed at frame {index}: {source}")]
    Oracle {
        index: usize,
        #[source]
        source: BoxError,
    },
}

impl SearchError {
    /// Set when the oracle refused the call because the search was
    /// cancelled or ran out of time, rather than failing on its own.
    pub fn interruption(&self) -> Option<Interrupted> {
        match self {
            SearchError::Oracle { source, .. } => source.downcast_ref::<Interrupted>().copied(),
        }
    }
}

/// Performs probes for a strategy: read the frame at an index, ask the
/// oracle, count the cost.
///
/// A frame that cannot be read counts as "absent" so the search always
/// terminates; the index is recorded in the stats and reported to the
/// logger. Oracle failures end the search.
pub struct Prober<'a> {
    source: &'a mut dyn FrameSource,
    oracle: &'a mut dyn FrameOracle,
    target: &'a TargetClass,
    logger: &'a mut dyn SearchLogger,
    len: usize,
    stats: ProbeStats,
}

impl<'a> Prober<'a> {
    pub fn new(
        source: &'a mut dyn FrameSource,
        oracle: &'a mut dyn FrameOracle,
        target: &'a TargetClass,
        logger: &'a mut dyn SearchLogger,
    ) -> Self {
        let len = source.frame_count();
        Self {
            source,
            oracle,
            target,
            logger,
            len,
            stats: ProbeStats::default(),
        }
    }

    /// Frame count of the source, fixed for the lifetime of the prober.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn probe(&mut self, index: usize) -> Result<bool, SearchError> {
        self.stats.probes += 1;

        let frame = match self.source.read_frame_at(index) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.read_failures.push(index);
                self.logger.read_failure(index, &e);
                return Ok(false);
            }
        };

        self.stats.oracle_calls += 1;
        let started = Instant::now();
        let present = self
            .oracle
            .is_present(&frame, self.target)
            .map_err(|source| SearchError::Oracle { index, source })?;
        self.logger
            .probe(index, present, started.elapsed().as_secs_f64() * 1000.0);

        Ok(present)
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    pub(crate) fn logger(&mut self) -> &mut (dyn SearchLogger + 'a) {
        &mut *self.logger
    }

    pub fn into_stats(self) -> ProbeStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::domain::search_logger::NullSearchLogger;
    use crate::testing::{target, PresenceOracle, ScriptedSource};

    #[test]
    fn test_probe_reads_and_asks_oracle() {
        let mut source = ScriptedSource::new(5);
        let mut oracle = PresenceOracle::at(&[2]);
        let target = target("person");
        let mut logger = NullSearchLogger;
        let mut prober = Prober::new(&mut source, &mut oracle, &target, &mut logger);

        assert_eq!(prober.len(), 5);
        assert!(!prober.probe(1).unwrap());
        assert!(prober.probe(2).unwrap());

        let stats = prober.into_stats();
        assert_eq!(stats.probes, 2);
        assert_eq!(stats.oracle_calls, 2);
        assert!(stats.read_failures.is_empty());
        assert_eq!(oracle.asked(), vec![1, 2]);
    }

    #[test]
    fn test_read_failure_counts_as_absent_without_oracle_call() {
        let mut source = ScriptedSource::new(5).failing_at(&[3]);
        let mut oracle = PresenceOracle::at(&[3]);
        let target = target("person");
        let mut logger = NullSearchLogger;
        let mut prober = Prober::new(&mut source, &mut oracle, &target, &mut logger);

        assert!(!prober.probe(3).unwrap());

        let stats = prober.into_stats();
        assert_eq!(stats.probes, 1);
        assert_eq!(stats.oracle_calls, 0);
        assert_eq!(stats.read_failures, vec![3]);
        assert_eq!(source.reads(), vec![3]);
        assert!(oracle.asked().is_empty());
    }

    #[test]
    fn test_oracle_error_is_fatal_and_keeps_index() {
        let mut source = ScriptedSource::new(5);
        let mut oracle = PresenceOracle::at(&[]).failing_at(4);
        let target = target("person");
        let mut logger = NullSearchLogger;
        let mut prober = Prober::new(&mut source, &mut oracle, &target, &mut logger);

        let err = prober.probe(4).unwrap_err();

        assert!(matches!(err, SearchError::Oracle { index: 4, .. }));
        assert_eq!(err.interruption(), None);
    }

    #[test]
    fn test_interruption_is_recognised() {
        let err = SearchError::Oracle {
            index: 0,
            source: Box::new(Interrupted::TimedOut),
        };
        assert_eq!(err.interruption(), Some(Interrupted::TimedOut));
    }
}
