use crate::detection::domain::frame_oracle::FrameOracle;
use crate::detection::domain::target_class::TargetClass;
use crate::search::domain::occurrence::{OccurrenceInterval, SearchOutcome, SearchPhase};
use crate::search::domain::prober::{Prober, SearchError};
use crate::search::domain::search_logger::{NullSearchLogger, SearchLogger};
use crate::search::domain::search_strategy::SearchStrategy;
use crate::video::domain::frame_source::FrameSource;

/// Finds the first and last frame in which a target class is present.
///
/// Holds no per-search state: each `locate` call is self-contained and the
/// engine can be shared across threads.
pub struct BoundarySearchEngine {
    strategy: Box<dyn SearchStrategy>,
}

impl BoundarySearchEngine {
    pub fn new(strategy: Box<dyn SearchStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn locate(
        &self,
        source: &mut dyn FrameSource,
        oracle: &mut dyn FrameOracle,
        target: &TargetClass,
    ) -> Result<SearchOutcome, SearchError> {
        self.locate_with_logger(source, oracle, target, &mut NullSearchLogger)
    }

    /// Runs one search, reporting phases, probes and read failures to
    /// `logger`.
    ///
    /// An empty source is "not found" without probing. The last-occurrence
    /// search only runs once a first occurrence exists, and only over frames
    /// at or after it.
    pub fn locate_with_logger(
        &self,
        source: &mut dyn FrameSource,
        oracle: &mut dyn FrameOracle,
        target: &TargetClass,
        logger: &mut dyn SearchLogger,
    ) -> Result<SearchOutcome, SearchError> {
        log::debug!(
            "Locating '{target}' in {} frames ({} search)",
            source.frame_count(),
            self.strategy.name()
        );
        logger.phase(SearchPhase::SearchingFirst);

        let mut prober = Prober::new(source, oracle, target, &mut *logger);
        let interval = if prober.is_empty() {
            None
        } else {
            match self.strategy.find_first(&mut prober)? {
                None => None,
                Some(first) => {
                    prober.logger().phase(SearchPhase::SearchingLast);
                    let last = self.strategy.find_last(&mut prober, first)?;
                    OccurrenceInterval::new(first, last.max(first))
                }
            }
        };
        prober.logger().phase(SearchPhase::Done {
            found: interval.is_some(),
        });

        let outcome = SearchOutcome {
            interval,
            stats: prober.into_stats(),
        };
        logger.summary(&outcome);
        Ok(outcome)
    }
}
