use crate::search::domain::prober::{Prober, SearchError};
use crate::search::domain::search_strategy::SearchStrategy;

/// Probes frames in order. Exact for any presence pattern, at the cost of
/// one probe per frame.
pub struct LinearScan;

impl SearchStrategy for LinearScan {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn find_first(&self, prober: &mut Prober<'_>) -> Result<Option<usize>, SearchError> {
        for index in 0..prober.len() {
            if prober.probe(index)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn find_last(&self, prober: &mut Prober<'_>, first: usize) -> Result<usize, SearchError> {
        let mut last = first;
        for index in first + 1..prober.len() {
            if prober.probe(index)? {
                last = index;
            }
        }
        Ok(last)
    }
}
