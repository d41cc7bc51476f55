use crate::search::domain::prober::{Prober, SearchError};
use crate::search::domain::search_strategy::SearchStrategy;

/// Binary search for the leftmost and then the rightmost present frame.
///
/// Spends O(log N) probes but is only exact when presence forms a single
/// contiguous run. Otherwise it still returns `first <= last`, but the pair
/// may miss present frames or report none at all.
pub struct BinaryBoundary;

impl SearchStrategy for BinaryBoundary {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn find_first(&self, prober: &mut Prober<'_>) -> Result<Option<usize>, SearchError> {
        let Some(mut high) = prober.len().checked_sub(1) else {
            return Ok(None);
        };
        let mut low = 0;
        let mut result = None;

        while low <= high {
            let mid = low + (high - low) / 2;
            if prober.probe(mid)? {
                result = Some(mid);
                if mid == 0 {
                    break;
                }
                high = mid - 1;
            } else {
                low = mid + 1;
            }
        }
        Ok(result)
    }

    fn find_last(&self, prober: &mut Prober<'_>, first: usize) -> Result<usize, SearchError> {
        // `first` is already known present; only the frames after it are open.
        let mut result = first;
        let mut low = first + 1;
        let Some(mut high) = prober.len().checked_sub(1) else {
            return Ok(result);
        };

        while low <= high {
            let mid = low + (high - low) / 2;
            if prober.probe(mid)? {
                result = mid;
                low = mid + 1;
            } else {
                high = mid - 1;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{all_patterns, run_search, unimodal_patterns};
    use rstest::rstest;

    fn budget(n: usize) -> usize {
        let log2_ceil = usize::BITS - n.saturating_sub(1).leading_zeros();
        (2 * log2_ceil as usize).max(1)
    }

    fn bounds(pattern: &[bool]) -> Option<(usize, usize)> {
        run_search(Box::new(BinaryBoundary), pattern)
            .interval
            .map(|i| (i.first(), i.last()))
    }

    fn pattern_of(n: usize, present: &[usize]) -> Vec<bool> {
        let mut pattern = vec![false; n];
        for &i in present {
            pattern[i] = true;
        }
        pattern
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 4)]
    #[case(4, 4)]
    #[case(10, 8)]
    #[case(1024, 20)]
    fn test_budget_helper(#[case] n: usize, #[case] expected: usize) {
        assert_eq!(budget(n), expected);
    }

    #[test]
    fn test_exact_when_presence_runs_to_the_end() {
        for n in 1..=40 {
            for onset in 0..n {
                let pattern: Vec<bool> = (0..n).map(|i| i >= onset).collect();
                assert_eq!(bounds(&pattern), Some((onset, n - 1)), "n={n} onset={onset}");
            }
        }
    }

    #[test]
    fn test_unimodal_is_exact_or_not_found() {
        for n in 1..=24 {
            for (pattern, start, end) in unimodal_patterns(n) {
                let expected = (end > start).then(|| (start, end - 1));
                match bounds(&pattern) {
                    None => {}
                    found => assert_eq!(found, expected, "n={n} run={start}..{end}"),
                }
            }
        }
    }

    #[test]
    fn test_short_run_before_midpoint_is_missed() {
        // The first probe lands on 1 (absent) and the search moves right,
        // never seeing frame 0.
        assert_eq!(bounds(&pattern_of(3, &[0])), None);
    }

    #[test]
    fn test_probe_budget_holds_for_every_pattern() {
        for n in 1..=12 {
            for pattern in all_patterns(n) {
                let outcome = run_search(Box::new(BinaryBoundary), &pattern);
                assert!(
                    outcome.stats.probes <= budget(n),
                    "n={n} pattern {pattern:?} used {} probes",
                    outcome.stats.probes
                );
                if let Some(interval) = outcome.interval {
                    assert!(interval.first() <= interval.last());
                }
            }
        }
    }

    #[rstest]
    #[case(100)]
    #[case(1000)]
    #[case(4096)]
    #[case(100_000)]
    fn test_probe_budget_on_long_sequences(#[case] n: usize) {
        for present in [vec![], vec![0], vec![n - 1], (n / 3..n / 2).collect::<Vec<_>>()] {
            let outcome = run_search(Box::new(BinaryBoundary), &pattern_of(n, &present));
            assert!(outcome.stats.probes <= budget(n));
        }
    }

    #[rstest]
    #[case::contiguous_block(10, &[4, 5, 6], Some((4, 6)), 7)]
    #[case::gapped(10, &[2, 7], Some((7, 7)), 5)]
    #[case::all_absent(5, &[], None, 3)]
    #[case::single_present(1, &[0], Some((0, 0)), 1)]
    #[case::single_absent(1, &[], None, 1)]
    fn test_baselines(
        #[case] n: usize,
        #[case] present: &[usize],
        #[case] expected: Option<(usize, usize)>,
        #[case] probes: usize,
    ) {
        let outcome = run_search(Box::new(BinaryBoundary), &pattern_of(n, present));
        assert_eq!(outcome.interval.map(|i| (i.first(), i.last())), expected);
        assert_eq!(outcome.stats.probes, probes);
    }
}
