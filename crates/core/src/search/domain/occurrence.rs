use std::fmt;

/// Inclusive run of frame indices in which the target was reported present.
///
/// Only constructible with `first <= last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OccurrenceInterval {
    first: usize,
    last: usize,
}

impl OccurrenceInterval {
    pub fn new(first: usize, last: usize) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
        }
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of frames spanned, both ends included.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }
}

impl fmt::Display for OccurrenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// Where a search currently is. Each `locate` call walks
/// `SearchingFirst -> (SearchingLast ->) Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchPhase {
    SearchingFirst,
    SearchingLast,
    Done { found: bool },
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::SearchingFirst => f.write_str("searching first"),
            SearchPhase::SearchingLast => f.write_str("searching last"),
            SearchPhase::Done { found: true } => f.write_str("done (found)"),
            SearchPhase::Done { found: false } => f.write_str("done (not found)"),
        }
    }
}

/// Cost and health counters for one search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Probes issued: one frame read attempt each.
    pub probes: usize,
    /// Oracle invocations. Lower than `probes` when reads failed.
    pub oracle_calls: usize,
    /// Indices whose frame could not be read; each was counted as absent.
    pub read_failures: Vec<usize>,
}

impl ProbeStats {
    pub fn has_read_failures(&self) -> bool {
        !self.read_failures.is_empty()
    }
}

/// Result of one `locate` call: the interval, or `None` if the target was
/// never seen, plus what it cost to find out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub interval: Option<OccurrenceInterval>,
    pub stats: ProbeStats,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        self.interval.is_some()
    }
}
