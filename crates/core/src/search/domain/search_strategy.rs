use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::search::domain::prober::{Prober, SearchError};

/// Probing policy for one boundary search.
///
/// Strategies are stateless; all per-search state lives in the [`Prober`]
/// they are handed, so one strategy value serves any number of concurrent
/// searches.
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Index of the first frame reported present, or `None`.
    fn find_first(&self, prober: &mut Prober<'_>) -> Result<Option<usize>, SearchError>;

    /// Index of the last frame reported present, searching only
    /// `first..len`. `first` is a known-present index; the result is never
    /// below it.
    fn find_last(&self, prober: &mut Prober<'_>, first: usize) -> Result<usize, SearchError>;
}

/// Configurable choice of [`SearchStrategy`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Probe every frame. Correct for any presence pattern.
    Linear,
    /// Binary search for each boundary. Assumes presence is one contiguous run.
    #[default]
    Binary,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Linear, StrategyKind::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Linear => "linear",
            StrategyKind::Binary => "binary",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(StrategyKind::Linear),
            "binary" => Ok(StrategyKind::Binary),
            other => Err(format!(
                "unknown search strategy '{other}' (expected one of: linear, binary)"
            )),
        }
    }
}
