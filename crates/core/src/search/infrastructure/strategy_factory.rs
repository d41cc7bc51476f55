use crate::search::domain::search_strategy::{SearchStrategy, StrategyKind};
use crate::search::infrastructure::binary_boundary::BinaryBoundary;
use crate::search::infrastructure::linear_scan::LinearScan;

pub fn create_strategy(kind: StrategyKind) -> Box<dyn SearchStrategy> {
    match kind {
        StrategyKind::Linear => Box::new(LinearScan),
        StrategyKind::Binary => Box::new(BinaryBoundary),
    }
}
