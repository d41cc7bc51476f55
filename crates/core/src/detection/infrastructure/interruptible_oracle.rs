use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::domain::frame_oracle::{FrameOracle, Interrupted};
use crate::detection::domain::target_class::TargetClass;
use crate::shared::frame::Frame;
use crate::BoxError;

/// Decorator that refuses oracle calls once a cancellation flag is raised or
/// a deadline has passed.
///
/// The refusal is an oracle error, which aborts the running search between
/// two probes; the search loop itself knows nothing about cancellation.
pub struct InterruptibleOracle<O> {
    inner: O,
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl<O: FrameOracle> InterruptibleOracle<O> {
    pub fn new(inner: O, cancelled: Arc<AtomicBool>, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            cancelled,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    fn check(&self) -> Result<(), Interrupted> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::TimedOut),
            _ => Ok(()),
        }
    }
}

impl<O: FrameOracle> FrameOracle for InterruptibleOracle<O> {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError> {
        self.check()?;
        self.inner.is_present(frame, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    impl FrameOracle for Always {
        fn is_present(&mut self, _frame: &Frame, _target: &TargetClass) -> Result<bool, BoxError> {
            Ok(self.0)
        }
    }

    fn ask<O: FrameOracle>(oracle: &mut O) -> Result<bool, BoxError> {
        oracle.is_present(&Frame::filled(1, 1, [0, 0, 0], 0), &TargetClass::new("cat").unwrap())
    }

    #[test]
    fn test_passes_through_when_not_interrupted() {
        let mut oracle =
            InterruptibleOracle::new(Always(true), Arc::new(AtomicBool::new(false)), None);
        assert!(ask(&mut oracle).unwrap());
    }

    #[test]
    fn test_cancellation_refuses_calls() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut oracle = InterruptibleOracle::new(Always(true), flag.clone(), None);
        assert!(ask(&mut oracle).is_ok());

        flag.store(true, Ordering::Relaxed);

        let err = ask(&mut oracle).unwrap_err();
        assert_eq!(err.downcast_ref::<Interrupted>(), Some(&Interrupted::Cancelled));
    }

    #[test]
    fn test_expired_deadline_refuses_calls() {
        let mut oracle = InterruptibleOracle::new(
            Always(false),
            Arc::new(AtomicBool::new(false)),
            Some(Duration::ZERO),
        );
        let err = ask(&mut oracle).unwrap_err();
        assert_eq!(err.downcast_ref::<Interrupted>(), Some(&Interrupted::TimedOut));
    }
}
