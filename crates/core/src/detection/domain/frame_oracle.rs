use thiserror::Error;

use crate::detection::domain::target_class::TargetClass;
use crate::shared::frame::Frame;
use crate::BoxError;

/// Answers whether a target class is visible in a frame.
///
/// Calls are expensive (model inference) and may be wrong. Within one search
/// an oracle is expected to answer the same frame the same way. An `Err` is
/// a failed invocation, not an absent target; the search that issued it
/// fails and is not retried.
///
/// `&mut self` because inference sessions need exclusive access; sharing
/// across searches goes through `SharedOracle`.
pub trait FrameOracle: Send {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError>;
}

impl<O: FrameOracle + ?Sized> FrameOracle for Box<O> {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError> {
        (**self).is_present(frame, target)
    }
}

/// Oracle error raised when a call is refused before reaching the model.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("search cancelled")]
    Cancelled,
    #[error("search exceeded its time limit")]
    TimedOut,
}
