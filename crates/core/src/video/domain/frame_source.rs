use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::BoxError;

/// Why a frame could not be produced for a requested index.
#[derive(Error, Debug)]
pub enum FrameReadError {
    #[error("frame {index} is outside the sequence of {len} frames")]
    OutOfRange { index: usize, len: usize },
    #[error("stream ended before frame {index}")]
    EndOfStream { index: usize },
    #[error("failed to decode frame {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: BoxError,
    },
}

/// Random-access view over an ordered, finite sequence of frames.
///
/// `read_frame_at` takes `&mut self`: seeking and reading happen as one
/// exclusive operation, so a source never has its position moved underneath
/// an in-flight read. Callers may request indices in any order; sources are
/// free to be faster on forward access.
pub trait FrameSource: Send {
    /// Number of addressable frames. Fixed once the source is open.
    fn frame_count(&self) -> usize;

    fn read_frame_at(&mut self, index: usize) -> Result<Frame, FrameReadError>;

    /// Frames per second, if the source has a time base.
    fn fps(&self) -> Option<f64> {
        None
    }
}

/// Opens a [`FrameSource`] for a path. One source per search; sources are
/// never shared between concurrent searches.
pub trait FrameSourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, BoxError>;
}
