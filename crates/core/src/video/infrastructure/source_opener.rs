use std::path::Path;

use crate::video::domain::frame_source::{FrameSource, FrameSourceOpener};
use crate::BoxError;

use super::ffmpeg_frame_source::FfmpegFrameSource;
use super::image_sequence_source::ImageSequenceSource;

/// Opens directories as image sequences and everything else with ffmpeg.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSourceOpener;

impl FrameSourceOpener for DefaultSourceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, BoxError> {
        if path.is_dir() {
            Ok(Box::new(ImageSequenceSource::open(path)?))
        } else {
            Ok(Box::new(FfmpegFrameSource::open(path)?))
        }
    }
}
