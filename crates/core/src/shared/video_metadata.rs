use std::path::PathBuf;

/// Properties of an opened frame source.
///
/// `fps` is 0.0 for sources without a time base (image directories).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Presentation time of `index` in seconds, if the source has a frame rate.
    pub fn timestamp_of(&self, index: usize) -> Option<f64> {
        (self.fps > 0.0).then(|| index as f64 / self.fps)
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.timestamp_of(self.total_frames)
    }
}
