use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameReadError, FrameSource};
use crate::BoxError;

/// Treats a directory of still images as a frame sequence.
///
/// Frames are ordered by file name, so zero-padded names (`frame_0001.png`)
/// give the natural order. Files without a known image extension are ignored.
/// Images are decoded on demand; nothing is held in memory between reads.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, BoxError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        log::debug!("Opened image sequence {} ({} frames)", dir.display(), paths.len());
        Ok(Self { paths })
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn read_frame_at(&mut self, index: usize) -> Result<Frame, FrameReadError> {
        let path = self.paths.get(index).ok_or(FrameReadError::OutOfRange {
            index,
            len: self.paths.len(),
        })?;
        let img = image::open(path)
            .map_err(|e| FrameReadError::Decode {
                index,
                source: Box::new(e),
            })?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, index))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
