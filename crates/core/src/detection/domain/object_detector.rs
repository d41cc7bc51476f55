use crate::detection::domain::frame_oracle::FrameOracle;
use crate::detection::domain::target_class::TargetClass;
use crate::shared::frame::Frame;
use crate::BoxError;

/// One labelled object found in a frame. `bbox` is `[x1, y1, x2, y2]` in
/// frame pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

/// Domain interface for multi-class object detection.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, BoxError>;
}

/// Turns an [`ObjectDetector`] into a [`FrameOracle`]: the target is present
/// when any detection carries its label.
pub struct DetectorOracle<D> {
    detector: D,
}

impl<D: ObjectDetector> DetectorOracle<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn into_inner(self) -> D {
        self.detector
    }
}

impl<D: ObjectDetector> FrameOracle for DetectorOracle<D> {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError> {
        let detections = self.detector.detect(frame)?;
        let hit = detections.iter().find(|d| target.matches(&d.label));
        if let Some(d) = hit {
            log::trace!(
                "frame {}: '{}' at {:.2} confidence",
                frame.index(),
                d.label,
                d.confidence
            );
        }
        Ok(hit.is_some())
    }
}
