/// Multi-class YOLO object detector using ONNX Runtime via `ort`.
///
/// Expects an Ultralytics-style detection export: one output of shape
/// `[1, 4 + classes, anchors]` (or its transpose) holding box centre, size
/// and per-class scores in letterboxed input coordinates.
use std::path::Path;

use crate::detection::domain::object_detector::{Detection, ObjectDetector};
use crate::shared::constants::COCO_CLASS_NAMES;
use crate::shared::frame::Frame;
use crate::BoxError;

/// Fallback input resolution when the model input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default minimum class score for a detection to count.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold, applied per class.
const NMS_IOU_THRESH: f64 = 0.45;

/// Box geometry values preceding the class scores in each output row.
const BOX_VALUES: usize = 4;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    labels: Vec<String>,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model labelled with the COCO class names.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let labels = COCO_CLASS_NAMES.iter().map(|s| s.to_string()).collect();
        Self::with_labels(model_path, labels, confidence)
    }

    /// Load a YOLO ONNX model with a custom label table, indexed by class id.
    ///
    /// The input resolution is read from the model's NCHW input shape,
    /// falling back to 640 when it is dynamic.
    pub fn with_labels(
        model_path: &Path,
        labels: Vec<String>,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded {} ({input_size}px input, {} labels)",
            model_path.display(),
            labels.len()
        );

        Ok(Self {
            session,
            labels,
            confidence,
            input_size,
        })
    }

    fn label_for(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, BoxError> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let raw = parse_output(data, &shape, self.confidence, &letterbox)?;
        drop(outputs);
        let kept = nms_per_class(raw, NMS_IOU_THRESH);

        Ok(kept
            .into_iter()
            .map(|d| Detection {
                label: self.label_for(d.class_id),
                confidence: d.score,
                bbox: d.bbox,
            })
            .collect())
    }
}

/// Platform ONNX execution providers; ORT falls back to CPU when they are
/// unavailable.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// How a frame was placed into the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    /// Maps a point from model input coordinates back to frame coordinates.
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame into a `target_size`² NCHW float tensor, padding
/// with YOLO grey (114).
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let side = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, side, side), 114.0 / 255.0);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbour resample into the padded area.
    for y in 0..new_h as usize {
        let sy = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let sx = ((x as f64 / scale) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, pad_y as usize + y, pad_x as usize + x]] =
                    src[[sy, sx, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
struct RawDetection {
    class_id: usize,
    score: f64,
    bbox: [f64; 4],
}

/// Decodes the raw output tensor into above-threshold detections, keeping
/// the best-scoring class per anchor.
fn parse_output(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, BoxError> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    // Exports are [1, features, anchors]; anchors always outnumber features.
    let transposed = shape[1] < shape[2];
    let (num_anchors, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= BOX_VALUES {
        return Err(format!("YOLO output has no class scores: {shape:?}").into());
    }
    if data.len() < num_anchors * num_feats {
        return Err("YOLO output shorter than its shape".into());
    }

    let value = |anchor: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_anchors + anchor
        } else {
            anchor * num_feats + feat
        };
        data[i] as f64
    };

    let mut dets = Vec::new();
    for anchor in 0..num_anchors {
        let (class_id, score) = (BOX_VALUES..num_feats)
            .map(|f| (f - BOX_VALUES, value(anchor, f)))
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < confidence {
            continue;
        }

        let (cx, cy, w, h) = (
            value(anchor, 0),
            value(anchor, 1),
            value(anchor, 2),
            value(anchor, 3),
        );
        let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);
        dets.push(RawDetection {
            class_id,
            score,
            bbox: [x1, y1, x2, y2],
        });
    }
    Ok(dets)
}

/// Greedy NMS within each class: highest score first, suppress same-class
/// boxes overlapping a kept one by more than `iou_thresh`.
fn nms_per_class(mut dets: Vec<RawDetection>, iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && bbox_iou(&k.bbox, &det.bbox) > iou_thresh);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    fn raw(class_id: usize, score: f64, bbox: [f64; 4]) -> RawDetection {
        RawDetection {
            class_id,
            score,
            bbox,
        }
    }

    /// Builds a `[1, 4 + classes, anchors]` tensor from per-anchor rows.
    fn transposed_output(rows: &[Vec<f32>]) -> (Vec<f32>, Vec<usize>) {
        let feats = rows[0].len();
        let anchors = rows.len();
        let mut data = vec![0.0; feats * anchors];
        for (a, row) in rows.iter().enumerate() {
            for (f, v) in row.iter().enumerate() {
                data[f * anchors + a] = *v;
            }
        }
        (data, vec![1, feats, anchors])
    }

    #[test]
    fn test_letterbox_wide_frame_pads_vertically() {
        let frame = Frame::filled(200, 100, [128, 128, 128], 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 1e-9);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_values_normalised_and_padded() {
        let frame = Frame::filled(100, 50, [255, 255, 255], 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let inside = tensor[[0, 0, lb.pad_y as usize + 1, 1]];
        assert_relative_eq!(inside, 1.0, epsilon = 1e-6);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 10,
            pad_y: 20,
        };
        assert_eq!(lb.unmap(30.0, 60.0), (10.0, 20.0));
    }

    #[test]
    fn test_parse_output_picks_best_class_and_thresholds() {
        // anchor 0: class 1 wins at 0.8; anchor 1: best is 0.1, dropped
        let mut rows = vec![
            vec![50.0, 50.0, 20.0, 10.0, 0.2, 0.8, 0.1],
            vec![10.0, 10.0, 4.0, 4.0, 0.1, 0.05, 0.0],
        ];
        rows.resize(8, vec![0.0; 7]);
        let (data, shape) = transposed_output(&rows);

        let dets = parse_output(&data, &shape, 0.25, &IDENTITY).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_relative_eq!(dets[0].score, 0.8, epsilon = 1e-6);
        assert_eq!(dets[0].bbox, [40.0, 45.0, 60.0, 55.0]);
    }

    #[test]
    fn test_parse_output_accepts_row_major_layout() {
        // [1, anchors, features] with more anchors than features
        let feats = 5;
        let anchors = 8;
        let mut data = vec![0.0f32; anchors * feats];
        data[3 * feats..4 * feats].copy_from_slice(&[8.0, 8.0, 4.0, 4.0, 0.9]);

        let dets = parse_output(&data, &[1, anchors, feats], 0.5, &IDENTITY).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 0);
        assert_eq!(dets[0].bbox, [6.0, 6.0, 10.0, 10.0]);
    }

    #[test]
    fn test_parse_output_rejects_bad_shapes() {
        assert!(parse_output(&[0.0; 4], &[4], 0.5, &IDENTITY).is_err());
        assert!(parse_output(&[0.0; 32], &[1, 4, 8], 0.5, &IDENTITY).is_err());
        assert!(parse_output(&[0.0; 3], &[1, 6, 8], 0.5, &IDENTITY).is_err());
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let kept = nms_per_class(
            vec![
                raw(0, 0.8, [5.0, 5.0, 105.0, 105.0]),
                raw(0, 0.9, [0.0, 0.0, 100.0, 100.0]),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_overlapping_boxes_of_different_classes() {
        let kept = nms_per_class(
            vec![
                raw(0, 0.9, [0.0, 0.0, 100.0, 100.0]),
                raw(2, 0.8, [0.0, 0.0, 100.0, 100.0]),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms_per_class(Vec::new(), 0.45).is_empty());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        assert_relative_eq!(bbox_iou(&b, &[5.0, 0.0, 15.0, 10.0]), 50.0 / 150.0);
    }

    #[test]
    fn test_coco_labels_cover_eighty_classes() {
        assert_eq!(COCO_CLASS_NAMES.len(), 80);
        assert_eq!(COCO_CLASS_NAMES[0], "person");
    }
}
