//! Detection inference service.
//!
//! [`Detector`] wraps one ONNX Runtime session together with the class
//! names and model input geometry. It is constructed once at startup and
//! then shared read-only by whatever drives predictions (the CLI demo
//! here, or an embedding service), instead of living in a process global.
//!
//! The model is expected to produce YOLO-style output of shape
//! `[1, 4 + num_classes, num_anchors]` with `(cx, cy, w, h)` in input
//! pixels followed by per-class scores.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::info;
use ndarray::{Array4, Axis};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;
use serde::Serialize;

use crate::dataset::labels::ClassMap;
use crate::dataset::CornerBox;
use crate::error::YoloprepError;

/// One predicted box in source-image pixel coordinates.
#[derive(Clone, Debug, Serialize)]
pub struct Prediction {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub label: String,
    pub confidence: f32,
}

/// The prediction response emitted by the CLI demo.
#[derive(Clone, Debug, Serialize)]
pub struct PredictionResponse {
    pub predictions: Vec<Prediction>,
}

/// Options for a detector instance.
#[derive(Clone, Debug)]
pub struct DetectorOptions {
    /// Square model input side in pixels.
    pub input_size: u32,
    /// Minimum class score for a row to become a detection.
    pub confidence_threshold: f32,
    /// IoU above which two same-class detections are considered duplicates.
    pub nms_iou_threshold: f64,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.5,
            nms_iou_threshold: 0.45,
        }
    }
}

/// A loaded detection model plus everything needed to decode its output.
pub struct Detector {
    session: Session,
    model_path: PathBuf,
    classes: ClassMap,
    opts: DetectorOptions,
}

impl Detector {
    /// Loads the ONNX model once. The returned value is the process-wide
    /// service object; clone-free sharing is by reference.
    pub fn new(
        model_path: &Path,
        classes: ClassMap,
        opts: DetectorOptions,
    ) -> Result<Self, YoloprepError> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        info!("loaded detection model from {}", model_path.display());

        Ok(Self {
            session,
            model_path: model_path.to_path_buf(),
            classes,
            opts,
        })
    }

    /// Runs inference on one image and returns predictions in the source
    /// image's pixel coordinates, highest confidence first.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Prediction>, YoloprepError> {
        let (orig_w, orig_h) = (image.width() as f64, image.height() as f64);
        let side = self.opts.input_size;

        let resized = image.resize_exact(side, side, image::imageops::FilterType::Triangle);
        let input = image_to_nchw(&resized);

        let outputs = self
            .session
            .run(inputs!["images" => TensorRef::from_array_view(&input)?])?;

        let output = outputs["output0"].try_extract_array::<f32>()?;

        if output.ndim() != 3 {
            return Err(YoloprepError::ModelOutput {
                model: self.model_path.clone(),
                message: format!("expected 3-d output, got {} dims", output.ndim()),
            });
        }

        let rows = output.index_axis(Axis(0), 0);
        let (attrs, anchors) = (rows.shape()[0], rows.shape()[1]);
        if attrs < 5 {
            return Err(YoloprepError::ModelOutput {
                model: self.model_path.clone(),
                message: format!("expected at least 5 attributes per anchor, got {}", attrs),
            });
        }

        let scale_x = orig_w / f64::from(side);
        let scale_y = orig_h / f64::from(side);

        let mut detections: Vec<(CornerBox, f32)> = Vec::new();
        for col in 0..anchors {
            let (class_id, score) = (4..attrs)
                .map(|row| (row - 4, rows[[row, col]]))
                .fold((0usize, f32::MIN), |best, cand| {
                    if cand.1 > best.1 {
                        cand
                    } else {
                        best
                    }
                });

            if score < self.opts.confidence_threshold {
                continue;
            }

            let cx = f64::from(rows[[0, col]]);
            let cy = f64::from(rows[[1, col]]);
            let w = f64::from(rows[[2, col]]);
            let h = f64::from(rows[[3, col]]);

            let bbox = CornerBox::new(
                class_id as u32,
                (cx - w / 2.0) * scale_x,
                (cy - h / 2.0) * scale_y,
                (cx + w / 2.0) * scale_x,
                (cy + h / 2.0) * scale_y,
            );
            detections.push((bbox, score));
        }

        let kept = non_maximum_suppression(detections, self.opts.nms_iou_threshold);

        Ok(kept
            .into_iter()
            .map(|(bbox, confidence)| Prediction {
                x1: bbox.x_min,
                y1: bbox.y_min,
                x2: bbox.x_max,
                y2: bbox.y_max,
                label: self.classes.name_of(bbox.class_id),
                confidence,
            })
            .collect())
    }
}

/// Converts an RGB image to a `[1, 3, H, W]` float tensor scaled to [0, 1].
fn image_to_nchw(image: &DynamicImage) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();

    let mut array = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, px) in rgb.enumerate_pixels() {
        for channel in 0..3 {
            array[[0, channel, y as usize, x as usize]] = f32::from(px.0[channel]) / 255.0;
        }
    }
    array
}

/// Removes duplicate detections: sorts by confidence and drops any
/// same-class box whose IoU with an already-kept box exceeds the
/// threshold.
fn non_maximum_suppression(
    mut detections: Vec<(CornerBox, f32)>,
    iou_threshold: f64,
) -> Vec<(CornerBox, f32)> {
    detections.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<(CornerBox, f32)> = Vec::new();
    for (bbox, score) in detections {
        let duplicate = kept.iter().any(|(kept_box, _)| {
            kept_box.class_id == bbox.class_id && kept_box.iou(&bbox) > iou_threshold
        });
        if !duplicate {
            kept.push((bbox, score));
        }
    }
    kept
}
