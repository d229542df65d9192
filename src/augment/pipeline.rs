//! The image transform pipeline.
//!
//! A small set of independent, probability-gated transforms over an image
//! and its boxes. Geometric transforms (the flips) rewrite box
//! coordinates; photometric ones leave them untouched. All pixel work is
//! delegated to the `image` crate.

use image::DynamicImage;
use rand::Rng;
use rand::RngExt;

use crate::dataset::{CornerBox, ImageDims};

/// Probabilities and jitter ranges for the pipeline.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Probability of a horizontal flip.
    pub hflip_p: f64,
    /// Probability of a vertical flip.
    pub vflip_p: f64,
    /// Probability of a brightness/contrast jitter.
    pub brightness_p: f64,
    /// Probability of a gaussian blur.
    pub blur_p: f64,
    /// Probability of a hue shift.
    pub hue_p: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            hflip_p: 0.5,
            vflip_p: 0.1,
            brightness_p: 0.2,
            blur_p: 0.2,
            hue_p: 0.2,
        }
    }
}

/// One augmented sample.
pub struct Augmented {
    pub image: DynamicImage,
    pub boxes: Vec<CornerBox>,
}

/// Applies one random draw of the pipeline to an image and its boxes.
///
/// Boxes are in absolute corner coordinates relative to `dims`. Degenerate
/// boxes are transformed like any other and passed through; discarding
/// them is the caller's choice.
pub fn apply_pipeline<R: Rng>(
    image: &DynamicImage,
    boxes: &[CornerBox],
    dims: ImageDims,
    settings: &PipelineSettings,
    rng: &mut R,
) -> Augmented {
    let mut image = image.clone();
    let mut boxes = boxes.to_vec();

    if rng.random_bool(settings.hflip_p) {
        image = image.fliph();
        for b in &mut boxes {
            *b = flip_horizontal(b, dims);
        }
    }

    if rng.random_bool(settings.vflip_p) {
        image = image.flipv();
        for b in &mut boxes {
            *b = flip_vertical(b, dims);
        }
    }

    if rng.random_bool(settings.brightness_p) {
        let delta = rng.random_range(-30..=30);
        let contrast = rng.random_range(-20.0f32..=20.0);
        image = image.brighten(delta).adjust_contrast(contrast);
    }

    if rng.random_bool(settings.blur_p) {
        let sigma = rng.random_range(0.5f32..=1.5);
        image = image.blur(sigma);
    }

    if rng.random_bool(settings.hue_p) {
        let degrees = rng.random_range(-20..=20);
        image = image.huerotate(degrees);
    }

    Augmented { image, boxes }
}

/// Mirrors a box across the vertical center line of the image.
pub fn flip_horizontal(b: &CornerBox, dims: ImageDims) -> CornerBox {
    CornerBox::new(
        b.class_id,
        dims.width_f() - b.x_max,
        b.y_min,
        dims.width_f() - b.x_min,
        b.y_max,
    )
}

/// Mirrors a box across the horizontal center line of the image.
pub fn flip_vertical(b: &CornerBox, dims: ImageDims) -> CornerBox {
    CornerBox::new(
        b.class_id,
        b.x_min,
        dims.height_f() - b.y_max,
        b.x_max,
        dims.height_f() - b.y_min,
    )
}
