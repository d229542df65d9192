//! Dataset augmentation.
//!
//! Walks an `images/` + `labels/` input tree, applies the transform
//! pipeline to each image/label pair, and writes `{stem}_aug_{i}` pairs to
//! a sibling output tree. Labels round-trip through absolute corner
//! coordinates so geometric transforms can rewrite them, then back to
//! normalized six-decimal form.
//!
//! Per-file failures (missing label, unreadable image) are logged and
//! skipped; the batch always runs to completion.

mod pipeline;

pub use pipeline::{apply_pipeline, flip_horizontal, flip_vertical, Augmented, PipelineSettings};

use std::fs;
use std::path::Path;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::labels::{
    collect_files_with_extensions, read_label_file, write_label_file, IMAGE_EXTENSIONS,
    LABEL_EXTENSION,
};
use crate::dataset::{CornerBox, ImageDims, YoloBox};
use crate::error::YoloprepError;

/// Options for an augmentation run.
#[derive(Clone, Debug)]
pub struct AugmentOptions {
    /// Augmented samples to generate per source image.
    pub per_image: usize,
    /// Seed for the transform RNG; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Transform pipeline settings.
    pub settings: PipelineSettings,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            per_image: 1,
            seed: None,
            settings: PipelineSettings::default(),
        }
    }
}

/// Counts reported at the end of an augmentation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    /// Source images considered.
    pub images_in: usize,
    /// Augmented image/label pairs written.
    pub generated: usize,
    /// Images skipped because no label file exists.
    pub skipped_missing_label: usize,
    /// Images skipped because of a read/decode/write failure.
    pub failed: usize,
}

/// Augments every image/label pair under `input_dir` into `output_dir`.
///
/// Both directories use the sibling `images/` + `labels/` layout; the
/// output tree is created if needed. Output pairs are named
/// `{original_stem}_aug_{i}` with the original image extension, keeping
/// the pair aligned by stem.
pub fn augment_dataset(
    input_dir: &Path,
    output_dir: &Path,
    opts: &AugmentOptions,
) -> Result<AugmentSummary, YoloprepError> {
    let images_in = input_dir.join("images");
    let labels_in = input_dir.join("labels");

    for (dir, name) in [(&images_in, "images/"), (&labels_in, "labels/")] {
        if !dir.is_dir() {
            return Err(YoloprepError::LayoutInvalid {
                path: input_dir.to_path_buf(),
                message: format!("missing {} directory", name),
            });
        }
    }

    let images_out = output_dir.join("images");
    let labels_out = output_dir.join("labels");
    fs::create_dir_all(&images_out).map_err(YoloprepError::Io)?;
    fs::create_dir_all(&labels_out).map_err(YoloprepError::Io)?;

    let image_files = collect_files_with_extensions(&images_in, &IMAGE_EXTENSIONS)?;
    info!(
        "augmenting {} images from {} ({} sample(s) per image)",
        image_files.len(),
        input_dir.display(),
        opts.per_image
    );

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => rand::make_rng(),
    };

    let mut summary = AugmentSummary {
        images_in: image_files.len(),
        ..Default::default()
    };

    for image_path in &image_files {
        let rel = image_path.strip_prefix(&images_in).unwrap_or(image_path);
        let label_rel = rel.with_extension(LABEL_EXTENSION);
        let label_path = labels_in.join(&label_rel);

        if !label_path.is_file() {
            warn!(
                "no label file for {}; skipping",
                image_path.display()
            );
            summary.skipped_missing_label += 1;
            continue;
        }

        let image = match image::open(image_path) {
            Ok(image) => image,
            Err(err) => {
                warn!("could not read {}: {}", image_path.display(), err);
                summary.failed += 1;
                continue;
            }
        };

        let dims = match ImageDims::new(image.width(), image.height()) {
            Ok(dims) => dims,
            Err(err) => {
                warn!("{}: {}", image_path.display(), err);
                summary.failed += 1;
                continue;
            }
        };

        let yolo_boxes = match read_label_file(&label_path) {
            Ok(boxes) => boxes,
            Err(err) => {
                warn!("{}", err);
                summary.failed += 1;
                continue;
            }
        };

        let corners: Vec<CornerBox> = yolo_boxes.iter().map(|b| b.to_corners(dims)).collect();

        let stem = rel
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = rel
            .extension()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent = rel.parent().unwrap_or(Path::new(""));

        for i in 0..opts.per_image {
            let augmented = apply_pipeline(&image, &corners, dims, &opts.settings, &mut rng);

            let image_out_path = images_out
                .join(parent)
                .join(format!("{}_aug_{}.{}", stem, i, ext));
            let label_out_path = labels_out
                .join(parent)
                .join(format!("{}_aug_{}.{}", stem, i, LABEL_EXTENSION));

            if let Some(dir) = image_out_path.parent() {
                fs::create_dir_all(dir).map_err(YoloprepError::Io)?;
            }

            if let Err(source) = augmented.image.save(&image_out_path) {
                warn!("could not write {}: {}", image_out_path.display(), source);
                summary.failed += 1;
                continue;
            }

            let out_boxes: Vec<YoloBox> =
                augmented.boxes.iter().map(|b| b.to_yolo(dims)).collect();
            write_label_file(&label_out_path, &out_boxes)?;

            summary.generated += 1;
        }
    }

    info!(
        "augmentation finished: {} generated, {} skipped (no label), {} failed",
        summary.generated, summary.skipped_missing_label, summary.failed
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, w: u32, h: u32) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        RgbImage::from_pixel(w, h, Rgb([120, 60, 30]))
            .save(path)
            .expect("write png");
    }

    #[test]
    fn missing_input_layout_is_an_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = augment_dataset(
            temp.path(),
            &temp.path().join("out"),
            &AugmentOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, YoloprepError::LayoutInvalid { .. }));
    }

    #[test]
    fn image_without_label_is_skipped_with_count() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_png(&temp.path().join("in/images/a.png"), 16, 16);
        fs::create_dir_all(temp.path().join("in/labels")).expect("create labels dir");

        let summary = augment_dataset(
            &temp.path().join("in"),
            &temp.path().join("out"),
            &AugmentOptions::default(),
        )
        .expect("augment runs");

        assert_eq!(summary.images_in, 1);
        assert_eq!(summary.skipped_missing_label, 1);
        assert_eq!(summary.generated, 0);
    }

    #[test]
    fn generates_aligned_pairs_with_aug_naming() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_png(&temp.path().join("in/images/train/a.png"), 32, 32);
        fs::create_dir_all(temp.path().join("in/labels/train")).expect("create labels dir");
        fs::write(
            temp.path().join("in/labels/train/a.txt"),
            "0 0.500000 0.500000 0.250000 0.250000\n",
        )
        .expect("write labels");

        let opts = AugmentOptions {
            per_image: 2,
            seed: Some(11),
            ..Default::default()
        };
        let summary = augment_dataset(&temp.path().join("in"), &temp.path().join("out"), &opts)
            .expect("augment runs");

        assert_eq!(summary.generated, 2);
        for i in 0..2 {
            let img = temp.path().join(format!("out/images/train/a_aug_{}.png", i));
            let lbl = temp.path().join(format!("out/labels/train/a_aug_{}.txt", i));
            assert!(img.is_file(), "missing {}", img.display());
            assert!(lbl.is_file(), "missing {}", lbl.display());

            let boxes = read_label_file(&lbl).expect("parse output labels");
            assert_eq!(boxes.len(), 1);
            assert!((0.0..=1.0).contains(&boxes[0].cx));
            assert!((boxes[0].w - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn same_seed_reproduces_identical_labels() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_png(&temp.path().join("in/images/a.png"), 20, 20);
        fs::create_dir_all(temp.path().join("in/labels")).expect("create labels dir");
        fs::write(
            temp.path().join("in/labels/a.txt"),
            "1 0.300000 0.400000 0.200000 0.200000\n",
        )
        .expect("write labels");

        let opts = AugmentOptions {
            seed: Some(99),
            ..Default::default()
        };

        augment_dataset(&temp.path().join("in"), &temp.path().join("out1"), &opts)
            .expect("first run");
        augment_dataset(&temp.path().join("in"), &temp.path().join("out2"), &opts)
            .expect("second run");

        let a = fs::read_to_string(temp.path().join("out1/labels/a_aug_0.txt")).expect("read");
        let b = fs::read_to_string(temp.path().join("out2/labels/a_aug_0.txt")).expect("read");
        assert_eq!(a, b);
    }
}
