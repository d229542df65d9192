//! Dataset cleaning heuristics.
//!
//! Five independent, stateless checks classify images and annotation
//! records: blur (Laplacian variance), exposure (mean brightness),
//! duplicates (perceptual hash), corruption (decode failure), and label
//! size outliers. Each heuristic takes explicit thresholds and returns the
//! raw measurement alongside the verdict; defaults live in
//! [`CleanOptions`], not inside the heuristic logic.
//!
//! The orchestrator is report-only. It never deletes or moves files.

mod report;

pub use report::{CleanReport, ImageFinding, OutlierFinding, QualityTag, ResolutionSummary};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use image::DynamicImage;
use image_hasher::HasherConfig;
use log::info;
use rayon::prelude::*;

use crate::dataset::labels::{collect_files_with_extensions, IMAGE_EXTENSIONS};
use crate::dataset::Manifest;
use crate::error::YoloprepError;

/// Thresholds for the cleaning heuristics.
///
/// Defaults match the values the pipeline has always shipped with; callers
/// override individual fields from CLI flags.
#[derive(Clone, Debug)]
pub struct CleanOptions {
    /// Images with Laplacian variance below this are flagged blurry.
    pub blur_threshold: f64,
    /// Images with mean brightness (0-255) below this are flagged poorly lit.
    pub brightness_threshold: f64,
    /// Side length of the square perceptual hash.
    pub hash_size: u32,
    /// Boxes with either side below this many pixels are very_small.
    pub min_box_side: f64,
    /// Boxes with either side above this fraction of the image side are very_large.
    pub max_box_fraction: f64,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            blur_threshold: 100.0,
            brightness_threshold: 50.0,
            hash_size: 8,
            min_box_side: 10.0,
            max_box_fraction: 0.9,
        }
    }
}

/// Variance of the 3x3 Laplacian response over the luma channel.
///
/// Higher values mean more high-frequency detail (sharper edges); a nearly
/// flat image scores close to zero. Only interior pixels contribute, so
/// images smaller than 3x3 score 0.
pub fn laplacian_variance(img: &DynamicImage) -> f64 {
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let (w, h) = (w as usize, h as usize);
    let data = gray.as_raw();

    let mut responses = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = f64::from(data[y * w + x]);
            let up = f64::from(data[(y - 1) * w + x]);
            let down = f64::from(data[(y + 1) * w + x]);
            let left = f64::from(data[y * w + x - 1]);
            let right = f64::from(data[y * w + x + 1]);
            responses.push(up + down + left + right - 4.0 * center);
        }
    }

    let count = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / count;
    responses.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count
}

/// Mean of the HSV value channel (max of R, G, B per pixel), in 0-255.
pub fn mean_brightness(img: &DynamicImage) -> f64 {
    let rgb = img.to_rgb8();
    let pixel_count = rgb.pixels().len();
    if pixel_count == 0 {
        return 0.0;
    }

    let sum: u64 = rgb
        .pixels()
        .map(|px| u64::from(px.0[0].max(px.0[1]).max(px.0[2])))
        .sum();
    sum as f64 / pixel_count as f64
}

/// Blur verdict: flagged when the variance measurement falls below the
/// threshold. Returns `(flagged, measurement)`.
pub fn is_blurry(img: &DynamicImage, threshold: f64) -> (bool, f64) {
    let variance = laplacian_variance(img);
    (variance < threshold, variance)
}

/// Exposure verdict: flagged when mean brightness falls below the
/// threshold. Returns `(flagged, measurement)`.
pub fn is_poorly_lit(img: &DynamicImage, threshold: f64) -> (bool, f64) {
    let brightness = mean_brightness(img);
    (brightness < threshold, brightness)
}

/// Per-image measurements produced by the parallel scan phase.
struct ImageMeasurements {
    variance: f64,
    brightness: f64,
    hash: String,
}

enum ScanOutcome {
    Readable(ImageMeasurements),
    Undecodable(String),
}

fn measure_image(path: &Path, hash_size: u32) -> ScanOutcome {
    let decoded = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| {
            reader
                .with_guessed_format()
                .map_err(image::ImageError::IoError)
        })
        .and_then(|reader| reader.decode());

    let img = match decoded {
        Ok(img) => img,
        Err(err) => return ScanOutcome::Undecodable(err.to_string()),
    };

    let hasher = HasherConfig::new()
        .hash_size(hash_size, hash_size)
        .preproc_dct()
        .to_hasher();

    ScanOutcome::Readable(ImageMeasurements {
        variance: laplacian_variance(&img),
        brightness: mean_brightness(&img),
        hash: hasher.hash_image(&img).to_base64(),
    })
}

/// Runs the image heuristics over every image file under `image_dir`.
///
/// Files are collected in sorted-name order before being measured in
/// parallel; duplicate detection treats the first file (in that order)
/// with a given hash as canonical, so results do not depend on how the
/// work was scheduled. Per-file failures are findings, never run aborts.
pub fn scan_images(image_dir: &Path, opts: &CleanOptions) -> Result<CleanReport, YoloprepError> {
    let files = collect_files_with_extensions(image_dir, &IMAGE_EXTENSIONS)?;
    info!("scanning {} images under {}", files.len(), image_dir.display());

    let outcomes: Vec<(PathBuf, ScanOutcome)> = files
        .par_iter()
        .map(|path| (path.clone(), measure_image(path, opts.hash_size)))
        .collect();

    let mut report = CleanReport {
        images_scanned: files.len(),
        ..Default::default()
    };

    // Sequential merge in sorted order keeps first-seen hash selection
    // deterministic.
    let mut seen_hashes: HashMap<String, PathBuf> = HashMap::new();
    let mut resolutions: Option<ResolutionSummary> = None;

    for (path, outcome) in outcomes {
        // Header-only probe; undecodable pixel data can still carry a
        // readable header, and that is fine for the resolution summary.
        if let Ok(size) = imagesize::size(&path) {
            let (w, h) = (size.width as u32, size.height as u32);
            let summary = resolutions.get_or_insert(ResolutionSummary {
                min_w: w,
                max_w: w,
                min_h: h,
                max_h: h,
            });
            summary.min_w = summary.min_w.min(w);
            summary.max_w = summary.max_w.max(w);
            summary.min_h = summary.min_h.min(h);
            summary.max_h = summary.max_h.max(h);
        }

        match outcome {
            ScanOutcome::Undecodable(_) => {
                // The decode failure is the corruption signal itself, and the
                // blur/exposure pass records the same file as unreadable so it
                // is never counted as clean.
                report.corrupted.push(ImageFinding {
                    path: path.clone(),
                    tag: QualityTag::Corrupted,
                    measurement: 0.0,
                    duplicate_of: None,
                });
                report.unreadable.push(ImageFinding {
                    path,
                    tag: QualityTag::Unreadable,
                    measurement: 0.0,
                    duplicate_of: None,
                });
            }
            ScanOutcome::Readable(m) => {
                match seen_hashes.get(&m.hash) {
                    Some(canonical) => report.duplicates.push(ImageFinding {
                        path: path.clone(),
                        tag: QualityTag::Duplicate,
                        measurement: 0.0,
                        duplicate_of: Some(canonical.clone()),
                    }),
                    None => {
                        seen_hashes.insert(m.hash, path.clone());
                    }
                }

                if m.variance < opts.blur_threshold {
                    report.blurry.push(ImageFinding {
                        path: path.clone(),
                        tag: QualityTag::Blurry,
                        measurement: m.variance,
                        duplicate_of: None,
                    });
                }

                if m.brightness < opts.brightness_threshold {
                    report.poorly_lit.push(ImageFinding {
                        path,
                        tag: QualityTag::PoorlyLit,
                        measurement: m.brightness,
                        duplicate_of: None,
                    });
                }
            }
        }
    }

    report.resolutions = resolutions;

    Ok(report)
}

/// Flags annotation records whose boxes are suspiciously small or large.
///
/// Both conditions are checked independently: a record can be very_small
/// on one axis and very_large on the other, yielding one tag per check.
/// Records whose image is missing from the manifest are skipped.
pub fn find_label_outliers(manifest: &Manifest, opts: &CleanOptions) -> Vec<OutlierFinding> {
    let mut outliers = Vec::new();

    for record in manifest.records() {
        let Some(dims) = manifest.dims(record.image_id) else {
            continue;
        };

        let (box_w, box_h) = (record.box_width(), record.box_height());

        if box_w < opts.min_box_side || box_h < opts.min_box_side {
            outliers.push(OutlierFinding {
                annotation_id: record.id.as_u64(),
                tag: QualityTag::SizeOutlierSmall,
                measurement: box_w.min(box_h),
            });
        }

        let (img_w, img_h) = (dims.width_f(), dims.height_f());
        if box_w > img_w * opts.max_box_fraction || box_h > img_h * opts.max_box_fraction {
            outliers.push(OutlierFinding {
                annotation_id: record.id.as_u64(),
                tag: QualityTag::SizeOutlierLarge,
                measurement: (box_w / img_w).max(box_h / img_h),
            });
        }
    }

    outliers
}

/// Tally of annotation records per category. Pure count, no judgment.
pub fn class_distribution(manifest: &Manifest) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for record in manifest.records() {
        *counts.entry(record.category_id.as_u64()).or_insert(0) += 1;
    }
    counts
}

/// Runs the full cleaning pass: image heuristics plus, when a manifest is
/// given, label outliers and class distribution.
pub fn clean_dataset(
    image_dir: &Path,
    manifest: Option<&Manifest>,
    opts: &CleanOptions,
) -> Result<CleanReport, YoloprepError> {
    let mut report = scan_images(image_dir, opts)?;

    if let Some(manifest) = manifest {
        info!(
            "checking {} annotation records for outliers",
            manifest.records().len()
        );
        report.annotations_checked = manifest.records().len();
        report.outliers = find_label_outliers(manifest, opts);
        report.class_distribution = class_distribution(manifest);
    }

    Ok(report)
}
