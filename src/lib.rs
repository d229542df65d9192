//! Yoloprep: dataset preparation for YOLO-style object detection.
//!
//! Yoloprep prepares detection datasets and drives a pretrained model:
//! it augments image/label pairs, scans datasets for quality problems,
//! downloads datasets from the Hugging Face Hub, and runs a loaded ONNX
//! model over images.
//!
//! # Modules
//!
//! - [`dataset`]: box types, conversions, label and manifest I/O
//! - [`augment`]: the augmentation pipeline and batch runner
//! - [`quality`]: cleaning heuristics and the report they produce
//! - [`error`]: error types for yoloprep operations
//!
//! The `inference` feature adds [`detect`] (ONNX Runtime detector
//! service); the `hf` feature adds [`download`].

pub mod augment;
pub mod dataset;
pub mod error;
pub mod quality;

#[cfg(feature = "inference")]
pub mod detect;
#[cfg(feature = "hf")]
pub mod download;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::YoloprepError;

/// The yoloprep CLI application.
#[derive(Parser)]
#[command(name = "yoloprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Augment an images/ + labels/ dataset into a new directory.
    Augment(AugmentArgs),
    /// Scan a dataset for quality problems and print a report.
    Clean(CleanArgs),
    /// Run the detection model on an image and print predictions as JSON.
    #[cfg(feature = "inference")]
    Predict(PredictArgs),
    /// Download a detection dataset from the Hugging Face Hub.
    #[cfg(feature = "hf")]
    Download(DownloadArgs),
}

/// Arguments for the augment subcommand.
#[derive(clap::Args)]
struct AugmentArgs {
    /// Input dataset root containing images/ and labels/.
    input: PathBuf,

    /// Output directory for the augmented pairs.
    output: PathBuf,

    /// Augmented samples to generate per source image.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// RNG seed for reproducible transforms.
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the clean subcommand.
#[derive(clap::Args)]
struct CleanArgs {
    /// Directory containing the images to scan.
    image_dir: PathBuf,

    /// Optional COCO-style annotation manifest for label checks.
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Laplacian variance below this flags an image as blurry.
    #[arg(long, default_value_t = 100.0)]
    blur_threshold: f64,

    /// Mean brightness (0-255) below this flags an image as poorly lit.
    #[arg(long, default_value_t = 50.0)]
    brightness_threshold: f64,

    /// Side length of the square perceptual hash used for duplicates.
    #[arg(long, default_value_t = 8)]
    hash_size: u32,

    /// Boxes with either side below this many pixels are very_small.
    #[arg(long, default_value_t = 10.0)]
    min_box_side: f64,

    /// Boxes with either side above this fraction of the image are very_large.
    #[arg(long, default_value_t = 0.9)]
    max_box_fraction: f64,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the predict subcommand.
#[cfg(feature = "inference")]
#[derive(clap::Args)]
struct PredictArgs {
    /// Image to run the model on.
    image: PathBuf,

    /// Path to the ONNX detection model.
    #[arg(short, long)]
    model: PathBuf,

    /// Class names: a data.yaml or a classes.txt file.
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Square model input side in pixels.
    #[arg(long, default_value_t = 640)]
    input_size: u32,

    /// Minimum confidence for a detection.
    #[arg(long, default_value_t = 0.5)]
    confidence: f32,

    /// IoU threshold for non-maximum suppression.
    #[arg(long, default_value_t = 0.45)]
    iou_threshold: f64,

    /// Write predictions to a JSON file instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,
}

/// Arguments for the download subcommand.
#[cfg(feature = "hf")]
#[derive(clap::Args)]
struct DownloadArgs {
    /// Hub dataset repo to fetch.
    #[arg(default_value = download::DEFAULT_DATASET)]
    repo_id: String,

    /// Optional git revision.
    #[arg(long)]
    revision: Option<String>,

    /// Hub token; falls back to the HF_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,
}

/// Run the yoloprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), YoloprepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Augment(args)) => run_augment(args),
        Some(Commands::Clean(args)) => run_clean(args),
        #[cfg(feature = "inference")]
        Some(Commands::Predict(args)) => run_predict(args),
        #[cfg(feature = "hf")]
        Some(Commands::Download(args)) => run_download(args),
        None => {
            println!("yoloprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset preparation for YOLO-style object detection.");
            println!();
            println!("Run 'yoloprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the augment subcommand.
fn run_augment(args: AugmentArgs) -> Result<(), YoloprepError> {
    let opts = augment::AugmentOptions {
        per_image: args.count,
        seed: args.seed,
        settings: augment::PipelineSettings::default(),
    };

    let summary = augment::augment_dataset(&args.input, &args.output, &opts)?;

    println!(
        "Augmented {} image(s): {} pair(s) written to {} ({} skipped without labels, {} failed)",
        summary.images_in,
        summary.generated,
        args.output.display(),
        summary.skipped_missing_label,
        summary.failed
    );

    Ok(())
}

/// Execute the clean subcommand.
fn run_clean(args: CleanArgs) -> Result<(), YoloprepError> {
    let opts = quality::CleanOptions {
        blur_threshold: args.blur_threshold,
        brightness_threshold: args.brightness_threshold,
        hash_size: args.hash_size,
        min_box_side: args.min_box_side,
        max_box_fraction: args.max_box_fraction,
    };

    let manifest = match &args.annotations {
        Some(path) => Some(dataset::manifest::read_manifest(path)?),
        None => None,
    };

    let report = quality::clean_dataset(&args.image_dir, manifest.as_ref(), &opts)?;

    match args.output.as_str() {
        "text" => print!("{}", report),
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .expect("report serialization cannot fail");
            println!("{}", json);
        }
        other => return Err(YoloprepError::UnsupportedFormat(other.to_string())),
    }

    Ok(())
}

/// Execute the predict subcommand.
#[cfg(feature = "inference")]
fn run_predict(args: PredictArgs) -> Result<(), YoloprepError> {
    use crate::dataset::labels::ClassMap;

    let classes = match &args.classes {
        Some(path) => {
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if is_yaml {
                ClassMap::from_data_yaml(path)?
            } else {
                ClassMap::from_classes_txt(path)?
            }
        }
        None => ClassMap::default(),
    };

    let detector = detect::Detector::new(
        &args.model,
        classes,
        detect::DetectorOptions {
            input_size: args.input_size,
            confidence_threshold: args.confidence,
            nms_iou_threshold: args.iou_threshold,
        },
    )?;

    let image = image::open(&args.image).map_err(|source| YoloprepError::UnreadableImage {
        path: args.image.clone(),
        source,
    })?;

    let predictions = detector.detect(&image)?;
    let response = detect::PredictionResponse { predictions };
    let json =
        serde_json::to_string_pretty(&response).expect("response serialization cannot fail");

    match &args.json {
        Some(path) => std::fs::write(path, json).map_err(YoloprepError::Io)?,
        None => println!("{}", json),
    }

    Ok(())
}

/// Execute the download subcommand.
#[cfg(feature = "hf")]
fn run_download(args: DownloadArgs) -> Result<(), YoloprepError> {
    let result = download::download_dataset(&download::DownloadOptions {
        repo_id: args.repo_id,
        revision: args.revision,
        token: args.token,
    })?;

    println!(
        "Downloaded {} file(s) from '{}':",
        result.files.len(),
        result.repo_id
    );
    for file in &result.files {
        println!("  {}", file.display());
    }

    Ok(())
}
