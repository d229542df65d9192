use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yoloprep operations.
#[derive(Debug, Error)]
pub enum YoloprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image dimensions {width}x{height} (must be positive)")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse class map {path}: {source}")]
    ClassMapParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse annotation manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid annotation manifest {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("Could not decode image {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "hf")]
    #[error("Hugging Face API error for '{repo_id}': {message}")]
    HfApi { repo_id: String, message: String },

    #[cfg(feature = "hf")]
    #[error("Failed to acquire '{repo_id}': {message}")]
    HfAcquire { repo_id: String, message: String },

    #[cfg(feature = "inference")]
    #[error("Inference session error: {0}")]
    Inference(#[from] ort::Error),

    #[cfg(feature = "inference")]
    #[error("Unexpected model output for {model}: {message}")]
    ModelOutput { model: PathBuf, message: String },
}
