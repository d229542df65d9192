//! COCO-style annotation manifest reader.
//!
//! The manifest is a JSON document with top-level `images` and
//! `annotations` lists. Boxes use `[x, y, width, height]` with `(x, y)` as
//! the top-left corner in absolute pixels. The manifest is consumed
//! read-only; records are validated while parsing so that a missing field
//! or a zero-sized image fails here, not deep inside a processing loop.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::dims::ImageDims;
use super::ids::{AnnotationId, CategoryId, ImageId};
use crate::error::YoloprepError;

/// One annotation record joined against its manifest IDs.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub image_id: ImageId,
    /// COCO-style `[x, y, width, height]` in absolute pixels.
    pub bbox: [f64; 4],
    pub category_id: CategoryId,
}

impl AnnotationRecord {
    /// Box width in pixels.
    #[inline]
    pub fn box_width(&self) -> f64 {
        self.bbox[2]
    }

    /// Box height in pixels.
    #[inline]
    pub fn box_height(&self) -> f64 {
        self.bbox[3]
    }
}

/// A parsed manifest: image dimensions by ID plus all annotation records.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    dims_by_image: HashMap<ImageId, ImageDims>,
    records: Vec<AnnotationRecord>,
}

impl Manifest {
    /// All annotation records in manifest order.
    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    /// Number of images described by the manifest.
    pub fn image_count(&self) -> usize {
        self.dims_by_image.len()
    }

    /// Looks up the dimensions of an image by ID.
    pub fn dims(&self, image_id: ImageId) -> Option<ImageDims> {
        self.dims_by_image.get(&image_id).copied()
    }
}

// Serde schema for the subset of COCO we consume. Unknown fields are
// accepted and ignored; missing required fields fail deserialization.

#[derive(Debug, Deserialize)]
struct ManifestFile {
    images: Vec<ManifestImage>,
    annotations: Vec<ManifestAnnotation>,
}

#[derive(Debug, Deserialize)]
struct ManifestImage {
    id: u64,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ManifestAnnotation {
    id: u64,
    image_id: u64,
    bbox: [f64; 4],
    category_id: u64,
}

/// Reads and validates an annotation manifest from a file.
pub fn read_manifest(path: &Path) -> Result<Manifest, YoloprepError> {
    let file = File::open(path).map_err(YoloprepError::Io)?;
    let reader = BufReader::new(file);

    let raw: ManifestFile =
        serde_json::from_reader(reader).map_err(|source| YoloprepError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    build_manifest(raw, path)
}

/// Reads a manifest from a JSON string. Useful for tests.
pub fn from_manifest_str(json: &str, path: &Path) -> Result<Manifest, YoloprepError> {
    let raw: ManifestFile =
        serde_json::from_str(json).map_err(|source| YoloprepError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    build_manifest(raw, path)
}

fn build_manifest(raw: ManifestFile, path: &Path) -> Result<Manifest, YoloprepError> {
    let mut dims_by_image = HashMap::with_capacity(raw.images.len());

    for img in raw.images {
        let dims = ImageDims::new(img.width, img.height).map_err(|_| {
            YoloprepError::ManifestInvalid {
                path: path.to_path_buf(),
                message: format!(
                    "image {} has invalid dimensions {}x{}",
                    img.id, img.width, img.height
                ),
            }
        })?;

        if dims_by_image.insert(ImageId::new(img.id), dims).is_some() {
            return Err(YoloprepError::ManifestInvalid {
                path: path.to_path_buf(),
                message: format!("duplicate image id {}", img.id),
            });
        }
    }

    let records = raw
        .annotations
        .into_iter()
        .map(|ann| AnnotationRecord {
            id: AnnotationId::new(ann.id),
            image_id: ImageId::new(ann.image_id),
            bbox: ann.bbox,
            category_id: CategoryId::new(ann.category_id),
        })
        .collect();

    Ok(Manifest {
        dims_by_image,
        records,
    })
}
