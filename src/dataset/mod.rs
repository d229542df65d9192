//! Core dataset model and I/O.
//!
//! Two box encodings flow through the pipeline: normalized center/size
//! boxes as stored in label files ([`YoloBox`]) and absolute pixel corner
//! boxes as used by transforms and detectors ([`CornerBox`]). Conversions
//! between them are parameterized by validated [`ImageDims`].
//!
//! # Design principles
//!
//! 1. **Validate at the edges**: dimensions and manifest records are
//!    checked when constructed/parsed, so downstream arithmetic never
//!    needs to re-check them.
//!
//! 2. **Permissive box representation**: a malformed box (min > max,
//!    coordinates outside [0, 1]) stays representable so cleaning passes
//!    can observe and report it rather than panic during parsing.

mod bbox;
mod dims;
mod ids;
pub mod labels;
pub mod manifest;

pub use bbox::{CornerBox, YoloBox};
pub use dims::ImageDims;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use manifest::{AnnotationRecord, Manifest};
