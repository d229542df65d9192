//! Validated image dimensions.

use serde::{Deserialize, Serialize};

use crate::error::YoloprepError;

/// Pixel dimensions of an image, checked positive at construction.
///
/// Every box conversion is parameterized by an `ImageDims`. Validating once
/// here keeps the conversions themselves infallible: a zero-sized image is
/// rejected with [`YoloprepError::InvalidDimensions`] before any arithmetic
/// can divide by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDims {
    width: u32,
    height: u32,
}

impl ImageDims {
    /// Creates dimensions, failing if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, YoloprepError> {
        if width == 0 || height == 0 {
            return Err(YoloprepError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width as `f64`, for coordinate arithmetic.
    #[inline]
    pub fn width_f(&self) -> f64 {
        f64::from(self.width)
    }

    /// Height as `f64`, for coordinate arithmetic.
    #[inline]
    pub fn height_f(&self) -> f64 {
        f64::from(self.height)
    }
}
