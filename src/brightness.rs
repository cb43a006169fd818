//! Brightness-based frame filtering.
//!
//! Each candidate frame is reduced to one number, its mean luminance on a
//! 0–255 scale, and accepted only if that number lies strictly inside the
//! configured range. Frames exactly on either bound are rejected.
//!
//! Luminance uses the BT.601 weights with the same 14-bit fixed-point
//! rounding common video tooling applies when converting RGB to 8-bit gray.
//!
//! # Example
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use vid2train::{BrightnessFilter, BrightnessRange, BrightnessVerdict};
//!
//! let filter = BrightnessFilter::new(BrightnessRange::new(20, 236)?);
//! let mid_gray = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
//! assert_eq!(filter.classify(&mid_gray), BrightnessVerdict::Accept);
//! # Ok::<(), vid2train::Vid2TrainError>(())
//! ```

use image::RgbImage;

use crate::error::Vid2TrainError;

const WEIGHT_RED: u32 = 4899;
const WEIGHT_GREEN: u32 = 9617;
const WEIGHT_BLUE: u32 = 1868;
const FIXED_POINT_SHIFT: u32 = 14;
const FIXED_POINT_HALF: u32 = 1 << (FIXED_POINT_SHIFT - 1);

/// Outcome of the brightness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrightnessVerdict {
    /// Mean luminance lies strictly inside the range.
    Accept,
    /// Mean luminance is at or beyond one of the bounds.
    Reject,
}

/// Exclusive brightness bounds on the 0–255 luminance scale.
///
/// `min` is in `[0, 256)` and `max` in `(min, 256]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrightnessRange {
    min: u32,
    max: u32,
}

impl BrightnessRange {
    /// Largest accepted bound.
    pub const LIMIT: u32 = 256;

    /// Create a range, validating both bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidConfiguration`] if `min >= 256`,
    /// `max > 256` or `max <= min`.
    pub fn new(min: u32, max: u32) -> Result<Self, Vid2TrainError> {
        if min >= Self::LIMIT {
            return Err(Vid2TrainError::InvalidConfiguration(format!(
                "minimum brightness {min} must be below {}",
                Self::LIMIT
            )));
        }
        if max > Self::LIMIT || max <= min {
            return Err(Vid2TrainError::InvalidConfiguration(format!(
                "maximum brightness {max} must be in ({min}, {}]",
                Self::LIMIT
            )));
        }
        Ok(Self { min, max })
    }

    /// Exclusive lower bound.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Exclusive upper bound.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns `true` if `mean` lies strictly between the bounds.
    pub fn contains(&self, mean: f64) -> bool {
        (self.min as f64) < mean && mean < (self.max as f64)
    }
}

impl Default for BrightnessRange {
    fn default() -> Self {
        Self { min: 20, max: 236 }
    }
}

/// Convert one RGB pixel to an 8-bit luma value.
pub fn luma(red: u8, green: u8, blue: u8) -> u8 {
    let weighted = red as u32 * WEIGHT_RED
        + green as u32 * WEIGHT_GREEN
        + blue as u32 * WEIGHT_BLUE
        + FIXED_POINT_HALF;
    (weighted >> FIXED_POINT_SHIFT).min(255) as u8
}

/// Arithmetic mean of the per-pixel luma values of `image`.
///
/// An image with no pixels has a mean of `0.0`.
pub fn mean_luminance(image: &RgbImage) -> f64 {
    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return 0.0;
    }

    let total: u64 = image
        .pixels()
        .map(|pixel| luma(pixel[0], pixel[1], pixel[2]) as u64)
        .sum();
    total as f64 / pixel_count as f64
}

/// Accept/reject policy over a [`BrightnessRange`].
///
/// Pure: the verdict depends only on the pixels and the bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrightnessFilter {
    range: BrightnessRange,
}

impl BrightnessFilter {
    /// Create a filter for `range`.
    pub fn new(range: BrightnessRange) -> Self {
        Self { range }
    }

    /// The bounds this filter applies.
    pub fn range(&self) -> BrightnessRange {
        self.range
    }

    /// Classify a frame by its mean luminance.
    pub fn classify(&self, image: &RgbImage) -> BrightnessVerdict {
        self.verdict_for(mean_luminance(image))
    }

    /// Classify an already computed mean luminance.
    pub fn verdict_for(&self, mean: f64) -> BrightnessVerdict {
        if self.range.contains(mean) {
            BrightnessVerdict::Accept
        } else {
            BrightnessVerdict::Reject
        }
    }
}
