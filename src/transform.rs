//! Randomized square crop followed by a deterministic resize.
//!
//! Given a frame of `W × H` pixels and a target size `c`:
//!
//! 1. `m = min(W, H)`.
//! 2. If `m < c` the crop window is `m` wide; otherwise its side is drawn
//!    uniformly from `[c, m]`.
//! 3. The window's top-left corner is drawn uniformly from every position
//!    that keeps it inside the frame.
//! 4. The window is resized to `c × c` with a fixed resampling filter.
//!
//! The output is always `c × c`. Frames smaller than `c` are upscaled.
//!
//! Randomness is injected through [`RandomSource`] so the crop geometry can
//! be pinned down in tests.

use image::{RgbImage, imageops, imageops::FilterType};
use rand::{Rng, rngs::StdRng};

use crate::error::Vid2TrainError;

/// Supplies uniform integer draws for crop placement.
pub trait RandomSource {
    /// A uniformly distributed value in `[low, high]` (both inclusive).
    ///
    /// Callers guarantee `low <= high`.
    fn pick(&mut self, low: u32, high: u32) -> u32;
}

impl RandomSource for StdRng {
    fn pick(&mut self, low: u32, high: u32) -> u32 {
        self.gen_range(low..=high)
    }
}

/// The square region cut out of a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropWindow {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Side length in pixels.
    pub size: u32,
}

/// The crop-then-resize transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropResize {
    crop_size: u32,
    filter: FilterType,
}

impl CropResize {
    /// Transform producing `crop_size × crop_size` images with bilinear
    /// resampling.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidConfiguration`] if `crop_size` is 0.
    pub fn new(crop_size: u32) -> Result<Self, Vid2TrainError> {
        if crop_size == 0 {
            return Err(Vid2TrainError::InvalidConfiguration(
                "crop size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            crop_size,
            filter: FilterType::Triangle,
        })
    }

    /// Use a different resampling filter for the resize step.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Side length of every output image.
    pub fn crop_size(&self) -> u32 {
        self.crop_size
    }

    /// Resampling filter used for the resize step.
    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Choose the crop window for a `width × height` frame.
    ///
    /// Draws the window size first, then the x offset, then the y offset.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidFrame`] if either dimension is 0.
    pub fn choose_window<R: RandomSource + ?Sized>(
        &self,
        width: u32,
        height: u32,
        rng: &mut R,
    ) -> Result<CropWindow, Vid2TrainError> {
        let smaller_side = width.min(height);
        if smaller_side == 0 {
            return Err(Vid2TrainError::InvalidFrame { width, height });
        }

        let size = if smaller_side < self.crop_size {
            smaller_side
        } else {
            rng.pick(self.crop_size, smaller_side)
        };

        let x = rng.pick(0, width - size);
        let y = rng.pick(0, height - size);
        Ok(CropWindow { x, y, size })
    }

    /// Crop `image` at a random window and resize it to the target size.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::InvalidFrame`] if the image has no pixels.
    pub fn apply<R: RandomSource + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<RgbImage, Vid2TrainError> {
        let window = self.choose_window(image.width(), image.height(), rng)?;
        Ok(self.apply_window(image, window))
    }

    /// Crop `image` at `window` and resize it to the target size.
    ///
    /// `window` must lie inside `image`.
    pub fn apply_window(&self, image: &RgbImage, window: CropWindow) -> RgbImage {
        let cropped =
            imageops::crop_imm(image, window.x, window.y, window.size, window.size).to_image();
        if window.size == self.crop_size {
            return cropped;
        }
        imageops::resize(&cropped, self.crop_size, self.crop_size, self.filter)
    }
}
