//! Raw RGB/RGBA pixel storage.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::seam::Seam;

/// A row-major 8-bit RGB or RGBA image.
///
/// `data.len() == width * height * channels` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBuffer`] if `channels` is not 3 or 4, or if the
    /// data length does not match the dimensions.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(Error::InvalidBuffer(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(Error::InvalidBuffer(format!(
                "{width}x{height}x{channels} needs {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Take ownership of an RGB image.
    #[must_use]
    pub fn from_rgb(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: img.into_raw(),
        }
    }

    /// Take ownership of an RGBA image.
    #[must_use]
    pub fn from_rgba(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 4,
            data: img.into_raw(),
        }
    }

    /// Convert a decoded image, keeping alpha when the source has it.
    #[must_use]
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        if img.color().has_alpha() {
            Self::from_rgba(img.to_rgba8())
        } else {
            Self::from_rgb(img.to_rgb8())
        }
    }

    /// Convert back into an [`image::DynamicImage`] for encoding.
    #[must_use]
    pub fn into_dynamic(self) -> DynamicImage {
        let (w, h) = (self.width, self.height);
        // Length is an invariant of the type, so the containers always accept it.
        if self.channels == 4 {
            RgbaImage::from_raw(w, h, self.data)
                .map_or_else(|| DynamicImage::new_rgba8(w, h), DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(w, h, self.data)
                .map_or_else(|| DynamicImage::new_rgb8(w, h), DynamicImage::ImageRgb8)
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel (3 or 4).
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Row-major samples.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Samples of the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        &self.data[i..i + c]
    }

    /// Swap the x and y axes.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let c = self.channels as usize;
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = vec![0_u8; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                let src = (y * w + x) * c;
                let dst = (x * h + y) * c;
                data[dst..dst + c].copy_from_slice(&self.data[src..src + c]);
            }
        }
        Self {
            width: self.height,
            height: self.width,
            channels: self.channels,
            data,
        }
    }

    /// Remove one pixel per row at the seam's columns, shrinking width by one.
    ///
    /// Rows are compacted in place and the tail is truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the seam length differs from the
    /// height or a column is out of range. The buffer is left untouched.
    pub fn remove_vertical_seam(&mut self, seam: &Seam) -> Result<()> {
        seam.check_fits(self.width, self.height)?;
        let c = self.channels as usize;
        let w = self.width as usize;
        let row_len = w * c;
        let mut write = 0;
        for (y, &sx) in seam.as_slice().iter().enumerate() {
            let sx = sx as usize;
            let row = y * row_len;
            let cut = row + sx * c;
            self.data.copy_within(row..cut, write);
            write += cut - row;
            self.data.copy_within(cut + c..row + row_len, write);
            write += row + row_len - (cut + c);
        }
        self.data.truncate(write);
        self.width -= 1;
        Ok(())
    }
}
