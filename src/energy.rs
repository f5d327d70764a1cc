//! Per-pixel importance ("energy") of an image.
//!
//! Energy is the L1 Sobel gradient magnitude of the luminance field, plus an
//! additive bias on protected pixels. Protection is only ever expressed as a
//! cost, so the seam search stays a single uniform minimisation.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::mask::ProtectionMask;

/// Largest possible `|gx| + |gy|` for 8-bit luminance under a 3x3 Sobel kernel.
pub const MAX_GRADIENT: f64 = 2040.0;

/// Bias added (scaled by weight) to protected pixels of a map with `rows` rows.
///
/// A fully protected pixel costs more than an entire seam of maximum-gradient
/// unprotected pixels, and never less than 8x the maximum gradient.
#[must_use]
pub fn protection_bias(rows: u32) -> f64 {
    MAX_GRADIENT * f64::from(rows.saturating_add(1).max(8))
}

/// A W x H grid of non-negative energy values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMap {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl EnergyMap {
    /// Compute the energy of `buffer`, biased by `mask` when given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaskMismatch`] if the mask dimensions differ from the buffer's.
    pub fn compute(buffer: &PixelBuffer, mask: Option<&ProtectionMask>) -> Result<Self> {
        let (width, height) = (buffer.width(), buffer.height());
        if let Some(m) = mask {
            if m.width() != width || m.height() != height {
                return Err(Error::MaskMismatch {
                    mask_width: m.width(),
                    mask_height: m.height(),
                    width,
                    height,
                });
            }
        }

        let lum = luminance_field(buffer);
        let mut values = sobel_energy(&lum, width as usize, height as usize);

        if let Some(m) = mask {
            let bias = protection_bias(height);
            for (e, &weight) in values.iter_mut().zip(m.weights()) {
                if weight > 0.0 {
                    *e += bias * f64::from(weight);
                }
            }
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_values(width: u32, height: u32, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), (width * height) as usize);
        Self {
            width,
            height,
            values,
        }
    }

    /// Map width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Energy at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[(y * self.width + x) as usize]
    }

    /// Row-major energy values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Row-major luminance `0.299R + 0.587G + 0.114B`, in `[0, 255]`.
fn luminance_field(buffer: &PixelBuffer) -> Vec<f32> {
    let c = buffer.channels() as usize;
    buffer
        .data()
        .chunks_exact(c)
        .map(|px| 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]))
        .collect()
}

/// `|gx| + |gy|` with 3x3 Sobel kernels. Borders replicate the edge pixels.
fn sobel_energy(lum: &[f32], width: usize, height: usize) -> Vec<f64> {
    let mut out = vec![0.0_f64; width * height];
    if width == 0 || height == 0 {
        return out;
    }

    for y in 0..height {
        let up = y.saturating_sub(1) * width;
        let mid = y * width;
        let down = (y + 1).min(height - 1) * width;
        for x in 0..width {
            let l = x.saturating_sub(1);
            let r = (x + 1).min(width - 1);

            let gx = (lum[up + r] + 2.0 * lum[mid + r] + lum[down + r])
                - (lum[up + l] + 2.0 * lum[mid + l] + lum[down + l]);
            let gy = (lum[down + l] + 2.0 * lum[down + x] + lum[down + r])
                - (lum[up + l] + 2.0 * lum[up + x] + lum[up + r]);

            out[mid + x] = f64::from(gx.abs() + gy.abs());
        }
    }

    out
}
