//! Protection masks: per-pixel weights marking content seams must not remove.
//!
//! A weight of `0.0` is unprotected and `1.0` is fully protected; values in
//! between only raise the removal cost. Masks are rasterised at image
//! resolution from painted rectangles, freehand strokes, a mask image, or
//! OCR text boxes, and travel through carving alongside their image.

use std::str::FromStr;

use image::GrayImage;

use crate::error::{Error, Result};
use crate::seam::Seam;

/// Weight at or above which a pixel may never be removed.
pub const FULLY_PROTECTED: f32 = 1.0;

/// An axis-aligned pixel rectangle. `x + width` and `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column.
    #[must_use]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row.
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Chebyshev gap between two rectangles; `0` when they touch or overlap.
    #[must_use]
    pub fn gap_to(&self, other: &Rect) -> u32 {
        let dx = other
            .x
            .saturating_sub(self.right())
            .max(self.x.saturating_sub(other.right()));
        let dy = other
            .y
            .saturating_sub(self.bottom())
            .max(self.y.saturating_sub(other.bottom()));
        dx.max(dy)
    }

    /// Grow by `padding` on every side, clipped to a `width x height` image.
    ///
    /// Returns `None` if nothing of the rectangle lies inside the image.
    #[must_use]
    pub fn padded_within(&self, padding: u32, width: u32, height: u32) -> Option<Rect> {
        let x0 = self.x.saturating_sub(padding);
        let y0 = self.y.saturating_sub(padding);
        let x1 = self.right().saturating_add(padding).min(width);
        let y1 = self.bottom().saturating_add(padding).min(height);
        (x0 < x1 && y0 < y1).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

impl FromStr for Rect {
    type Err = String;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,width,height, got '{s}'"));
        }
        let mut nums = [0_u32; 4];
        for (n, p) in nums.iter_mut().zip(&parts) {
            *n = p
                .parse()
                .map_err(|e| format!("invalid number '{p}' in '{s}': {e}"))?;
        }
        Ok(Rect::new(nums[0], nums[1], nums[2], nums[3]))
    }
}

/// Merge OCR text boxes that lie within `proximity` pixels of each other,
/// then pad every merged box by `padding` and clip it to the image.
///
/// Merging repeats until no two boxes are within range, so chains of nearby
/// words collapse into a single line or paragraph box.
#[must_use]
pub fn merge_text_regions(
    boxes: &[Rect],
    proximity: u32,
    padding: u32,
    width: u32,
    height: u32,
) -> Vec<Rect> {
    let mut merged: Vec<Rect> = boxes.iter().copied().filter(|r| !r.is_empty()).collect();

    'scan: loop {
        for i in 0..merged.len() {
            for j in (i + 1)..merged.len() {
                if merged[i].gap_to(&merged[j]) <= proximity {
                    let other = merged.swap_remove(j);
                    merged[i] = merged[i].union(&other);
                    continue 'scan;
                }
            }
        }
        break;
    }

    merged
        .iter()
        .filter_map(|r| r.padded_within(padding, width, height))
        .collect()
}

/// A W x H grid of protection weights in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionMask {
    width: u32,
    height: u32,
    weights: Vec<f32>,
}

impl ProtectionMask {
    /// An empty (nothing protected) mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            weights: vec![0.0; width as usize * height as usize],
        }
    }

    /// Wrap row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMask`] if the length is wrong or any weight is
    /// not a finite value in `[0, 1]`.
    pub fn from_weights(width: u32, height: u32, weights: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if weights.len() != expected {
            return Err(Error::InvalidMask(format!(
                "{width}x{height} needs {expected} weights, got {}",
                weights.len()
            )));
        }
        if let Some(bad) = weights
            .iter()
            .find(|w| !w.is_finite() || !(0.0..=1.0).contains(*w))
        {
            return Err(Error::InvalidMask(format!("weight {bad} outside [0, 1]")));
        }
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// Build a binary mask from row-major flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMask`] if the length is wrong.
    pub fn from_bools(width: u32, height: u32, flags: &[bool]) -> Result<Self> {
        let weights = flags
            .iter()
            .map(|&f| if f { FULLY_PROTECTED } else { 0.0 })
            .collect();
        Self::from_weights(width, height, weights)
    }

    /// Use a grayscale image as weights (`luma / 255`), e.g. a painted mask layer.
    #[must_use]
    pub fn from_luma(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            weights: img.pixels().map(|p| f32::from(p[0]) / 255.0).collect(),
        }
    }

    /// Fully protect every rectangle (clipped to the mask).
    #[must_use]
    pub fn from_regions(width: u32, height: u32, regions: &[Rect]) -> Self {
        let mut mask = Self::new(width, height);
        for r in regions {
            mask.protect_rect(*r, FULLY_PROTECTED);
        }
        mask
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weight at `(x, y)`.
    #[must_use]
    pub fn weight(&self, x: u32, y: u32) -> f32 {
        self.weights[self.index(x, y)]
    }

    /// Overwrite the weight at `(x, y)`, clamped to `[0, 1]`.
    pub fn set_weight(&mut self, x: u32, y: u32, weight: f32) {
        let i = self.index(x, y);
        self.weights[i] = weight.clamp(0.0, 1.0);
    }

    /// Whether `(x, y)` carries any protection.
    #[must_use]
    pub fn is_protected(&self, x: u32, y: u32) -> bool {
        self.weight(x, y) > 0.0
    }

    /// Whether `(x, y)` must never be removed.
    #[must_use]
    pub fn is_fully_protected(&self, x: u32, y: u32) -> bool {
        self.weight(x, y) >= FULLY_PROTECTED
    }

    /// Whether any pixel carries protection.
    #[must_use]
    pub fn has_protection(&self) -> bool {
        self.weights.iter().any(|&w| w > 0.0)
    }

    /// Bounding box of all protected pixels, if any.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_protected(x, y) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds.map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
    }

    /// Raise every pixel in `rect` to at least `weight`.
    pub fn protect_rect(&mut self, rect: Rect, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        let x1 = rect.right().min(self.width);
        let y1 = rect.bottom().min(self.height);
        for y in rect.y.min(y1)..y1 {
            for x in rect.x.min(x1)..x1 {
                let i = self.index(x, y);
                self.weights[i] = self.weights[i].max(weight);
            }
        }
    }

    /// Paint a freehand brush stroke of `radius` pixels through `points`.
    ///
    /// Discs are stamped along each segment at half-radius spacing; painting
    /// only ever raises weights.
    pub fn paint_stroke(&mut self, points: &[(f32, f32)], radius: f32, weight: f32) {
        let radius = radius.max(0.5);
        let weight = weight.clamp(0.0, 1.0);
        let step = (radius / 2.0).max(0.5);

        if let [(x, y)] = points {
            self.stamp_disc(*x, *y, radius, weight);
            return;
        }

        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let len = (x1 - x0).hypot(y1 - y0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let steps = (len / step).ceil().max(1.0) as u32;
            for i in 0..=steps {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / steps as f32;
                self.stamp_disc(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, radius, weight);
            }
        }
    }

    fn stamp_disc(&mut self, cx: f32, cy: f32, radius: f32, weight: f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let clip = |v: f32, max: u32| -> u32 { v.clamp(0.0, (max - 1) as f32) as u32 };
        let x0 = clip((cx - radius).floor(), self.width);
        let x1 = clip((cx + radius).ceil(), self.width);
        let y0 = clip((cy - radius).floor(), self.height);
        let y1 = clip((cy + radius).ceil(), self.height);
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                #[allow(clippy::cast_precision_loss)]
                let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                if dx * dx + dy * dy <= r2 {
                    let i = self.index(x, y);
                    self.weights[i] = self.weights[i].max(weight);
                }
            }
        }
    }

    /// Swap the x and y axes.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut weights = vec![0.0; self.weights.len()];
        for y in 0..h {
            for x in 0..w {
                weights[x * h + y] = self.weights[y * w + x];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            weights,
        }
    }

    /// Remove one weight per row at the seam's columns, shrinking width by one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the seam length differs from the
    /// height or a column is out of range. The mask is left untouched.
    pub fn remove_vertical_seam(&mut self, seam: &Seam) -> Result<()> {
        seam.check_fits(self.width, self.height)?;
        let w = self.width as usize;
        let mut write = 0;
        for (y, &sx) in seam.as_slice().iter().enumerate() {
            let sx = sx as usize;
            let row = y * w;
            self.weights.copy_within(row..row + sx, write);
            write += sx;
            self.weights.copy_within(row + sx + 1..row + w, write);
            write += w - sx - 1;
        }
        self.weights.truncate(write);
        self.width -= 1;
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
