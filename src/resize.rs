//! Public resize entry point.
//!
//! A resize validates the request, clones the source into an owned working
//! copy, and carves it down in two phases. The default [`CarveOrder`] removes
//! vertical seams (width) first and horizontal seams (height) second. Seam
//! carving is not commutative, so the two orders generally give different
//! pixels; each order is deterministic on its own.

use crate::buffer::PixelBuffer;
use crate::cancel::CancelToken;
use crate::carver::{Carver, ProgressFn};
use crate::error::{Error, Result};
use crate::mask::ProtectionMask;

/// Smallest size slider value, in percent of the original.
pub const MIN_PERCENT: f32 = 10.0;
/// Largest size slider value; the engine only ever shrinks.
pub const MAX_PERCENT: f32 = 100.0;

/// Which axis is carved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarveOrder {
    /// Remove vertical seams, then horizontal seams.
    #[default]
    WidthFirst,
    /// Remove horizontal seams, then vertical seams.
    HeightFirst,
}

/// Everything a single resize needs.
///
/// The source and mask are borrowed and never modified.
pub struct ResizeRequest<'a> {
    source: &'a PixelBuffer,
    mask: Option<&'a ProtectionMask>,
    target_width: u32,
    target_height: u32,
    order: CarveOrder,
    progress: Option<ProgressFn<'a>>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> ResizeRequest<'a> {
    /// Request `source` shrunk to `target_width x target_height`.
    #[must_use]
    pub fn new(source: &'a PixelBuffer, target_width: u32, target_height: u32) -> Self {
        Self {
            source,
            mask: None,
            target_width,
            target_height,
            order: CarveOrder::default(),
            progress: None,
            cancel: None,
        }
    }

    /// Protect content with a mask of the source's dimensions.
    #[must_use]
    pub fn with_mask(mut self, mask: &'a ProtectionMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Choose which axis is carved first.
    #[must_use]
    pub fn with_order(mut self, order: CarveOrder) -> Self {
        self.order = order;
        self
    }

    /// Receive progress percentages after every seam.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stop early when `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Convert size-slider percentages into absolute target dimensions.
///
/// Each percentage must lie in `[10, 100]`; results are rounded and never
/// drop below one pixel.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if a percentage is out of range.
pub fn target_from_percent(
    width: u32,
    height: u32,
    width_pct: f32,
    height_pct: f32,
) -> Result<(u32, u32)> {
    for (axis, pct) in [("width", width_pct), ("height", height_pct)] {
        if !(MIN_PERCENT..=MAX_PERCENT).contains(&pct) {
            return Err(Error::InvalidRequest(format!(
                "{axis} percentage {pct} outside {MIN_PERCENT}-{MAX_PERCENT}"
            )));
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale = |dim: u32, pct: f32| -> u32 {
        ((f64::from(dim) * f64::from(pct) / 100.0).round() as u32).clamp(1, dim.max(1))
    };
    Ok((scale(width, width_pct), scale(height, height_pct)))
}

/// Reject requests that cannot be satisfied, before any pixel is touched.
fn validate(
    source: &PixelBuffer,
    mask: Option<&ProtectionMask>,
    target_width: u32,
    target_height: u32,
) -> Result<()> {
    let (w, h) = (source.width(), source.height());
    if target_width == 0 || target_height == 0 {
        return Err(Error::InvalidRequest(format!(
            "target {target_width}x{target_height} must be at least 1x1"
        )));
    }
    if target_width > w || target_height > h {
        return Err(Error::InvalidRequest(format!(
            "target {target_width}x{target_height} exceeds source {w}x{h}; enlargement is not supported"
        )));
    }

    let Some(mask) = mask else {
        return Ok(());
    };
    if mask.width() != w || mask.height() != h {
        return Err(Error::MaskMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            width: w,
            height: h,
        });
    }
    if let Some(bbox) = mask.bounding_box() {
        if bbox.width > target_width || bbox.height > target_height {
            return Err(Error::ProtectionUnsatisfiable {
                protected_width: bbox.width,
                protected_height: bbox.height,
                target_width,
                target_height,
            });
        }
    }
    Ok(())
}

/// Shrink an image to the requested size by seam carving.
///
/// Returns a new buffer of exactly the target dimensions. Protected pixels
/// are never removed.
///
/// # Errors
///
/// - [`Error::InvalidRequest`] for zero or enlarging targets.
/// - [`Error::MaskMismatch`] if the mask does not match the source.
/// - [`Error::ProtectionUnsatisfiable`] if the protected content cannot fit,
///   either up front (bounding box) or when no unprotected seam remains.
/// - [`Error::Cancelled`] if the token fires; no partial result is returned.
pub fn resize(request: ResizeRequest<'_>) -> Result<PixelBuffer> {
    let ResizeRequest {
        source,
        mask,
        target_width,
        target_height,
        order,
        progress,
        cancel,
    } = request;

    validate(source, mask, target_width, target_height)?;

    let delta_w = source.width() - target_width;
    let delta_h = source.height() - target_height;
    let protected = mask
        .and_then(ProtectionMask::bounding_box)
        .map_or((0, 0), |r| (r.width, r.height));

    log::debug!(
        "resizing {}x{} -> {target_width}x{target_height} ({delta_w} vertical, {delta_h} horizontal seams, {order:?})",
        source.width(),
        source.height(),
    );

    let mut carver = Carver::new(delta_w + delta_h, progress, cancel)
        .with_limits(protected, (target_width, target_height));
    carver.start()?;

    let mut buffer = source.clone();
    let mut mask = mask.filter(|m| m.has_protection()).cloned();

    match order {
        CarveOrder::WidthFirst => {
            carver.carve_vertical(&mut buffer, &mut mask, delta_w)?;
            carver.carve_horizontal(&mut buffer, &mut mask, delta_h)?;
        }
        CarveOrder::HeightFirst => {
            carver.carve_horizontal(&mut buffer, &mut mask, delta_h)?;
            carver.carve_vertical(&mut buffer, &mut mask, delta_w)?;
        }
    }

    debug_assert_eq!((buffer.width(), buffer.height()), (target_width, target_height));
    log::debug!("resize finished at {}x{}", buffer.width(), buffer.height());
    Ok(buffer)
}
