//! Seam removal and the repeated carving loop.

use crate::buffer::PixelBuffer;
use crate::cancel::CancelToken;
use crate::energy::EnergyMap;
use crate::error::{Error, Result};
use crate::mask::ProtectionMask;
use crate::seam::{find_vertical_seam, Seam};

/// Remove `seam` from `buffer` and, when present, from `mask`.
///
/// Both shrink by one column together, so pixel-to-weight correspondence is
/// preserved. The energy map is never touched here.
///
/// # Errors
///
/// Returns [`Error::MaskMismatch`] if the mask and buffer dimensions differ,
/// or [`Error::InvalidRequest`] if the seam does not fit the buffer. Nothing
/// is modified on error.
pub fn remove_seam(
    buffer: &mut PixelBuffer,
    mask: Option<&mut ProtectionMask>,
    seam: &Seam,
) -> Result<()> {
    if let Some(mask) = mask.as_deref() {
        if (mask.width(), mask.height()) != (buffer.width(), buffer.height()) {
            return Err(Error::MaskMismatch {
                mask_width: mask.width(),
                mask_height: mask.height(),
                width: buffer.width(),
                height: buffer.height(),
            });
        }
    }
    seam.check_fits(buffer.width(), buffer.height())?;

    buffer.remove_vertical_seam(seam)?;
    if let Some(mask) = mask {
        mask.remove_vertical_seam(seam)?;
    }
    Ok(())
}

/// First row where `seam` crosses a fully protected pixel.
fn blocked_row(mask: &ProtectionMask, seam: &Seam) -> Option<u32> {
    (0..mask.height()).find(|&y| mask.is_fully_protected(seam.x(y), y))
}

/// Callback receiving progress as a percentage in `[0, 100]`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f32);

/// Drives seam-by-seam carving for one resize, across both phases.
///
/// Owns the progress/cancellation plumbing so every phase reports against a
/// single seam total.
pub(crate) struct Carver<'a> {
    total: u32,
    done: u32,
    progress: Option<ProgressFn<'a>>,
    cancel: Option<&'a CancelToken>,
    protected: (u32, u32),
    target: (u32, u32),
}

impl<'a> Carver<'a> {
    pub(crate) fn new(
        total: u32,
        progress: Option<ProgressFn<'a>>,
        cancel: Option<&'a CancelToken>,
    ) -> Self {
        Self {
            total,
            done: 0,
            progress,
            cancel,
            protected: (0, 0),
            target: (0, 0),
        }
    }

    /// Protected extent and target size, reported if carving gets blocked.
    pub(crate) fn with_limits(mut self, protected: (u32, u32), target: (u32, u32)) -> Self {
        self.protected = protected;
        self.target = target;
        self
    }

    /// Check for cancellation before any work; a zero-seam run completes here.
    pub(crate) fn start(&mut self) -> Result<()> {
        self.check_cancelled()?;
        if self.total == 0 {
            self.report();
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            log::debug!("resize cancelled after {}/{} seams", self.done, self.total);
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn report(&mut self) {
        let pct = if self.done >= self.total {
            100.0
        } else {
            #[allow(clippy::cast_possible_truncation)]
            {
                (f64::from(self.done) * 100.0 / f64::from(self.total)) as f32
            }
        };
        if let Some(progress) = self.progress.as_mut() {
            (*progress)(pct);
        }
    }

    /// Remove `count` vertical seams, recomputing energy before each one.
    ///
    /// Cancellation is checked before each seam, so a run whose last seam has
    /// been reported always completes.
    pub(crate) fn carve_vertical(
        &mut self,
        buffer: &mut PixelBuffer,
        mask: &mut Option<ProtectionMask>,
        count: u32,
    ) -> Result<()> {
        for _ in 0..count {
            self.check_cancelled()?;
            let energy = EnergyMap::compute(buffer, mask.as_ref())?;
            let seam = find_vertical_seam(&energy);

            if let Some(row) = mask.as_ref().and_then(|m| blocked_row(m, &seam)) {
                log::debug!(
                    "no unprotected seam left at {}x{} (blocked at row {row})",
                    buffer.width(),
                    buffer.height()
                );
                return Err(Error::ProtectionUnsatisfiable {
                    protected_width: self.protected.0,
                    protected_height: self.protected.1,
                    target_width: self.target.0,
                    target_height: self.target.1,
                });
            }

            remove_seam(buffer, mask.as_mut(), &seam)?;
            self.done += 1;
            log::trace!(
                "seam {}/{} removed, now {}x{}",
                self.done,
                self.total,
                buffer.width(),
                buffer.height()
            );

            self.report();
        }
        Ok(())
    }

    /// Remove `count` horizontal seams by carving the transposed image.
    pub(crate) fn carve_horizontal(
        &mut self,
        buffer: &mut PixelBuffer,
        mask: &mut Option<ProtectionMask>,
        count: u32,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let mut transposed = buffer.transpose();
        let mut transposed_mask = mask.as_ref().map(ProtectionMask::transpose);
        self.carve_vertical(&mut transposed, &mut transposed_mask, count)?;
        *buffer = transposed.transpose();
        *mask = transposed_mask.map(|m| m.transpose());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Rect;

    fn noise(width: u32, height: u32, seed: u32) -> PixelBuffer {
        let mut state = seed;
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height * 3 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            data.push((state >> 16) as u8);
        }
        PixelBuffer::new(width, height, 3, data).unwrap()
    }

    #[test]
    fn remove_seam_keeps_mask_and_buffer_aligned() {
        let mut buf = noise(6, 4, 1);
        let mut mask = ProtectionMask::new(6, 4);
        mask.set_weight(5, 0, 1.0);
        let marker = buf.pixel(5, 0).to_vec();

        remove_seam(&mut buf, Some(&mut mask), &Seam::new(vec![2, 3, 3, 2])).unwrap();

        assert_eq!((buf.width(), mask.width()), (5, 5));
        assert!(mask.is_fully_protected(4, 0));
        assert_eq!(buf.pixel(4, 0), marker.as_slice());
    }

    #[test]
    fn mismatched_mask_is_rejected_before_anything_shrinks() {
        let mut buf = noise(4, 4, 2);
        let before = buf.clone();
        let mut mask = ProtectionMask::new(4, 3);
        let seam = Seam::new(vec![1, 1, 1, 1]);

        let err = remove_seam(&mut buf, Some(&mut mask), &seam).unwrap_err();

        assert!(matches!(
            err,
            Error::MaskMismatch {
                mask_width: 4,
                mask_height: 3,
                width: 4,
                height: 4,
            }
        ));
        assert_eq!(buf, before);
        assert_eq!((mask.width(), mask.height()), (4, 3));
    }

    #[test]
    fn ill_fitting_seam_is_rejected_before_anything_shrinks() {
        let mut buf = noise(4, 4, 2);
        let before = buf.clone();
        let mut mask = ProtectionMask::new(4, 4);
        let seam = Seam::new(vec![1, 2, 4, 3]);

        let err = remove_seam(&mut buf, Some(&mut mask), &seam).unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(buf, before);
        assert_eq!(mask.width(), 4);
    }

    #[test]
    fn every_removed_seam_avoids_protected_pixels() {
        let mut buf = noise(40, 20, 7);
        let mut mask = Some(ProtectionMask::from_regions(
            40,
            20,
            &[Rect::new(12, 0, 8, 20), Rect::new(30, 5, 4, 4)],
        ));

        for _ in 0..18 {
            let energy = EnergyMap::compute(&buf, mask.as_ref()).unwrap();
            let seam = find_vertical_seam(&energy);
            let m = mask.as_ref().unwrap();
            for y in 0..m.height() {
                assert!(!m.is_protected(seam.x(y), y), "seam hit protection at row {y}");
            }
            remove_seam(&mut buf, mask.as_mut(), &seam).unwrap();
        }

        let m = mask.unwrap();
        assert_eq!(m.width(), 22);
        // Every protected pixel survived.
        let protected = m.weights().iter().filter(|&&w| w > 0.0).count();
        assert_eq!(protected, 8 * 20 + 4 * 4);
    }

    #[test]
    fn carver_reports_progress_per_seam() {
        let mut seen = Vec::new();
        let mut on_progress = |p: f32| seen.push(p);
        let mut buf = noise(10, 10, 3);
        let mut mask = None;
        {
            let progress: ProgressFn<'_> = &mut on_progress;
            let mut carver = Carver::new(4, Some(progress), None);
            carver.start().unwrap();
            carver.carve_vertical(&mut buf, &mut mask, 2).unwrap();
            carver.carve_horizontal(&mut buf, &mut mask, 2).unwrap();
        }
        assert_eq!(seen, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!((buf.width(), buf.height()), (8, 8));
    }

    #[test]
    fn carver_stops_when_cancelled() {
        let token = CancelToken::new();
        let mut buf = noise(10, 10, 3);
        let mut mask = None;
        let mut carver = Carver::new(3, None, Some(&token));
        carver.carve_vertical(&mut buf, &mut mask, 1).unwrap();
        token.cancel();
        let err = carver.carve_vertical(&mut buf, &mut mask, 2).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn cancel_during_final_report_keeps_the_result() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let mut seen = Vec::new();
        let mut on_progress = |p: f32| {
            seen.push(p);
            if p >= 100.0 {
                trigger.cancel();
            }
        };
        let mut buf = noise(10, 10, 4);
        let mut mask = None;
        {
            let progress: ProgressFn<'_> = &mut on_progress;
            let mut carver = Carver::new(2, Some(progress), Some(&token));
            carver.start().unwrap();
            carver.carve_vertical(&mut buf, &mut mask, 2).unwrap();
        }
        assert_eq!(seen, vec![50.0, 100.0]);
        assert!(token.is_cancelled());
        assert_eq!(buf.width(), 8);
    }

    #[test]
    fn fully_blocked_image_is_unsatisfiable() {
        // A protected diagonal band leaves no connected unprotected path.
        let mut buf = noise(4, 4, 9);
        let mut mask = ProtectionMask::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                if x != 0 || y == 0 {
                    mask.set_weight(x, y, 1.0);
                }
            }
        }
        let mut mask = Some(mask);
        let mut carver = Carver::new(1, None, None).with_limits((4, 4), (3, 4));
        let err = carver.carve_vertical(&mut buf, &mut mask, 1).unwrap_err();
        assert!(matches!(err, Error::ProtectionUnsatisfiable { .. }));
        assert_eq!(buf.width(), 4);
    }
}
