//! File-level processing: decode, build the protection mask, resize, encode.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::buffer::PixelBuffer;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::mask::{merge_text_regions, ProtectionMask, Rect, FULLY_PROTECTED};
use crate::resize::{resize, target_from_percent, CarveOrder, ResizeRequest};

/// Options controlling how files are resized.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Output width as a percentage of the original (10-100).
    pub width_percent: f32,
    /// Output height as a percentage of the original (10-100).
    pub height_percent: f32,
    /// Absolute output width; overrides `width_percent`.
    pub target_width: Option<u32>,
    /// Absolute output height; overrides `height_percent`.
    pub target_height: Option<u32>,
    /// Which axis to carve first.
    pub order: CarveOrder,
    /// Rectangles to protect fully.
    pub protect: Vec<Rect>,
    /// Text boxes (e.g. from OCR) to merge, pad, and protect.
    pub text_boxes: Vec<Rect>,
    /// Text boxes this close (in pixels) are merged into one region.
    pub text_proximity: u32,
    /// Padding added around each merged text region.
    pub text_padding: u32,
    /// Grayscale mask image; brighter pixels are more protected.
    pub mask_path: Option<PathBuf>,
    /// Abort in-flight and pending work when cancelled.
    pub cancel: Option<CancelToken>,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            width_percent: 100.0,
            height_percent: 100.0,
            target_width: None,
            target_height: None,
            order: CarveOrder::default(),
            protect: Vec::new(),
            text_boxes: Vec::new(),
            text_proximity: 12,
            text_padding: 4,
            mask_path: None,
            cancel: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl ProcessOptions {
    /// Absolute target size for a `width x height` source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a percentage is out of range.
    pub fn target_for(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        let (w, h) = target_from_percent(width, height, self.width_percent, self.height_percent)?;
        Ok((
            self.target_width.unwrap_or(w),
            self.target_height.unwrap_or(h),
        ))
    }

    /// Rasterise the configured protection sources for a `width x height` image.
    ///
    /// Returns `None` when nothing is protected.
    ///
    /// # Errors
    ///
    /// Fails if the mask image cannot be read or its size differs from the image.
    pub fn build_mask(&self, width: u32, height: u32) -> Result<Option<ProtectionMask>> {
        let mut mask = match &self.mask_path {
            Some(path) => {
                let luma = image::open(path)?.to_luma8();
                if luma.dimensions() != (width, height) {
                    return Err(Error::MaskMismatch {
                        mask_width: luma.width(),
                        mask_height: luma.height(),
                        width,
                        height,
                    });
                }
                ProtectionMask::from_luma(&luma)
            }
            None => ProtectionMask::new(width, height),
        };

        for rect in &self.protect {
            mask.protect_rect(*rect, FULLY_PROTECTED);
        }
        let text_regions = merge_text_regions(
            &self.text_boxes,
            self.text_proximity,
            self.text_padding,
            width,
            height,
        );
        for rect in text_regions {
            mask.protect_rect(rect, FULLY_PROTECTED);
        }

        Ok(mask.has_protection().then_some(mask))
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (already at the target size).
    pub skipped: bool,
    /// Whether processing was cancelled.
    pub cancelled: bool,
    /// Output dimensions, when an image was produced.
    pub output_size: Option<(u32, u32)>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            cancelled: false,
            output_size: None,
            message: String::new(),
        }
    }
}

enum Outcome {
    Resized { from: (u32, u32), to: (u32, u32) },
    AlreadyAtTarget((u32, u32)),
}

fn resize_file(input: &Path, output: &Path, opts: &ProcessOptions) -> Result<Outcome> {
    let decoded = image::open(input)?;
    let source = PixelBuffer::from_dynamic(&decoded);
    drop(decoded);

    let (w, h) = (source.width(), source.height());
    let (tw, th) = opts.target_for(w, h)?;
    if (tw, th) == (w, h) {
        return Ok(Outcome::AlreadyAtTarget((w, h)));
    }

    let mask = opts.build_mask(w, h)?;
    if let Some(bbox) = mask.as_ref().and_then(ProtectionMask::bounding_box) {
        log::debug!(
            "{}: protecting {}x{} at ({}, {})",
            input.display(),
            bbox.width,
            bbox.height,
            bbox.x,
            bbox.y
        );
    }

    let name = input.display().to_string();
    let mut next_step = 10.0;
    let mut log_progress = |pct: f32| {
        if pct >= next_step {
            log::debug!("{name}: {pct:.0}%");
            while next_step <= pct {
                next_step += 10.0;
            }
        }
    };

    let mut request = ResizeRequest::new(&source, tw, th)
        .with_order(opts.order)
        .with_progress(&mut log_progress);
    if let Some(m) = &mask {
        request = request.with_mask(m);
    }
    if let Some(token) = &opts.cancel {
        request = request.with_cancel(token);
    }
    let resized = resize(request)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_image(&resized.into_dynamic(), output)?;

    Ok(Outcome::Resized {
        from: (w, h),
        to: (tw, th),
    })
}

/// Process a single image file: load, build the mask, resize, save.
///
/// Returns a [`ProcessResult`] indicating success, skip, cancellation, or failure.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let mut result = ProcessResult::new(input);

    match resize_file(input, output, opts) {
        Ok(Outcome::Resized { from, to }) => {
            result.success = true;
            result.output_size = Some(to);
            result.message = format!("Resized {}x{} -> {}x{}", from.0, from.1, to.0, to.1);
        }
        Ok(Outcome::AlreadyAtTarget(size)) => {
            result.success = true;
            result.skipped = true;
            result.message = format!("Already at target size ({}x{})", size.0, size.1);
        }
        Err(e) if e.is_cancelled() => {
            result.cancelled = true;
            result.message = "Cancelled".to_string();
        }
        Err(e) => {
            result.message = format!("Failed: {e}");
        }
    }

    result
}

/// Process all supported images in a directory.
///
/// Each image is an independent resize, so files run in parallel when the
/// `cli` feature is enabled (via rayon). Returns a [`ProcessResult`] for each
/// image found.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            let mut failed = ProcessResult::new(input_dir);
            failed.message = format!("Failed to read directory: {e}");
            return vec![failed];
        }
    };
    inputs.sort();

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            let mut failed = ProcessResult::new(output_dir);
            failed.message = format!("Failed to create output directory: {e}");
            return vec![failed];
        }
    }

    let run = |input: &PathBuf| {
        let output = match input.file_name() {
            Some(name) => output_dir.join(name),
            None => default_output_path(input),
        };
        process_file(input, &output, opts)
    };

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        inputs.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        inputs.iter().map(run).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an image with format-specific settings.
///
/// JPEG is written at quality 100 and drops any alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&img.to_rgb8())?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"banner.png"` becomes `"banner_resized.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_resized.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_appends_resized_suffix() {
        let p = default_output_path(Path::new("/tmp/banner.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/banner_resized.jpg"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "image_resized.png"
        );
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn absolute_targets_override_percentages() {
        let opts = ProcessOptions {
            width_percent: 50.0,
            height_percent: 50.0,
            target_height: Some(70),
            ..ProcessOptions::default()
        };
        assert_eq!(opts.target_for(200, 100).unwrap(), (100, 70));
    }

    #[test]
    fn build_mask_combines_rects_and_merged_text() {
        let opts = ProcessOptions {
            protect: vec![Rect::new(0, 0, 4, 4)],
            text_boxes: vec![Rect::new(20, 20, 5, 5), Rect::new(27, 20, 5, 5)],
            text_proximity: 3,
            text_padding: 1,
            ..ProcessOptions::default()
        };
        let mask = opts.build_mask(40, 40).unwrap().unwrap();
        assert!(mask.is_fully_protected(0, 0));
        // Gap between the words is bridged by the merge.
        assert!(mask.is_fully_protected(26, 22));
        assert!(mask.is_fully_protected(19, 19));
        assert_eq!(mask.bounding_box(), Some(Rect::new(0, 0, 33, 26)));
    }

    #[test]
    fn build_mask_is_none_without_sources() {
        assert!(ProcessOptions::default().build_mask(10, 10).unwrap().is_none());
    }
}
