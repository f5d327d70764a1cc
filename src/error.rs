//! Error types for the content-aware-resize crate.

/// Errors that can occur while building masks, carving seams, or processing files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested target size is not a valid shrink of the source.
    #[error("invalid resize request: {0}")]
    InvalidRequest(String),

    /// The protected region cannot fit inside the requested target size.
    #[error(
        "protected region ({protected_width}x{protected_height}) does not fit target \
         {target_width}x{target_height}"
    )]
    ProtectionUnsatisfiable {
        /// Width of the protected bounding box in pixels.
        protected_width: u32,
        /// Height of the protected bounding box in pixels.
        protected_height: u32,
        /// Requested output width.
        target_width: u32,
        /// Requested output height.
        target_height: u32,
    },

    /// The resize was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("resize cancelled")]
    Cancelled,

    /// A protection mask does not have the same dimensions as its buffer.
    #[error("mask is {mask_width}x{mask_height} but image is {width}x{height}")]
    MaskMismatch {
        /// Mask width in pixels.
        mask_width: u32,
        /// Mask height in pixels.
        mask_height: u32,
        /// Buffer width in pixels.
        width: u32,
        /// Buffer height in pixels.
        height: u32,
    },

    /// Pixel data does not describe a valid RGB/RGBA buffer.
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// Mask weights are malformed (wrong length, NaN, or out of `[0, 1]`).
    #[error("invalid protection mask: {0}")]
    InvalidMask(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether this is a cooperative cancellation rather than a real failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
