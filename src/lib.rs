//! Content-aware image shrinking with protected regions.
//!
//! Images are shrunk by seam carving: the least important connected column
//! (or row) of pixels is removed one at a time until the target size is
//! reached. Regions marked in a [`ProtectionMask`] (logos, text) carry a
//! large energy bias and are never removed.
//!
//! # Quick Start
//!
//! ```no_run
//! use content_aware_resize::{resize, PixelBuffer, ProtectionMask, Rect, ResizeRequest};
//!
//! let img = image::open("banner.png").unwrap();
//! let source = PixelBuffer::from_dynamic(&img);
//! let mask = ProtectionMask::from_regions(
//!     source.width(),
//!     source.height(),
//!     &[Rect::new(40, 20, 120, 60)],
//! );
//!
//! let resized = resize(
//!     ResizeRequest::new(&source, source.width() * 3 / 4, source.height())
//!         .with_mask(&mask),
//! )
//! .unwrap();
//! resized.into_dynamic().save("banner_small.png").unwrap();
//! ```
//!
//! # Progress and cancellation
//!
//! Long resizes report a percentage after every seam and stop between seams
//! when their [`CancelToken`] fires. A [`ResizeSession`] cancels the previous
//! job whenever a new one begins.
//!
//! ```no_run
//! use content_aware_resize::{resize, PixelBuffer, ResizeRequest, ResizeSession};
//!
//! let session = ResizeSession::new();
//! let source = PixelBuffer::from_dynamic(&image::open("banner.png").unwrap());
//! let token = session.begin();
//! let mut on_progress = |pct: f32| eprintln!("{pct:.0}%");
//! match resize(
//!     ResizeRequest::new(&source, 300, 200)
//!         .with_progress(&mut on_progress)
//!         .with_cancel(&token),
//! ) {
//!     Ok(out) => println!("{}x{}", out.width(), out.height()),
//!     Err(e) if e.is_cancelled() => println!("superseded"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#![deny(missing_docs)]

pub mod buffer;
mod cancel;
pub mod carver;
pub mod energy;
mod engine;
pub mod error;
pub mod mask;
mod resize;
pub mod seam;

pub use buffer::PixelBuffer;
pub use cancel::{CancelToken, ResizeSession};
pub use carver::{remove_seam, ProgressFn};
pub use energy::EnergyMap;
pub use engine::{
    default_output_path, is_supported_image, process_directory, process_file, save_image,
    ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use mask::{merge_text_regions, ProtectionMask, Rect};
pub use resize::{resize, target_from_percent, CarveOrder, ResizeRequest, MAX_PERCENT, MIN_PERCENT};
pub use seam::{find_vertical_seam, Seam};
