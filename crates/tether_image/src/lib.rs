//! Tether Image
//!
//! Frame decoding for disappear animations.
//!
//! - [`ImageData`]: decoded RGBA pixels (PNG via the `image` crate)
//! - [`FrameLoader`]: resolves frame names to pixels (files, memory, closures)
//! - [`FrameCache`]: weakly memoised frames so repeated animations skip decoding

pub mod cache;
pub mod error;
pub mod loader;

pub use cache::{FrameCache, FrameImage};
pub use error::{ImageError, Result};
pub use loader::{FileFrameLoader, FrameLoader, ImageData, MemoryFrameLoader};
