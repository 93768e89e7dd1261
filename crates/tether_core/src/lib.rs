//! Tether Core
//!
//! Foundational primitives shared by the tether drag engine:
//!
//! - **Geometry**: points, rects, vectors, affine transforms and colors
//! - **Rubber Band**: the curve linking a dragged badge to its anchor
//! - **Draw Context**: the rendering API the overlay paints through
//! - **Pictures**: immutable recorded snapshots that can be redrawn anywhere
//!
//! # Example
//!
//! ```rust
//! use tether_core::{Point, Rect, RubberBand};
//!
//! let target = Rect::new(180.0, 80.0, 40.0, 40.0);
//! let band = RubberBand::compute(Point::new(100.0, 100.0), 10.0, target, (20.0, 20.0));
//! assert!(band.is_some());
//! ```

pub mod band;
pub mod draw;
pub mod geometry;

pub use band::RubberBand;
pub use draw::{DrawCommand, DrawContext, ImageId, Path, PathCommand, Picture, RecordingContext};
pub use geometry::{clamp, Affine2D, Color, Point, Rect, Size, Vec2};
