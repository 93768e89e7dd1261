//! Overlay animations
//!
//! - [`DampingAnimator`]: springs the ghost back to its anchor
//! - [`DisappearAnimator`]: plays a frame sequence into one or more rects
//! - [`DisappearAnimatorSet`]: chains disappear animators into one playback
//!
//! All three implement [`tether_animation::Animation`] and are driven by the
//! engine's scheduler.

mod damping;
mod disappear;
mod disappear_set;

pub use damping::DampingAnimator;
pub use disappear::DisappearAnimator;
pub use disappear_set::{DisappearAnimatorSet, SetBuilder};
