//! Tether Animation System
//!
//! Time-driven animators for the drag engine.
//!
//! # Features
//!
//! - **Easing**: linear, accelerate/decelerate and damped-oscillation curves
//! - **Value Animators**: fixed-duration `f32` interpolation with lifecycle events
//! - **Listener Sets**: deduplicated observers that can be merged across animators
//! - **Scheduler**: cooperative, single-threaded clock driven by the host

pub mod animator;
pub mod damping;
pub mod easing;
pub mod listener;
pub mod scheduler;

pub use animator::{AnimatorState, ValueAnimator};
pub use damping::DampingCurve;
pub use easing::Easing;
pub use listener::{AnimatorListener, ListenerSet};
pub use scheduler::{Animation, AnimationId, AnimationScheduler};
