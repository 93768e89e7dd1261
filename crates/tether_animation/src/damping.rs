//! Damped oscillation curve
//!
//! Stylised spring settle used when a dragged badge snaps back to its
//! anchor. The curve is a closed-form decaying cosine rather than an
//! integrated spring, so a return animation always lasts exactly its
//! configured duration and ends exactly at rest.
//!
//! The weight starts at 1, overshoots the rest position `bounces` times with
//! shrinking amplitude and reaches exactly 0 at `t = 1`:
//!
//! ```text
//! weight(t) = (1 - t)² · cos(π · (bounces + ½) · t)
//! ```

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Configuration for a damped return curve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DampingCurve {
    /// How many times the motion crosses the rest position before settling
    pub bounces: u32,
}

impl DampingCurve {
    /// Create a new curve with the given number of overshoots
    pub fn new(bounces: u32) -> Self {
        Self { bounces }
    }

    /// No overshoot, an eased slide home
    pub fn settle() -> Self {
        Self { bounces: 0 }
    }

    /// One soft overshoot
    pub fn gentle() -> Self {
        Self { bounces: 1 }
    }

    /// Two overshoots (good for badges)
    pub fn lively() -> Self {
        Self { bounces: 2 }
    }

    /// Several quick wobbles
    pub fn jelly() -> Self {
        Self { bounces: 4 }
    }

    /// Remaining displacement at progress `t`, `1.0` at the start and `0.0` at rest
    pub fn weight(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return 0.0;
        }
        let decay = (1.0 - t) * (1.0 - t);
        let frequency = PI * (self.bounces as f32 + 0.5);
        decay * (frequency * t).cos()
    }

    /// Interpolated fraction at progress `t` (the complement of [`weight`](Self::weight))
    pub fn fraction(&self, t: f32) -> f32 {
        1.0 - self.weight(t)
    }

    /// Number of times the weight changes sign over `samples` evenly spaced points
    pub fn sign_changes(&self, samples: usize) -> usize {
        let mut changes = 0;
        let mut previous = self.weight(0.0);
        for i in 1..samples {
            let w = self.weight(i as f32 / samples as f32);
            if w != 0.0 && previous != 0.0 && (w > 0.0) != (previous > 0.0) {
                changes += 1;
            }
            if w != 0.0 {
                previous = w;
            }
        }
        changes
    }
}

impl Default for DampingCurve {
    fn default() -> Self {
        Self::lively()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_endpoints() {
        for bounces in 0..6 {
            let curve = DampingCurve::new(bounces);
            assert_eq!(curve.weight(0.0), 1.0);
            assert_eq!(curve.weight(1.0), 0.0);
            assert_eq!(curve.fraction(0.0), 0.0);
            assert_eq!(curve.fraction(1.0), 1.0);
        }
    }

    #[test]
    fn test_curve_overshoots_bounce_count_times() {
        assert_eq!(DampingCurve::settle().sign_changes(1000), 0);
        assert_eq!(DampingCurve::gentle().sign_changes(1000), 1);
        assert_eq!(DampingCurve::lively().sign_changes(1000), 2);
        assert_eq!(DampingCurve::jelly().sign_changes(1000), 4);
    }

    #[test]
    fn test_amplitude_decays() {
        let curve = DampingCurve::lively();
        // Peaks shrink: sample the envelope at increasing t
        let early = curve.weight(0.05).abs();
        let late = curve.weight(0.8).abs();
        assert!(late < early);
    }

    #[test]
    fn test_out_of_range_progress_is_clamped() {
        let curve = DampingCurve::gentle();
        assert_eq!(curve.weight(-1.0), 1.0);
        assert_eq!(curve.weight(2.0), 0.0);
    }
}
