//! Easing functions
//!
//! Maps linear animation progress `t ∈ [0, 1]` to an interpolated fraction.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::damping::DampingCurve;

/// Interpolation curve applied to an animator's progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant rate
    Linear,
    /// Starts and ends slowly, faster in the middle
    #[default]
    AccelerateDecelerate,
    /// Decaying oscillation around the end value
    Damping(DampingCurve),
}

impl Easing {
    /// Apply the easing to a linear progress value
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        // Exact endpoints regardless of float error in the curve
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Easing::Linear => t,
            Easing::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
            Easing::Damping(curve) => curve.fraction(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn test_accelerate_decelerate_is_symmetric() {
        let easing = Easing::AccelerateDecelerate;
        assert!(easing.apply(0.0).abs() < 1e-6);
        assert!((easing.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        assert!(easing.apply(0.1) < 0.1);
    }

    #[test]
    fn test_damping_overshoots() {
        let easing = Easing::Damping(DampingCurve::lively());
        let overshoot = (1..100).map(|i| easing.apply(i as f32 / 100.0)).any(|v| v > 1.0);
        assert!(overshoot);
        assert_eq!(easing.apply(1.0), 1.0);
    }
}
