//! Gain curves for the start-of-playback volume ramp
//!
//! A ramp walks a normalized position from 0.0 to 1.0 in fixed steps; the
//! curve maps that position to the slot volume.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Ramp curve types
///
/// - Linear: constant rate of change (each step adds the same volume)
/// - Exponential: slow start, fast finish
/// - SCurve: smooth acceleration and deceleration
/// - EqualPower: constant perceived loudness growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GainCurve {
    /// v(t) = t
    #[default]
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine")]
    SCurve,

    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl GainCurve {
    /// Volume multiplier at normalized ramp position (clamped to 0.0..=1.0)
    pub fn gain_at(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            GainCurve::Linear => t,
            GainCurve::Exponential => t * t,
            GainCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            GainCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Parse curve from a config string
    ///
    /// Accepts `linear`, `exponential`, `cosine`/`s_curve`/`scurve`/`s-curve`
    /// and `equal_power`/`equalpower`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(GainCurve::Linear),
            "exponential" => Some(GainCurve::Exponential),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(GainCurve::SCurve),
            "equal_power" | "equalpower" => Some(GainCurve::EqualPower),
            _ => None,
        }
    }

    /// All available curves
    pub fn all_variants() -> &'static [GainCurve] {
        &[
            GainCurve::Linear,
            GainCurve::Exponential,
            GainCurve::SCurve,
            GainCurve::EqualPower,
        ]
    }
}

impl std::fmt::Display for GainCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainCurve::Linear => write!(f, "linear"),
            GainCurve::Exponential => write!(f, "exponential"),
            GainCurve::SCurve => write!(f, "s_curve"),
            GainCurve::EqualPower => write!(f, "equal_power"),
        }
    }
}
