//! Easing curves over normalized progress.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

const BACK_OVERSHOOT: f64 = 1.70158;

/// Named easing function applied to keyframe progress.
///
/// Every curve maps `0 -> 0` and `1 -> 1`; Back and Elastic overshoot in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    BackEaseIn,
    BackEaseOut,
    BackEaseInOut,
    ElasticEaseIn,
    ElasticEaseOut,
    ElasticEaseInOut,
    BounceEaseIn,
    BounceEaseOut,
    BounceEaseInOut,
    StrongEaseIn,
    StrongEaseOut,
    StrongEaseInOut,
}

impl Easing {
    pub const ALL: [Easing; 16] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::BackEaseIn,
        Easing::BackEaseOut,
        Easing::BackEaseInOut,
        Easing::ElasticEaseIn,
        Easing::ElasticEaseOut,
        Easing::ElasticEaseInOut,
        Easing::BounceEaseIn,
        Easing::BounceEaseOut,
        Easing::BounceEaseInOut,
        Easing::StrongEaseIn,
        Easing::StrongEaseOut,
        Easing::StrongEaseInOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseIn => "EaseIn",
            Easing::EaseOut => "EaseOut",
            Easing::EaseInOut => "EaseInOut",
            Easing::BackEaseIn => "BackEaseIn",
            Easing::BackEaseOut => "BackEaseOut",
            Easing::BackEaseInOut => "BackEaseInOut",
            Easing::ElasticEaseIn => "ElasticEaseIn",
            Easing::ElasticEaseOut => "ElasticEaseOut",
            Easing::ElasticEaseInOut => "ElasticEaseInOut",
            Easing::BounceEaseIn => "BounceEaseIn",
            Easing::BounceEaseOut => "BounceEaseOut",
            Easing::BounceEaseInOut => "BounceEaseInOut",
            Easing::StrongEaseIn => "StrongEaseIn",
            Easing::StrongEaseOut => "StrongEaseOut",
            Easing::StrongEaseInOut => "StrongEaseInOut",
        }
    }

    /// Evaluate the curve at `t` (expected in `[0, 1]`).
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => -t * (t - 2.0),
            Easing::EaseInOut => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t * t
                } else {
                    let t = t - 1.0;
                    -0.5 * (t * (t - 2.0) - 1.0)
                }
            }
            Easing::BackEaseIn => back_in(t, BACK_OVERSHOOT),
            Easing::BackEaseOut => back_out(t, BACK_OVERSHOOT),
            Easing::BackEaseInOut => {
                let s = BACK_OVERSHOOT * 1.525;
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * (t * t * ((s + 1.0) * t - s))
                } else {
                    let t = t - 2.0;
                    0.5 * (t * t * ((s + 1.0) * t + s) + 2.0)
                }
            }
            Easing::ElasticEaseIn => elastic_in(t, 0.3),
            Easing::ElasticEaseOut => elastic_out(t, 0.3),
            Easing::ElasticEaseInOut => {
                if t <= 0.0 {
                    return 0.0;
                }
                if t >= 1.0 {
                    return 1.0;
                }
                let p = 0.3 * 1.5;
                let s = p / 4.0;
                let t = t * 2.0 - 1.0;
                if t < 0.0 {
                    -0.5 * (2f64.powf(10.0 * t) * ((t - s) * TAU / p).sin())
                } else {
                    2f64.powf(-10.0 * t) * ((t - s) * TAU / p).sin() * 0.5 + 1.0
                }
            }
            Easing::BounceEaseIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceEaseOut => bounce_out(t),
            Easing::BounceEaseInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - t * 2.0)) * 0.5
                } else {
                    bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
                }
            }
            Easing::StrongEaseIn => t.powi(5),
            Easing::StrongEaseOut => (t - 1.0).powi(5) + 1.0,
            Easing::StrongEaseInOut => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t.powi(5)
                } else {
                    0.5 * ((t - 2.0).powi(5) + 2.0)
                }
            }
        }
    }
}

fn back_in(t: f64, s: f64) -> f64 {
    t * t * ((s + 1.0) * t - s)
}

fn back_out(t: f64, s: f64) -> f64 {
    let t = t - 1.0;
    t * t * ((s + 1.0) * t + s) + 1.0
}

fn elastic_in(t: f64, period: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let s = period / 4.0;
    let t = t - 1.0;
    -(2f64.powf(10.0 * t) * ((t - s) * TAU / period).sin())
}

fn elastic_out(t: f64, period: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let s = period / 4.0;
    2f64.powf(-10.0 * t) * ((t - s) * TAU / period).sin() + 1.0
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized easing name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown easing: {0}")]
pub struct UnknownEasing(pub String);

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| UnknownEasing(s.to_string()))
    }
}
