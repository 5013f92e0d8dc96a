//! Keyframe tracks and interpolation.

use super::easing::Easing;
use crate::shapes::NodeAttrs;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Partial set of animatable properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimatedProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl AnimatedProperties {
    /// Position-only properties.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Capture every property from a node.
    pub fn from_attrs(attrs: &NodeAttrs) -> Self {
        Self {
            x: Some(attrs.x),
            y: Some(attrs.y),
            scale_x: Some(attrs.scale_x),
            scale_y: Some(attrs.scale_y),
            rotation: Some(attrs.rotation),
            opacity: Some(attrs.opacity),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Interpolate the properties present on both sides; the rest are left unset.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        fn mix(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                _ => None,
            }
        }
        Self {
            x: mix(self.x, other.x, t),
            y: mix(self.y, other.y, t),
            scale_x: mix(self.scale_x, other.scale_x, t),
            scale_y: mix(self.scale_y, other.scale_y, t),
            rotation: mix(self.rotation, other.rotation, t),
            opacity: mix(self.opacity, other.opacity, t),
        }
    }

    /// Overwrite the properties that are present in `other`.
    pub fn merge(&mut self, other: &Self) {
        fn pick(current: &mut Option<f64>, incoming: Option<f64>) {
            if incoming.is_some() {
                *current = incoming;
            }
        }
        pick(&mut self.x, other.x);
        pick(&mut self.y, other.y);
        pick(&mut self.scale_x, other.scale_x);
        pick(&mut self.scale_y, other.scale_y);
        pick(&mut self.rotation, other.rotation);
        pick(&mut self.opacity, other.opacity);
    }

    /// Write the present properties onto node attributes.
    pub fn apply_to(&self, attrs: &mut NodeAttrs) {
        if let Some(v) = self.x {
            attrs.x = v;
        }
        if let Some(v) = self.y {
            attrs.y = v;
        }
        if let Some(v) = self.scale_x {
            attrs.scale_x = v;
        }
        if let Some(v) = self.scale_y {
            attrs.scale_y = v;
        }
        if let Some(v) = self.rotation {
            attrs.rotation = v;
        }
        if let Some(v) = self.opacity {
            attrs.opacity = v;
        }
    }
}

/// A timestamped property set on one object's track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Milliseconds from the start of the animation.
    pub timestamp: f64,
    #[serde(default)]
    pub properties: AnimatedProperties,
    /// Curve used when interpolating towards this keyframe.
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(timestamp: f64, properties: AnimatedProperties) -> Self {
        Self {
            timestamp: timestamp.max(0.0),
            properties,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Keyframe track for one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAnimation {
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(rename = "loop", default)]
    pub looping: bool,
}

impl ObjectAnimation {
    /// Insert a keyframe, keeping the track ordered by timestamp.
    ///
    /// Equal timestamps keep insertion order, so the most recently added one wins
    /// as the bounding "before" keyframe.
    pub fn insert(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
        self.sort();
    }

    /// Stable sort by timestamp.
    pub fn sort(&mut self) {
        self.keyframes
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Timestamp of the last keyframe.
    pub fn end_time(&self) -> Option<f64> {
        self.keyframes
            .iter()
            .map(|k| k.timestamp)
            .max_by(f64::total_cmp)
    }

    /// Properties in effect at `time` ms.
    ///
    /// `None` for an empty track. Before the first keyframe the first keyframe's
    /// values hold, after the last keyframe the last one's do.
    pub fn sample(&self, time: f64, total_duration: f64) -> Option<AnimatedProperties> {
        match self.keyframes.as_slice() {
            [] => return None,
            [only] => return Some(only.properties),
            _ => {}
        }

        let keyframes: Cow<'_, [Keyframe]> =
            if self.keyframes.is_sorted_by(|a, b| a.timestamp <= b.timestamp) {
                Cow::Borrowed(&self.keyframes)
            } else {
                let mut sorted = self.keyframes.clone();
                sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
                Cow::Owned(sorted)
            };

        let time = if self.looping {
            let last = keyframes.last().map_or(0.0, |k| k.timestamp);
            let period = if last > 0.0 { last } else { total_duration };
            if period > 0.0 { time.rem_euclid(period) } else { time }
        } else {
            time
        };

        let before = keyframes.iter().rev().find(|k| k.timestamp <= time);
        let after = keyframes.iter().find(|k| k.timestamp > time);

        match (before, after) {
            (Some(before), Some(after)) => {
                let span = after.timestamp - before.timestamp;
                let progress = ((time - before.timestamp) / span).clamp(0.0, 1.0);
                let eased = after.easing.apply(progress);
                Some(before.properties.lerp(&after.properties, eased))
            }
            (Some(only), None) | (None, Some(only)) => Some(only.properties),
            (None, None) => None,
        }
    }
}
