//! Designer-authored response curves.
//!
//! A curve is plain data: a sorted list of keyframes plus the interpolation
//! used between neighbouring keys. Inputs outside the key range hold the value
//! of the nearest end key.

use serde::{Deserialize, Serialize};

use crate::{CityGrooveError, Result};

/// Interpolation applied between two neighbouring keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Cubic Hermite segment with flat tangents at both keys (ease in/out).
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Sampled function mapping a normalised input to an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    pub keys: Vec<Keyframe>,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl ResponseCurve {
    pub fn new(keys: Vec<Keyframe>, interpolation: Interpolation) -> Self {
        Self {
            keys,
            interpolation,
        }
    }

    /// Straight line from (0, 0) to (1, 1).
    pub fn linear() -> Self {
        Self::new(
            vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)],
            Interpolation::Linear,
        )
    }

    /// S-shaped curve from (0, 0) to (1, 1) with flat ends.
    pub fn ease_in_out() -> Self {
        Self::new(
            vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)],
            Interpolation::Smooth,
        )
    }

    /// Curve that ignores its input.
    pub fn constant(value: f32) -> Self {
        Self::new(
            vec![Keyframe::new(0.0, value), Keyframe::new(1.0, value)],
            Interpolation::Linear,
        )
    }

    /// Checks that the curve has keys, that every key is finite and that key
    /// times never decrease.
    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(CityGrooveError::config("response curve has no keys"));
        }

        if self
            .keys
            .iter()
            .any(|key| !key.time.is_finite() || !key.value.is_finite())
        {
            return Err(CityGrooveError::config(
                "response curve keys must be finite",
            ));
        }

        if self.keys.windows(2).any(|pair| pair[1].time < pair[0].time) {
            return Err(CityGrooveError::config(
                "response curve keys must be sorted by time",
            ));
        }

        Ok(())
    }

    /// Samples the curve at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if x.is_nan() || x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        // first.time < x < last.time, so the index lands in 1..len.
        let index = self.keys.partition_point(|key| key.time <= x);
        let a = self.keys[index - 1];
        let b = self.keys[index];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }

        let mut t = (x - a.time) / span;
        if self.interpolation == Interpolation::Smooth {
            t = t * t * (3.0 - 2.0 * t);
        }
        a.value + (b.value - a.value) * t
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::linear()
    }
}
