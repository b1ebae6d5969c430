// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe curves and the normalized progress curve.
//!
//! [`Curve`] is a general keyframe curve used by property animators.
//! [`ProgressCurve`] wraps one with the progress-domain rules:
//! - first key at t=0, last key at t=1
//! - key times and values inside [0, 1]
//! - at least two keys
//!
//! Those rules are applied by [`ProgressCurve::normalized`], an editor-side
//! pass. A driver accepts any curve as-is at runtime.

use crate::keyframe::{CurveKey, Interpolation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something that maps a query time to a value
pub trait Evaluate {
    /// Evaluate at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

/// A keyframe curve with Hermite segments
///
/// Queries before the first key or after the last key clamp to the end
/// values. An empty curve evaluates to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct Curve {
    keys: Vec<CurveKey>,
}

impl Curve {
    /// Create a curve from keys (sorted by time)
    pub fn new(keys: Vec<CurveKey>) -> Self {
        let mut curve = Self { keys };
        curve.sort_keys();
        curve
    }

    /// Straight line from `(t0, v0)` to `(t1, v1)`
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::from_points(&[(t0, v0), (t1, v1)])
    }

    /// Curve holding `value` over [0, 1]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![CurveKey::new(0.0, value), CurveKey::new(1.0, value)])
    }

    /// Flat-tangent ease between two points
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::new(vec![CurveKey::new(t0, v0), CurveKey::new(t1, v1)])
    }

    /// Piecewise-linear curve through the given points
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let mut curve = Self::new(
            points
                .iter()
                .map(|&(time, value)| CurveKey::new(time, value))
                .collect(),
        );
        curve.set_linear_tangents();
        curve
    }

    /// Add a key, keeping keys ordered
    pub fn add_key(&mut self, key: CurveKey) {
        self.keys.push(key);
        self.sort_keys();
    }

    /// Get all keys
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Get key count
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the curve has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the first key (0 for an empty curve)
    pub fn start_time(&self) -> f32 {
        self.keys.first().map_or(0.0, |k| k.time)
    }

    /// Time of the last key (0 for an empty curve)
    pub fn end_time(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Time between the first and last key
    pub fn time_span(&self) -> f32 {
        self.end_time() - self.start_time()
    }

    /// Recompute tangents so every segment is a straight line
    pub fn set_linear_tangents(&mut self) {
        let slopes: Vec<f32> = self
            .keys
            .windows(2)
            .map(|w| {
                let span = w[1].time - w[0].time;
                if span.abs() < f32::EPSILON {
                    0.0
                } else {
                    (w[1].value - w[0].value) / span
                }
            })
            .collect();

        let count = self.keys.len();
        for (i, key) in self.keys.iter_mut().enumerate() {
            if i > 0 {
                key.in_tangent = slopes[i - 1];
            }
            if i + 1 < count {
                key.out_tangent = slopes[i];
            }
        }
    }

    fn sort_keys(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

impl Evaluate for Curve {
    fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; 1..len because of the clamps above.
        let next = self.keys.partition_point(|k| k.time <= t);
        Interpolation::segment(&self.keys[next - 1], &self.keys[next], t)
    }
}

impl From<Vec<CurveKey>> for Curve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<CurveKey> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

/// A progress curve rule violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// Fewer than two keys
    #[error("Progress curve needs at least 2 keys, found {0}")]
    TooFewKeys(usize),

    /// First key is not at t=0
    #[error("First key must be at t=0, found t={0}")]
    FirstKeyTime(f32),

    /// Last key is not at t=1
    #[error("Last key must be at t=1, found t={0}")]
    LastKeyTime(f32),

    /// A key lies outside the unit square
    #[error("Key {index} at ({time}, {value}) is outside [0, 1]")]
    OutOfRange {
        /// Key index
        index: usize,
        /// Key time
        time: f32,
        /// Key value
        value: f32,
    },
}

/// Curve mapping normalized playback time to progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressCurve(Curve);

impl ProgressCurve {
    /// Wrap keys without any checks
    pub fn new(keys: Vec<CurveKey>) -> Self {
        Self(Curve::new(keys))
    }

    /// The identity curve: (0, 0) to (1, 1), linear
    pub fn linear() -> Self {
        Self(Curve::linear(0.0, 0.0, 1.0, 1.0))
    }

    /// Flat-tangent ease from 0 to 1
    pub fn ease_in_out() -> Self {
        Self(Curve::ease_in_out(0.0, 0.0, 1.0, 1.0))
    }

    /// Get the underlying curve
    pub fn curve(&self) -> &Curve {
        &self.0
    }

    /// Get all keys
    pub fn keys(&self) -> &[CurveKey] {
        self.0.keys()
    }

    /// Check the progress-domain rules
    pub fn validate(&self) -> Result<(), CurveError> {
        let keys = self.0.keys();
        if keys.len() < 2 {
            return Err(CurveError::TooFewKeys(keys.len()));
        }

        for (index, key) in keys.iter().enumerate() {
            if !(0.0..=1.0).contains(&key.time) || !(0.0..=1.0).contains(&key.value) {
                return Err(CurveError::OutOfRange {
                    index,
                    time: key.time,
                    value: key.value,
                });
            }
        }

        let first = self.0.start_time();
        if first != 0.0 {
            return Err(CurveError::FirstKeyTime(first));
        }
        let last = self.0.end_time();
        if last != 1.0 {
            return Err(CurveError::LastKeyTime(last));
        }
        Ok(())
    }

    /// Synthesize keys until there are at least two
    ///
    /// An empty curve gains a key at (0, 0); a single key gains a partner
    /// one time unit later with value 1. Logs a warning when repairing.
    pub fn ensure_min_keys(&mut self) {
        let count = self.0.len();
        if count >= 2 {
            return;
        }

        tracing::warn!("Progress curve must have at least 2 keys (found {count}), adding a key");
        if count == 0 {
            self.0.add_key(CurveKey::new(0.0, 0.0));
        }
        let first_time = self.0.start_time();
        self.0.add_key(CurveKey::new(first_time + 1.0, 1.0));
    }

    /// Return a copy that satisfies every progress-domain rule
    ///
    /// Keys are clamped into [0, 1], then the first and last keys are pinned
    /// to t=0 and t=1. Tangents are kept, so the evaluated value may still
    /// leave [0, 1] between keys.
    pub fn normalized(&self) -> Self {
        let mut repaired = self.clone();
        repaired.ensure_min_keys();

        let mut keys: Vec<CurveKey> = repaired
            .0
            .keys()
            .iter()
            .map(|k| CurveKey {
                time: k.time.clamp(0.0, 1.0),
                value: k.value.clamp(0.0, 1.0),
                ..*k
            })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(first) = keys.first_mut() {
            first.time = 0.0;
        }
        if let Some(last) = keys.last_mut() {
            last.time = 1.0;
        }

        Self(Curve { keys })
    }
}

impl Default for ProgressCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl Evaluate for ProgressCurve {
    fn evaluate(&self, t: f32) -> f32 {
        self.0.evaluate(t)
    }
}

impl From<Curve> for ProgressCurve {
    fn from(curve: Curve) -> Self {
        Self(curve)
    }
}
