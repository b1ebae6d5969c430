// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and interpolation helpers.

use serde::{Deserialize, Serialize};

/// Keys closer together than this are treated as sharing one time.
pub(crate) const TIME_EPSILON: f32 = 0.0001;

/// A keyframe on a curve
///
/// Tangents are slopes (value units per time unit). An infinite tangent on
/// either side of a segment makes that segment constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Time of the key
    pub time: f32,
    /// Value at this key
    pub value: f32,
    /// Incoming tangent (slope arriving at the key)
    #[serde(default)]
    pub in_tangent: f32,
    /// Outgoing tangent (slope leaving the key)
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    /// Create a key with flat tangents
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    /// Set both tangents
    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }

    /// Make the segment leaving this key a step
    pub fn constant(mut self) -> Self {
        self.out_tangent = f32::INFINITY;
        self
    }

    /// Whether the segment between `self` and `next` holds `self.value`
    pub fn is_step_to(&self, next: &CurveKey) -> bool {
        !self.out_tangent.is_finite() || !next.in_tangent.is_finite()
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Hermite spline interpolation
    ///
    /// `m0` and `m1` are tangents already scaled to the segment length.
    pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Evaluate the segment between two keys at an absolute time
    pub fn segment(k0: &CurveKey, k1: &CurveKey, time: f32) -> f32 {
        let span = k1.time - k0.time;
        if span.abs() < TIME_EPSILON {
            return k1.value;
        }
        if k0.is_step_to(k1) {
            return k0.value;
        }

        let t = (time - k0.time) / span;
        Self::hermite(
            k0.value,
            k0.out_tangent * span,
            k1.value,
            k1.in_tangent * span,
            t,
        )
    }
}
