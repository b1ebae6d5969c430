// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color gradients.
//!
//! A [`Gradient`] keeps color keys and alpha keys on separate tracks, both
//! over the time range [0, 1]. Colors are linear RGBA stored in a `Vec4`.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Opaque white
pub const WHITE: Vec4 = Vec4::ONE;

/// How a gradient blends between keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMode {
    /// Linear blend between neighbouring keys
    #[default]
    Blend,
    /// Hold the value of the next key
    Fixed,
}

/// A color key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    /// RGB color
    pub color: Vec3,
    /// Position in [0, 1]
    pub time: f32,
}

impl ColorKey {
    /// Create a color key
    pub fn new(color: Vec3, time: f32) -> Self {
        Self { color, time }
    }
}

/// An alpha key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaKey {
    /// Alpha value
    pub alpha: f32,
    /// Position in [0, 1]
    pub time: f32,
}

impl AlphaKey {
    /// Create an alpha key
    pub fn new(alpha: f32, time: f32) -> Self {
        Self { alpha, time }
    }
}

/// Color and alpha keys over [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    color_keys: Vec<ColorKey>,
    alpha_keys: Vec<AlphaKey>,
    /// Blend mode
    pub mode: GradientMode,
}

impl Gradient {
    /// Create a gradient; keys are sorted by time
    pub fn new(mut color_keys: Vec<ColorKey>, mut alpha_keys: Vec<AlphaKey>) -> Self {
        color_keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        alpha_keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            color_keys,
            alpha_keys,
            mode: GradientMode::Blend,
        }
    }

    /// Opaque blend between two colors
    pub fn two_color(from: Vec3, to: Vec3) -> Self {
        Self::new(
            vec![ColorKey::new(from, 0.0), ColorKey::new(to, 1.0)],
            vec![AlphaKey::new(1.0, 0.0)],
        )
    }

    /// Set the blend mode
    pub fn with_mode(mut self, mode: GradientMode) -> Self {
        self.mode = mode;
        self
    }

    /// Color keys
    pub fn color_keys(&self) -> &[ColorKey] {
        &self.color_keys
    }

    /// Alpha keys
    pub fn alpha_keys(&self) -> &[AlphaKey] {
        &self.alpha_keys
    }

    /// Whether there are no color keys
    pub fn is_empty(&self) -> bool {
        self.color_keys.is_empty()
    }

    /// Evaluate at `t`
    ///
    /// Missing color keys read as white and missing alpha keys as opaque.
    pub fn evaluate(&self, t: f32) -> Vec4 {
        let t = t.clamp(0.0, 1.0);
        let rgb = sample(&self.color_keys, self.mode, t, |k| (k.time, k.color), Vec3::ONE, Vec3::lerp);
        let alpha = sample(&self.alpha_keys, self.mode, t, |k| (k.time, k.alpha), 1.0, |a, b, s| {
            a + (b - a) * s
        });
        rgb.extend(alpha)
    }
}

fn sample<K, V: Copy>(
    keys: &[K],
    mode: GradientMode,
    t: f32,
    key: impl Fn(&K) -> (f32, V),
    empty: V,
    lerp: impl Fn(V, V, f32) -> V,
) -> V {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return empty;
    };
    let (first_time, first_value) = key(first);
    let (last_time, last_value) = key(last);
    if t.is_nan() || t <= first_time {
        return first_value;
    }
    if t >= last_time {
        return last_value;
    }

    let next = keys.partition_point(|k| key(k).0 < t);
    let (t1, v1) = key(&keys[next]);
    match mode {
        GradientMode::Fixed => v1,
        GradientMode::Blend => {
            let (t0, v0) = key(&keys[next - 1]);
            let span = t1 - t0;
            if span <= f32::EPSILON {
                v1
            } else {
                lerp(v0, v1, (t - t0) / span)
            }
        }
    }
}
