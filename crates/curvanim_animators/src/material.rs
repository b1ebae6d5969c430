// SPDX-License-Identifier: MIT OR Apache-2.0
//! Material parameter animators.

use crate::float::CurvedValue;
use crate::scene::Material;
use curvanim_core::{Curve, Evaluate, ProgressListener};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default texture whose offset [`MaterialUvOffsetAnimator`] writes
pub const DEFAULT_TEXTURE_PARAM: &str = "_MainTex";

/// An ordered material list without duplicates
#[derive(Debug, Clone, Default)]
struct MaterialSet(Vec<Material>);

impl MaterialSet {
    fn add(&mut self, material: Material) {
        if !self.0.contains(&material) {
            self.0.push(material);
        }
    }

    fn remove(&mut self, material: &Material) -> bool {
        let before = self.0.len();
        self.0.retain(|m| m != material);
        self.0.len() != before
    }
}

impl FromIterator<Material> for MaterialSet {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        let mut set = Self::default();
        for material in iter {
            set.add(material);
        }
        set
    }
}

/// Writes a curved float to a named parameter on every material
#[derive(Debug)]
pub struct MaterialFloatAnimator {
    value: CurvedValue,
    materials: MaterialSet,
    param: String,
}

impl MaterialFloatAnimator {
    /// Create an animator writing `param`
    pub fn new(curve: Curve, param: impl Into<String>) -> Self {
        Self {
            value: CurvedValue::new(curve),
            materials: MaterialSet::default(),
            param: param.into(),
        }
    }

    /// Add initial materials
    pub fn with_materials(mut self, materials: impl IntoIterator<Item = Material>) -> Self {
        self.materials = materials.into_iter().collect();
        self
    }

    /// Add a material; already present materials are ignored
    pub fn add_material(&mut self, material: Material) {
        self.materials.add(material);
    }

    /// Remove a material; returns false if it was not present
    pub fn remove_material(&mut self, material: &Material) -> bool {
        self.materials.remove(material)
    }

    /// Change the parameter written from now on
    pub fn set_param(&mut self, param: impl Into<String>) {
        self.param = param.into();
    }

    /// Parameter name
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Animated materials
    pub fn materials(&self) -> &[Material] {
        &self.materials.0
    }

    /// Last written value
    pub fn current_value(&self) -> f32 {
        self.value.current()
    }
}

impl ProgressListener for MaterialFloatAnimator {
    fn on_progress(&mut self, progress: f32) {
        let value = self.value.sample(progress);
        for material in &self.materials.0 {
            material.set_float(&self.param, value);
        }
    }
}

/// Texture coordinates driven by a [`MaterialUvOffsetAnimator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UvAxis {
    /// Nothing is written
    None,
    /// Horizontal offset
    #[default]
    U,
    /// Vertical offset
    V,
    /// Both offsets
    Uv,
}

impl UvAxis {
    /// Whether U is driven
    pub fn has_u(self) -> bool {
        matches!(self, Self::U | Self::Uv)
    }

    /// Whether V is driven
    pub fn has_v(self) -> bool {
        matches!(self, Self::V | Self::Uv)
    }
}

/// Scrolls a texture offset on every material
///
/// Only the selected components are written; the other keeps whatever the
/// material already holds.
#[derive(Debug)]
pub struct MaterialUvOffsetAnimator {
    u_curve: Curve,
    v_curve: Curve,
    axis: UvAxis,
    materials: MaterialSet,
    texture: String,
}

impl MaterialUvOffsetAnimator {
    /// Animate `axis` of the [`DEFAULT_TEXTURE_PARAM`] offset
    pub fn new(axis: UvAxis) -> Self {
        Self {
            u_curve: Curve::linear(0.0, 0.0, 1.0, 1.0),
            v_curve: Curve::linear(0.0, 0.0, 1.0, 1.0),
            axis,
            materials: MaterialSet::default(),
            texture: DEFAULT_TEXTURE_PARAM.to_string(),
        }
    }

    /// Replace the U and V curves
    pub fn with_curves(mut self, u_curve: Curve, v_curve: Curve) -> Self {
        self.u_curve = u_curve;
        self.v_curve = v_curve;
        self
    }

    /// Add initial materials
    pub fn with_materials(mut self, materials: impl IntoIterator<Item = Material>) -> Self {
        self.materials = materials.into_iter().collect();
        self
    }

    /// Add a material; already present materials are ignored
    pub fn add_material(&mut self, material: Material) {
        self.materials.add(material);
    }

    /// Remove a material; returns false if it was not present
    pub fn remove_material(&mut self, material: &Material) -> bool {
        self.materials.remove(material)
    }

    /// Change the texture written from now on
    pub fn set_texture(&mut self, texture: impl Into<String>) {
        self.texture = texture.into();
    }

    /// Texture name
    pub fn texture(&self) -> &str {
        &self.texture
    }

    /// Driven axes
    pub fn axis(&self) -> UvAxis {
        self.axis
    }

    /// Animated materials
    pub fn materials(&self) -> &[Material] {
        &self.materials.0
    }
}

impl ProgressListener for MaterialUvOffsetAnimator {
    fn on_progress(&mut self, progress: f32) {
        if self.axis == UvAxis::None {
            return;
        }

        let u = self.axis.has_u().then(|| self.u_curve.evaluate(progress));
        let v = self.axis.has_v().then(|| self.v_curve.evaluate(progress));
        for material in &self.materials.0 {
            let current = material.texture_offset(&self.texture);
            let offset = Vec2::new(u.unwrap_or(current.x), v.unwrap_or(current.y));
            material.set_texture_offset(&self.texture, offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::AnimatorHandle;
    use curvanim_core::{ActiveFlag, CurvedProgressAnimator, FrameScheduler};

    #[test]
    fn test_material_set_has_no_duplicates() {
        let glass = Material::new("glass");
        let mut animator = MaterialFloatAnimator::new(Curve::linear(0.0, 0.0, 1.0, 1.0), "_Glow")
            .with_materials([glass.clone(), glass.clone()]);
        assert_eq!(animator.materials().len(), 1);

        animator.add_material(glass.clone());
        assert_eq!(animator.materials().len(), 1);
        assert!(animator.remove_material(&glass));
        assert!(!animator.remove_material(&glass));
    }

    #[test]
    fn test_float_written_to_every_material() {
        let scheduler = FrameScheduler::shared();
        let driver = CurvedProgressAnimator::new(scheduler.clone(), ActiveFlag::default());
        let a = Material::new("a");
        let b = Material::new("b");
        let handle = AnimatorHandle::attach(
            &driver,
            MaterialFloatAnimator::new(Curve::linear(0.0, 2.0, 1.0, 4.0), "_Glow")
                .with_materials([a.clone(), b.clone()]),
        );

        driver.play_one_shot_with(1.0, false, false);
        scheduler.tick(0.5);
        assert_eq!(a.float("_Glow"), Some(3.0));
        assert_eq!(b.float("_Glow"), Some(3.0));

        handle.animator_mut().set_param("_Pulse");
        scheduler.tick(0.5);
        assert_eq!(a.float("_Pulse"), Some(4.0));
        assert_eq!(a.float("_Glow"), Some(3.0));
    }

    #[test]
    fn test_uv_offset_keeps_other_component() {
        let scheduler = FrameScheduler::shared();
        let driver = CurvedProgressAnimator::new(scheduler.clone(), ActiveFlag::default());
        let water = Material::new("water");
        water.set_texture_offset(DEFAULT_TEXTURE_PARAM, Vec2::new(0.0, 0.75));
        let _handle = AnimatorHandle::attach(
            &driver,
            MaterialUvOffsetAnimator::new(UvAxis::U).with_materials([water.clone()]),
        );

        driver.play_one_shot_with(1.0, false, false);
        scheduler.tick(0.5);
        assert_eq!(water.texture_offset(DEFAULT_TEXTURE_PARAM), Vec2::new(0.5, 0.75));
    }

    #[test]
    fn test_uv_axis_none_writes_nothing() {
        let water = Material::new("water");
        let mut animator = MaterialUvOffsetAnimator::new(UvAxis::None).with_materials([water.clone()]);
        animator.on_progress(0.5);
        assert_eq!(water.texture_offset(DEFAULT_TEXTURE_PARAM), Vec2::ZERO);
    }

    #[test]
    fn test_uv_both_axes() {
        let water = Material::new("water");
        let mut animator = MaterialUvOffsetAnimator::new(UvAxis::Uv)
            .with_curves(Curve::constant(0.25), Curve::constant(0.5))
            .with_materials([water.clone()]);
        animator.set_texture("_Detail");
        animator.on_progress(1.0);
        assert_eq!(water.texture_offset("_Detail"), Vec2::new(0.25, 0.5));
    }
}
