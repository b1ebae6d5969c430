// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal scene model written to by the animators.
//!
//! Handles are cheap to clone and share their data; equality is identity.
//! Nodes have no parents, so local and world space coincide.

use curvanim_core::Activation;
use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Coordinate space for transform deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Space {
    /// Along the node's own axes, scaled by the node
    #[default]
    Local,
    /// Along the world axes
    World,
}

/// Position, Euler rotation in degrees, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Euler angles in degrees
    pub euler_angles: Vec3,
    /// Scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        euler_angles: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Rotation as a quaternion
    ///
    /// Z is applied first, then X, then Y.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.euler_angles.y.to_radians(),
            self.euler_angles.x.to_radians(),
            self.euler_angles.z.to_radians(),
        )
    }

    /// Map a point from this transform's local space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation() * (self.scale * local)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug)]
struct NodeData {
    name: String,
    transform: Transform,
    active: bool,
}

/// A named, activatable object with a transform
#[derive(Clone)]
pub struct SceneNode(Rc<RefCell<NodeData>>);

impl SceneNode {
    /// Create an active node at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_transform(name, Transform::IDENTITY)
    }

    /// Create an active node with a transform
    pub fn with_transform(name: impl Into<String>, transform: Transform) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            name: name.into(),
            transform,
            active: true,
        })))
    }

    /// Node name
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Current transform
    pub fn transform(&self) -> Transform {
        self.0.borrow().transform
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.0.borrow().transform.position
    }

    /// Set position
    pub fn set_position(&self, position: Vec3) {
        self.0.borrow_mut().transform.position = position;
    }

    /// Current Euler angles in degrees
    pub fn euler_angles(&self) -> Vec3 {
        self.0.borrow().transform.euler_angles
    }

    /// Set Euler angles in degrees
    pub fn set_euler_angles(&self, euler_angles: Vec3) {
        self.0.borrow_mut().transform.euler_angles = euler_angles;
    }

    /// Current scale
    pub fn scale(&self) -> Vec3 {
        self.0.borrow().transform.scale
    }

    /// Set scale
    pub fn set_scale(&self, scale: Vec3) {
        self.0.borrow_mut().transform.scale = scale;
    }

    /// Whether two handles refer to the same node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SceneNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Activation for SceneNode {
    fn set_active(&self, active: bool) {
        self.0.borrow_mut().active = active;
    }

    fn is_active(&self) -> bool {
        self.0.borrow().active
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("SceneNode")
            .field("name", &data.name)
            .field("transform", &data.transform)
            .field("active", &data.active)
            .finish()
    }
}

/// The nodes an animator writes to
///
/// With no explicit targets the owner is animated. With targets, the owner
/// is animated too only when `include_self` is set.
#[derive(Debug, Clone)]
pub struct TargetSet {
    owner: SceneNode,
    targets: Vec<SceneNode>,
    include_self: bool,
}

impl TargetSet {
    /// Animate only the owner
    pub fn owner(owner: SceneNode) -> Self {
        Self {
            owner,
            targets: Vec::new(),
            include_self: false,
        }
    }

    /// Animate explicit targets
    pub fn new(owner: SceneNode, targets: Vec<SceneNode>, include_self: bool) -> Self {
        Self {
            owner,
            targets,
            include_self,
        }
    }

    /// Nodes to write, without duplicates
    pub fn resolve(&self) -> Vec<SceneNode> {
        if self.targets.is_empty() {
            return vec![self.owner.clone()];
        }

        let mut nodes: Vec<SceneNode> = Vec::with_capacity(self.targets.len() + 1);
        for node in &self.targets {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
        if self.include_self && !nodes.contains(&self.owner) {
            nodes.push(self.owner.clone());
        }
        nodes
    }
}

#[derive(Debug, Default)]
struct MaterialData {
    name: String,
    floats: IndexMap<String, f32>,
    texture_offsets: IndexMap<String, Vec2>,
}

/// A shared material with named float and texture offset parameters
#[derive(Clone)]
pub struct Material(Rc<RefCell<MaterialData>>);

impl Material {
    /// Create an empty material
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(MaterialData {
            name: name.into(),
            ..MaterialData::default()
        })))
    }

    /// Material name
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Get a float parameter
    pub fn float(&self, param: &str) -> Option<f32> {
        self.0.borrow().floats.get(param).copied()
    }

    /// Set a float parameter
    pub fn set_float(&self, param: &str, value: f32) {
        self.0.borrow_mut().floats.insert(param.to_string(), value);
    }

    /// Get a texture offset; unset offsets are zero
    pub fn texture_offset(&self, texture: &str) -> Vec2 {
        self.0
            .borrow()
            .texture_offsets
            .get(texture)
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// Set a texture offset
    pub fn set_texture_offset(&self, texture: &str, offset: Vec2) {
        self.0
            .borrow_mut()
            .texture_offsets
            .insert(texture.to_string(), offset);
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Material")
            .field("name", &data.name)
            .field("floats", &data.floats)
            .field("texture_offsets", &data.texture_offsets)
            .finish()
    }
}

/// Per-renderer parameter overrides that leave shared materials untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBlock {
    colors: IndexMap<String, Vec4>,
}

impl PropertyBlock {
    /// Create an empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a color parameter
    pub fn set_color(&mut self, param: &str, color: Vec4) {
        self.colors.insert(param.to_string(), color);
    }

    /// Get a color parameter
    pub fn color(&self, param: &str) -> Option<Vec4> {
        self.colors.get(param).copied()
    }
}

#[derive(Debug, Default)]
struct RendererData {
    name: String,
    block: PropertyBlock,
}

/// A shared renderer holding a property block
#[derive(Clone)]
pub struct Renderer(Rc<RefCell<RendererData>>);

impl Renderer {
    /// Create a renderer with an empty property block
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(RendererData {
            name: name.into(),
            block: PropertyBlock::new(),
        })))
    }

    /// Renderer name
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Replace the property block
    pub fn set_property_block(&self, block: &PropertyBlock) {
        self.0.borrow_mut().block = block.clone();
    }

    /// Current property block
    pub fn property_block(&self) -> PropertyBlock {
        self.0.borrow().block.clone()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Renderer")
            .field("name", &data.name)
            .field("block", &data.block)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_transform_point_applies_scale_then_rotation() {
        let transform = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            euler_angles: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::splat(2.0),
        };
        let point = transform.transform_point(Vec3::Z);
        assert!(approx(point, Vec3::new(3.0, 0.0, 0.0)), "{point:?}");
    }

    #[test]
    fn test_node_activation() {
        let node = SceneNode::new("cube");
        assert!(node.is_active());
        node.clone().set_active(false);
        assert!(!node.is_active());
    }

    #[test]
    fn test_targets_default_to_owner() {
        let owner = SceneNode::new("owner");
        let nodes = TargetSet::owner(owner.clone()).resolve();
        assert_eq!(nodes, vec![owner]);
    }

    #[test]
    fn test_targets_include_self() {
        let owner = SceneNode::new("owner");
        let a = SceneNode::new("a");

        let without = TargetSet::new(owner.clone(), vec![a.clone(), a.clone()], false);
        assert_eq!(without.resolve(), vec![a.clone()]);

        let with = TargetSet::new(owner.clone(), vec![a.clone()], true);
        assert_eq!(with.resolve(), vec![a, owner]);
    }

    #[test]
    fn test_material_parameters() {
        let material = Material::new("water");
        assert_eq!(material.float("_Glow"), None);
        assert_eq!(material.texture_offset("_MainTex"), Vec2::ZERO);

        material.set_float("_Glow", 0.5);
        material.set_texture_offset("_MainTex", Vec2::new(0.25, 0.0));
        assert_eq!(material.float("_Glow"), Some(0.5));
        assert_eq!(material.texture_offset("_MainTex").x, 0.25);
        assert_ne!(material, Material::new("water"));
    }
}
