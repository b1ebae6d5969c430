// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform animators.
//!
//! Each animator captures the pose of its targets at the first start after
//! activation and computes every update from that snapshot:
//! - [`PositionAnimator`]: offsets along selected axes
//! - [`RotationAnimator`]: an angle about one axis, added to the Euler angles
//! - [`ScaleAnimator`]: per-axis or isotropic scale factors

use crate::float::CurvedValue;
use crate::scene::{SceneNode, Space, TargetSet, Transform};
use curvanim_core::{Curve, Evaluate, ProgressListener};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A set of X/Y/Z axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMask {
    /// X axis selected
    pub x: bool,
    /// Y axis selected
    pub y: bool,
    /// Z axis selected
    pub z: bool,
}

impl AxisMask {
    /// X only
    pub const X: Self = Self::new(true, false, false);
    /// Y only
    pub const Y: Self = Self::new(false, true, false);
    /// Z only
    pub const Z: Self = Self::new(false, false, true);
    /// X and Y
    pub const XY: Self = Self::new(true, true, false);
    /// Y and Z
    pub const YZ: Self = Self::new(false, true, true);
    /// X and Z
    pub const XZ: Self = Self::new(true, false, true);
    /// All axes
    pub const XYZ: Self = Self::new(true, true, true);

    /// Create a mask
    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::Y
    }
}

/// One curve per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCurves {
    /// X curve
    pub x: Curve,
    /// Y curve
    pub y: Curve,
    /// Z curve
    pub z: Curve,
}

impl AxisCurves {
    /// Same curve on every axis
    pub fn uniform(curve: Curve) -> Self {
        Self {
            x: curve.clone(),
            y: curve.clone(),
            z: curve,
        }
    }

    /// Evaluate the selected axes; unselected axes read as `fill`
    fn sample(&self, axes: AxisMask, progress: f32, fill: f32) -> Vec3 {
        Vec3::new(
            if axes.x { self.x.evaluate(progress) } else { fill },
            if axes.y { self.y.evaluate(progress) } else { fill },
            if axes.z { self.z.evaluate(progress) } else { fill },
        )
    }
}

/// Per-node snapshots taken when playback starts
#[derive(Debug, Clone, Default)]
struct Snapshots {
    poses: Vec<(SceneNode, Transform)>,
    captured: bool,
}

impl Snapshots {
    fn ensure(&mut self, targets: &TargetSet) {
        if self.captured {
            return;
        }
        self.poses = targets
            .resolve()
            .into_iter()
            .map(|node| {
                let pose = node.transform();
                (node, pose)
            })
            .collect();
        self.captured = true;
    }

    fn reset(&mut self) {
        self.captured = false;
    }
}

/// Moves targets along curves
///
/// In [`Space::Local`] the offset is expressed in each node's captured
/// frame (rotated and scaled); in [`Space::World`] it is added directly.
#[derive(Debug)]
pub struct PositionAnimator {
    targets: TargetSet,
    space: Space,
    axes: AxisMask,
    curves: AxisCurves,
    snapshots: Snapshots,
}

impl PositionAnimator {
    /// Animate the given axes of the targets
    pub fn new(targets: TargetSet, axes: AxisMask, curves: AxisCurves) -> Self {
        Self {
            targets,
            space: Space::Local,
            axes,
            curves,
            snapshots: Snapshots::default(),
        }
    }

    /// Set the offset space
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    /// Offset space
    pub fn space(&self) -> Space {
        self.space
    }

    /// Animated axes
    pub fn axes(&self) -> AxisMask {
        self.axes
    }
}

impl ProgressListener for PositionAnimator {
    fn on_progress(&mut self, progress: f32) {
        self.snapshots.ensure(&self.targets);
        let delta = self.curves.sample(self.axes, progress, 0.0);

        for (node, pose) in &self.snapshots.poses {
            let position = match self.space {
                Space::Local => pose.transform_point(delta),
                Space::World => pose.position + delta,
            };
            node.set_position(position);
        }
    }

    fn on_started(&mut self) {
        self.snapshots.ensure(&self.targets);
    }

    fn on_deactivated(&mut self) {
        self.snapshots.reset();
    }
}

/// Axis a [`RotationAnimator`] turns about
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RotationAxis {
    /// Right
    X,
    /// Up
    Y,
    /// Forward
    #[default]
    Z,
    /// Any axis, scaled by its length
    Custom(Vec3),
}

impl RotationAxis {
    /// Axis as a vector
    pub fn vector(&self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
            Self::Custom(axis) => *axis,
        }
    }
}

/// Turns targets by a curved angle in degrees
///
/// The result is `captured_euler + axis * angle`.
#[derive(Debug)]
pub struct RotationAnimator {
    targets: TargetSet,
    axis: RotationAxis,
    angle: CurvedValue,
    snapshots: Snapshots,
}

impl RotationAnimator {
    /// Rotate about `axis` by the curve's value in degrees
    pub fn new(targets: TargetSet, axis: RotationAxis, angle: Curve) -> Self {
        Self {
            targets,
            axis,
            angle: CurvedValue::new(angle),
            snapshots: Snapshots::default(),
        }
    }

    /// Rotation axis
    pub fn axis(&self) -> RotationAxis {
        self.axis
    }

    /// Last sampled angle in degrees
    pub fn current_angle(&self) -> f32 {
        self.angle.current()
    }
}

impl ProgressListener for RotationAnimator {
    fn on_progress(&mut self, progress: f32) {
        self.snapshots.ensure(&self.targets);
        let offset = self.axis.vector() * self.angle.sample(progress);

        for (node, pose) in &self.snapshots.poses {
            node.set_euler_angles(pose.euler_angles + offset);
        }
    }

    fn on_started(&mut self) {
        self.snapshots.ensure(&self.targets);
    }

    fn on_deactivated(&mut self) {
        self.snapshots.reset();
    }
}

/// Which scale components a [`ScaleAnimator`] drives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Selected axes each follow their own curve
    Axes(AxisMask, AxisCurves),
    /// One curve for all axes
    Isotropic(Curve),
}

/// Multiplies the captured scale of targets by curved factors
#[derive(Debug)]
pub struct ScaleAnimator {
    targets: TargetSet,
    mode: ScaleMode,
    snapshots: Snapshots,
}

impl ScaleAnimator {
    /// Create a scale animator
    pub fn new(targets: TargetSet, mode: ScaleMode) -> Self {
        Self {
            targets,
            mode,
            snapshots: Snapshots::default(),
        }
    }

    /// Uniform scale from one curve
    pub fn isotropic(targets: TargetSet, curve: Curve) -> Self {
        Self::new(targets, ScaleMode::Isotropic(curve))
    }

    /// Scale mode
    pub fn mode(&self) -> &ScaleMode {
        &self.mode
    }

    fn factor(&self, progress: f32) -> Vec3 {
        match &self.mode {
            ScaleMode::Isotropic(curve) => Vec3::splat(curve.evaluate(progress)),
            ScaleMode::Axes(axes, curves) => curves.sample(*axes, progress, 1.0),
        }
    }
}

impl ProgressListener for ScaleAnimator {
    fn on_progress(&mut self, progress: f32) {
        self.snapshots.ensure(&self.targets);
        let factor = self.factor(progress);

        for (node, pose) in &self.snapshots.poses {
            node.set_scale(pose.scale * factor);
        }
    }

    fn on_started(&mut self) {
        self.snapshots.ensure(&self.targets);
    }

    fn on_deactivated(&mut self) {
        self.snapshots.reset();
    }
}
