// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property animators for curvanim.
//!
//! This crate maps a driver's progress onto concrete outputs:
//! - Curved floats
//! - Node position, rotation and scale
//! - Gradient colors, optionally mirrored into renderer property blocks
//! - Material floats and texture offsets
//!
//! ## Usage
//!
//! Wrap an animator in an [`AnimatorHandle`] to attach it to a
//! [`curvanim_core::CurvedProgressAnimator`]. The handle keeps the driver
//! alive and detaches the animator when dropped.

pub mod color;
pub mod float;
pub mod gradient;
pub mod handle;
pub mod material;
pub mod scene;
pub mod transform;

pub use color::{ColorAnimator, InstancedColorAnimator, DEFAULT_COLOR_PARAM};
pub use float::{CurvedFloatAnimator, CurvedValue};
pub use gradient::{AlphaKey, ColorKey, Gradient, GradientMode, WHITE};
pub use handle::AnimatorHandle;
pub use material::{MaterialFloatAnimator, MaterialUvOffsetAnimator, UvAxis, DEFAULT_TEXTURE_PARAM};
pub use scene::{Material, PropertyBlock, Renderer, SceneNode, Space, TargetSet, Transform};
pub use transform::{
    AxisCurves, AxisMask, PositionAnimator, RotationAnimator, RotationAxis, ScaleAnimator, ScaleMode,
};
