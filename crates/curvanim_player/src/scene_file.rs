// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene files for the headless player.
//!
//! A scene file is RON describing one driver, the nodes, materials and
//! renderers it animates, the animators attached to it, and how long to
//! play it.

use curvanim_animators::{
    AxisCurves, AxisMask, Gradient, RotationAxis, ScaleMode, Space, Transform, UvAxis,
    DEFAULT_COLOR_PARAM, DEFAULT_TEXTURE_PARAM,
};
use curvanim_core::{AnimationConfig, ConfigError, Curve};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Scene file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene file is not valid RON for this format
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Embedded animation was rejected or could not be saved
    #[error("Animation error: {0}")]
    Config(#[from] ConfigError),

    /// An animator names a node that does not exist
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// An animator names a material that does not exist
    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    /// An animator names a renderer that does not exist
    #[error("Unknown renderer '{0}'")]
    UnknownRenderer(String),

    /// Bad command line
    #[error("{0}")]
    Usage(String),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// A node and its starting transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique node name
    pub name: String,
    /// Starting transform
    #[serde(default)]
    pub transform: Transform,
}

/// How the driver is started before ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartMode {
    /// Run the start hook, which plays only if `animate_on_start` is set
    #[default]
    OnStart,
    /// Play according to the looping and reversed settings
    Play,
    /// Play once forward
    OneShot,
    /// Play once in reverse
    OneShotReversed,
    /// Loop forward
    Loop,
    /// Loop in reverse
    LoopReversed,
}

/// Fixed-step playback parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPlan {
    /// How playback begins
    pub start: StartMode,
    /// Seconds per frame
    pub step: f32,
    /// Frames to run
    pub frames: u32,
    /// Scheduler time scale
    pub time_scale: f32,
}

impl Default for PlaybackPlan {
    fn default() -> Self {
        Self {
            start: StartMode::OnStart,
            step: 1.0 / 60.0,
            frames: 120,
            time_scale: 1.0,
        }
    }
}

fn default_color_param() -> String {
    DEFAULT_COLOR_PARAM.to_string()
}

fn default_texture_param() -> String {
    DEFAULT_TEXTURE_PARAM.to_string()
}

fn unit_curve() -> Curve {
    Curve::linear(0.0, 0.0, 1.0, 1.0)
}

/// An animator to attach to the driver
///
/// Node lists name entries of [`PlayerScene::nodes`]; an empty list means
/// the owner node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnimatorDef {
    /// Publish a curved float
    Float {
        /// Sampled curve
        curve: Curve,
    },
    /// Move nodes
    Position {
        /// Target nodes
        #[serde(default)]
        targets: Vec<String>,
        /// Also move the owner when targets are given
        #[serde(default)]
        include_self: bool,
        /// Animated axes
        #[serde(default)]
        axes: AxisMask,
        /// Offset space
        #[serde(default)]
        space: Space,
        /// Per-axis offset curves
        curves: AxisCurves,
    },
    /// Turn nodes
    Rotation {
        /// Target nodes
        #[serde(default)]
        targets: Vec<String>,
        /// Also turn the owner when targets are given
        #[serde(default)]
        include_self: bool,
        /// Rotation axis
        #[serde(default)]
        axis: RotationAxis,
        /// Angle curve in degrees
        angle: Curve,
    },
    /// Scale nodes
    Scale {
        /// Target nodes
        #[serde(default)]
        targets: Vec<String>,
        /// Also scale the owner when targets are given
        #[serde(default)]
        include_self: bool,
        /// Scale curves
        mode: ScaleMode,
    },
    /// Sample a gradient, optionally mirrored into renderers
    Color {
        /// Sampled gradient
        gradient: Gradient,
        /// Renderers receiving the color
        #[serde(default)]
        renderers: Vec<String>,
        /// Color parameter on the renderers
        #[serde(default = "default_color_param")]
        param: String,
    },
    /// Write a float parameter on materials
    MaterialFloat {
        /// Target materials
        materials: Vec<String>,
        /// Float parameter
        param: String,
        /// Value curve
        curve: Curve,
    },
    /// Scroll a texture offset on materials
    UvOffset {
        /// Target materials
        materials: Vec<String>,
        /// Driven components
        #[serde(default)]
        axis: UvAxis,
        /// Texture parameter
        #[serde(default = "default_texture_param")]
        texture: String,
        /// U offset curve
        #[serde(default = "unit_curve")]
        u_curve: Curve,
        /// V offset curve
        #[serde(default = "unit_curve")]
        v_curve: Curve,
    },
}

/// Everything the player needs to run one animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScene {
    /// Driver curve and settings
    pub animation: AnimationConfig,
    /// Node owning the driver
    pub owner: String,
    /// Scene nodes
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// Material names
    #[serde(default)]
    pub materials: Vec<String>,
    /// Renderer names
    #[serde(default)]
    pub renderers: Vec<String>,
    /// Attached animators, in notification order
    #[serde(default)]
    pub animators: Vec<AnimatorDef>,
    /// Playback parameters
    #[serde(default)]
    pub playback: PlaybackPlan,
}

impl PlayerScene {
    /// Parse from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let scene: PlayerScene = ron::from_str(content)?;
        scene.animation.check()?;
        Ok(scene)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scene = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded scene '{}' from {:?}", scene.animation.name, path);
        Ok(scene)
    }
}
