// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builds a scene from a [`PlayerScene`] and plays it at a fixed step.

use crate::scene_file::{AnimatorDef, PlaybackPlan, PlayerError, PlayerScene, Result, StartMode};
use curvanim_animators::{
    AnimatorHandle, ColorAnimator, CurvedFloatAnimator, InstancedColorAnimator, Material,
    MaterialFloatAnimator, MaterialUvOffsetAnimator, PositionAnimator, Renderer, RotationAnimator,
    ScaleAnimator, ScaleMode, SceneNode, TargetSet,
};
use curvanim_core::{CurvedProgressAnimator, FrameScheduler, PlaybackState};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One driver event, stamped with the frame it fired in
///
/// Frame 0 is before the first tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceEvent {
    /// Playback started
    Started {
        /// Frame number
        frame: u64,
    },
    /// Progress changed
    Progress {
        /// Frame number
        frame: u64,
        /// New progress
        value: f32,
    },
    /// A cycle reached its end point
    LoopPoint {
        /// Frame number
        frame: u64,
    },
    /// Playback stopped
    Stopped {
        /// Frame number
        frame: u64,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { frame } => write!(f, "[{frame:>4}] started"),
            Self::Progress { frame, value } => write!(f, "[{frame:>4}] progress {value:.4}"),
            Self::LoopPoint { frame } => write!(f, "[{frame:>4}] loop point"),
            Self::Stopped { frame } => write!(f, "[{frame:>4}] stopped"),
        }
    }
}

/// An animator kept alive for the duration of playback
enum Attached {
    Float(AnimatorHandle<CurvedFloatAnimator>),
    Position(AnimatorHandle<PositionAnimator>),
    Rotation(AnimatorHandle<RotationAnimator>),
    Scale(AnimatorHandle<ScaleAnimator>),
    Color(AnimatorHandle<ColorAnimator>, Option<InstancedColorAnimator>),
    MaterialFloat(AnimatorHandle<MaterialFloatAnimator>),
    UvOffset(AnimatorHandle<MaterialUvOffsetAnimator>),
}

impl Attached {
    fn describe(&self) -> String {
        match self {
            Self::Float(h) => format!("float = {:.4}", h.animator().current_value()),
            Self::Position(h) => format!("position ({:?})", h.animator().space()),
            Self::Rotation(h) => format!("rotation angle = {:.2}", h.animator().current_angle()),
            Self::Scale(h) => match h.animator().mode() {
                ScaleMode::Isotropic(_) => "scale (isotropic)".to_string(),
                ScaleMode::Axes(axes, _) => format!("scale ({axes:?})"),
            },
            Self::Color(h, instanced) => format!(
                "color = {:?}{}",
                h.animator().current_color(),
                instanced
                    .as_ref()
                    .map(|i| format!(" -> {}", i.param()))
                    .unwrap_or_default()
            ),
            Self::MaterialFloat(h) => {
                let a = h.animator();
                format!("{} = {:.4} on {} material(s)", a.param(), a.current_value(), a.materials().len())
            }
            Self::UvOffset(h) => {
                let a = h.animator();
                format!("{} offset on {} material(s)", a.texture(), a.materials().len())
            }
        }
    }
}

/// A playable scene
pub struct Player {
    scheduler: Rc<FrameScheduler>,
    driver: CurvedProgressAnimator,
    owner: SceneNode,
    nodes: IndexMap<String, SceneNode>,
    materials: IndexMap<String, Material>,
    renderers: IndexMap<String, Renderer>,
    attached: Vec<Attached>,
    trace: Rc<RefCell<Vec<TraceEvent>>>,
    plan: PlaybackPlan,
}

impl Player {
    /// Build nodes, driver and animators
    ///
    /// The owner node is created at the origin if the scene does not list it.
    pub fn new(scene: &PlayerScene) -> Result<Self> {
        let mut nodes: IndexMap<String, SceneNode> = scene
            .nodes
            .iter()
            .map(|def| (def.name.clone(), SceneNode::with_transform(&def.name, def.transform)))
            .collect();
        let owner = nodes
            .entry(scene.owner.clone())
            .or_insert_with(|| {
                tracing::debug!("Creating owner node '{}'", scene.owner);
                SceneNode::new(&scene.owner)
            })
            .clone();

        let materials = scene
            .materials
            .iter()
            .map(|name| (name.clone(), Material::new(name)))
            .collect();
        let renderers = scene
            .renderers
            .iter()
            .map(|name| (name.clone(), Renderer::new(name)))
            .collect();

        let scheduler = FrameScheduler::shared();
        scheduler.set_time_scale(scene.playback.time_scale);
        let driver =
            CurvedProgressAnimator::from_config(&scene.animation, scheduler.clone(), owner.clone());

        let mut player = Self {
            scheduler,
            driver,
            owner,
            nodes,
            materials,
            renderers,
            attached: Vec::with_capacity(scene.animators.len()),
            trace: Rc::new(RefCell::new(Vec::new())),
            plan: scene.playback,
        };
        player.record_trace();

        for def in &scene.animators {
            let attached = player.attach(def)?;
            player.attached.push(attached);
        }

        tracing::info!(
            "Scene '{}': {} node(s), {} animator(s)",
            scene.animation.name,
            player.nodes.len(),
            player.attached.len()
        );
        Ok(player)
    }

    /// Override frame count and step
    pub fn set_plan(&mut self, plan: PlaybackPlan) {
        self.scheduler.set_time_scale(plan.time_scale);
        self.plan = plan;
    }

    /// Start the driver and tick the planned number of frames
    pub fn run(&self) {
        match self.plan.start {
            StartMode::OnStart => self.driver.on_start(),
            StartMode::Play => self.driver.play(),
            StartMode::OneShot => self.driver.play_one_shot(),
            StartMode::OneShotReversed => self.driver.play_one_shot_reversed(),
            StartMode::Loop => self.driver.play_loop(),
            StartMode::LoopReversed => self.driver.play_loop_reversed(),
        }

        self.scheduler.run_frames(self.plan.frames, self.plan.step);
        tracing::debug!(
            "Ran {} frame(s), {:.3}s elapsed",
            self.scheduler.frame_count(),
            self.scheduler.elapsed()
        );
        if self.state().is_looping() {
            tracing::info!("Loop still running after the last frame");
        }
    }

    /// Driver events recorded so far
    pub fn trace(&self) -> Vec<TraceEvent> {
        self.trace.borrow().clone()
    }

    /// The scene's driver
    #[cfg(test)]
    pub fn driver(&self) -> &CurvedProgressAnimator {
        &self.driver
    }

    /// Final driver state
    pub fn state(&self) -> PlaybackState {
        self.driver.state()
    }

    /// Look up a node
    #[cfg(test)]
    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.get(name)
    }

    /// Look up a material
    #[cfg(test)]
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Look up a renderer
    #[cfg(test)]
    pub fn renderer(&self, name: &str) -> Option<&Renderer> {
        self.renderers.get(name)
    }

    /// Log the final state of every node, material and animator
    pub fn log_summary(&self) {
        tracing::info!(
            "Driver '{}' {:?}, progress {:.4}",
            self.driver.name(),
            self.state(),
            self.driver.progress()
        );
        for node in self.nodes.values() {
            let t = node.transform();
            tracing::info!(
                "node {}: position {:?} euler {:?} scale {:?}",
                node.name(),
                t.position,
                t.euler_angles,
                t.scale
            );
        }
        for material in self.materials.values() {
            tracing::info!("{material:?}");
        }
        for renderer in self.renderers.values() {
            tracing::info!("{renderer:?}");
        }
        for attached in &self.attached {
            tracing::info!("animator {}", attached.describe());
        }
    }

    fn record_trace(&self) {
        let frame = {
            let scheduler = Rc::clone(&self.scheduler);
            move || scheduler.frame_count()
        };

        let (trace, f) = (Rc::clone(&self.trace), frame.clone());
        self.driver.started().add_listener(move |()| {
            let event = TraceEvent::Started { frame: f() };
            tracing::info!("{event}");
            trace.borrow_mut().push(event);
        });

        let (trace, f) = (Rc::clone(&self.trace), frame.clone());
        self.driver.progress_updated().add_listener(move |value| {
            let event = TraceEvent::Progress { frame: f(), value };
            tracing::trace!("{event}");
            trace.borrow_mut().push(event);
        });

        let (trace, f) = (Rc::clone(&self.trace), frame.clone());
        self.driver.loop_point_reached().add_listener(move |()| {
            let event = TraceEvent::LoopPoint { frame: f() };
            tracing::info!("{event}");
            trace.borrow_mut().push(event);
        });

        let (trace, f) = (Rc::clone(&self.trace), frame);
        self.driver.stopped().add_listener(move |()| {
            let event = TraceEvent::Stopped { frame: f() };
            tracing::info!("{event}");
            trace.borrow_mut().push(event);
        });
    }

    fn targets(&self, names: &[String], include_self: bool) -> Result<TargetSet> {
        let targets = names
            .iter()
            .map(|name| {
                self.nodes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PlayerError::UnknownNode(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TargetSet::new(self.owner.clone(), targets, include_self))
    }

    fn lookup_materials(&self, names: &[String]) -> Result<Vec<Material>> {
        names
            .iter()
            .map(|name| {
                self.materials
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PlayerError::UnknownMaterial(name.clone()))
            })
            .collect()
    }

    fn lookup_renderers(&self, names: &[String]) -> Result<Vec<Renderer>> {
        names
            .iter()
            .map(|name| {
                self.renderers
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PlayerError::UnknownRenderer(name.clone()))
            })
            .collect()
    }

    fn attach(&self, def: &AnimatorDef) -> Result<Attached> {
        let driver = &self.driver;
        let attached = match def {
            AnimatorDef::Float { curve } => {
                Attached::Float(AnimatorHandle::attach(driver, CurvedFloatAnimator::new(curve.clone())))
            }
            AnimatorDef::Position {
                targets,
                include_self,
                axes,
                space,
                curves,
            } => Attached::Position(AnimatorHandle::attach(
                driver,
                PositionAnimator::new(self.targets(targets, *include_self)?, *axes, curves.clone())
                    .with_space(*space),
            )),
            AnimatorDef::Rotation {
                targets,
                include_self,
                axis,
                angle,
            } => Attached::Rotation(AnimatorHandle::attach(
                driver,
                RotationAnimator::new(self.targets(targets, *include_self)?, *axis, angle.clone()),
            )),
            AnimatorDef::Scale {
                targets,
                include_self,
                mode,
            } => Attached::Scale(AnimatorHandle::attach(
                driver,
                ScaleAnimator::new(self.targets(targets, *include_self)?, mode.clone()),
            )),
            AnimatorDef::Color {
                gradient,
                renderers,
                param,
            } => {
                let handle = AnimatorHandle::attach(driver, ColorAnimator::new(gradient.clone()));
                let instanced = if renderers.is_empty() {
                    None
                } else {
                    let renderers = self.lookup_renderers(renderers)?;
                    Some(InstancedColorAnimator::with_param(&handle, renderers, param.clone()))
                };
                Attached::Color(handle, instanced)
            }
            AnimatorDef::MaterialFloat {
                materials,
                param,
                curve,
            } => Attached::MaterialFloat(AnimatorHandle::attach(
                driver,
                MaterialFloatAnimator::new(curve.clone(), param.clone())
                    .with_materials(self.lookup_materials(materials)?),
            )),
            AnimatorDef::UvOffset {
                materials,
                axis,
                texture,
                u_curve,
                v_curve,
            } => {
                let mut animator = MaterialUvOffsetAnimator::new(*axis)
                    .with_curves(u_curve.clone(), v_curve.clone())
                    .with_materials(self.lookup_materials(materials)?);
                animator.set_texture(texture.clone());
                Attached::UvOffset(AnimatorHandle::attach(driver, animator))
            }
        };
        Ok(attached)
    }
}
