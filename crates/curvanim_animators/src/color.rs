// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color animators.

use crate::gradient::{Gradient, WHITE};
use crate::handle::AnimatorHandle;
use crate::scene::{PropertyBlock, Renderer};
use curvanim_core::{CurvedProgressAnimator, EventChannel, ListenerId, ProgressListener};
use glam::Vec4;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Default color parameter written by [`InstancedColorAnimator`]
pub const DEFAULT_COLOR_PARAM: &str = "_Color";

/// Samples a gradient by progress and publishes the color
#[derive(Debug)]
pub struct ColorAnimator {
    gradient: Gradient,
    initial: Vec4,
    current: Vec4,
    updated: Rc<EventChannel<Vec4>>,
}

impl ColorAnimator {
    /// Create an animator for a gradient
    ///
    /// A gradient without color keys starts from white, with a warning.
    pub fn new(gradient: Gradient) -> Self {
        let initial = if gradient.is_empty() {
            tracing::warn!("Color gradient has no color keys, starting from white");
            WHITE
        } else {
            gradient.evaluate(0.0)
        };

        Self {
            gradient,
            initial,
            current: initial,
            updated: Rc::new(EventChannel::new()),
        }
    }

    /// Color at progress 0
    pub fn initial_color(&self) -> Vec4 {
        self.initial
    }

    /// Last published color
    pub fn current_color(&self) -> Vec4 {
        self.current
    }

    /// The sampled gradient
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Fired with each new color
    pub fn updated(&self) -> Rc<EventChannel<Vec4>> {
        Rc::clone(&self.updated)
    }
}

impl ProgressListener for ColorAnimator {
    fn on_progress(&mut self, progress: f32) {
        self.current = self.gradient.evaluate(progress);
        self.updated.fire(self.current);
    }
}

struct BlockWriter {
    renderers: Vec<Renderer>,
    param: String,
    block: PropertyBlock,
}

impl BlockWriter {
    fn write(&mut self, color: Vec4) {
        self.block.set_color(&self.param, color);
        for renderer in &self.renderers {
            renderer.set_property_block(&self.block);
        }
    }
}

/// Mirrors a [`ColorAnimator`] into renderer property blocks
///
/// Renderers sharing a material get per-instance colors. The subscription
/// to the color animator ends when this value is dropped.
pub struct InstancedColorAnimator {
    driver: CurvedProgressAnimator,
    source: Rc<EventChannel<Vec4>>,
    listener: ListenerId,
    writer: Rc<RefCell<BlockWriter>>,
    default_color: Vec4,
}

impl InstancedColorAnimator {
    /// Follow `color`, writing the [`DEFAULT_COLOR_PARAM`] parameter
    pub fn new(color: &AnimatorHandle<ColorAnimator>, renderers: Vec<Renderer>) -> Self {
        Self::with_param(color, renderers, DEFAULT_COLOR_PARAM)
    }

    /// Follow `color`, writing a named color parameter
    pub fn with_param(
        color: &AnimatorHandle<ColorAnimator>,
        renderers: Vec<Renderer>,
        param: impl Into<String>,
    ) -> Self {
        if renderers.is_empty() {
            tracing::warn!("InstancedColorAnimator has no renderers");
        }

        let writer = Rc::new(RefCell::new(BlockWriter {
            renderers,
            param: param.into(),
            block: PropertyBlock::new(),
        }));
        let source = color.animator().updated();

        let w = Rc::clone(&writer);
        let listener = source.add_listener(move |c| w.borrow_mut().write(c));

        Self {
            driver: color.driver().clone(),
            source,
            listener,
            writer,
            default_color: WHITE,
        }
    }

    /// Set the color used by [`Self::reset_color`]
    pub fn with_default_color(mut self, color: Vec4) -> Self {
        self.default_color = color;
        self
    }

    /// Play the followed animator once
    pub fn play(&self) {
        self.driver.play_one_shot();
    }

    /// Write the default color
    pub fn reset_color(&self) {
        self.reset_color_to(self.default_color);
    }

    /// Write a specific color
    pub fn reset_color_to(&self, color: Vec4) {
        self.writer.borrow_mut().write(color);
    }

    /// Parameter written on each renderer
    pub fn param(&self) -> String {
        self.writer.borrow().param.clone()
    }
}

impl Drop for InstancedColorAnimator {
    fn drop(&mut self) {
        self.source.remove_listener(self.listener);
    }
}

impl fmt::Debug for InstancedColorAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let writer = self.writer.borrow();
        f.debug_struct("InstancedColorAnimator")
            .field("param", &writer.param)
            .field("renderers", &writer.renderers.len())
            .field("default_color", &self.default_color)
            .finish()
    }
}
