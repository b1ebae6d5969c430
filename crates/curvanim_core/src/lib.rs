// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve-driven progress animation.
//!
//! This crate provides the playback core shared by all property animators:
//! - Keyframe curves with Hermite interpolation
//! - A driver that maps tick time onto a normalized progress curve
//! - Multicast event channels
//! - A cooperative frame scheduler
//! - RON animation files
//!
//! ## Architecture
//!
//! Everything runs on one thread. The host owns a [`FrameScheduler`] and
//! ticks it once per frame; each playing [`CurvedProgressAnimator`] keeps a
//! task on that scheduler. Property animators implement
//! [`ProgressListener`] and are attached to a driver, which notifies them
//! before its public event channels fire.

pub mod activation;
pub mod curve;
pub mod driver;
pub mod event;
pub mod keyframe;
pub mod listener;
pub mod scheduler;
pub mod settings;

#[cfg(test)]
mod testing;

pub use activation::{Activation, ActiveFlag};
pub use curve::{Curve, CurveError, Evaluate, ProgressCurve};
pub use driver::{CurvedProgressAnimator, PlaybackState, WeakProgressAnimator};
pub use event::{EventChannel, ListenerId};
pub use keyframe::{CurveKey, Interpolation};
pub use listener::ProgressListener;
pub use scheduler::{FrameScheduler, Scheduler, TaskId, TaskStatus, TickTask};
pub use settings::{AnimationConfig, ConfigError, DriverSettings, CONFIG_FORMAT_VERSION};
