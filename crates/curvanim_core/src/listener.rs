// SPDX-License-Identifier: MIT OR Apache-2.0
//! Direct notification channel for property animators.

/// Capability implemented by anything that animates from a driver's progress
///
/// Attached listeners are notified before the driver's broadcast channels
/// fire, so an animator has already applied its output by the time external
/// subscribers see the event.
pub trait ProgressListener {
    /// Progress changed
    fn on_progress(&mut self, progress: f32);

    /// Playback started
    fn on_started(&mut self) {}

    /// Playback stopped
    fn on_stopped(&mut self) {}

    /// The owning object was deactivated
    fn on_deactivated(&mut self) {}
}
