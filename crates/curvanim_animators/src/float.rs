// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curved float output.

use curvanim_core::{Curve, Evaluate, EventChannel, ProgressListener};
use std::rc::Rc;

/// A curve sampled across its own key span by normalized progress
///
/// Progress 0 maps to the first key's time and progress 1 to the last.
#[derive(Debug, Clone)]
pub struct CurvedValue {
    curve: Curve,
    key0_time: f32,
    time_span: f32,
    initial: f32,
    current: f32,
}

impl CurvedValue {
    /// Wrap a curve
    ///
    /// With fewer than two keys the span falls back to [0, 1] and the
    /// initial value to 0, with a warning.
    pub fn new(curve: Curve) -> Self {
        let (key0_time, time_span, initial) = if curve.len() < 2 {
            tracing::warn!("Float curve has {} key(s), need at least 2", curve.len());
            (0.0, 1.0, 0.0)
        } else {
            let start = curve.start_time();
            (start, curve.time_span(), curve.evaluate(start))
        };

        Self {
            curve,
            key0_time,
            time_span,
            initial,
            current: initial,
        }
    }

    /// Sample at `progress` and store the result
    pub fn sample(&mut self, progress: f32) -> f32 {
        self.current = self.curve.evaluate(self.key0_time + progress * self.time_span);
        self.current
    }

    /// Value at the first key
    pub fn initial(&self) -> f32 {
        self.initial
    }

    /// Last sampled value
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The sampled curve
    pub fn curve(&self) -> &Curve {
        &self.curve
    }
}

impl Default for CurvedValue {
    fn default() -> Self {
        Self::new(Curve::linear(0.0, 0.0, 1.0, 1.0))
    }
}

/// Publishes a curved float on every progress update
#[derive(Debug)]
pub struct CurvedFloatAnimator {
    value: CurvedValue,
    updated: Rc<EventChannel<f32>>,
}

impl CurvedFloatAnimator {
    /// Create an animator for a curve
    pub fn new(curve: Curve) -> Self {
        Self {
            value: CurvedValue::new(curve),
            updated: Rc::new(EventChannel::new()),
        }
    }

    /// Value at the first key
    pub fn initial_value(&self) -> f32 {
        self.value.initial()
    }

    /// Last published value
    pub fn current_value(&self) -> f32 {
        self.value.current()
    }

    /// Fired with each new value
    pub fn updated(&self) -> Rc<EventChannel<f32>> {
        Rc::clone(&self.updated)
    }
}

impl ProgressListener for CurvedFloatAnimator {
    fn on_progress(&mut self, progress: f32) {
        let value = self.value.sample(progress);
        self.updated.fire(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::AnimatorHandle;
    use curvanim_core::{ActiveFlag, CurveKey, CurvedProgressAnimator, FrameScheduler};
    use std::cell::RefCell;

    #[test]
    fn test_progress_maps_over_key_span() {
        let mut value = CurvedValue::new(Curve::linear(2.0, 10.0, 4.0, 20.0));
        assert_eq!(value.initial(), 10.0);
        assert!((value.sample(0.5) - 15.0).abs() < 1e-4);
        assert_eq!(value.sample(1.0), 20.0);
    }

    #[test]
    fn test_single_key_falls_back() {
        let mut value = CurvedValue::new(Curve::new(vec![CurveKey::new(3.0, 7.0)]));
        assert_eq!(value.initial(), 0.0);
        assert_eq!(value.sample(0.5), 7.0);
    }

    #[test]
    fn test_updated_fires_through_driver() {
        let scheduler = FrameScheduler::shared();
        let driver = CurvedProgressAnimator::new(scheduler.clone(), ActiveFlag::default());
        let handle = AnimatorHandle::attach(
            &driver,
            CurvedFloatAnimator::new(Curve::linear(0.0, 0.0, 1.0, 100.0)),
        );

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        handle
            .animator()
            .updated()
            .add_listener(move |v| s.borrow_mut().push(v));

        driver.play_one_shot_with(1.0, false, false);
        scheduler.run_frames(2, 0.5);

        assert_eq!(*seen.borrow(), vec![50.0, 100.0]);
        assert_eq!(handle.animator().current_value(), 100.0);
    }
}
