// SPDX-License-Identifier: MIT OR Apache-2.0
//! The curved progress driver.
//!
//! [`CurvedProgressAnimator`] advances a normalized cursor over tick time,
//! samples its [`ProgressCurve`] at that cursor, stores the result as the
//! current progress and notifies listeners. It handles:
//! - One-shot and looping playback, forward or reversed
//! - Start/stop lifecycle and owner activation
//! - Event fan-out to attached animators and broadcast channels
//!
//! ## Event order
//!
//! Each progress change notifies attached [`ProgressListener`]s first, then
//! the `progress_updated` channel. A one-shot run ends with the endpoint
//! update, `stopped`, then `loop_point_reached`. A loop fires
//! `loop_point_reached` at every cycle end and never stops on its own.

use crate::activation::Activation;
use crate::curve::{Evaluate, ProgressCurve};
use crate::event::{EventChannel, ListenerId};
use crate::listener::ProgressListener;
use crate::scheduler::{Scheduler, TaskId, TaskStatus};
use crate::settings::{AnimationConfig, DriverSettings};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing
    #[default]
    Idle,
    /// Playing once from 0 to 1
    PlayingOneShotForward,
    /// Playing once from 1 to 0
    PlayingOneShotReversed,
    /// Repeating from 0 to 1
    PlayingLoopForward,
    /// Repeating from 1 to 0
    PlayingLoopReversed,
}

impl PlaybackState {
    /// Whether a run is active
    pub fn is_playing(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether the active run loops
    pub fn is_looping(&self) -> bool {
        matches!(self, Self::PlayingLoopForward | Self::PlayingLoopReversed)
    }

    /// Whether the active run travels from 1 to 0
    pub fn is_reversed(&self) -> bool {
        matches!(
            self,
            Self::PlayingOneShotReversed | Self::PlayingLoopReversed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackMode {
    OneShot,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reversed,
}

impl Direction {
    fn start(self) -> f32 {
        match self {
            Self::Forward => 0.0,
            Self::Reversed => 1.0,
        }
    }

    fn end(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reversed => 0.0,
        }
    }

    /// Strict comparison: the cursor at exactly the end leaves the cycle.
    fn in_cycle(self, cursor: f32) -> bool {
        match self {
            Self::Forward => cursor < 1.0,
            Self::Reversed => 0.0 < cursor,
        }
    }
}

/// What one tick of a run produced
enum Step {
    /// Sample the curve here
    Progress(f32),
    /// Loop cycle finished at this endpoint
    LoopPoint(f32),
    /// One-shot run finished
    Completed,
}

#[derive(Debug)]
struct ActiveRun {
    id: u64,
    task: Option<TaskId>,
    mode: PlaybackMode,
    direction: Direction,
    duration: f32,
    cursor: f32,
    restart_pending: bool,
    revert_on_stop: bool,
    deactivate_on_stop: bool,
}

impl ActiveRun {
    fn state(&self) -> PlaybackState {
        match (self.mode, self.direction) {
            (PlaybackMode::OneShot, Direction::Forward) => PlaybackState::PlayingOneShotForward,
            (PlaybackMode::OneShot, Direction::Reversed) => PlaybackState::PlayingOneShotReversed,
            (PlaybackMode::Loop, Direction::Forward) => PlaybackState::PlayingLoopForward,
            (PlaybackMode::Loop, Direction::Reversed) => PlaybackState::PlayingLoopReversed,
        }
    }

    fn advance(&mut self, delta_time: f32) -> Step {
        if self.restart_pending {
            self.restart_pending = false;
            self.cursor = self.direction.start();
            return Step::Progress(self.cursor);
        }

        let delta = delta_time / self.duration;
        self.cursor = match self.direction {
            Direction::Forward => self.cursor + delta,
            Direction::Reversed => self.cursor - delta,
        };
        if self.direction.in_cycle(self.cursor) {
            return Step::Progress(self.cursor);
        }

        match self.mode {
            PlaybackMode::OneShot => Step::Completed,
            PlaybackMode::Loop => {
                self.restart_pending = true;
                Step::LoopPoint(self.direction.end())
            }
        }
    }
}

#[derive(Debug)]
struct DriverState {
    name: String,
    settings: DriverSettings,
    curve: ProgressCurve,
    progress: f32,
    run: Option<ActiveRun>,
    next_run_id: u64,
    tmp_revert_on_stop: bool,
    tmp_deactivate_on_stop: bool,
}

type ListenerSlot = Weak<RefCell<dyn ProgressListener>>;

struct DriverInner {
    state: RefCell<DriverState>,
    scheduler: Rc<dyn Scheduler>,
    owner: Box<dyn Activation>,
    listeners: RefCell<IndexMap<ListenerId, ListenerSlot>>,
    started: EventChannel<()>,
    progress_updated: EventChannel<f32>,
    loop_point_reached: EventChannel<()>,
    stopped: EventChannel<()>,
}

/// Drives a normalized progress value along a curve over time
///
/// This is a cheap, cloneable handle; clones share one driver. All methods
/// take `&self` and may be called from inside the driver's own callbacks.
/// A Play call made from a callback replaces the run in flight, and the
/// replaced run never fires again.
#[derive(Clone)]
pub struct CurvedProgressAnimator {
    inner: Rc<DriverInner>,
}

/// A non-owning reference to a [`CurvedProgressAnimator`]
#[derive(Clone)]
pub struct WeakProgressAnimator {
    inner: Weak<DriverInner>,
}

impl WeakProgressAnimator {
    /// Get the driver if it is still alive
    pub fn upgrade(&self) -> Option<CurvedProgressAnimator> {
        self.inner
            .upgrade()
            .map(|inner| CurvedProgressAnimator { inner })
    }
}

impl CurvedProgressAnimator {
    /// Create a driver with default settings and the identity curve
    pub fn new(scheduler: Rc<dyn Scheduler>, owner: impl Activation + 'static) -> Self {
        Self::with_settings(
            "CurvedProgressAnimator",
            scheduler,
            owner,
            DriverSettings::default(),
            ProgressCurve::default(),
        )
    }

    /// Create a driver from explicit settings and curve
    ///
    /// A curve with fewer than two keys is repaired with a warning.
    pub fn with_settings(
        name: impl Into<String>,
        scheduler: Rc<dyn Scheduler>,
        owner: impl Activation + 'static,
        settings: DriverSettings,
        mut curve: ProgressCurve,
    ) -> Self {
        curve.ensure_min_keys();

        let state = DriverState {
            name: name.into(),
            settings,
            curve,
            progress: 0.0,
            run: None,
            next_run_id: 0,
            tmp_revert_on_stop: settings.revert_on_stop,
            tmp_deactivate_on_stop: settings.deactivate_on_stop,
        };

        Self {
            inner: Rc::new(DriverInner {
                state: RefCell::new(state),
                scheduler,
                owner: Box::new(owner),
                listeners: RefCell::new(IndexMap::new()),
                started: EventChannel::new(),
                progress_updated: EventChannel::new(),
                loop_point_reached: EventChannel::new(),
                stopped: EventChannel::new(),
            }),
        }
    }

    /// Create a driver from a loaded animation file
    pub fn from_config(
        config: &AnimationConfig,
        scheduler: Rc<dyn Scheduler>,
        owner: impl Activation + 'static,
    ) -> Self {
        Self::with_settings(
            config.name.clone(),
            scheduler,
            owner,
            config.settings,
            config.progress_curve.clone(),
        )
    }

    /// Get a non-owning reference
    pub fn downgrade(&self) -> WeakProgressAnimator {
        WeakProgressAnimator {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same driver
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Play according to the persistent `looping`/`reversed` settings
    pub fn play(&self) {
        let settings = self.settings();
        match (settings.looping, settings.reversed) {
            (false, false) => self.play_one_shot(),
            (false, true) => self.play_one_shot_reversed(),
            (true, false) => self.play_loop(),
            (true, true) => self.play_loop_reversed(),
        }
    }

    /// Play once from 0 to 1 with the persistent settings
    pub fn play_one_shot(&self) {
        let s = self.settings();
        self.play_one_shot_with(s.duration, s.revert_on_stop, s.deactivate_on_stop);
    }

    /// Play once from 0 to 1
    ///
    /// A non-positive duration completes immediately, inside this call.
    pub fn play_one_shot_with(&self, duration: f32, revert_on_stop: bool, deactivate_on_stop: bool) {
        self.inner.begin(
            PlaybackMode::OneShot,
            Direction::Forward,
            duration,
            revert_on_stop,
            deactivate_on_stop,
        );
    }

    /// Play once from 1 to 0 with the persistent settings
    pub fn play_one_shot_reversed(&self) {
        let s = self.settings();
        self.play_one_shot_reversed_with(s.duration, s.revert_on_stop, s.deactivate_on_stop);
    }

    /// Play once from 1 to 0
    pub fn play_one_shot_reversed_with(
        &self,
        duration: f32,
        revert_on_stop: bool,
        deactivate_on_stop: bool,
    ) {
        self.inner.begin(
            PlaybackMode::OneShot,
            Direction::Reversed,
            duration,
            revert_on_stop,
            deactivate_on_stop,
        );
    }

    /// Loop from 0 to 1 with the persistent duration
    pub fn play_loop(&self) {
        self.play_loop_with(self.settings().duration);
    }

    /// Loop from 0 to 1 until stopped
    ///
    /// A non-positive duration is replaced by 1 with a warning.
    pub fn play_loop_with(&self, duration: f32) {
        let s = self.settings();
        self.inner.begin(
            PlaybackMode::Loop,
            Direction::Forward,
            duration,
            s.revert_on_stop,
            s.deactivate_on_stop,
        );
    }

    /// Loop from 1 to 0 with the persistent duration
    pub fn play_loop_reversed(&self) {
        self.play_loop_reversed_with(self.settings().duration);
    }

    /// Loop from 1 to 0 until stopped
    pub fn play_loop_reversed_with(&self, duration: f32) {
        let s = self.settings();
        self.inner.begin(
            PlaybackMode::Loop,
            Direction::Reversed,
            duration,
            s.revert_on_stop,
            s.deactivate_on_stop,
        );
    }

    /// Stop using the flags captured by the last Play call
    pub fn stop(&self) {
        let (revert, deactivate) = self.inner.captured_flags();
        self.stop_with(revert, deactivate);
    }

    /// Stop playback
    ///
    /// Safe to call when idle. `stopped` fires once per call either way.
    pub fn stop_with(&self, revert: bool, deactivate: bool) {
        self.inner.stop_with(revert, deactivate);
    }

    /// Set the progress directly, clamped to [0, 1]
    ///
    /// Fires a progress update but no lifecycle events, and does not touch
    /// a running playback.
    pub fn set_progress(&self, progress: f32) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.inner.state.borrow_mut().progress = progress;
        self.inner.notify_progress(progress);
    }

    /// Replace the progress curve without validation
    pub fn set_progress_curve(&self, curve: ProgressCurve) {
        self.inner.state.borrow_mut().curve = curve;
    }

    /// Replace the persistent settings
    ///
    /// A run in progress keeps the flags it was started with.
    pub fn set_settings(&self, settings: DriverSettings) {
        self.inner.state.borrow_mut().settings = settings;
    }

    // ------------------------------------------------------------------
    // Host lifecycle
    // ------------------------------------------------------------------

    /// The host started the owning object
    pub fn on_start(&self) {
        if self.settings().animate_on_start {
            self.play();
        }
    }

    /// The host activated the owning object
    pub fn on_enable(&self) {
        if self.settings().animate_on_enable {
            self.play();
        }
    }

    /// The host deactivated the owning object
    ///
    /// A running playback is stopped with the flags captured when it began.
    pub fn on_disable(&self) {
        if self.is_playing() {
            self.inner.stop_for_inactive_owner();
        } else {
            self.inner.dispatch(|l| l.on_deactivated());
        }
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Attach an animator to the direct channel
    ///
    /// The driver holds a weak reference; dropping the animator detaches it.
    pub fn attach<L>(&self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: ProgressListener + 'static,
    {
        let id = ListenerId::new();
        let listener: Rc<RefCell<dyn ProgressListener>> = listener.clone();
        let slot: ListenerSlot = Rc::downgrade(&listener);
        self.inner.listeners.borrow_mut().insert(id, slot);
        id
    }

    /// Detach an animator; returns false if it was not attached
    pub fn detach(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().shift_remove(&id).is_some()
    }

    /// Number of attached animators
    pub fn attached_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Fired when a run starts
    pub fn started(&self) -> &EventChannel<()> {
        &self.inner.started
    }

    /// Fired with the new progress on every update
    pub fn progress_updated(&self) -> &EventChannel<f32> {
        &self.inner.progress_updated
    }

    /// Fired when a cycle reaches its end point
    pub fn loop_point_reached(&self) -> &EventChannel<()> {
        &self.inner.loop_point_reached
    }

    /// Fired on every stop
    pub fn stopped(&self) -> &EventChannel<()> {
        &self.inner.stopped
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current progress value
    pub fn progress(&self) -> f32 {
        self.inner.state.borrow().progress
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.inner
            .state
            .borrow()
            .run
            .as_ref()
            .map_or(PlaybackState::Idle, ActiveRun::state)
    }

    /// Whether a run is active
    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().run.is_some()
    }

    /// Persistent duration setting
    pub fn duration(&self) -> f32 {
        self.inner.state.borrow().settings.duration
    }

    /// Duration used by the active run, or the persistent one when idle
    pub fn current_duration(&self) -> f32 {
        let state = self.inner.state.borrow();
        state
            .run
            .as_ref()
            .map_or(state.settings.duration, |run| run.duration)
    }

    /// Persistent settings
    pub fn settings(&self) -> DriverSettings {
        self.inner.state.borrow().settings
    }

    /// Current progress curve
    pub fn progress_curve(&self) -> ProgressCurve {
        self.inner.state.borrow().curve.clone()
    }

    /// Display name
    pub fn name(&self) -> String {
        self.inner.state.borrow().name.clone()
    }

    /// Whether the owning object is active
    pub fn is_owner_active(&self) -> bool {
        self.inner.owner.is_active()
    }
}

impl fmt::Debug for CurvedProgressAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("CurvedProgressAnimator")
            .field("name", &state.name)
            .field("progress", &state.progress)
            .field("run", &state.run)
            .finish()
    }
}

impl DriverInner {
    fn begin(
        self: &Rc<Self>,
        mode: PlaybackMode,
        direction: Direction,
        duration: f32,
        revert_on_stop: bool,
        deactivate_on_stop: bool,
    ) {
        self.cancel_run();
        if !self.owner.is_active() {
            self.owner.set_active(true);
        }

        let duration = if mode == PlaybackMode::Loop && (duration.is_nan() || duration <= 0.0) {
            tracing::warn!(
                "{}: loop duration must be greater than 0 (got {duration}), using 1",
                self.state.borrow().name
            );
            1.0
        } else {
            duration
        };
        let ticks = duration > 0.0;

        let run_id = {
            let mut state = self.state.borrow_mut();
            state.tmp_revert_on_stop = revert_on_stop;
            state.tmp_deactivate_on_stop = deactivate_on_stop;
            state.next_run_id += 1;
            let id = state.next_run_id;
            state.run = Some(ActiveRun {
                id,
                task: None,
                mode,
                direction,
                duration,
                cursor: direction.start(),
                restart_pending: false,
                revert_on_stop,
                deactivate_on_stop,
            });
            tracing::debug!("{}: play {:?} {:?} over {duration}s", state.name, mode, direction);
            id
        };

        if ticks {
            let weak = Rc::downgrade(self);
            let task = self.scheduler.schedule(Box::new(move |dt| match weak.upgrade() {
                Some(inner) => inner.step(run_id, dt),
                None => TaskStatus::Finished,
            }));
            if let Some(run) = self.state.borrow_mut().run.as_mut() {
                run.task = Some(task);
            }
        }

        self.dispatch(|l| l.on_started());
        self.started.fire(());

        if !ticks && self.is_current(run_id) {
            self.complete_one_shot(run_id);
        }
    }

    fn step(&self, run_id: u64, delta_time: f32) -> TaskStatus {
        if !self.owner.is_active() {
            if self.is_current(run_id) {
                tracing::debug!("{}: owner went inactive", self.state.borrow().name);
                self.stop_for_inactive_owner();
            }
            return TaskStatus::Finished;
        }

        let step = {
            let mut state = self.state.borrow_mut();
            let Some(run) = state.run.as_mut().filter(|run| run.id == run_id) else {
                return TaskStatus::Finished;
            };
            run.advance(delta_time)
        };

        match step {
            Step::Progress(cursor) => self.apply_curve_at(cursor),
            Step::LoopPoint(end) => {
                self.apply_curve_at(end);
                if self.is_current(run_id) {
                    self.loop_point_reached.fire(());
                }
            }
            Step::Completed => {
                self.complete_one_shot(run_id);
                return TaskStatus::Finished;
            }
        }

        if self.is_current(run_id) {
            TaskStatus::Continue
        } else {
            TaskStatus::Finished
        }
    }

    fn complete_one_shot(&self, run_id: u64) {
        let finish = self
            .state
            .borrow()
            .run
            .as_ref()
            .filter(|run| run.id == run_id)
            .map(|run| (run.direction.end(), run.revert_on_stop, run.deactivate_on_stop));
        let Some((end, revert, deactivate)) = finish else {
            return;
        };

        self.apply_curve_at(end);
        if !self.is_current(run_id) {
            return;
        }
        self.stop_with(revert, deactivate);
        self.loop_point_reached.fire(());
    }

    fn stop_with(&self, revert: bool, deactivate: bool) {
        if self.cancel_run() {
            tracing::debug!("{}: stopped", self.state.borrow().name);
        }
        if revert {
            self.apply_curve_at(0.0);
        }
        if deactivate {
            self.owner.set_active(false);
            self.dispatch(|l| l.on_deactivated());
        }

        self.dispatch(|l| l.on_stopped());
        self.stopped.fire(());
    }

    /// Stop with the captured flags and make sure animators hear about the
    /// deactivation exactly once.
    fn stop_for_inactive_owner(&self) {
        let (revert, deactivate) = self.captured_flags();
        self.stop_with(revert, deactivate);
        if !deactivate {
            self.dispatch(|l| l.on_deactivated());
        }
    }

    /// Drop the active run and its task without firing anything.
    fn cancel_run(&self) -> bool {
        let run = self.state.borrow_mut().run.take();
        match run {
            Some(run) => {
                if let Some(task) = run.task {
                    self.scheduler.cancel(task);
                }
                true
            }
            None => false,
        }
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.state
            .borrow()
            .run
            .as_ref()
            .is_some_and(|run| run.id == run_id)
    }

    fn captured_flags(&self) -> (bool, bool) {
        let state = self.state.borrow();
        (state.tmp_revert_on_stop, state.tmp_deactivate_on_stop)
    }

    fn apply_curve_at(&self, t: f32) {
        let progress = {
            let mut state = self.state.borrow_mut();
            state.progress = state.curve.evaluate(t);
            state.progress
        };
        self.notify_progress(progress);
    }

    fn notify_progress(&self, progress: f32) {
        self.dispatch(|listener| listener.on_progress(progress));
        self.progress_updated.fire(progress);
    }

    /// Call `f` on every live attached listener, pruning dropped ones.
    fn dispatch(&self, f: impl Fn(&mut (dyn ProgressListener + 'static))) {
        let snapshot: Vec<(ListenerId, ListenerSlot)> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();

        for (id, slot) in snapshot {
            let Some(listener) = slot.upgrade() else {
                self.listeners.borrow_mut().shift_remove(&id);
                continue;
            };
            if !self.listeners.borrow().contains_key(&id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => f(&mut *listener),
                Err(_) => tracing::warn!("Skipping recursive notification of animator {:?}", id.0),
            };
        }
    }
}

impl Drop for DriverInner {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().run.as_ref().and_then(|run| run.task) {
            self.scheduler.cancel(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActiveFlag;
    use crate::keyframe::CurveKey;
    use crate::scheduler::FrameScheduler;
    use crate::testing::capture_warnings;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Started,
        Progress(f32),
        LoopPoint,
        Stopped,
    }

    struct Harness {
        scheduler: Rc<FrameScheduler>,
        owner: ActiveFlag,
        driver: CurvedProgressAnimator,
        log: Rc<RefCell<Vec<Seen>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_settings(DriverSettings::default())
        }

        fn with_settings(settings: DriverSettings) -> Self {
            let scheduler = FrameScheduler::shared();
            let owner = ActiveFlag::new(true);
            let driver = CurvedProgressAnimator::with_settings(
                "test",
                scheduler.clone(),
                owner.clone(),
                settings,
                ProgressCurve::linear(),
            );
            let log = Rc::new(RefCell::new(Vec::new()));

            let l = Rc::clone(&log);
            driver.started().add_listener(move |()| l.borrow_mut().push(Seen::Started));
            let l = Rc::clone(&log);
            driver
                .progress_updated()
                .add_listener(move |p| l.borrow_mut().push(Seen::Progress(p)));
            let l = Rc::clone(&log);
            driver
                .loop_point_reached()
                .add_listener(move |()| l.borrow_mut().push(Seen::LoopPoint));
            let l = Rc::clone(&log);
            driver.stopped().add_listener(move |()| l.borrow_mut().push(Seen::Stopped));

            Self {
                scheduler,
                owner,
                driver,
                log,
            }
        }

        fn take(&self) -> Vec<Seen> {
            std::mem::take(&mut *self.log.borrow_mut())
        }

        fn progress_values(&self) -> Vec<f32> {
            self.log
                .borrow()
                .iter()
                .filter_map(|seen| match seen {
                    Seen::Progress(p) => Some(*p),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, wanted: &Seen) -> usize {
            self.log.borrow().iter().filter(|seen| *seen == wanted).count()
        }
    }

    fn assert_progress(seen: &[Seen], expected: &[f32]) {
        let values: Vec<f32> = seen
            .iter()
            .filter_map(|s| match s {
                Seen::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(values.len(), expected.len(), "progress values: {values:?}");
        for (got, want) in values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-4, "got {values:?}, want {expected:?}");
        }
    }

    #[test]
    fn test_one_shot_forward_sequence() {
        let h = Harness::new();
        h.driver.play_one_shot_with(2.0, false, false);
        assert_eq!(h.driver.state(), PlaybackState::PlayingOneShotForward);
        assert_eq!(h.take(), vec![Seen::Started]);

        h.scheduler.run_frames(4, 0.5);
        let seen = h.take();
        assert_progress(&seen, &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(&seen[4..], &[Seen::Stopped, Seen::LoopPoint]);
        assert_eq!(h.driver.state(), PlaybackState::Idle);
        assert_eq!(h.driver.progress(), 1.0);
        assert_eq!(h.scheduler.task_count(), 0);

        h.scheduler.run_frames(3, 0.5);
        assert!(h.take().is_empty());
    }

    #[test]
    fn test_one_shot_reversed_sequence() {
        let h = Harness::new();
        h.driver.play_one_shot_reversed_with(2.0, false, false);
        assert_eq!(h.driver.state(), PlaybackState::PlayingOneShotReversed);

        h.scheduler.run_frames(4, 0.5);
        let seen = h.take();
        assert_eq!(seen[0], Seen::Started);
        assert_progress(&seen, &[0.75, 0.5, 0.25, 0.0]);
        assert_eq!(&seen[seen.len() - 2..], &[Seen::Stopped, Seen::LoopPoint]);
        assert_eq!(h.driver.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_one_shot_progress_is_monotonic() {
        let h = Harness::new();
        h.driver.set_progress_curve(ProgressCurve::ease_in_out());
        h.driver.play_one_shot_with(1.0, false, false);
        h.scheduler.run_frames(20, 0.07);

        let values = h.progress_values();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        assert_eq!(values.last().copied(), Some(1.0));
        assert_eq!(h.count(&Seen::Started), 1);
        assert_eq!(h.count(&Seen::Stopped), 1);
        assert_eq!(h.count(&Seen::LoopPoint), 1);
    }

    #[test]
    fn test_one_shot_revert_on_stop() {
        let h = Harness::new();
        h.driver.play_one_shot_with(1.0, true, false);
        h.scheduler.run_frames(2, 0.5);

        let seen = h.take();
        assert_progress(&seen, &[0.5, 1.0, 0.0]);
        assert_eq!(&seen[seen.len() - 2..], &[Seen::Stopped, Seen::LoopPoint]);
        assert_eq!(h.driver.progress(), 0.0);
    }

    #[test]
    fn test_zero_duration_one_shot_completes_immediately() {
        let h = Harness::new();
        h.driver.play_one_shot_with(0.0, false, false);

        assert_eq!(
            h.take(),
            vec![
                Seen::Started,
                Seen::Progress(1.0),
                Seen::Stopped,
                Seen::LoopPoint
            ]
        );
        assert_eq!(h.driver.state(), PlaybackState::Idle);
        assert_eq!(h.scheduler.task_count(), 0);
    }

    #[test]
    fn test_zero_duration_reversed_snaps_to_start() {
        let h = Harness::new();
        h.driver.play_one_shot_reversed_with(-3.0, false, false);
        assert_eq!(h.driver.progress(), 0.0);
        assert_eq!(h.count(&Seen::LoopPoint), 1);
    }

    #[test]
    fn test_one_shot_deactivates_owner() {
        let h = Harness::new();
        h.driver.play_one_shot_with(0.5, false, true);
        h.scheduler.run_frames(2, 0.25);

        assert!(!h.owner.is_active());
        h.driver.play_one_shot_with(0.5, false, true);
        assert!(h.owner.is_active());
    }

    #[test]
    fn test_play_reactivates_owner() {
        let h = Harness::new();
        h.owner.set_active(false);
        h.driver.play_loop_with(1.0);
        assert!(h.owner.is_active());
        assert!(h.driver.is_owner_active());
    }

    #[test]
    fn test_loop_non_positive_duration_uses_one() {
        let h = Harness::new();
        let ((), warnings) = capture_warnings(|| h.driver.play_loop_with(0.0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("loop duration"), "{warnings:?}");
        assert_eq!(h.driver.current_duration(), 1.0);
        assert_eq!(h.driver.duration(), 1.0);

        h.scheduler.run_frames(4, 0.25);
        let seen = h.take();
        assert_progress(&seen, &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(seen.last(), Some(&Seen::LoopPoint));
        assert_eq!(h.driver.state(), PlaybackState::PlayingLoopForward);
        assert!(h.driver.state().is_looping());
    }

    #[test]
    fn test_loop_cycles_without_stopping() {
        let h = Harness::new();
        h.driver.play_loop_with(1.0);
        h.scheduler.run_frames(2, 0.5);
        assert_eq!(
            h.take(),
            vec![
                Seen::Started,
                Seen::Progress(0.5),
                Seen::Progress(1.0),
                Seen::LoopPoint
            ]
        );

        // Restart tick samples the cycle start, then the cycle repeats.
        h.scheduler.run_frames(3, 0.5);
        assert_eq!(
            h.take(),
            vec![
                Seen::Progress(0.0),
                Seen::Progress(0.5),
                Seen::Progress(1.0),
                Seen::LoopPoint
            ]
        );
        assert_eq!(h.count(&Seen::Stopped), 0);
        assert!(h.driver.is_playing());
    }

    #[test]
    fn test_loop_reversed_cycles() {
        let h = Harness::new();
        h.driver.play_loop_reversed_with(1.0);
        assert_eq!(h.driver.state(), PlaybackState::PlayingLoopReversed);
        assert!(h.driver.state().is_reversed());

        h.scheduler.run_frames(3, 0.5);
        let seen = h.take();
        assert_progress(&seen, &[0.5, 0.0, 1.0]);
        assert_eq!(h.driver.progress(), 1.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let h = Harness::with_settings(DriverSettings {
            revert_on_stop: false,
            deactivate_on_stop: false,
            ..DriverSettings::default()
        });
        h.driver.stop();
        h.driver.stop();

        assert_eq!(h.take(), vec![Seen::Stopped, Seen::Stopped]);
        assert_eq!(h.driver.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stop_cancels_loop() {
        let h = Harness::new();
        h.driver.play_loop_with(1.0);
        h.scheduler.tick(0.25);
        h.driver.stop_with(false, false);
        h.take();

        h.scheduler.run_frames(10, 0.25);
        assert!(h.take().is_empty());
        assert_eq!(h.scheduler.task_count(), 0);
    }

    #[test]
    fn test_stop_with_revert_fires_update() {
        let h = Harness::new();
        h.driver.set_progress(0.6);
        h.take();

        h.driver.stop_with(true, false);
        assert_eq!(h.take(), vec![Seen::Progress(0.0), Seen::Stopped]);
    }

    #[test]
    fn test_set_progress_clamps() {
        let h = Harness::new();
        h.driver.set_progress(-0.5);
        assert_eq!(h.driver.progress(), 0.0);
        h.driver.set_progress(1.7);
        assert_eq!(h.driver.progress(), 1.0);

        assert_eq!(h.take(), vec![Seen::Progress(0.0), Seen::Progress(1.0)]);
    }

    #[test]
    fn test_one_shot_preempts_loop() {
        let h = Harness::new();
        h.driver.play_loop_with(0.5);
        h.scheduler.run_frames(5, 0.25);
        assert!(h.count(&Seen::LoopPoint) >= 1);
        h.take();

        h.driver.play_one_shot_with(1.0, false, false);
        assert_eq!(h.scheduler.task_count(), 1);
        h.scheduler.run_frames(4, 0.25);

        let seen = h.take();
        assert_eq!(seen[0], Seen::Started);
        assert_progress(&seen, &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(&seen[seen.len() - 2..], &[Seen::Stopped, Seen::LoopPoint]);

        h.scheduler.run_frames(4, 0.25);
        assert!(h.take().is_empty());
    }

    #[test]
    fn test_play_from_callback_replaces_run() {
        let h = Harness::new();
        let driver = h.driver.downgrade();
        let restarted = Rc::new(RefCell::new(false));

        let flag = Rc::clone(&restarted);
        h.driver.progress_updated().add_listener(move |p| {
            if p >= 0.5 && !flag.replace(true) {
                if let Some(driver) = driver.upgrade() {
                    driver.play_one_shot_reversed_with(1.0, false, false);
                }
            }
        });

        h.driver.play_one_shot_with(1.0, false, false);
        h.scheduler.run_frames(2, 0.5);
        assert_eq!(h.driver.state(), PlaybackState::PlayingOneShotReversed);
        // Forward run reached its end value but never stopped.
        assert_eq!(h.count(&Seen::Stopped), 0);
        assert_eq!(h.count(&Seen::Started), 2);

        h.scheduler.run_frames(2, 0.5);
        assert_eq!(h.count(&Seen::Stopped), 1);
        assert_eq!(h.driver.progress(), 0.0);
    }

    #[test]
    fn test_on_disable_uses_captured_flags() {
        let h = Harness::new();
        h.driver.play_one_shot_with(1.0, true, false);
        h.scheduler.tick(0.5);

        h.driver.set_settings(DriverSettings {
            revert_on_stop: false,
            ..DriverSettings::default()
        });
        h.owner.set_active(false);
        h.driver.on_disable();

        assert_eq!(h.driver.progress(), 0.0);
        assert!(!h.driver.is_playing());
        assert!(!h.owner.is_active());
        assert_eq!(h.count(&Seen::Stopped), 1);
    }

    #[test]
    fn test_on_disable_when_idle_is_silent() {
        let h = Harness::new();
        h.driver.on_disable();
        assert!(h.take().is_empty());
    }

    #[test]
    fn test_lifecycle_hooks_follow_settings() {
        let h = Harness::with_settings(DriverSettings {
            looping: true,
            reversed: true,
            animate_on_start: false,
            ..DriverSettings::default()
        });

        h.driver.on_start();
        assert_eq!(h.driver.state(), PlaybackState::Idle);
        h.driver.on_enable();
        assert_eq!(h.driver.state(), PlaybackState::PlayingLoopReversed);
    }

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ProgressListener for Recorder {
        fn on_progress(&mut self, progress: f32) {
            self.log.borrow_mut().push(format!("direct {progress}"));
        }

        fn on_started(&mut self) {
            self.log.borrow_mut().push("direct started".into());
        }

        fn on_stopped(&mut self) {
            self.log.borrow_mut().push("direct stopped".into());
        }

        fn on_deactivated(&mut self) {
            self.log.borrow_mut().push("direct deactivated".into());
        }
    }

    fn attach_recorder(h: &Harness) -> (Rc<RefCell<Recorder>>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::new(RefCell::new(Recorder { log: Rc::clone(&log) }));
        h.driver.attach(&recorder);
        (recorder, log)
    }

    fn deactivations(log: &RefCell<Vec<String>>) -> usize {
        log.borrow().iter().filter(|e| *e == "direct deactivated").count()
    }

    #[test]
    fn test_inactive_owner_stops_run() {
        let h = Harness::new();
        let (_recorder, log) = attach_recorder(&h);
        h.driver.play_loop_with(1.0);
        h.scheduler.tick(0.25);
        h.take();

        h.owner.set_active(false);
        h.scheduler.run_frames(3, 0.25);

        // Loops stop with the persistent revert/deactivate defaults.
        assert_eq!(h.take(), vec![Seen::Progress(0.0), Seen::Stopped]);
        assert_eq!(h.driver.state(), PlaybackState::Idle);
        assert_eq!(h.scheduler.task_count(), 0);
        assert_eq!(deactivations(&log), 1);
    }

    #[test]
    fn test_inactive_owner_without_flags_still_notifies_deactivation() {
        let h = Harness::new();
        let (_recorder, log) = attach_recorder(&h);
        h.driver.play_one_shot_with(1.0, false, false);
        h.scheduler.tick(0.25);
        h.take();

        h.owner.set_active(false);
        h.scheduler.tick(0.25);

        assert_eq!(h.take(), vec![Seen::Stopped]);
        assert_eq!(h.driver.progress(), 0.25);
        assert!(!h.driver.is_playing());
        assert_eq!(deactivations(&log), 1);
    }

    #[test]
    fn test_direct_channel_fires_before_broadcast() {
        let h = Harness::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::new(RefCell::new(Recorder { log: Rc::clone(&log) }));
        h.driver.attach(&recorder);

        let l = Rc::clone(&log);
        h.driver
            .progress_updated()
            .add_listener(move |p| l.borrow_mut().push(format!("broadcast {p}")));
        let l = Rc::clone(&log);
        h.driver
            .started()
            .add_listener(move |()| l.borrow_mut().push("broadcast started".into()));

        h.driver.play_one_shot_with(0.0, false, false);
        assert_eq!(
            *log.borrow(),
            vec![
                "direct started",
                "broadcast started",
                "direct 1",
                "broadcast 1",
                "direct stopped"
            ]
        );
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let h = Harness::new();
        let recorder = Rc::new(RefCell::new(Recorder {
            log: Rc::new(RefCell::new(Vec::new())),
        }));
        let id = h.driver.attach(&recorder);
        assert_eq!(h.driver.attached_count(), 1);

        drop(recorder);
        h.driver.set_progress(0.3);
        assert_eq!(h.driver.attached_count(), 0);
        assert!(!h.driver.detach(id));
    }

    #[test]
    fn test_from_config_repairs_single_key_curve() {
        let mut config = AnimationConfig::new("single");
        config.progress_curve = ProgressCurve::new(vec![CurveKey::new(0.0, 0.2)]);
        let driver =
            CurvedProgressAnimator::from_config(&config, FrameScheduler::shared(), ActiveFlag::default());

        assert_eq!(driver.progress_curve().keys().len(), 2);
        assert_eq!(driver.name(), "single");
    }

    #[test]
    fn test_dropping_driver_cancels_task() {
        let scheduler = FrameScheduler::shared();
        let driver = CurvedProgressAnimator::new(scheduler.clone(), ActiveFlag::default());
        driver.play_loop_with(1.0);
        assert_eq!(scheduler.task_count(), 1);

        drop(driver);
        assert_eq!(scheduler.task_count(), 0);
    }
}
