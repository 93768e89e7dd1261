//! Time-driven value animator
//!
//! A [`ValueAnimator`] interpolates a single `f32` between two values over a
//! fixed duration. It has no clock of its own: the owner feeds it elapsed
//! milliseconds through [`tick`](ValueAnimator::tick), normally from the
//! [`AnimationScheduler`](crate::AnimationScheduler).

use std::rc::Rc;

use crate::easing::Easing;
use crate::listener::{AnimatorListener, ListenerSet};

/// Playback state of an animator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorState {
    /// Never started, or reset
    Idle,
    Running,
    /// Reached the end of its duration (or was ended early)
    Finished,
    Cancelled,
}

/// Interpolates a value from `from` to `to` over `duration_ms`
#[derive(Debug)]
pub struct ValueAnimator {
    from: f32,
    to: f32,
    duration_ms: f32,
    elapsed_ms: f32,
    easing: Easing,
    state: AnimatorState,
    listeners: ListenerSet,
}

impl ValueAnimator {
    pub fn new(from: f32, to: f32, duration_ms: f32) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing: Easing::default(),
            state: AnimatorState::Idle,
            listeners: ListenerSet::new(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn set_values(&mut self, from: f32, to: f32) {
        self.from = from;
        self.to = to;
    }

    pub fn set_duration(&mut self, duration_ms: f32) {
        self.duration_ms = duration_ms.max(0.0);
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimatorState::Running
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Current interpolated value
    pub fn value(&self) -> f32 {
        let fraction = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * fraction
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnimatorListener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Rc<dyn AnimatorListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerSet {
        &mut self.listeners
    }

    /// Start from the beginning
    ///
    /// Restarting a running animator cancels the current run first.
    pub fn start(&mut self) {
        if self.is_running() {
            self.cancel();
        }
        self.elapsed_ms = 0.0;
        self.state = AnimatorState::Running;
        tracing::trace!(
            from = self.from,
            to = self.to,
            duration_ms = self.duration_ms,
            "ValueAnimator: start"
        );
        self.listeners.emit_start();
    }

    /// Advance by `dt_ms`, reporting the new value to `on_update`
    ///
    /// Returns `true` while still running. Completion listeners fire after
    /// the final update has been delivered.
    pub fn tick(&mut self, dt_ms: f32, mut on_update: impl FnMut(f32)) -> bool {
        if !self.is_running() {
            return false;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        on_update(self.value());

        if self.elapsed_ms >= self.duration_ms {
            self.state = AnimatorState::Finished;
            self.listeners.emit_end();
            return false;
        }
        true
    }

    /// Stop without reaching the end value
    pub fn cancel(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = AnimatorState::Cancelled;
        self.listeners.emit_cancel();
    }

    /// Jump to the end value and finish
    pub fn end(&mut self, on_update: impl FnOnce(f32)) {
        if !self.is_running() {
            return;
        }
        self.elapsed_ms = self.duration_ms;
        on_update(self.value());
        self.state = AnimatorState::Finished;
        self.listeners.emit_end();
    }
}
