//! Animation scheduler
//!
//! Cooperative clock for every running animation. The scheduler lives on the
//! UI thread and is driven by the host, either with wall-clock deltas
//! ([`tick`](AnimationScheduler::tick)) or with explicit frame durations
//! ([`advance`](AnimationScheduler::advance)). Nothing here blocks or spawns
//! threads; an animation that finishes is dropped from the scheduler.

use slotmap::{new_key_type, SlotMap};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a registered animation
    pub struct AnimationId;
}

/// Something the scheduler can drive
pub trait Animation {
    /// Advance by `dt_ms`; returns `true` while the animation is still running
    fn tick(&mut self, dt_ms: f32) -> bool;

    /// Stop immediately without completing
    fn cancel(&mut self);

    /// Jump to the final state and complete
    fn end(&mut self);
}

/// Drives all registered animations
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Box<dyn Animation>>,
    last_frame: Instant,
    target_fps: u32,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
            last_frame: Instant::now(),
            target_fps: 60,
        }
    }

    /// Set the target frame rate used by [`frame_duration`](Self::frame_duration)
    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Duration of one frame at the target frame rate
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    /// Register an already started animation
    pub fn add(&mut self, animation: Box<dyn Animation>) -> AnimationId {
        if self.animations.is_empty() {
            // Idle time before the first animation is not animation time
            self.last_frame = Instant::now();
        }
        let id = self.animations.insert(animation);
        tracing::debug!(?id, active = self.animations.len(), "AnimationScheduler: add");
        id
    }

    /// Tick using the wall-clock time since the previous tick
    ///
    /// Returns `true` if animations are still active.
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        self.step(dt.as_secs_f32() * 1000.0)
    }

    /// Tick by an explicit duration
    ///
    /// Returns `true` if animations are still active.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.last_frame = Instant::now();
        self.step(dt.as_secs_f32() * 1000.0)
    }

    fn step(&mut self, dt_ms: f32) -> bool {
        let ids: Vec<AnimationId> = self.animations.keys().collect();
        for id in ids {
            let running = match self.animations.get_mut(id) {
                Some(animation) => animation.tick(dt_ms),
                None => continue,
            };
            if !running {
                self.animations.remove(id);
                tracing::debug!(?id, "AnimationScheduler: finished");
            }
        }
        self.has_active_animations()
    }

    /// Cancel and drop an animation; returns `false` if it was not active
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        match self.animations.remove(id) {
            Some(mut animation) => {
                animation.cancel();
                tracing::debug!(?id, "AnimationScheduler: cancelled");
                true
            }
            None => false,
        }
    }

    /// Complete an animation immediately; returns `false` if it was not active
    pub fn end(&mut self, id: AnimationId) -> bool {
        match self.animations.remove(id) {
            Some(mut animation) => {
                animation.end();
                true
            }
            None => false,
        }
    }

    /// Cancel every active animation
    pub fn cancel_all(&mut self) {
        let ids: Vec<AnimationId> = self.animations.keys().collect();
        for id in ids {
            self.cancel(id);
        }
    }

    pub fn is_active(&self, id: AnimationId) -> bool {
        self.animations.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.animations.len()
    }

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        !self.animations.is_empty()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Countdown {
        remaining_ms: f32,
        cancelled: Rc<Cell<bool>>,
        ended: Rc<Cell<bool>>,
    }

    impl Countdown {
        fn boxed(ms: f32) -> (Box<dyn Animation>, Rc<Cell<bool>>, Rc<Cell<bool>>) {
            let cancelled = Rc::new(Cell::new(false));
            let ended = Rc::new(Cell::new(false));
            let animation = Box::new(Countdown {
                remaining_ms: ms,
                cancelled: cancelled.clone(),
                ended: ended.clone(),
            });
            (animation, cancelled, ended)
        }
    }

    impl Animation for Countdown {
        fn tick(&mut self, dt_ms: f32) -> bool {
            self.remaining_ms -= dt_ms;
            if self.remaining_ms <= 0.0 {
                self.ended.set(true);
                return false;
            }
            true
        }

        fn cancel(&mut self) {
            self.cancelled.set(true);
        }

        fn end(&mut self) {
            self.ended.set(true);
        }
    }

    #[test]
    fn test_finished_animations_are_removed() {
        let mut scheduler = AnimationScheduler::new();
        let (short, _, short_ended) = Countdown::boxed(10.0);
        let (long, _, _) = Countdown::boxed(100.0);
        let short_id = scheduler.add(short);
        let long_id = scheduler.add(long);

        assert!(scheduler.advance(Duration::from_millis(16)));
        assert!(short_ended.get());
        assert!(!scheduler.is_active(short_id));
        assert!(scheduler.is_active(long_id));
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_cancel_and_end() {
        let mut scheduler = AnimationScheduler::new();
        let (a, a_cancelled, _) = Countdown::boxed(100.0);
        let (b, _, b_ended) = Countdown::boxed(100.0);
        let a_id = scheduler.add(a);
        let b_id = scheduler.add(b);

        assert!(scheduler.cancel(a_id));
        assert!(a_cancelled.get());
        assert!(!scheduler.cancel(a_id));

        assert!(scheduler.end(b_id));
        assert!(b_ended.get());
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_frame_duration() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.set_target_fps(50);
        assert_eq!(scheduler.frame_duration(), Duration::from_millis(20));
    }
}
