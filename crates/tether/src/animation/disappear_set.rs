//! Orchestrated playback of several disappear animators

use std::rc::Rc;

use tether_animation::{Animation, AnimatorListener, AnimatorState, ListenerSet};
use tether_core::Rect;

use super::DisappearAnimator;
use crate::element::VisualElement;

/// Disappear animators played one after another as a single animation
///
/// Build it with [`play`](Self::play):
///
/// ```ignore
/// set.play(leader)
///     .with(first_rect)       // same timeline as `leader`
///     .before(next)           // plays after `leader` finishes
///     .add_listener(listener);
/// ```
///
/// On [`start`](Self::start) the listeners of every child are moved to the
/// set, so each fires once for the whole playback rather than once per
/// child.
pub struct DisappearAnimatorSet {
    animators: Vec<DisappearAnimator>,
    current: usize,
    listeners: ListenerSet,
    state: AnimatorState,
}

impl Default for DisappearAnimatorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DisappearAnimatorSet {
    pub fn new() -> Self {
        Self {
            animators: Vec::new(),
            current: 0,
            listeners: ListenerSet::new(),
            state: AnimatorState::Idle,
        }
    }

    /// Append `animator` and return a builder positioned on it
    pub fn play(&mut self, animator: DisappearAnimator) -> SetBuilder<'_> {
        self.animators.push(animator);
        SetBuilder { set: self }
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnimatorListener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn animators(&self) -> &[DisappearAnimator] {
        &self.animators
    }

    pub fn len(&self) -> usize {
        self.animators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Index of the playing child
    pub fn current_index(&self) -> Option<usize> {
        self.is_running().then_some(self.current)
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimatorState::Running
    }

    /// Start the first child that has something to play
    ///
    /// Returns `false` if no child can start; nothing is reported to the
    /// listeners in that case.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            self.cancel();
        }
        for animator in &mut self.animators {
            self.listeners.absorb(animator.listeners_mut());
        }
        let Some(first) = self.start_from(0) else {
            tracing::debug!(children = self.animators.len(), "DisappearAnimatorSet: nothing to play");
            return false;
        };
        self.current = first;
        self.state = AnimatorState::Running;
        tracing::debug!(
            children = self.animators.len(),
            listeners = self.listeners.len(),
            "DisappearAnimatorSet: start"
        );
        self.listeners.emit_start();
        true
    }

    fn start_from(&mut self, from: usize) -> Option<usize> {
        (from..self.animators.len()).find(|&index| self.animators[index].start())
    }

    fn finish(&mut self) {
        self.state = AnimatorState::Finished;
        tracing::debug!("DisappearAnimatorSet: finished");
        self.listeners.emit_end();
    }
}

impl Animation for DisappearAnimatorSet {
    fn tick(&mut self, dt_ms: f32) -> bool {
        if !self.is_running() {
            return false;
        }
        if let Some(current) = self.animators.get_mut(self.current) {
            if current.tick(dt_ms) {
                return true;
            }
        }
        match self.start_from(self.current + 1) {
            Some(next) => {
                tracing::trace!(next, "DisappearAnimatorSet: next child");
                self.current = next;
                true
            }
            None => {
                self.finish();
                false
            }
        }
    }

    fn cancel(&mut self) {
        if !self.is_running() {
            return;
        }
        for animator in &mut self.animators {
            animator.cancel();
        }
        self.state = AnimatorState::Cancelled;
        self.listeners.emit_cancel();
    }

    fn end(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(current) = self.animators.get_mut(self.current) {
            current.end();
        }
        for animator in &mut self.animators {
            animator.cancel();
        }
        self.finish();
    }
}

/// Builder returned by [`DisappearAnimatorSet::play`]
pub struct SetBuilder<'a> {
    set: &'a mut DisappearAnimatorSet,
}

impl<'a> SetBuilder<'a> {
    fn tail(&mut self) -> Option<&mut DisappearAnimator> {
        self.set.animators.last_mut()
    }

    /// Draw the current timeline into `rect` as well
    pub fn with(mut self, rect: Rect) -> Self {
        if let Some(animator) = self.tail() {
            animator.add_destination_rect(rect);
        }
        self
    }

    /// Play `animator` after everything added so far
    pub fn before(self, animator: DisappearAnimator) -> Self {
        self.set.animators.push(animator);
        self
    }

    /// Listen to the whole set
    pub fn add_listener(mut self, listener: Rc<dyn AnimatorListener>) -> Self {
        if let Some(animator) = self.tail() {
            animator.add_listener(listener);
        } else {
            self.set.listeners.add(listener);
        }
        self
    }

    /// Draw `element` under the frames of every animator added so far
    pub fn add_placeholder(self, element: &dyn VisualElement) -> Self {
        for animator in &mut self.set.animators {
            animator.add_placeholder(element);
        }
        self
    }
}
