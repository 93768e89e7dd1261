//! Drag session state machine
//!
//! A [`DragSession`] holds the geometry of a single gesture and classifies
//! its release. It performs no side effects; the engine turns the returned
//! [`DragUpdate`] and [`Release`] values into overlay updates and animations.

use tether_core::{Point, Rect, Vec2};

use crate::config::DragParams;

/// Lifecycle of an element's drag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Dragging,
    /// Damped return to the anchor is playing
    ReturningHome,
    /// Disappear animation (and cascade) is playing
    Vanishing,
}

/// Overlay state for one move sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragUpdate {
    pub target_rect: Rect,
    pub radius: f32,
    pub draw_link: bool,
}

/// What should follow a release
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Play the disappear animation from the release point
    Vanish,
    /// Spring back to the anchor
    ReturnHome,
    /// Show the element again in place, no animation
    Restore,
}

/// Classification of a release
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Release {
    pub outcome: ReleaseOutcome,
    /// The gesture qualifies as a vanish trigger, whether or not an
    /// animation can be played for it
    pub valid: bool,
    /// The ghost should stay on the overlay for the follow-up animation
    pub keep_visible: bool,
    pub target_rect: Rect,
}

/// Geometry and thresholds of one drag gesture
#[derive(Debug)]
pub struct DragSession {
    anchor_rect: Rect,
    pointer_offset: Vec2,
    params: DragParams,
    target_rect: Rect,
    exceeded: bool,
    state: SessionState,
}

impl DragSession {
    /// Start a gesture on an element at `anchor_rect`, grabbed at `pointer`
    pub fn begin(anchor_rect: Rect, pointer: Point, params: DragParams) -> Self {
        Self {
            anchor_rect,
            pointer_offset: pointer - anchor_rect.origin,
            params,
            target_rect: anchor_rect,
            exceeded: false,
            state: SessionState::Dragging,
        }
    }

    /// Follow the pointer
    pub fn update(&mut self, pointer: Point) -> DragUpdate {
        self.target_rect = self.target_for(pointer);
        let distance = self.distance();
        if distance > self.params.max_distance {
            self.exceeded = true;
        }
        DragUpdate {
            target_rect: self.target_rect,
            radius: self.radius_for(distance),
            draw_link: !self.exceeded,
        }
    }

    /// Classify the release at `pointer`
    ///
    /// `disappear_ok` and `damping_ok` report whether the element has a
    /// usable configuration for the respective animation. The exceeded
    /// latch is not updated by the release sample.
    pub fn release(&mut self, pointer: Point, disappear_ok: bool, damping_ok: bool) -> Release {
        self.target_rect = self.target_for(pointer);
        let valid = self.exceeded && self.distance() > self.params.recoverable_distance;

        let outcome = if valid && disappear_ok {
            ReleaseOutcome::Vanish
        } else if !self.exceeded && damping_ok {
            ReleaseOutcome::ReturnHome
        } else {
            ReleaseOutcome::Restore
        };
        self.state = match outcome {
            ReleaseOutcome::Vanish => SessionState::Vanishing,
            ReleaseOutcome::ReturnHome => SessionState::ReturningHome,
            ReleaseOutcome::Restore => SessionState::Idle,
        };
        tracing::debug!(?outcome, valid, exceeded = self.exceeded, "DragSession: release");

        Release {
            outcome,
            valid,
            keep_visible: outcome != ReleaseOutcome::Restore,
            target_rect: self.target_rect,
        }
    }

    /// Anchor radius at `distance`
    ///
    /// Shrinks linearly from `max_radius` at the anchor to `min_radius` at
    /// `max_distance`, and is zero once the latch is set.
    pub fn radius_for(&self, distance: f32) -> f32 {
        if self.exceeded {
            return 0.0;
        }
        let p = &self.params;
        p.min_radius + (1.0 - distance / p.max_distance) * (p.max_radius - p.min_radius)
    }

    /// Distance between the anchor centre and the current target centre
    pub fn distance(&self) -> f32 {
        self.anchor_rect
            .center()
            .distance_to(self.target_rect.center())
    }

    fn target_for(&self, pointer: Point) -> Rect {
        self.anchor_rect
            .offset_to(Point::new(pointer.x - self.pointer_offset.x, pointer.y - self.pointer_offset.y))
    }

    pub fn anchor_rect(&self) -> Rect {
        self.anchor_rect
    }

    pub fn target_rect(&self) -> Rect {
        self.target_rect
    }

    pub fn params(&self) -> &DragParams {
        &self.params
    }

    pub fn exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DragParams {
        DragParams {
            max_distance: 200.0,
            min_radius: 10.0,
            max_radius: 50.0,
            recoverable_distance: 150.0,
        }
    }

    /// 20x20 element centred on (100, 100), grabbed at its centre
    fn session() -> DragSession {
        DragSession::begin(Rect::new(90.0, 90.0, 20.0, 20.0), Point::new(100.0, 100.0), params())
    }

    #[test]
    fn test_radius_at_half_distance() {
        let mut session = session();
        let update = session.update(Point::new(200.0, 100.0));
        assert_eq!(session.distance(), 100.0);
        assert_eq!(update.radius, 30.0);
        assert!(update.draw_link);
        assert_eq!(update.target_rect, Rect::new(190.0, 90.0, 20.0, 20.0));
    }

    #[test]
    fn test_radius_reaches_min_at_max_distance() {
        let mut session = session();
        let update = session.update(Point::new(300.0, 100.0));
        assert_eq!(update.radius, 10.0);
        assert!(!session.exceeded());
    }

    #[test]
    fn test_radius_is_monotonic() {
        let session = session();
        let mut previous = f32::INFINITY;
        for step in 0..=20 {
            let radius = session.radius_for(step as f32 * 10.0);
            assert!(radius <= previous);
            previous = radius;
        }
    }

    #[test]
    fn test_exceeded_latch_holds() {
        let mut session = session();
        let update = session.update(Point::new(320.0, 100.0));
        assert!(session.exceeded());
        assert_eq!(update.radius, 0.0);
        assert!(!update.draw_link);

        let update = session.update(Point::new(110.0, 100.0));
        assert!(session.exceeded());
        assert_eq!(update.radius, 0.0);
        assert!(!update.draw_link);
    }

    #[test]
    fn test_pointer_offset_is_preserved() {
        let mut session =
            DragSession::begin(Rect::new(90.0, 90.0, 20.0, 20.0), Point::new(92.0, 95.0), params());
        let update = session.update(Point::new(102.0, 95.0));
        assert_eq!(update.target_rect, Rect::new(100.0, 90.0, 20.0, 20.0));
    }

    #[test]
    fn test_release_past_recoverable_vanishes() {
        let mut session = session();
        session.update(Point::new(320.0, 100.0));
        let release = session.release(Point::new(350.0, 100.0), true, true);
        assert_eq!(release.outcome, ReleaseOutcome::Vanish);
        assert!(release.valid);
        assert!(release.keep_visible);
        assert_eq!(session.state(), SessionState::Vanishing);
    }

    #[test]
    fn test_valid_release_without_frames_restores() {
        let mut session = session();
        session.update(Point::new(320.0, 100.0));
        let release = session.release(Point::new(350.0, 100.0), false, true);
        assert_eq!(release.outcome, ReleaseOutcome::Restore);
        assert!(release.valid);
        assert!(!release.keep_visible);
    }

    #[test]
    fn test_exceeded_within_recoverable_restores() {
        let mut session = session();
        session.update(Point::new(320.0, 100.0));
        let release = session.release(Point::new(150.0, 100.0), true, true);
        assert_eq!(release.outcome, ReleaseOutcome::Restore);
        assert!(!release.valid);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_release_within_range_returns_home() {
        let mut session = session();
        session.update(Point::new(180.0, 100.0));
        let release = session.release(Point::new(180.0, 100.0), true, true);
        assert_eq!(release.outcome, ReleaseOutcome::ReturnHome);
        assert_eq!(session.state(), SessionState::ReturningHome);

        let mut session = self::session();
        let release = session.release(Point::new(180.0, 100.0), true, false);
        assert_eq!(release.outcome, ReleaseOutcome::Restore);
    }

    #[test]
    fn test_release_does_not_latch() {
        let mut session = session();
        session.update(Point::new(150.0, 100.0));
        // Release lands past max distance without a move sample there
        let release = session.release(Point::new(400.0, 100.0), true, true);
        assert!(!release.valid);
        assert_eq!(release.outcome, ReleaseOutcome::ReturnHome);
    }
}
