//! Damped return to the anchor

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tether_animation::{Animation, AnimatorListener, DampingCurve, Easing, ValueAnimator};
use tether_core::{Point, Vec2};

use crate::config::DampingConfig;
use crate::overlay::{OverlayHandle, OverlaySurface};

/// Moves the overlay ghost from where it was released back to `anchor`
///
/// The offset between the ghost and the anchor is scaled by a decaying
/// oscillation that starts at 1 and settles at exactly 0, so the ghost
/// overshoots the anchor `bounce_count` times before coming to rest on it.
pub struct DampingAnimator {
    surface: Weak<RefCell<OverlaySurface>>,
    anchor: Point,
    distance: Vec2,
    animator: ValueAnimator,
}

impl DampingAnimator {
    /// `anchor` is the origin the ghost returns to
    pub fn new(surface: &OverlayHandle, anchor: Point, config: &DampingConfig) -> Self {
        let animator = ValueAnimator::new(1.0, 0.0, config.duration_ms as f32)
            .with_easing(Easing::Damping(DampingCurve::new(config.bounce_count)));
        Self {
            surface: Rc::downgrade(surface),
            anchor,
            distance: Vec2::ZERO,
            animator,
        }
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnimatorListener>) -> bool {
        self.animator.add_listener(listener)
    }

    /// Start from the ghost's current position
    ///
    /// Returns `false` without starting if there is no ghost to move.
    pub fn start(&mut self) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            return false;
        };
        let ghost = surface.borrow().ghost_rect();
        let Some(ghost) = ghost else {
            tracing::debug!("DampingAnimator: no ghost rect, not starting");
            return false;
        };
        self.distance = ghost.origin - self.anchor;
        tracing::debug!(
            anchor = ?self.anchor,
            distance = ?self.distance,
            "DampingAnimator: start"
        );
        self.animator.start();
        true
    }

    pub fn is_running(&self) -> bool {
        self.animator.is_running()
    }

    /// Current displacement weight (1 at release, 0 at rest)
    pub fn weight(&self) -> f32 {
        self.animator.value()
    }
}

fn move_ghost(surface: &Weak<RefCell<OverlaySurface>>, origin: Point) {
    if let Some(surface) = surface.upgrade() {
        surface.borrow_mut().move_ghost_to(origin);
    }
}

impl Animation for DampingAnimator {
    fn tick(&mut self, dt_ms: f32) -> bool {
        let (anchor, distance) = (self.anchor, self.distance);
        let surface = &self.surface;
        self.animator
            .tick(dt_ms, |weight| move_ghost(surface, anchor + distance.scale(weight)))
    }

    fn cancel(&mut self) {
        self.animator.cancel();
    }

    fn end(&mut self) {
        let (anchor, distance) = (self.anchor, self.distance);
        let surface = &self.surface;
        self.animator
            .end(|weight| move_ghost(surface, anchor + distance.scale(weight)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessWindow;
    use tether_core::{Color, Picture, Rect, Size};
    use tether_image::{FrameCache, MemoryFrameLoader};

    fn dragged_surface(window: &HeadlessWindow, release: Rect) -> OverlayHandle {
        let surface =
            OverlaySurface::new_handle(Rc::new(FrameCache::new(MemoryFrameLoader::new())));
        {
            let mut s = surface.borrow_mut();
            s.attach(window);
            s.on_surface_changed(Size::new(400.0, 400.0));
            s.begin_drag(
                Picture::empty(Size::new(20.0, 20.0)),
                Color::RED,
                Rect::new(90.0, 90.0, 20.0, 20.0),
            );
            s.end_drag(release, true);
        }
        surface
    }

    #[test]
    fn test_settles_exactly_at_anchor() {
        let window = HeadlessWindow::new(1);
        let surface = dragged_surface(&window, Rect::new(150.0, 120.0, 20.0, 20.0));
        let config = DampingConfig {
            duration_ms: 300,
            bounce_count: 2,
        };
        let mut animator = DampingAnimator::new(&surface, Point::new(90.0, 90.0), &config);
        assert!(animator.start());

        let mut crossed = false;
        while animator.tick(16.0) {
            let x = surface.borrow().ghost_rect().unwrap().x();
            crossed |= x < 90.0;
        }
        assert!(crossed, "ghost should overshoot the anchor");
        assert_eq!(
            surface.borrow().ghost_rect(),
            Some(Rect::new(90.0, 90.0, 20.0, 20.0))
        );
    }

    #[test]
    fn test_without_ghost_does_not_start() {
        let surface =
            OverlaySurface::new_handle(Rc::new(FrameCache::new(MemoryFrameLoader::new())));
        let mut animator =
            DampingAnimator::new(&surface, Point::ZERO, &DampingConfig::default());
        assert!(!animator.start());
        assert!(!animator.is_running());
    }

    #[test]
    fn test_end_jumps_home() {
        let window = HeadlessWindow::new(1);
        let surface = dragged_surface(&window, Rect::new(150.0, 90.0, 20.0, 20.0));
        let mut animator =
            DampingAnimator::new(&surface, Point::new(90.0, 90.0), &DampingConfig::default());
        assert!(animator.start());
        animator.tick(16.0);
        animator.end();
        assert_eq!(animator.weight(), 0.0);
        assert_eq!(
            surface.borrow().ghost_rect(),
            Some(Rect::new(90.0, 90.0, 20.0, 20.0))
        );
    }
}
