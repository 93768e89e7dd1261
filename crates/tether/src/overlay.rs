//! Overlay surface
//!
//! A single full-window transparent surface renders everything a drag
//! needs: the link, the ghost and the disappear frames. It is attached to
//! the window of whichever element currently owns it and detached (and its
//! frame cache cleared) as soon as the owner is done.
//!
//! Surface creation is asynchronous on most platforms. Until the host
//! reports the surface as sized, element updates only change state; the
//! first [`on_surface_changed`](OverlaySurface::on_surface_changed) paints
//! whatever was buffered.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tether_animation::AnimatorListener;
use tether_core::{Affine2D, Color, DrawContext, Picture, Point, Rect, Size, Vec2};
use tether_image::FrameCache;

use crate::element::{DirtyFlag, GhostElement, LinkElement, VisualElement};
use crate::host::{HostWindow, SurfaceCanvas, WindowId};

/// Shared handle to the overlay
pub type OverlayHandle = Rc<RefCell<OverlaySurface>>;

/// The process-wide drag overlay
pub struct OverlaySurface {
    link: LinkElement,
    ghost: GhostElement,
    /// Draw gate: elements are only painted while set
    draw_enabled: bool,
    draw_link: bool,
    /// The surface reported its size and accepts frames
    ready: bool,
    origin: Point,
    size: Size,
    window: Option<WindowId>,
    canvas: Option<Box<dyn SurfaceCanvas>>,
    dirty: DirtyFlag,
    cache: Rc<FrameCache>,
    listener: Rc<OverlayListener>,
    frames_posted: u64,
    frames_dropped: u64,
}

impl OverlaySurface {
    /// Create a detached overlay
    pub fn new_handle(cache: Rc<FrameCache>) -> OverlayHandle {
        Rc::new_cyclic(|weak| {
            let dirty: DirtyFlag = Rc::new(Cell::new(false));
            RefCell::new(OverlaySurface {
                link: LinkElement::new(Some(dirty.clone())),
                ghost: GhostElement::new(Some(dirty.clone())),
                draw_enabled: false,
                draw_link: false,
                ready: false,
                origin: Point::ZERO,
                size: Size::ZERO,
                window: None,
                canvas: None,
                dirty,
                cache,
                listener: Rc::new(OverlayListener {
                    surface: weak.clone(),
                }),
                frames_posted: 0,
                frames_dropped: 0,
            })
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attachment
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach to `window`, detaching from any previous window first
    pub fn attach(&mut self, window: &dyn HostWindow) {
        if self.is_attached() {
            self.detach();
        }
        self.canvas = Some(window.create_surface());
        self.window = Some(window.id());
        self.origin = window.overlay_origin();
        self.ready = false;
        tracing::debug!(window = ?window.id(), origin = ?self.origin, "OverlaySurface: attached");
    }

    /// Drop the surface and clear the frame cache
    pub fn detach(&mut self) {
        if self.canvas.take().is_some() {
            tracing::debug!(window = ?self.window, "OverlaySurface: detached");
        }
        self.window = None;
        self.ready = false;
        self.cache.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// The backing surface was (re)created; nothing is drawn until it is sized
    pub fn on_surface_created(&mut self) {
        self.draw_enabled = false;
    }

    /// The backing surface is sized and ready; paints the buffered state
    pub fn on_surface_changed(&mut self, size: Size) {
        if !self.is_attached() {
            return;
        }
        self.size = size;
        self.draw_enabled = true;
        self.ready = true;
        self.draw_frame();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drag updates
    // ─────────────────────────────────────────────────────────────────────────

    /// Start showing `picture` at `rect` with the link anchored at its centre
    pub fn begin_drag(&mut self, picture: Picture, color: Color, rect: Rect) {
        let half = Vec2::new(picture.height() / 2.0, picture.width() / 2.0);
        self.link.set_anchor(rect.center(), half, color);
        self.link.set_target(rect);
        self.ghost.set_target(picture, rect);
        self.draw_enabled = true;
        self.draw_link = true;
        self.flush();
    }

    /// Move the ghost and resize the anchor
    pub fn update_drag(&mut self, rect: Rect, anchor_radius: f32, draw_link: bool) {
        if self.draw_link != draw_link {
            self.draw_link = draw_link;
            self.dirty.set(true);
        }
        self.link.set_anchor_radius(anchor_radius);
        self.link.set_target(rect);
        self.ghost.set_rect(rect);
        self.flush();
    }

    /// Finish the gesture
    ///
    /// With `keep_visible` the ghost stays at `rect` for an animation to take
    /// over; otherwise everything is cleared and the overlay detaches.
    pub fn end_drag(&mut self, rect: Rect, keep_visible: bool) {
        if keep_visible {
            self.ghost.set_rect(rect);
        } else {
            self.ghost.dispose();
        }
        self.clean(keep_visible);
    }

    /// Move the ghost's origin (used by the return animation)
    pub fn move_ghost_to(&mut self, origin: Point) {
        self.ghost.offset_to(origin);
        self.flush();
    }

    fn clean(&mut self, keep_visible: bool) {
        if !keep_visible {
            self.ghost.dispose();
            self.link.dispose();
            self.dirty.set(false);
            self.detach();
            return;
        }
        self.draw_enabled = true;
        self.draw_link = false;
        self.dirty.set(false);
        self.draw_frame();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Painting
    // ─────────────────────────────────────────────────────────────────────────

    fn flush(&mut self) {
        if self.dirty.replace(false) {
            self.draw_frame();
        }
    }

    /// Repaint the link and ghost
    pub fn draw_frame(&mut self) {
        let draw_enabled = self.draw_enabled;
        let draw_link = self.draw_link;
        let link = &self.link;
        let ghost = &self.ghost;
        let origin = self.origin;
        let ready = self.ready;
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if !ready {
            return;
        }
        let posted = paint(canvas.as_mut(), origin, |ctx| {
            if draw_enabled {
                if draw_link {
                    link.draw(ctx);
                }
                ghost.draw(ctx);
            }
        });
        self.record_frame(posted);
    }

    /// Paint a custom frame over a cleared surface, in screen coordinates
    ///
    /// Returns `false` if the frame was dropped (not attached, not ready or
    /// the canvas could not be locked).
    pub fn with_canvas(&mut self, f: impl FnOnce(&mut dyn DrawContext)) -> bool {
        if !self.ready {
            return false;
        }
        let origin = self.origin;
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let posted = paint(canvas.as_mut(), origin, f);
        self.record_frame(posted);
        posted
    }

    fn record_frame(&mut self, posted: bool) {
        if posted {
            self.frames_posted += 1;
        } else {
            self.frames_dropped += 1;
            tracing::trace!("OverlaySurface: canvas unavailable, frame dropped");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn ghost_rect(&self) -> Option<Rect> {
        self.ghost.rect()
    }

    pub fn link(&self) -> &LinkElement {
        &self.link
    }

    pub fn is_link_visible(&self) -> bool {
        self.draw_link
    }

    pub fn is_draw_enabled(&self) -> bool {
        self.draw_enabled
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn frames_posted(&self) -> u64 {
        self.frames_posted
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Listener that keeps the overlay in step with an animation
    pub fn listener(&self) -> Rc<dyn AnimatorListener> {
        self.listener.clone()
    }
}

fn paint(
    canvas: &mut dyn SurfaceCanvas,
    origin: Point,
    f: impl FnOnce(&mut dyn DrawContext),
) -> bool {
    let Some(ctx) = canvas.lock_canvas() else {
        return false;
    };
    ctx.push_transform(Affine2D::translation(-origin.x, -origin.y));
    ctx.clear(Color::TRANSPARENT);
    f(&mut *ctx);
    ctx.pop_transform();
    canvas.unlock_and_post();
    true
}

/// Ties overlay state to animation lifecycle
///
/// Start enables drawing, completion clears and detaches, cancellation only
/// closes the draw gate (the engine releases ownership afterwards).
struct OverlayListener {
    surface: Weak<RefCell<OverlaySurface>>,
}

impl OverlayListener {
    fn with_surface(&self, f: impl FnOnce(&mut OverlaySurface)) {
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        match surface.try_borrow_mut() {
            Ok(mut surface) => f(&mut surface),
            Err(_) => tracing::warn!("OverlaySurface: busy during animation callback"),
        };
    }
}

impl AnimatorListener for OverlayListener {
    fn on_start(&self) {
        self.with_surface(|surface| surface.draw_enabled = true);
    }

    fn on_end(&self) {
        self.with_surface(|surface| surface.clean(false));
    }

    fn on_cancel(&self) {
        self.with_surface(|surface| surface.draw_enabled = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessWindow;
    use tether_core::DrawCommand;
    use tether_image::MemoryFrameLoader;

    fn surface() -> OverlayHandle {
        OverlaySurface::new_handle(Rc::new(FrameCache::new(MemoryFrameLoader::new())))
    }

    fn picture() -> Picture {
        Picture::empty(Size::new(20.0, 20.0))
    }

    #[test]
    fn test_updates_before_ready_are_buffered() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));
        s.update_drag(Rect::new(150.0, 90.0, 20.0, 20.0), 8.0, true);
        assert_eq!(window.frame_count(), 0);

        s.on_surface_created();
        s.on_surface_changed(Size::new(400.0, 800.0));
        assert_eq!(window.frame_count(), 1);
        assert_eq!(s.ghost_rect(), Some(Rect::new(150.0, 90.0, 20.0, 20.0)));
    }

    #[test]
    fn test_frames_are_cleared_and_translated() {
        let window = HeadlessWindow::new(1).with_origin(Point::new(0.0, 24.0));
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.on_surface_changed(Size::new(400.0, 800.0));
        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));

        let frame = window.last_frame().unwrap();
        assert_eq!(
            frame[0],
            DrawCommand::PushTransform(Affine2D::translation(0.0, -24.0))
        );
        assert_eq!(frame[1], DrawCommand::Clear(Color::TRANSPARENT));
        assert_eq!(frame.last(), Some(&DrawCommand::PopTransform));
    }

    #[test]
    fn test_repeated_update_is_idempotent() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.on_surface_changed(Size::new(400.0, 800.0));
        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));

        let rect = Rect::new(140.0, 90.0, 20.0, 20.0);
        s.update_drag(rect, 10.0, true);
        let frames = window.frame_count();
        let snapshot = window.last_frame();
        for _ in 0..5 {
            s.update_drag(rect, 10.0, true);
        }
        assert_eq!(window.frame_count(), frames);
        assert_eq!(window.last_frame(), snapshot);
        assert_eq!(s.ghost_rect(), Some(rect));
        assert_eq!(s.link().anchor_radius(), 10.0);
    }

    #[test]
    fn test_end_drag_without_keep_detaches() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.on_surface_changed(Size::new(400.0, 800.0));
        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));

        s.end_drag(Rect::new(95.0, 90.0, 20.0, 20.0), false);
        assert!(!s.is_attached());
        assert!(s.ghost_rect().is_none());
    }

    #[test]
    fn test_end_drag_with_keep_hides_link() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.on_surface_changed(Size::new(400.0, 800.0));
        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));

        let release = Rect::new(120.0, 90.0, 20.0, 20.0);
        s.end_drag(release, true);
        assert!(s.is_attached());
        assert!(!s.is_link_visible());
        assert_eq!(s.ghost_rect(), Some(release));

        let frame = window.last_frame().unwrap();
        assert!(!frame
            .iter()
            .any(|c| matches!(c, DrawCommand::FillCircle { .. } | DrawCommand::FillPath { .. })));
    }

    #[test]
    fn test_lock_failure_drops_frame() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        let mut s = surface.borrow_mut();
        s.attach(&window);
        s.on_surface_changed(Size::new(400.0, 800.0));
        window.set_lock_fails(true);

        s.begin_drag(picture(), Color::RED, Rect::new(90.0, 90.0, 20.0, 20.0));
        assert_eq!(s.frames_dropped(), 1);
        assert_eq!(window.frame_count(), 1);

        window.set_lock_fails(false);
        s.update_drag(Rect::new(100.0, 90.0, 20.0, 20.0), 5.0, true);
        assert_eq!(window.frame_count(), 2);
    }

    #[test]
    fn test_listener_end_detaches() {
        let window = HeadlessWindow::new(1);
        let surface = surface();
        surface.borrow_mut().attach(&window);
        let listener = surface.borrow().listener();

        listener.on_start();
        assert!(surface.borrow().is_draw_enabled());
        listener.on_end();
        assert!(!surface.borrow().is_attached());
    }
}
