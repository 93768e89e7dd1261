//! Headless host backend
//!
//! A window, surface and element implementation with no display behind
//! them. Every posted frame is recorded as a list of [`DrawCommand`]s so
//! tests and the `tether-sim` tool can inspect exactly what the overlay
//! painted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_core::{Color, DrawCommand, DrawContext, Picture, Point, Rect, RecordingContext, Size};

use crate::host::{HostElement, HostWindow, SurfaceCanvas, WindowId};

type FrameLog = Rc<RefCell<Vec<Vec<DrawCommand>>>>;

/// A window whose overlay surfaces record frames in memory
pub struct HeadlessWindow {
    id: WindowId,
    origin: Point,
    size: Size,
    frames: FrameLog,
    lock_fails: Rc<Cell<bool>>,
}

impl HeadlessWindow {
    pub fn new(id: u64) -> Self {
        Self {
            id: WindowId(id),
            origin: Point::ZERO,
            size: Size::new(1080.0, 1920.0),
            frames: Rc::new(RefCell::new(Vec::new())),
            lock_fails: Rc::new(Cell::new(false)),
        }
    }

    /// Place the window root at `origin` in screen space
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Make every subsequent canvas lock fail (or succeed again)
    pub fn set_lock_fails(&self, fails: bool) {
        self.lock_fails.set(fails);
    }

    /// Number of frames posted by all surfaces of this window
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn last_frame(&self) -> Option<Vec<DrawCommand>> {
        self.frames.borrow().last().cloned()
    }

    pub fn frames(&self) -> Vec<Vec<DrawCommand>> {
        self.frames.borrow().clone()
    }

    pub fn clear_frames(&self) {
        self.frames.borrow_mut().clear();
    }
}

impl HostWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn overlay_origin(&self) -> Point {
        self.origin
    }

    fn create_surface(&self) -> Box<dyn SurfaceCanvas> {
        Box::new(HeadlessCanvas {
            recording: RecordingContext::new(self.size),
            frames: self.frames.clone(),
            lock_fails: self.lock_fails.clone(),
            locked: false,
        })
    }
}

/// Surface that appends each posted frame to its window's log
pub struct HeadlessCanvas {
    recording: RecordingContext,
    frames: FrameLog,
    lock_fails: Rc<Cell<bool>>,
    locked: bool,
}

impl SurfaceCanvas for HeadlessCanvas {
    fn lock_canvas(&mut self) -> Option<&mut dyn DrawContext> {
        if self.lock_fails.get() {
            return None;
        }
        self.recording.reset();
        self.locked = true;
        Some(&mut self.recording)
    }

    fn unlock_and_post(&mut self) {
        if !self.locked {
            tracing::warn!("HeadlessCanvas: unlock without lock");
            return;
        }
        self.locked = false;
        let commands = self.recording.take_commands();
        self.frames.borrow_mut().push(commands);
    }

    fn size(&self) -> Size {
        self.recording.viewport_size()
    }
}

/// A host element with settable geometry that records its callbacks
pub struct HeadlessElement {
    rect: Cell<Rect>,
    on_screen: Cell<bool>,
    content_visible: Cell<bool>,
    color: Cell<Color>,
    drag_completes: Cell<u32>,
    disappear_completes: Cell<u32>,
}

impl HeadlessElement {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: Cell::new(rect),
            on_screen: Cell::new(true),
            content_visible: Cell::new(true),
            color: Cell::new(Color::RED),
            drag_completes: Cell::new(0),
            disappear_completes: Cell::new(0),
        }
    }

    pub fn shared(rect: Rect) -> Rc<Self> {
        Rc::new(Self::new(rect))
    }

    pub fn set_rect(&self, rect: Rect) {
        self.rect.set(rect);
    }

    /// Simulate the element being scrolled out of view or detached
    pub fn set_on_screen(&self, on_screen: bool) {
        self.on_screen.set(on_screen);
    }

    pub fn set_color(&self, color: Color) {
        self.color.set(color);
    }

    /// Whether the element currently renders its own content
    pub fn is_content_visible(&self) -> bool {
        self.content_visible.get()
    }

    pub fn drag_completes(&self) -> u32 {
        self.drag_completes.get()
    }

    pub fn disappear_completes(&self) -> u32 {
        self.disappear_completes.get()
    }
}

impl HostElement for HeadlessElement {
    fn screen_rect(&self) -> Rect {
        self.rect.get()
    }

    fn visible_rect(&self) -> Option<Rect> {
        let rect = self.rect.get();
        (self.on_screen.get() && !rect.is_empty()).then_some(rect)
    }

    fn snapshot(&self) -> Picture {
        let size = self.rect.get().size;
        let color = self.color.get();
        Picture::record(size, |ctx| {
            let center = Point::new(size.width / 2.0, size.height / 2.0);
            ctx.fill_circle(center, size.width.min(size.height) / 2.0, color);
        })
    }

    fn visible_snapshot(&self) -> Option<Picture> {
        self.visible_rect().map(|_| self.snapshot())
    }

    fn set_content_visible(&self, visible: bool) {
        self.content_visible.set(visible);
    }

    fn on_drag_complete(&self) {
        self.drag_completes.set(self.drag_completes.get() + 1);
    }

    fn on_disappear_complete(&self) {
        self.disappear_completes.set(self.disappear_completes.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_records_posted_frames() {
        let window = HeadlessWindow::new(7);
        let mut canvas = window.create_surface();
        {
            let ctx = canvas.lock_canvas().unwrap();
            ctx.clear(Color::TRANSPARENT);
        }
        canvas.unlock_and_post();

        assert_eq!(window.frame_count(), 1);
        assert_eq!(window.last_frame(), Some(vec![DrawCommand::Clear(Color::TRANSPARENT)]));
    }

    #[test]
    fn test_lock_failure() {
        let window = HeadlessWindow::new(7);
        let mut canvas = window.create_surface();
        window.set_lock_fails(true);
        assert!(canvas.lock_canvas().is_none());
        canvas.unlock_and_post();
        assert_eq!(window.frame_count(), 0);
    }

    #[test]
    fn test_element_visibility() {
        let element = HeadlessElement::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(element.visible_snapshot().is_some());
        element.set_on_screen(false);
        assert!(element.visible_rect().is_none());
        assert!(element.visible_snapshot().is_none());
        assert_eq!(element.snapshot().size(), Size::new(10.0, 10.0));
    }
}
