//! Host integration traits
//!
//! The engine never touches a real view tree. Hosts describe their draggable
//! elements with [`HostElement`], their windows with [`HostWindow`], and the
//! transparent full-window surface the overlay renders into with
//! [`SurfaceCanvas`]. All geometry crossing this boundary is in screen space.

use tether_core::{DrawContext, Picture, Point, Rect, Size};

/// Identifies a host window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// Identifies a host context in which marks are unique
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

/// A draggable element owned by the host
///
/// Callbacks take `&self`; hosts use interior mutability for their own state.
pub trait HostElement {
    /// Current screen-space bounds
    fn screen_rect(&self) -> Rect;

    /// Screen-space bounds of the visible part, or `None` if the element is
    /// hidden, detached or scrolled fully out of view
    fn visible_rect(&self) -> Option<Rect>;

    /// Snapshot of the element's rendering in local coordinates
    fn snapshot(&self) -> Picture;

    /// Snapshot clipped to the visible part, or `None` if nothing is visible
    fn visible_snapshot(&self) -> Option<Picture>;

    /// Show or hide the element's own rendering while the overlay stands in for it
    fn set_content_visible(&self, visible: bool);

    /// The release was classified as a vanish trigger
    fn on_drag_complete(&self) {}

    /// This element's disappear animation finished
    fn on_disappear_complete(&self) {}
}

/// A host window the overlay can attach to
pub trait HostWindow {
    fn id(&self) -> WindowId;

    /// Screen-space position of the window root the overlay covers
    fn overlay_origin(&self) -> Point;

    /// Create the transparent surface backing the overlay
    ///
    /// Creation may complete asynchronously; the host reports readiness via
    /// [`DragEngine::notify_surface_created`](crate::DragEngine::notify_surface_created)
    /// and [`DragEngine::notify_surface_changed`](crate::DragEngine::notify_surface_changed).
    fn create_surface(&self) -> Box<dyn SurfaceCanvas>;
}

/// The render buffer behind the overlay
pub trait SurfaceCanvas {
    /// Lock the buffer for a frame; `None` if it is not available right now
    fn lock_canvas(&mut self) -> Option<&mut dyn DrawContext>;

    /// Post the frame drawn since the last successful lock
    fn unlock_and_post(&mut self);

    fn size(&self) -> Size;
}
