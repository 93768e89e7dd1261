//! Overlay ownership
//!
//! There is exactly one overlay, and a drag owns it for as long as the
//! overlay is attached to a window. The coordinator keeps only a weak
//! reference between sessions so an unused overlay is freed and recreated
//! on the next drag; a strong reference is retained only while an owner is
//! active.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tether_image::FrameCache;

use crate::host::HostWindow;
use crate::overlay::{OverlayHandle, OverlaySurface};

/// Serializes access to the overlay surface
pub struct OverlayCoordinator {
    current: Weak<RefCell<OverlaySurface>>,
    retained: Option<OverlayHandle>,
    cache: Rc<FrameCache>,
}

impl OverlayCoordinator {
    pub fn new(cache: Rc<FrameCache>) -> Self {
        Self {
            current: Weak::new(),
            retained: None,
            cache,
        }
    }

    /// Try to take ownership of the overlay for `window`
    ///
    /// Creates the overlay if none exists, re-attaches a detached one, and
    /// refuses while another owner has it attached.
    pub fn acquire(&mut self, window: &dyn HostWindow) -> bool {
        match self.current.upgrade() {
            None => {
                let surface = OverlaySurface::new_handle(self.cache.clone());
                surface.borrow_mut().attach(window);
                self.current = Rc::downgrade(&surface);
                self.retained = Some(surface);
                tracing::debug!(window = ?window.id(), "OverlayCoordinator: created overlay");
                true
            }
            Some(surface) => {
                if surface.borrow().is_attached() {
                    tracing::debug!(window = ?window.id(), "OverlayCoordinator: overlay busy");
                    return false;
                }
                surface.borrow_mut().attach(window);
                self.retained = Some(surface);
                true
            }
        }
    }

    /// The overlay, if one is alive
    pub fn current_surface(&self) -> Option<OverlayHandle> {
        self.current.upgrade()
    }

    /// Give up ownership: detach and stop retaining the overlay
    pub fn release(&mut self) {
        if let Some(surface) = self.retained.take() {
            let mut surface = surface.borrow_mut();
            if surface.is_attached() {
                surface.detach();
            }
        }
    }

    /// Whether some owner currently holds the overlay
    pub fn is_owned(&self) -> bool {
        self.current
            .upgrade()
            .map(|surface| surface.borrow().is_attached())
            .unwrap_or(false)
    }
}
