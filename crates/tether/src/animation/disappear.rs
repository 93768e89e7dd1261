//! Frame sequence animation

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tether_animation::{Animation, AnimatorListener, Easing, ListenerSet, ValueAnimator};
use tether_core::{Picture, Rect, RecordingContext, Size};
use tether_image::{FrameCache, FrameImage};

use crate::element::VisualElement;
use crate::overlay::{OverlayHandle, OverlaySurface};

/// Per-run drawing state, dropped whenever a run stops
struct FramePainter {
    surface: Weak<RefCell<OverlaySurface>>,
    cache: Rc<FrameCache>,
    frames: Vec<String>,
    size: f32,
    destinations: SmallVec<[Rect; 4]>,
    placeholder: Option<RecordingContext>,
    backdrop: Option<Picture>,
    /// Decoded frames kept alive for the run; the cache only holds them weakly
    held: Vec<Rc<FrameImage>>,
    last_index: Option<usize>,
}

impl FramePainter {
    fn frame_index(&self, fraction: f32) -> usize {
        let last = self.frames.len().saturating_sub(1);
        ((fraction.clamp(0.0, 1.0) * last as f32).floor() as usize).min(last)
    }

    fn paint_at(&mut self, fraction: f32) {
        let index = self.frame_index(fraction);
        if self.last_index == Some(index) {
            return;
        }
        self.last_index = Some(index);

        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        let name = &self.frames[index];
        let image = match self.cache.get(name) {
            Ok(image) => {
                if !self.held.iter().any(|held| Rc::ptr_eq(held, &image)) {
                    self.held.push(image.clone());
                }
                Some(image)
            }
            Err(err) => {
                tracing::warn!(frame = %name, %err, "DisappearAnimator: frame skipped");
                None
            }
        };
        tracing::trace!(index, frame = %name, "DisappearAnimator: frame");

        let backdrop = self.backdrop.as_ref();
        let destinations = &self.destinations;
        let Ok(mut surface) = surface.try_borrow_mut() else {
            tracing::warn!("DisappearAnimator: overlay busy, frame dropped");
            return;
        };
        surface.with_canvas(|ctx| {
            if let Some(backdrop) = backdrop {
                backdrop.replay(ctx);
            }
            if let Some(image) = &image {
                for rect in destinations {
                    ctx.draw_image(image.id(), *rect);
                }
            }
        });
    }

    fn reset(&mut self) {
        self.destinations.clear();
        self.placeholder = None;
        self.backdrop = None;
        self.held.clear();
        self.last_index = None;
    }
}

/// Plays a frame sequence into every destination rect on the overlay
///
/// All destinations share one timeline. Placeholders are drawn under each
/// frame so elements that have not vanished yet stay visible. Destination
/// rects and placeholders belong to a single run: they are dropped when the
/// run finishes or is cancelled.
pub struct DisappearAnimator {
    painter: FramePainter,
    animator: ValueAnimator,
}

impl DisappearAnimator {
    pub fn new(surface: &OverlayHandle, cache: Rc<FrameCache>) -> Self {
        Self {
            painter: FramePainter {
                surface: Rc::downgrade(surface),
                cache,
                frames: Vec::new(),
                size: 0.0,
                destinations: SmallVec::new(),
                placeholder: None,
                backdrop: None,
                held: Vec::new(),
                last_index: None,
            },
            animator: ValueAnimator::new(0.0, 1.0, 0.0).with_easing(Easing::Linear),
        }
    }

    /// Set the frame sequence, its total duration and the frame size
    pub fn configure(&mut self, frames: Vec<String>, duration_ms: u32, size: f32) {
        self.painter.frames = frames;
        self.painter.size = size;
        self.animator.set_duration(duration_ms as f32);
    }

    /// Add a rect to draw the frames into; duplicates are ignored
    pub fn add_destination_rect(&mut self, rect: Rect) -> bool {
        if self.painter.destinations.contains(&rect) {
            return false;
        }
        self.painter.destinations.push(rect);
        true
    }

    /// Freeze `element`'s current rendering under every frame
    pub fn add_placeholder(&mut self, element: &dyn VisualElement) {
        let viewport = self
            .painter
            .surface
            .upgrade()
            .map(|surface| surface.borrow().size())
            .unwrap_or(Size::ZERO);
        let recording = self
            .painter
            .placeholder
            .get_or_insert_with(|| RecordingContext::new(viewport));
        element.draw(recording);
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnimatorListener>) -> bool {
        self.animator.add_listener(listener)
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerSet {
        self.animator.listeners_mut()
    }

    pub fn destinations(&self) -> &[Rect] {
        &self.painter.destinations
    }

    pub fn frames(&self) -> &[String] {
        &self.painter.frames
    }

    pub fn is_running(&self) -> bool {
        self.animator.is_running()
    }

    /// Whether [`start`](Self::start) would play anything
    pub fn can_start(&self) -> bool {
        !self.painter.frames.is_empty()
            && self.animator.duration_ms() > 0.0
            && self.painter.size > 0.0
            && !self.painter.destinations.is_empty()
            && self.painter.surface.strong_count() > 0
    }

    /// Start playing
    ///
    /// Returns `false` without starting if there are no frames, no
    /// duration, no size or no destinations. Restarting a running animator
    /// cancels the current run, which drops its destinations.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            self.cancel();
        }
        if !self.can_start() {
            tracing::debug!(
                frames = self.painter.frames.len(),
                destinations = self.painter.destinations.len(),
                "DisappearAnimator: nothing to play"
            );
            return false;
        }
        self.painter.backdrop = self.painter.placeholder.take().map(RecordingContext::finish);
        self.painter.last_index = None;
        tracing::debug!(
            frames = self.painter.frames.len(),
            destinations = self.painter.destinations.len(),
            duration_ms = self.animator.duration_ms(),
            "DisappearAnimator: start"
        );
        self.animator.start();
        true
    }
}

impl Animation for DisappearAnimator {
    fn tick(&mut self, dt_ms: f32) -> bool {
        let painter = &mut self.painter;
        let running = self.animator.tick(dt_ms, |fraction| painter.paint_at(fraction));
        if !running {
            self.painter.reset();
        }
        running
    }

    fn cancel(&mut self) {
        self.animator.cancel();
        self.painter.reset();
    }

    fn end(&mut self) {
        let painter = &mut self.painter;
        self.animator.end(|fraction| painter.paint_at(fraction));
        self.painter.reset();
    }
}
