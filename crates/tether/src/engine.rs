//! Drag engine
//!
//! [`DragEngine`] is the context object a host creates once and passes its
//! pointer events to. It owns the hierarchy registry, the overlay
//! coordinator, the frame cache and the animation scheduler, and runs at
//! most one drag (or the animation following it) at a time.
//!
//! ```ignore
//! let mut engine = DragEngine::new(FileFrameLoader::new("assets/frames"));
//! let id = engine.register(scope, Rc::downgrade(&badge), config)?;
//!
//! if engine.pointer_down(id, &window, down) {
//!     engine.pointer_move(id, moved);
//!     engine.pointer_up(id, released);
//! }
//! // every frame:
//! engine.tick();
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tether_animation::{AnimationId, AnimationScheduler, AnimatorListener};
use tether_core::{Point, Rect, Size};
use tether_image::{FrameCache, FrameLoader};

use crate::animation::{DampingAnimator, DisappearAnimator, DisappearAnimatorSet};
use crate::cascade::{plan_cascade, CascadeStep};
use crate::config::DragConfig;
use crate::coordinator::OverlayCoordinator;
use crate::element::GhostElement;
use crate::error::{DragError, Result};
use crate::host::{HostElement, HostWindow, ScopeId};
use crate::overlay::OverlayHandle;
use crate::registry::{ElementId, HierarchyRegistry};
use crate::session::{DragSession, ReleaseOutcome, SessionState};

/// Terminal events reported by animation listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEvent {
    Finished,
    Cancelled,
}

type EventQueue = Rc<RefCell<VecDeque<SessionEvent>>>;

/// The element that currently owns the overlay
struct ActiveSession {
    element: ElementId,
    /// `None` for a disappear started without a gesture
    session: Option<DragSession>,
    animation: Option<AnimationId>,
    state: SessionState,
    last_pointer: Point,
}

/// Entry point for hosts
pub struct DragEngine {
    registry: HierarchyRegistry,
    coordinator: OverlayCoordinator,
    cache: Rc<FrameCache>,
    scheduler: AnimationScheduler,
    active: Option<ActiveSession>,
    events: EventQueue,
}

impl DragEngine {
    /// Create an engine loading disappear frames through `loader`
    pub fn new(loader: impl FrameLoader + 'static) -> Self {
        Self::with_cache(Rc::new(FrameCache::new(loader)))
    }

    pub fn with_cache(cache: Rc<FrameCache>) -> Self {
        Self {
            registry: HierarchyRegistry::new(),
            coordinator: OverlayCoordinator::new(cache.clone()),
            cache,
            scheduler: AnimationScheduler::new(),
            active: None,
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a draggable element
    ///
    /// The engine only holds `host` weakly; dropping the element on the host
    /// side is enough to take it out of every relationship.
    pub fn register(
        &mut self,
        scope: ScopeId,
        host: Weak<dyn HostElement>,
        config: DragConfig,
    ) -> Result<ElementId> {
        self.registry.insert(scope, host, config)
    }

    /// Unregister an element, stopping its animation if it owns the overlay
    pub fn unregister(&mut self, id: ElementId) -> bool {
        if self.active_element() == Some(id) {
            self.abort();
        }
        self.registry.remove(id)
    }

    pub fn set_mark(&mut self, id: ElementId, mark: Option<String>) -> Result<()> {
        self.registry.set_mark(id, mark)
    }

    pub fn set_leader_mark(&mut self, id: ElementId, leader: Option<String>) -> Result<()> {
        self.registry.set_leader_mark(id, leader)
    }

    pub fn set_sort(&mut self, id: ElementId, sort: i32) -> Result<()> {
        self.registry.set_sort(id, sort)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gestures
    // ─────────────────────────────────────────────────────────────────────────

    /// Start dragging `id` at screen position `pointer`
    ///
    /// Returns `false` if the gesture is not intercepted: dragging is
    /// disabled, the element is not on screen, or another element owns the
    /// overlay. The host should then treat the gesture normally.
    pub fn pointer_down(&mut self, id: ElementId, window: &dyn HostWindow, pointer: Point) -> bool {
        if self.active.is_some() {
            tracing::debug!(element = ?id, "DragEngine: overlay in use, gesture ignored");
            return false;
        }
        let Some(config) = self.registry.config(id) else {
            return false;
        };
        if !config.drag_enabled {
            return false;
        }
        let Some(host) = self.registry.host(id) else {
            return false;
        };
        if host.visible_rect().is_none() {
            return false;
        }
        // An empty element has no anchor radius to shrink from
        let rect = host.screen_rect();
        if rect.is_empty() {
            tracing::debug!(element = ?id, ?rect, "DragEngine: empty element, gesture ignored");
            return false;
        }
        if !self.coordinator.acquire(window) {
            tracing::debug!(element = ?id, "DragEngine: overlay busy, gesture ignored");
            return false;
        }
        let Some(surface) = self.coordinator.current_surface() else {
            return false;
        };

        let params = config.drag_params(rect.size);
        let color = config.link_color;
        surface.borrow_mut().begin_drag(host.snapshot(), color, rect);
        host.set_content_visible(false);

        tracing::debug!(element = ?id, ?rect, ?params, "DragEngine: drag started");
        self.active = Some(ActiveSession {
            element: id,
            session: Some(DragSession::begin(rect, pointer, params)),
            animation: None,
            state: SessionState::Dragging,
            last_pointer: pointer,
        });
        true
    }

    /// Follow the pointer; returns `false` if `id` is not being dragged
    pub fn pointer_move(&mut self, id: ElementId, pointer: Point) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.element != id || active.state != SessionState::Dragging {
            return false;
        }
        let Some(session) = active.session.as_mut() else {
            return false;
        };
        active.last_pointer = pointer;
        let update = session.update(pointer);
        tracing::trace!(
            target_rect = ?update.target_rect,
            radius = update.radius,
            "DragEngine: drag update"
        );
        if let Some(surface) = self.coordinator.current_surface() {
            surface
                .borrow_mut()
                .update_drag(update.target_rect, update.radius, update.draw_link);
        }
        true
    }

    /// Release the drag at `pointer`
    ///
    /// Depending on how far the element travelled it vanishes, springs back
    /// or simply reappears. Returns `false` if `id` was not being dragged.
    pub fn pointer_up(&mut self, id: ElementId, pointer: Point) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.element != id || active.state != SessionState::Dragging {
            return false;
        }
        let Some(mut session) = active.session.take() else {
            return false;
        };
        active.last_pointer = pointer;

        let Some(config) = self.registry.config(id).cloned() else {
            self.restore(id);
            return true;
        };
        let Some(surface) = self.coordinator.current_surface() else {
            self.restore(id);
            return true;
        };

        let release = session.release(
            pointer,
            config.disappear.is_usable(),
            config.damping.is_usable(),
        );
        surface
            .borrow_mut()
            .end_drag(release.target_rect, release.keep_visible);

        if release.valid {
            if let Some(host) = self.registry.host(id) {
                host.on_drag_complete();
            }
        }

        let started = match release.outcome {
            ReleaseOutcome::Vanish => {
                let rect = Rect::square(release.target_rect.center(), config.disappear.size);
                self.start_disappear(id, &surface, &config, rect)
                    .map(|animation| (animation, SessionState::Vanishing))
            }
            ReleaseOutcome::ReturnHome => self
                .start_return(id, &surface, &config, session.anchor_rect().origin)
                .map(|animation| (animation, SessionState::ReturningHome)),
            ReleaseOutcome::Restore => None,
        };

        match started {
            Some((animation, state)) => {
                if let Some(active) = self.active.as_mut() {
                    session.set_state(state);
                    active.session = Some(session);
                    active.animation = Some(animation);
                    active.state = state;
                }
                tracing::debug!(element = ?id, ?state, "DragEngine: released");
            }
            None => self.restore(id),
        }
        true
    }

    /// The gesture was cancelled by the system; handled like a release at
    /// the last known pointer position
    pub fn pointer_cancel(&mut self, id: ElementId) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        if active.element != id {
            return false;
        }
        let pointer = active.last_pointer;
        self.pointer_up(id, pointer)
    }

    /// Play the disappear animation of an on-screen element without a drag
    ///
    /// Subordinates cascade as they would after a drag. Returns `false` if
    /// the element is not visible, has no usable frames, or another element
    /// owns the overlay.
    pub fn play_disappear(&mut self, id: ElementId, window: &dyn HostWindow) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(config) = self.registry.config(id).cloned() else {
            return false;
        };
        if !config.disappear.is_usable() {
            return false;
        }
        let Some(host) = self.registry.host(id) else {
            return false;
        };
        if host.visible_rect().is_none() {
            return false;
        }
        if !self.coordinator.acquire(window) {
            return false;
        }
        let Some(surface) = self.coordinator.current_surface() else {
            return false;
        };

        let rect = Rect::square(host.screen_rect().center(), config.disappear.size);
        match self.start_disappear(id, &surface, &config, rect) {
            Some(animation) => {
                self.active = Some(ActiveSession {
                    element: id,
                    session: None,
                    animation: Some(animation),
                    state: SessionState::Vanishing,
                    last_pointer: rect.center(),
                });
                tracing::debug!(element = ?id, "DragEngine: disappear started");
                true
            }
            None => {
                self.coordinator.release();
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Animations
    // ─────────────────────────────────────────────────────────────────────────

    fn start_return(
        &mut self,
        id: ElementId,
        surface: &OverlayHandle,
        config: &DragConfig,
        anchor: Point,
    ) -> Option<AnimationId> {
        let mut animator = DampingAnimator::new(surface, anchor, &config.damping);
        animator.add_listener(surface.borrow().listener());
        if let Some(listener) = self.element_listener(id, false) {
            animator.add_listener(listener);
        }
        animator.add_listener(self.session_listener());
        if !animator.start() {
            return None;
        }
        Some(self.scheduler.add(Box::new(animator)))
    }

    fn start_disappear(
        &mut self,
        id: ElementId,
        surface: &OverlayHandle,
        config: &DragConfig,
        rect: Rect,
    ) -> Option<AnimationId> {
        let mut leader = DisappearAnimator::new(surface, self.cache.clone());
        leader.configure(
            config.disappear.frames.clone(),
            config.disappear.duration_ms,
            config.disappear.size,
        );
        leader.add_destination_rect(rect);
        let overlay_listener = surface.borrow().listener();

        let mut set = DisappearAnimatorSet::new();
        let mut builder = set.play(leader).add_listener(overlay_listener);
        if let Some(listener) = self.element_listener(id, true) {
            builder = builder.add_listener(listener);
        }

        let plan = plan_cascade(&self.registry, id);
        for step in plan.into_steps() {
            let element = step.element();
            match step {
                CascadeStep::Join { rect, .. } => {
                    builder = builder.with(rect);
                }
                CascadeStep::Follow {
                    rect,
                    frames,
                    duration_ms,
                    placeholder,
                    ..
                } => {
                    if let Some(placeholder) = placeholder {
                        let ghost = GhostElement::placeholder(placeholder.rect, placeholder.picture);
                        builder = builder.add_placeholder(&ghost);
                    }
                    let mut next = DisappearAnimator::new(surface, self.cache.clone());
                    next.configure(frames, duration_ms, rect.width());
                    next.add_destination_rect(rect);
                    builder = builder.before(next);
                }
            }
            if let Some(listener) = self.element_listener(element, true) {
                builder = builder.add_listener(listener);
            }
        }

        set.add_listener(self.session_listener());
        if !set.start() {
            return None;
        }
        tracing::debug!(element = ?id, animators = set.len(), "DragEngine: disappear set started");
        Some(self.scheduler.add(Box::new(set)))
    }

    fn element_listener(&self, id: ElementId, notify_disappear: bool) -> Option<Rc<dyn AnimatorListener>> {
        let host = self.registry.host(id)?;
        Some(Rc::new(ElementListener {
            host: Rc::downgrade(&host),
            notify_disappear,
        }))
    }

    fn session_listener(&self) -> Rc<dyn AnimatorListener> {
        Rc::new(SessionListener {
            events: self.events.clone(),
        })
    }

    /// Advance animations by the wall-clock time since the previous tick
    ///
    /// Returns `true` while an animation is still playing.
    pub fn tick(&mut self) -> bool {
        let running = self.scheduler.tick();
        self.process_events();
        running
    }

    /// Advance animations by `dt`
    pub fn advance(&mut self, dt: Duration) -> bool {
        let running = self.scheduler.advance(dt);
        self.process_events();
        running
    }

    /// Stop the animation of `id`; the element reappears in place
    pub fn cancel_animation(&mut self, id: ElementId) -> bool {
        let Some(animation) = self
            .active
            .as_ref()
            .filter(|active| active.element == id)
            .and_then(|active| active.animation)
        else {
            return false;
        };
        let cancelled = self.scheduler.cancel(animation);
        self.process_events();
        cancelled
    }

    /// Jump the animation of `id` to its end
    pub fn finish_animation(&mut self, id: ElementId) -> bool {
        let Some(animation) = self
            .active
            .as_ref()
            .filter(|active| active.element == id)
            .and_then(|active| active.animation)
        else {
            return false;
        };
        let ended = self.scheduler.end(animation);
        self.process_events();
        ended
    }

    fn process_events(&mut self) {
        loop {
            let event = self.events.borrow_mut().pop_front();
            let Some(event) = event else {
                break;
            };
            if let Some(active) = self.active.take() {
                tracing::debug!(element = ?active.element, ?event, "DragEngine: session over");
                self.coordinator.release();
            }
        }
    }

    /// Show the element again and give up the overlay
    fn restore(&mut self, id: ElementId) {
        if let Some(host) = self.registry.host(id) {
            host.set_content_visible(true);
        }
        self.coordinator.release();
        self.active = None;
        tracing::debug!(element = ?id, "DragEngine: restored");
    }

    fn abort(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let element = active.element;
        let animation = active.animation;
        let rect = active
            .session
            .as_ref()
            .map(DragSession::target_rect)
            .unwrap_or(Rect::ZERO);
        match animation {
            Some(animation) => {
                self.scheduler.cancel(animation);
                self.process_events();
            }
            None => {
                if let Some(surface) = self.coordinator.current_surface() {
                    surface.borrow_mut().end_drag(rect, false);
                }
            }
        }
        if self.active.is_some() {
            self.restore(element);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Surface lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// The host created the overlay's backing surface
    pub fn notify_surface_created(&mut self) {
        if let Some(surface) = self.coordinator.current_surface() {
            surface.borrow_mut().on_surface_created();
        }
    }

    /// The overlay's backing surface is sized and ready to draw
    pub fn notify_surface_changed(&mut self, size: Size) {
        if let Some(surface) = self.coordinator.current_surface() {
            surface.borrow_mut().on_surface_changed(size);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Lifecycle state of `id`
    pub fn state(&self, id: ElementId) -> SessionState {
        match &self.active {
            Some(active) if active.element == id => active.state,
            _ => SessionState::Idle,
        }
    }

    pub fn active_element(&self) -> Option<ElementId> {
        self.active.as_ref().map(|active| active.element)
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// The live drag session of `id`
    pub fn session(&self, id: ElementId) -> Option<&DragSession> {
        self.active
            .as_ref()
            .filter(|active| active.element == id)?
            .session
            .as_ref()
    }

    pub fn surface(&self) -> Option<OverlayHandle> {
        self.coordinator.current_surface()
    }

    pub fn registry(&self) -> &HierarchyRegistry {
        &self.registry
    }

    pub fn config(&self, id: ElementId) -> Result<&DragConfig> {
        self.registry
            .config(id)
            .ok_or(DragError::UnknownElement(id))
    }

    pub fn cache(&self) -> &Rc<FrameCache> {
        &self.cache
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AnimationScheduler {
        &mut self.scheduler
    }
}

/// Hides the host element while the overlay stands in for it
struct ElementListener {
    host: Weak<dyn HostElement>,
    notify_disappear: bool,
}

impl AnimatorListener for ElementListener {
    fn on_start(&self) {
        if let Some(host) = self.host.upgrade() {
            host.set_content_visible(false);
        }
    }

    fn on_end(&self) {
        if let Some(host) = self.host.upgrade() {
            if self.notify_disappear {
                host.on_disappear_complete();
            }
            host.set_content_visible(true);
        }
    }

    fn on_cancel(&self) {
        if let Some(host) = self.host.upgrade() {
            host.set_content_visible(true);
        }
    }
}

/// Reports the end of the session's animation back to the engine
struct SessionListener {
    events: EventQueue,
}

impl SessionListener {
    fn push(&self, event: SessionEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl AnimatorListener for SessionListener {
    fn on_end(&self) {
        self.push(SessionEvent::Finished);
    }

    fn on_cancel(&self) {
        self.push(SessionEvent::Cancelled);
    }
}
