//! Visual elements drawn on the overlay
//!
//! The overlay owns two elements: the rubber-band [`LinkElement`] and the
//! dragged [`GhostElement`]. Elements only draw; when their state changes
//! they raise a shared [`DirtyFlag`] and the overlay decides when to repaint.

use std::cell::Cell;
use std::rc::Rc;

use tether_core::{Color, DrawContext, Picture, Point, Rect, RubberBand, Vec2};

/// Shared flag raised by elements whose rendering changed
pub type DirtyFlag = Rc<Cell<bool>>;

/// A drawable unit of the overlay
pub trait VisualElement {
    /// Draw in screen coordinates
    fn draw(&self, ctx: &mut dyn DrawContext);

    /// Release drawing state; a disposed element draws nothing
    fn dispose(&mut self);
}

fn mark_dirty(flag: &Option<DirtyFlag>) {
    if let Some(flag) = flag {
        flag.set(true);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Link
// ─────────────────────────────────────────────────────────────────────────────

/// Anchor circle plus the rubber band reaching to the ghost
#[derive(Debug, Default)]
pub struct LinkElement {
    anchor_center: Point,
    anchor_radius: f32,
    target_half: Vec2,
    color: Color,
    target: Option<Rect>,
    dirty: Option<DirtyFlag>,
}

impl LinkElement {
    pub fn new(dirty: Option<DirtyFlag>) -> Self {
        Self {
            dirty,
            ..Default::default()
        }
    }

    pub fn set_anchor(&mut self, center: Point, target_half: Vec2, color: Color) {
        self.anchor_center = center;
        self.target_half = target_half;
        self.color = color;
        mark_dirty(&self.dirty);
    }

    pub fn set_anchor_radius(&mut self, radius: f32) {
        if self.anchor_radius != radius {
            self.anchor_radius = radius;
            mark_dirty(&self.dirty);
        }
    }

    pub fn set_target(&mut self, rect: Rect) {
        if self.target != Some(rect) {
            self.target = Some(rect);
            mark_dirty(&self.dirty);
        }
    }

    pub fn anchor_center(&self) -> Point {
        self.anchor_center
    }

    pub fn anchor_radius(&self) -> f32 {
        self.anchor_radius
    }

    pub fn target(&self) -> Option<Rect> {
        self.target
    }

    /// Band geometry for the current state
    pub fn band(&self) -> Option<RubberBand> {
        let target = self.target?;
        RubberBand::compute(
            self.anchor_center,
            self.anchor_radius,
            target,
            (self.target_half.x, self.target_half.y),
        )
    }
}

impl VisualElement for LinkElement {
    fn draw(&self, ctx: &mut dyn DrawContext) {
        if self.target.is_none() {
            return;
        }
        ctx.fill_circle(self.anchor_center, self.anchor_radius, self.color);
        if let Some(band) = self.band() {
            ctx.fill_path(&band.to_path(), self.color);
        }
    }

    fn dispose(&mut self) {
        self.target = None;
        self.anchor_radius = 0.0;
        mark_dirty(&self.dirty);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ghost
// ─────────────────────────────────────────────────────────────────────────────

/// Frozen snapshot of a dragged element, drawn stretched into its rect
#[derive(Debug, Default)]
pub struct GhostElement {
    rect: Option<Rect>,
    picture: Option<Picture>,
    dirty: Option<DirtyFlag>,
}

impl GhostElement {
    pub fn new(dirty: Option<DirtyFlag>) -> Self {
        Self {
            dirty,
            ..Default::default()
        }
    }

    /// A detached ghost used as a placeholder under disappear frames
    pub fn placeholder(rect: Rect, picture: Picture) -> Self {
        Self {
            rect: Some(rect),
            picture: Some(picture),
            dirty: None,
        }
    }

    pub fn set_target(&mut self, picture: Picture, rect: Rect) {
        self.picture = Some(picture);
        self.rect = Some(rect);
        mark_dirty(&self.dirty);
    }

    pub fn set_rect(&mut self, rect: Rect) {
        if self.rect != Some(rect) {
            self.rect = Some(rect);
            mark_dirty(&self.dirty);
        }
    }

    /// Move the ghost keeping its size; no-op without a rect
    pub fn offset_to(&mut self, origin: Point) {
        if let Some(rect) = self.rect {
            self.set_rect(rect.offset_to(origin));
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn picture(&self) -> Option<&Picture> {
        self.picture.as_ref()
    }
}

impl VisualElement for GhostElement {
    fn draw(&self, ctx: &mut dyn DrawContext) {
        if let (Some(rect), Some(picture)) = (self.rect, &self.picture) {
            picture.draw_into(ctx, rect);
        }
    }

    fn dispose(&mut self) {
        self.rect = None;
        self.picture = None;
        mark_dirty(&self.dirty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{DrawCommand, RecordingContext, Size};

    #[test]
    fn test_link_draws_circle_and_band() {
        let dirty: DirtyFlag = Rc::new(Cell::new(false));
        let mut link = LinkElement::new(Some(dirty.clone()));
        link.set_anchor(Point::new(100.0, 100.0), Vec2::new(20.0, 20.0), Color::RED);
        link.set_anchor_radius(12.0);
        link.set_target(Rect::new(180.0, 80.0, 40.0, 40.0));
        assert!(dirty.get());

        let mut ctx = RecordingContext::new(Size::new(400.0, 400.0));
        link.draw(&mut ctx);
        assert!(matches!(
            ctx.commands()[0],
            DrawCommand::FillCircle { radius, .. } if radius == 12.0
        ));
        assert!(matches!(ctx.commands()[1], DrawCommand::FillPath { .. }));
    }

    #[test]
    fn test_link_without_target_draws_nothing() {
        let link = LinkElement::new(None);
        let mut ctx = RecordingContext::new(Size::ZERO);
        link.draw(&mut ctx);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_unchanged_values_do_not_invalidate() {
        let dirty: DirtyFlag = Rc::new(Cell::new(false));
        let mut ghost = GhostElement::new(Some(dirty.clone()));
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        ghost.set_target(Picture::empty(Size::new(10.0, 10.0)), rect);
        dirty.set(false);

        ghost.set_rect(rect);
        assert!(!dirty.get());
        ghost.offset_to(Point::new(5.0, 5.0));
        assert!(dirty.get());
        assert_eq!(ghost.rect(), Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn test_disposed_ghost_draws_nothing() {
        let mut ghost = GhostElement::placeholder(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Picture::empty(Size::new(10.0, 10.0)),
        );
        ghost.dispose();
        assert!(ghost.rect().is_none());

        let mut ctx = RecordingContext::new(Size::ZERO);
        ghost.draw(&mut ctx);
        assert!(ctx.commands().is_empty());
    }
}
