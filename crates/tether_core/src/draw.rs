//! Draw Context - the rendering API of the overlay
//!
//! Everything the drag engine paints goes through the [`DrawContext`] trait:
//! the rubber-band link, the dragged ghost and the disappear frames. Hosts
//! implement it on top of their real renderer; [`RecordingContext`] records
//! commands instead, which is how [`Picture`] snapshots are made and how the
//! headless backend captures frames.
//!
//! # Example
//!
//! ```rust
//! use tether_core::{Color, DrawContext, Point, RecordingContext, Size};
//!
//! let mut ctx = RecordingContext::new(Size::new(100.0, 100.0));
//! ctx.fill_circle(Point::new(50.0, 50.0), 10.0, Color::RED);
//! assert_eq!(ctx.commands().len(), 1);
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::geometry::{Affine2D, Color, Point, Rect, Size};

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command for building vector paths
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum PathCommand {
    /// Move to a point
    MoveTo(Point),
    /// Line to a point
    LineTo(Point),
    /// Quadratic Bézier curve
    QuadTo { control: Point, end: Point },
    /// Close the current subpath
    Close,
}

/// A vector path
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Move to a point
    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    /// Line to a point
    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    /// Quadratic Bézier curve
    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
        self
    }

    /// Close the path
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Get the path commands
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque handle to a decoded image known to the renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ImageId(pub u64);

// ─────────────────────────────────────────────────────────────────────────────
// Draw Context Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Unified 2D drawing interface used by the overlay
pub trait DrawContext {
    /// Push a transform onto the stack; it composes with the current one
    fn push_transform(&mut self, transform: Affine2D);

    /// Pop the most recently pushed transform
    fn pop_transform(&mut self);

    /// Replace every pixel with `color`, ignoring blending
    ///
    /// The overlay always clears with [`Color::TRANSPARENT`] so that frames
    /// drawn earlier never persist.
    fn clear(&mut self, color: Color);

    /// Fill a circle
    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    /// Fill a closed path
    fn fill_path(&mut self, path: &Path, color: Color);

    /// Draw an image stretched into `rect`
    fn draw_image(&mut self, image: ImageId, rect: Rect);

    /// Size of the drawing area
    fn viewport_size(&self) -> Size;
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording Draw Context
// ─────────────────────────────────────────────────────────────────────────────

/// A draw command that can be recorded and replayed
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DrawCommand {
    PushTransform(Affine2D),
    PopTransform,
    Clear(Color),
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
    },
    FillPath {
        path: Path,
        color: Color,
    },
    DrawImage {
        image: ImageId,
        rect: Rect,
    },
}

impl DrawCommand {
    /// Re-issue this command against another context
    pub fn replay(&self, ctx: &mut dyn DrawContext) {
        match self {
            DrawCommand::PushTransform(t) => ctx.push_transform(*t),
            DrawCommand::PopTransform => ctx.pop_transform(),
            DrawCommand::Clear(color) => ctx.clear(*color),
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => ctx.fill_circle(*center, *radius, *color),
            DrawCommand::FillPath { path, color } => ctx.fill_path(path, *color),
            DrawCommand::DrawImage { image, rect } => ctx.draw_image(*image, *rect),
        }
    }
}

/// A draw context that records commands for later execution
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform_depth: usize,
    viewport: Size,
}

impl RecordingContext {
    /// Create a new recording context
    pub fn new(viewport: Size) -> Self {
        Self {
            commands: Vec::new(),
            transform_depth: 0,
            viewport,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        self.transform_depth = 0;
        std::mem::take(&mut self.commands)
    }

    /// Clear all recorded commands
    pub fn reset(&mut self) {
        self.commands.clear();
        self.transform_depth = 0;
    }

    /// Finish recording and freeze the commands into a [`Picture`]
    pub fn finish(mut self) -> Picture {
        // Unbalanced pushes would leak into whoever replays the picture
        for _ in 0..self.transform_depth {
            self.commands.push(DrawCommand::PopTransform);
        }
        Picture {
            size: self.viewport,
            commands: self.commands.into(),
        }
    }
}

impl DrawContext for RecordingContext {
    fn push_transform(&mut self, transform: Affine2D) {
        self.commands.push(DrawCommand::PushTransform(transform));
        self.transform_depth += 1;
    }

    fn pop_transform(&mut self) {
        if self.transform_depth == 0 {
            tracing::warn!("RecordingContext: pop_transform without matching push");
            return;
        }
        self.commands.push(DrawCommand::PopTransform);
        self.transform_depth -= 1;
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn draw_image(&mut self, image: ImageId, rect: Rect) {
        self.commands.push(DrawCommand::DrawImage { image, rect });
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Picture
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable recorded drawing
///
/// A picture is recorded in its own local space `(0, 0)..size` and can be
/// drawn any number of times into a destination rect. Cloning is cheap (the
/// command list is shared).
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    size: Size,
    commands: Arc<[DrawCommand]>,
}

impl Picture {
    /// Record a picture of the given size
    pub fn record(size: Size, f: impl FnOnce(&mut dyn DrawContext)) -> Self {
        let mut ctx = RecordingContext::new(size);
        f(&mut ctx);
        ctx.finish()
    }

    /// An empty picture of the given size
    pub fn empty(size: Size) -> Self {
        Self {
            size,
            commands: Arc::from(Vec::new()),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Replay the picture unchanged (in its own coordinate space)
    pub fn replay(&self, ctx: &mut dyn DrawContext) {
        for command in self.commands.iter() {
            command.replay(ctx);
        }
    }

    /// Draw the picture stretched into `dest`
    pub fn draw_into(&self, ctx: &mut dyn DrawContext, dest: Rect) {
        let local = Rect::from_origin_size(Point::ZERO, self.size);
        ctx.push_transform(Affine2D::rect_to_rect(local, dest));
        self.replay(ctx);
        ctx.pop_transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_context_records_in_order() {
        let mut ctx = RecordingContext::new(Size::new(10.0, 10.0));
        ctx.clear(Color::TRANSPARENT);
        ctx.fill_circle(Point::new(1.0, 1.0), 2.0, Color::RED);

        assert_eq!(
            ctx.commands(),
            &[
                DrawCommand::Clear(Color::TRANSPARENT),
                DrawCommand::FillCircle {
                    center: Point::new(1.0, 1.0),
                    radius: 2.0,
                    color: Color::RED,
                },
            ]
        );
    }

    #[test]
    fn test_finish_balances_transforms() {
        let mut ctx = RecordingContext::new(Size::new(10.0, 10.0));
        ctx.push_transform(Affine2D::translation(1.0, 1.0));
        let picture = ctx.finish();

        assert_eq!(picture.commands().last(), Some(&DrawCommand::PopTransform));
    }

    #[test]
    fn test_picture_draw_into_wraps_in_transform() {
        let picture = Picture::record(Size::new(20.0, 10.0), |ctx| {
            ctx.draw_image(ImageId(7), Rect::new(0.0, 0.0, 20.0, 10.0));
        });

        let mut target = RecordingContext::new(Size::new(100.0, 100.0));
        picture.draw_into(&mut target, Rect::new(50.0, 50.0, 20.0, 10.0));

        let commands = target.commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], DrawCommand::PushTransform(_)));
        assert_eq!(
            commands[1],
            DrawCommand::DrawImage {
                image: ImageId(7),
                rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            }
        );
        assert_eq!(commands[2], DrawCommand::PopTransform);
    }

    #[test]
    fn test_unbalanced_pop_is_ignored() {
        let mut ctx = RecordingContext::new(Size::ZERO);
        ctx.pop_transform();
        assert!(ctx.commands().is_empty());
    }
}
