//! Core geometry types
//!
//! Screen-space points, sizes and rectangles shared by every layer of the
//! drag engine. All coordinates are `f32` logical pixels with the origin in
//! the top-left corner of the screen.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Points and Vectors
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f32 {
        (*self - other).length()
    }

    /// Translate the point by a vector
    pub fn offset(&self, delta: Vec2) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Vec2;

    fn sub(self, rhs: Point) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add<Vec2> for Point {
    type Output = Point;

    fn add(self, rhs: Vec2) -> Point {
        self.offset(rhs)
    }
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length vector
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// The vector rotated by 90 degrees counter-clockwise
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sizes and Rectangles
// ─────────────────────────────────────────────────────────────────────────────

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half of the smaller side
    pub fn min_half_extent(&self) -> f32 {
        self.width.min(self.height) / 2.0
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Create a rect from center point and size
    pub fn from_center(center: Point, size: Size) -> Self {
        Rect {
            origin: Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
            size,
        }
    }

    /// Square of side `side` centred on `center`
    pub fn square(center: Point, side: f32) -> Self {
        Self::from_center(center, Size::new(side, side))
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Half width and half height
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.right()
            && point.y >= self.origin.y
            && point.y <= self.bottom()
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Move the rect so its origin sits at `origin`, keeping its size
    pub fn offset_to(&self, origin: Point) -> Self {
        Rect {
            origin,
            size: self.size,
        }
    }

    /// Clamp a point into the rect bounds
    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            clamp(point.x, self.origin.x, self.right()),
            clamp(point.y, self.origin.y, self.bottom()),
        )
    }

    /// Get the union of two rects (smallest rect containing both)
    pub fn union(&self, other: &Rect) -> Self {
        let min_x = self.origin.x.min(other.origin.x);
        let min_y = self.origin.y.min(other.origin.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        Rect {
            origin: Point::new(min_x, min_y),
            size: Size::new(max_x - min_x, max_y - min_y),
        }
    }
}

/// Constrain `value` to `[min, max]`
///
/// Unlike `f32::clamp` this never panics when the bounds are inverted
/// (degenerate rects); the lower bound wins.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transforms
// ─────────────────────────────────────────────────────────────────────────────

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Map the rect `from` onto the rect `to` (translate + scale)
    pub fn rect_to_rect(from: Rect, to: Rect) -> Self {
        let sx = if from.width() > 0.0 {
            to.width() / from.width()
        } else {
            1.0
        };
        let sy = if from.height() > 0.0 {
            to.height() / from.height()
        } else {
            1.0
        };
        Self::translation(to.x(), to.y())
            .then(&Self::scale(sx, sy))
            .then(&Self::translation(-from.x(), -from.y()))
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color
///
/// Serialized as a packed `0xAARRGGBB` integer so configuration files can
/// write `link_color = 0xFFFF3B30`. A value without an alpha byte (`<= 0xFFFFFF`)
/// is read as fully opaque.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Unpack a `0xAARRGGBB` value
    pub fn from_argb(argb: u32) -> Self {
        let a = ((argb >> 24) & 0xFF) as f32 / 255.0;
        Self::from_hex(argb).with_alpha(a)
    }

    /// Pack into `0xAARRGGBB`
    pub fn to_argb(&self) -> u32 {
        let channel = |v: f32| (clamp(v, 0.0, 1.0) * 255.0).round() as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        if value <= 0x00FF_FFFF {
            Color::from_hex(value)
        } else {
            Color::from_argb(value)
        }
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_argb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(160.0, 180.0);
        assert_eq!(a.distance_to(b), 100.0);
        assert_eq!(b.distance_to(a), 100.0);
    }

    #[test]
    fn test_rect_center_and_offset_to() {
        let rect = Rect::new(10.0, 20.0, 40.0, 20.0);
        assert_eq!(rect.center(), Point::new(30.0, 30.0));

        let moved = rect.offset_to(Point::new(0.0, 0.0));
        assert_eq!(moved, Rect::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(moved.size, rect.size);
    }

    #[test]
    fn test_clamp_point_into_rect() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(rect.clamp_point(Point::new(-5.0, 5.0)), Point::new(0.0, 5.0));
        assert_eq!(rect.clamp_point(Point::new(15.0, 20.0)), Point::new(10.0, 10.0));
        assert_eq!(rect.clamp_point(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_clamp_with_inverted_bounds() {
        assert_eq!(clamp(5.0, 10.0, 0.0), 10.0);
    }

    #[test]
    fn test_rect_to_rect_maps_corners() {
        let from = Rect::new(0.0, 0.0, 10.0, 10.0);
        let to = Rect::new(100.0, 50.0, 20.0, 40.0);
        let t = Affine2D::rect_to_rect(from, to);

        assert_eq!(t.transform_point(Point::new(0.0, 0.0)), Point::new(100.0, 50.0));
        assert_eq!(t.transform_point(Point::new(10.0, 10.0)), Point::new(120.0, 90.0));
    }

    #[test]
    fn test_color_packing() {
        let c = Color::from(0xFF3B30);
        assert_eq!(c.a, 1.0);
        assert_eq!(c.to_argb(), 0xFFFF3B30);

        let translucent = Color::from(0x80000000);
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-6);
    }
}
