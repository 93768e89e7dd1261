//! Rubber-band link geometry
//!
//! The link between the anchor and the dragged ghost is a filled shape made
//! of two quadratic curves. Its four corner points are found by offsetting
//! both ends perpendicular to the anchor→target direction: by the anchor
//! radius on the anchor side, and by the geometric mean of the target half
//! extents on the target side. The target-side corners are clamped into the
//! target rect so the band never pokes out past the ghost. Both curves share
//! one control point, the centroid of the four corners, which pinches the
//! band in the middle.

use smallvec::SmallVec;

use crate::draw::Path;
use crate::geometry::{Point, Rect};

/// Corner points and control point of a rubber-band link
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RubberBand {
    /// Anchor side, positive perpendicular
    pub anchor_start: Point,
    /// Anchor side, negative perpendicular
    pub anchor_end: Point,
    /// Target side, positive perpendicular (clamped into the target rect)
    pub target_start: Point,
    /// Target side, negative perpendicular (clamped into the target rect)
    pub target_end: Point,
    /// Shared quadratic control point
    pub control: Point,
}

impl RubberBand {
    /// Compute the band between an anchor circle and a target rect
    ///
    /// `target_half` is the half size of the dragged snapshot, which can
    /// differ from `target`'s own size while the ghost is being resized.
    /// Returns `None` when the anchor and the target centre coincide, since
    /// the band has no direction.
    pub fn compute(
        anchor: Point,
        anchor_radius: f32,
        target: Rect,
        target_half: (f32, f32),
    ) -> Option<Self> {
        let end = target.center();
        let direction = end - anchor;
        if direction.length() <= f32::EPSILON {
            return None;
        }
        let normal = direction.normalize().perpendicular();

        let anchor_offset = normal.scale(anchor_radius);
        let target_radius = (target_half.0.max(0.0) * target_half.1.max(0.0)).sqrt();
        let target_offset = normal.scale(target_radius);

        let anchor_start = anchor + anchor_offset;
        let anchor_end = anchor + anchor_offset.scale(-1.0);
        let target_start = target.clamp_point(end + target_offset);
        let target_end = target.clamp_point(end + target_offset.scale(-1.0));

        let corners: SmallVec<[Point; 4]> =
            SmallVec::from_buf([anchor_start, target_start, anchor_end, target_end]);
        let (sum_x, sum_y) = corners
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let control = Point::new(sum_x / 4.0, sum_y / 4.0);

        Some(Self {
            anchor_start,
            anchor_end,
            target_start,
            target_end,
            control,
        })
    }

    /// Closed outline of the band
    pub fn to_path(&self) -> Path {
        let c = self.control;
        Path::new()
            .move_to(self.anchor_start.x, self.anchor_start.y)
            .quad_to(c.x, c.y, self.target_start.x, self.target_start.y)
            .line_to(self.target_end.x, self.target_end.y)
            .quad_to(c.x, c.y, self.anchor_end.x, self.anchor_end.y)
            .close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::PathCommand;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_horizontal_band_offsets_vertically() {
        // Target centred at (200, 100), 40x40, anchor radius 10
        let target = Rect::new(180.0, 80.0, 40.0, 40.0);
        let band = RubberBand::compute(Point::new(100.0, 100.0), 10.0, target, (20.0, 20.0))
            .expect("band has a direction");

        assert!(approx(band.anchor_start.x, 100.0));
        assert!(approx(band.anchor_start.y, 110.0));
        assert!(approx(band.anchor_end.y, 90.0));
        // sqrt(20 * 20) = 20, which lands exactly on the target's edges
        assert!(approx(band.target_start.y, 120.0));
        assert!(approx(band.target_end.y, 80.0));
        assert!(approx(band.control.x, 150.0));
        assert!(approx(band.control.y, 100.0));
    }

    #[test]
    fn test_target_corners_are_clamped() {
        let target = Rect::new(180.0, 90.0, 40.0, 20.0);
        // Half extents larger than the rect itself
        let band = RubberBand::compute(Point::new(100.0, 100.0), 5.0, target, (50.0, 50.0))
            .expect("band has a direction");

        assert!(target.contains(band.target_start));
        assert!(target.contains(band.target_end));
    }

    #[test]
    fn test_coincident_centres_have_no_band() {
        let target = Rect::new(90.0, 90.0, 20.0, 20.0);
        assert!(RubberBand::compute(Point::new(100.0, 100.0), 5.0, target, (10.0, 10.0)).is_none());
    }

    #[test]
    fn test_path_shape() {
        let target = Rect::new(180.0, 80.0, 40.0, 40.0);
        let band = RubberBand::compute(Point::new(100.0, 100.0), 10.0, target, (20.0, 20.0))
            .expect("band has a direction");
        let path = band.to_path();
        let commands = path.commands();

        assert_eq!(commands.len(), 5);
        assert!(matches!(commands[0], PathCommand::MoveTo(_)));
        assert!(matches!(commands[1], PathCommand::QuadTo { .. }));
        assert!(matches!(commands[2], PathCommand::LineTo(_)));
        assert!(matches!(commands[3], PathCommand::QuadTo { .. }));
        assert_eq!(commands[4], PathCommand::Close);
    }
}
