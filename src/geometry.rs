//! Points and corner quads
//!
//! A [`Quad`] always holds its corners clockwise starting at the top-left:
//! top-left, top-right, bottom-right, bottom-left. Rotations and flips only
//! move points between slots, coordinates are never touched.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of corners in a quad
pub const CORNERS: usize = 4;

/// Labels for the corner slots, in winding order
pub const CORNER_LABELS: [&str; CORNERS] = ["Top Left", "Top Right", "Bottom Right", "Bottom Left"];

/// A 2D point, in normalized editor space (0.0 to 1.0) or in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale component-wise, e.g. from normalized to window pixels
    pub fn scale(&self, size: Point) -> Self {
        Self {
            x: self.x * size.x,
            y: self.y * size.y,
        }
    }

    /// Clamp both coordinates to the normalized range
    pub fn clamp_unit(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    pub fn distance(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Four corners in clockwise winding order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Quad(pub [Point; CORNERS]);

impl Default for Quad {
    fn default() -> Self {
        Self::unit()
    }
}

impl Quad {
    /// The normalized identity rectangle (0,0)-(1,1)
    pub const fn unit() -> Self {
        Self([
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
    }

    /// Axis-aligned rectangle from the origin to (width, height)
    pub fn rect(width: f32, height: f32) -> Self {
        Self([
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    pub fn points(&self) -> &[Point; CORNERS] {
        &self.0
    }

    /// Scale every corner component-wise by `size`
    pub fn scaled(&self, size: Point) -> Self {
        Self(self.0.map(|p| p.scale(size)))
    }

    /// Move every point one slot forward: `new[i] = old[i - 1]`
    pub fn rotated_ccw(&self) -> Self {
        let [a, b, c, d] = self.0;
        Self([d, a, b, c])
    }

    /// Move every point one slot back: `new[i] = old[i + 1]`
    pub fn rotated_cw(&self) -> Self {
        let [a, b, c, d] = self.0;
        Self([b, c, d, a])
    }

    /// Swap across the vertical axis: (0,1) and (2,3)
    pub fn flipped_horizontal(&self) -> Self {
        let [a, b, c, d] = self.0;
        Self([b, a, d, c])
    }

    /// Swap across the horizontal axis: (0,3) and (1,2)
    pub fn flipped_vertical(&self) -> Self {
        let [a, b, c, d] = self.0;
        Self([d, c, b, a])
    }

    /// Index and distance of the corner closest to `target`
    pub fn closest(&self, target: Point) -> (usize, f32) {
        self.0
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.distance(target)))
            .fold((0, f32::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
    }
}

impl Index<usize> for Quad {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.0[index]
    }
}

impl IndexMut<usize> for Quad {
    fn index_mut(&mut self, index: usize) -> &mut Point {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> Quad {
        Quad([
            Point::new(0.1, 0.05),
            Point::new(0.9, 0.0),
            Point::new(0.95, 0.8),
            Point::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_point_scale() {
        let p = Point::new(0.5, 0.25);
        assert_eq!(p.scale(Point::new(800.0, 600.0)), Point::new(400.0, 150.0));
    }

    #[test]
    fn test_clamp_unit() {
        let p = Point::new(1.5, -0.5).clamp_unit();
        assert_eq!(p, Point::new(1.0, 0.0));
    }

    #[test]
    fn test_rect_winding() {
        let q = Quad::rect(640.0, 480.0);
        assert_eq!(q[0], Point::new(0.0, 0.0));
        assert_eq!(q[1], Point::new(640.0, 0.0));
        assert_eq!(q[2], Point::new(640.0, 480.0));
        assert_eq!(q[3], Point::new(0.0, 480.0));
    }

    #[test]
    fn test_rotations_are_inverse() {
        let q = skewed();
        assert_eq!(q.rotated_cw().rotated_ccw(), q);
        assert_eq!(q.rotated_ccw().rotated_cw(), q);
        // Four quarter turns come back around
        assert_eq!(q.rotated_cw().rotated_cw().rotated_cw().rotated_cw(), q);
    }

    #[test]
    fn test_rotation_moves_slots() {
        let q = skewed();
        let ccw = q.rotated_ccw();
        assert_eq!(ccw[1], q[0]);
        assert_eq!(ccw[0], q[3]);
        let cw = q.rotated_cw();
        assert_eq!(cw[0], q[1]);
        assert_eq!(cw[3], q[0]);
    }

    #[test]
    fn test_flips_are_involutions() {
        let q = skewed();
        assert_eq!(q.flipped_horizontal().flipped_horizontal(), q);
        assert_eq!(q.flipped_vertical().flipped_vertical(), q);
        assert_ne!(q.flipped_horizontal(), q);

        let h = q.flipped_horizontal();
        assert_eq!(h[0], q[1]);
        assert_eq!(h[2], q[3]);
        let v = q.flipped_vertical();
        assert_eq!(v[0], q[3]);
        assert_eq!(v[1], q[2]);
    }

    #[test]
    fn test_closest_corner() {
        let q = Quad::rect(100.0, 100.0);
        let (index, dist) = q.closest(Point::new(95.0, 90.0));
        assert_eq!(index, 2);
        assert!((dist - (25.0f32 + 100.0).sqrt()).abs() < 1e-4);
    }
}
