//! Perspective transformation for keystone warping
//!
//! This module solves the homography that maps the content rectangle onto the
//! four destination corners, and embeds it in a 4x4 matrix so a generic 4x4
//! transform pipeline can apply it.
//!
//! The solve is done for exactly 4 correspondences: an 8x9 augmented system
//! (8 unknowns h11..h32, h33 fixed to 1) reduced by Gaussian elimination with
//! partial pivoting, followed by back substitution.

use nalgebra::{Matrix4, Vector4};

use crate::error::WarpError;
use crate::geometry::{Point, Quad, CORNERS};

/// Unknown homography coefficients (h33 is fixed to 1)
const UNKNOWNS: usize = 2 * CORNERS;
/// Coefficient columns plus the right-hand side
const COLUMNS: usize = UNKNOWNS + 1;
/// Index of the right-hand side column
const RHS: usize = UNKNOWNS;

type AugmentedMatrix = [[f32; COLUMNS]; UNKNOWNS];

/// A forward perspective transform together with its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keystone {
    /// Maps content (source) pixels to window (destination) pixels
    pub transform: Matrix4<f32>,
    /// Maps window pixels back to content pixels
    pub inverse: Matrix4<f32>,
}

impl Default for Keystone {
    fn default() -> Self {
        Self::identity()
    }
}

impl Keystone {
    pub fn identity() -> Self {
        Self {
            transform: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// Transform a point from source to destination coordinates
    #[inline]
    pub fn map(&self, p: Point) -> Point {
        project_point(&self.transform, p)
    }

    /// Transform a point from destination to source coordinates (inverse)
    #[inline]
    pub fn unmap(&self, p: Point) -> Point {
        project_point(&self.inverse, p)
    }

    /// True when both matrices are free of NaN and infinities
    pub fn is_finite(&self) -> bool {
        self.transform.iter().all(|v| v.is_finite()) && self.inverse.iter().all(|v| v.is_finite())
    }
}

/// Apply a 4x4 perspective matrix to a point on the z = 0 plane
#[inline]
pub fn project_point(m: &Matrix4<f32>, p: Point) -> Point {
    let v = m * Vector4::new(p.x, p.y, 0.0, 1.0);
    if v.w.abs() < 1e-10 {
        return p; // Avoid division by zero
    }
    Point::new(v.x / v.w, v.y / v.w)
}

/// Compute the transform mapping `source` onto `destination`, plus its inverse.
///
/// Degenerate quads (duplicate or collinear corners) are not reported: the
/// result may be singular, in which case the inverse is filled with NaN. Use
/// [`try_compute_transform`] to have that detected.
pub fn compute_transform(source: &Quad, destination: &Quad) -> Keystone {
    let mut system = build_system(source, destination);
    eliminate(&mut system);
    let h = back_substitute(&mut system);

    let transform = assemble(&h);
    let inverse = transform
        .try_inverse()
        .unwrap_or_else(|| Matrix4::from_element(f32::NAN));

    Keystone { transform, inverse }
}

/// Like [`compute_transform`], but rejects non-finite or singular results
pub fn try_compute_transform(source: &Quad, destination: &Quad) -> Result<Keystone, WarpError> {
    let keystone = compute_transform(source, destination);
    if keystone.is_finite() {
        Ok(keystone)
    } else {
        Err(WarpError::Degenerate)
    }
}

/// Build the 8x9 augmented matrix.
///
/// Each correspondence (x,y) -> (x',y') contributes two rows:
/// h11*x + h12*y + h13 - h31*x*x' - h32*y*x' = x'
/// h21*x + h22*y + h23 - h31*x*y' - h32*y*y' = y'
fn build_system(src: &Quad, dst: &Quad) -> AugmentedMatrix {
    let mut a = [[0.0f32; COLUMNS]; UNKNOWNS];

    for (i, (s, d)) in src.points().iter().zip(dst.points()).enumerate() {
        a[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -s.x * d.x, -s.y * d.x, d.x];
        a[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -s.x * d.y, -s.y * d.y, d.y];
    }

    a
}

/// Forward elimination with partial pivoting.
///
/// For each coefficient column the row with the largest magnitude among the
/// rows not yet reduced becomes the pivot. A zero pivot skips the column
/// without consuming a row, leaving the system dependent.
fn eliminate(a: &mut AugmentedMatrix) {
    let mut row = 0;

    for col in 0..UNKNOWNS {
        if row >= UNKNOWNS {
            break;
        }

        // Find pivot
        let pivot_row = (row + 1..UNKNOWNS).fold(row, |best, r| {
            if a[r][col].abs() > a[best][col].abs() {
                r
            } else {
                best
            }
        });

        let pivot = a[pivot_row][col];
        if pivot == 0.0 {
            continue;
        }

        if pivot_row != row {
            a.swap(row, pivot_row);
        }

        for v in a[row].iter_mut() {
            *v /= pivot;
        }

        // Eliminate column below the pivot
        let pivot_values = a[row];
        for below in a[row + 1..].iter_mut() {
            let factor = below[col];
            for (v, p) in below.iter_mut().zip(pivot_values.iter()) {
                *v -= factor * p;
            }
        }

        row += 1;
    }
}

/// Back substitution from the second to last row upward. The last row is
/// already solved after normalization.
fn back_substitute(a: &mut AugmentedMatrix) -> [f32; UNKNOWNS] {
    for row in (0..UNKNOWNS - 1).rev() {
        for col in row + 1..UNKNOWNS {
            a[row][RHS] -= a[row][col] * a[col][RHS];
        }
    }

    std::array::from_fn(|i| a[i][RHS])
}

/// Embed h11..h32 (h33 = 1) in a 4x4 matrix with z passed through
fn assemble(h: &[f32; UNKNOWNS]) -> Matrix4<f32> {
    #[rustfmt::skip]
    let m = Matrix4::new(
        h[0], h[1], 0.0, h[2],
        h[3], h[4], 0.0, h[5],
        0.0,  0.0,  1.0, 0.0,
        h[6], h[7], 0.0, 1.0,
    );
    m
}
