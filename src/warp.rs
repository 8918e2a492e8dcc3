//! Perspective warp state: control points, sizes and the cached transform
//!
//! The control points are the persisted, editable state. Everything else
//! (source quad, destination quad, matrices) is derived from them and from
//! the content and window sizes. Any change marks the warp dirty; the next
//! read of either matrix recomputes both in a single step.

use nalgebra::Matrix4;
use tracing::{debug, warn};

use crate::error::WarpError;
use crate::geometry::{Point, Quad, CORNERS};
use crate::transform::{compute_transform, Keystone};

/// Default content and window size
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// A four-corner keystone warp
#[derive(Debug, Clone)]
pub struct WarpPerspective {
    /// Normalized destination corners (0.0 to 1.0), winding TL, TR, BR, BL
    control_points: Quad,
    /// Content dimensions in pixels
    width: u32,
    height: u32,
    /// Window (viewport) size in pixels
    window_size: Point,
    /// Currently selected control point, if any
    selected: Option<usize>,
    edit_mode: bool,
    /// Output brightness (0.0 to 1.0)
    brightness: f32,
    /// Cached matrices, `None` while dirty
    cache: Option<Keystone>,
}

impl Default for WarpPerspective {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl WarpPerspective {
    /// Create a warp for content of the given size. The window size starts
    /// equal to the content size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            control_points: Quad::unit(),
            width,
            height,
            window_size: Point::new(width as f32, height as f32),
            selected: None,
            edit_mode: false,
            brightness: 1.0,
            cache: None,
        }
    }

    /// Restore the identity rectangle
    pub fn reset(&mut self) {
        self.control_points = Quad::unit();
        self.set_dirty();
    }

    /// Invalidate the cached matrices
    pub fn set_dirty(&mut self) {
        self.cache = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_none()
    }

    pub fn control_points(&self) -> &Quad {
        &self.control_points
    }

    /// Replace all four control points
    pub fn set_control_points(&mut self, points: Quad) {
        self.control_points = points;
        self.set_dirty();
    }

    /// Move one control point, clamped to the normalized range
    pub fn set_control_point(&mut self, index: usize, point: Point) -> Result<(), WarpError> {
        if index >= CORNERS {
            return Err(WarpError::InvalidPoint { index });
        }
        self.control_points[index] = point.clamp_unit();
        self.set_dirty();
        Ok(())
    }

    /// Move the selected control point by a normalized delta.
    /// Returns false when nothing is selected.
    pub fn nudge_selected(&mut self, dx: f32, dy: f32) -> bool {
        let Some(index) = self.selected.filter(|&i| i < CORNERS) else {
            return false;
        };
        let p = self.control_points[index];
        self.control_points[index] = Point::new(p.x + dx, p.y + dy).clamp_unit();
        self.set_dirty();
        true
    }

    /// Content dimensions in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.set_dirty();
        }
    }

    pub fn window_size(&self) -> Point {
        self.window_size
    }

    pub fn set_window_size(&mut self, size: Point) {
        if size != self.window_size {
            self.window_size = size;
            self.set_dirty();
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index;
    }

    /// Select the control point closest to a window-space position.
    /// Returns the index and its distance in pixels.
    pub fn select_closest(&mut self, position: Point) -> (usize, f32) {
        let (index, distance) = self.destination().closest(position);
        self.selected = Some(index);
        (index, distance)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    /// Content rectangle in pixels, always matching the current content size
    pub fn source(&self) -> Quad {
        Quad::rect(self.width as f32, self.height as f32)
    }

    /// Control points scaled to window pixels
    pub fn destination(&self) -> Quad {
        self.control_points.scaled(self.window_size)
    }

    /// Shift every point one slot forward, keeping the same corner selected
    pub fn rotate_ccw(&mut self) {
        self.control_points = self.control_points.rotated_ccw();
        self.adjust_selection(|s| (s + 1) % CORNERS);
        self.set_dirty();
    }

    /// Shift every point one slot back, keeping the same corner selected
    pub fn rotate_cw(&mut self) {
        self.control_points = self.control_points.rotated_cw();
        self.adjust_selection(|s| (s + CORNERS - 1) % CORNERS);
        self.set_dirty();
    }

    pub fn flip_horizontal(&mut self) {
        self.control_points = self.control_points.flipped_horizontal();
        self.adjust_selection(|s| s ^ 1);
        self.set_dirty();
    }

    pub fn flip_vertical(&mut self) {
        self.control_points = self.control_points.flipped_vertical();
        self.adjust_selection(|s| CORNERS - 1 - s);
        self.set_dirty();
    }

    /// Remap the selection after a permutation. An absent or out-of-range
    /// selection is left alone.
    fn adjust_selection(&mut self, remap: impl Fn(usize) -> usize) {
        if let Some(s) = self.selected.filter(|&s| s < CORNERS) {
            self.selected = Some(remap(s));
        }
    }

    /// Both matrices, recomputed first if dirty
    pub fn keystone(&mut self) -> Keystone {
        if let Some(keystone) = self.cache {
            return keystone;
        }

        let keystone = self.recompute();
        self.cache = Some(keystone);
        keystone
    }

    /// Transform from content pixels to window pixels
    pub fn transform(&mut self) -> Matrix4<f32> {
        self.keystone().transform
    }

    /// Transform from window pixels back to content pixels
    pub fn inverted_transform(&mut self) -> Matrix4<f32> {
        self.keystone().inverse
    }

    /// Project a content-space point into window space
    pub fn map_point(&mut self, p: Point) -> Point {
        self.keystone().map(p)
    }

    /// Project a window-space point back into content space
    pub fn unmap_point(&mut self, p: Point) -> Point {
        self.keystone().unmap(p)
    }

    fn recompute(&self) -> Keystone {
        let source = self.source();
        let destination = self.destination();
        let keystone = compute_transform(&source, &destination);

        if keystone.is_finite() {
            debug!(
                "Recomputed warp for {}x{} content in {}x{} window",
                self.width, self.height, self.window_size.x, self.window_size.y
            );
        } else {
            warn!("Degenerate control points {:?}, warp is not invertible", self.control_points);
        }

        keystone
    }
}
