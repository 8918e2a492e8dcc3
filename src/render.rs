//! CPU rendering of a warped texture and its edit overlay
//!
//! The warp is applied backwards: every output pixel is mapped through the
//! inverse transform into content space and sampled from the source image.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use rayon::prelude::*;
use tracing::debug;

use crate::geometry::Point;
use crate::warp::WarpPerspective;

const CHANNELS: usize = 3;

/// Overlay colors
const GRID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const SELECTED_COLOR: Rgb<u8> = Rgb([255, 160, 0]);
const CONTROL_POINT_RADIUS: i32 = 6;

/// Render `src` through the warp into an image of the warp's window size.
///
/// `src` is stretched over the warp's content rectangle. Pixels outside the
/// warped content stay black; brightness scales every sampled pixel.
pub fn warp_image(src: &RgbImage, warp: &mut WarpPerspective) -> RgbImage {
    let keystone = warp.keystone();
    let window = warp.window_size();
    let out_w = window.x.round().max(0.0) as u32;
    let out_h = window.y.round().max(0.0) as u32;
    let mut out = RgbImage::new(out_w, out_h);

    let (content_w, content_h) = warp.size();
    if out_w == 0 || content_w == 0 || content_h == 0 || src.width() == 0 || src.height() == 0 {
        return out;
    }

    let content = Point::new(content_w as f32, content_h as f32);
    let scale = Point::new(
        src.width() as f32 / content.x,
        src.height() as f32 / content.y,
    );
    let brightness = warp.brightness();
    let stride = out_w as usize * CHANNELS;

    let buf: &mut [u8] = &mut out;
    buf.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for (x, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
            // Map destination pixel to content coordinates
            let p = keystone.unmap(Point::new(x as f32, y as f32));
            if !(0.0..=content.x).contains(&p.x) || !(0.0..=content.y).contains(&p.y) {
                continue;
            }

            let rgb = bilinear_sample(src, p.x * scale.x, p.y * scale.y);
            for (dst, v) in pixel.iter_mut().zip(rgb) {
                *dst = (v * brightness).round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    debug!(
        "Rendered {}x{} source into {}x{} window",
        src.width(),
        src.height(),
        out_w,
        out_h
    );
    out
}

/// Draw the warped content outline, its diagonals and the control points.
/// Does nothing outside edit mode.
pub fn draw_edit_grid(img: &mut RgbImage, warp: &mut WarpPerspective) {
    if !warp.is_edit_mode() {
        return;
    }

    let keystone = warp.keystone();
    let corners = warp.source();
    let segments = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
        (corners[0], corners[2]),
        (corners[1], corners[3]),
    ];

    for (from, to) in segments {
        let a = keystone.map(from);
        let b = keystone.map(to);
        draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), GRID_COLOR);
    }

    for (i, p) in warp.destination().points().iter().enumerate() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        if warp.selected() == Some(i) {
            draw_filled_circle_mut(img, center, CONTROL_POINT_RADIUS, SELECTED_COLOR);
        } else {
            draw_hollow_circle_mut(img, center, CONTROL_POINT_RADIUS, GRID_COLOR);
        }
    }
}

/// Bilinear interpolation sampling
#[inline]
fn bilinear_sample(src: &RgbImage, x: f32, y: f32) -> [f32; CHANNELS] {
    let (width, height) = src.dimensions();

    // Clamp coordinates
    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    std::array::from_fn(|c| {
        p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f32 * fx * (1.0 - fy)
            + p01[c] as f32 * (1.0 - fx) * fy
            + p11[c] as f32 * fx * fy
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;

    const ORANGE: Rgb<u8> = Rgb([200, 100, 50]);

    fn solid(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, ORANGE)
    }

    #[test]
    fn test_identity_warp_copies_source() {
        let src = RgbImage::from_fn(4, 4, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 7]));
        let mut warp = WarpPerspective::new(4, 4);

        let out = warp_image(&src, &mut warp);
        assert_eq!(out.dimensions(), (4, 4));
        // Row and column 0 sit exactly on the content edge and may round
        // either way, so only interior pixels are compared
        for (x, y, p) in out.enumerate_pixels().filter(|(x, y, _)| *x > 0 && *y > 0) {
            let expected = src.get_pixel(x, y);
            for c in 0..CHANNELS {
                assert!((p.0[c] as i32 - expected.0[c] as i32).abs() <= 1, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_half_scale_leaves_outside_black() {
        let src = solid(8, 8);
        let mut warp = WarpPerspective::new(8, 8);
        warp.set_control_points(Quad([
            Point::new(0.0, 0.0),
            Point::new(0.5, 0.0),
            Point::new(0.5, 0.5),
            Point::new(0.0, 0.5),
        ]));

        let out = warp_image(&src, &mut warp);
        assert_eq!(*out.get_pixel(1, 1), ORANGE);
        assert_eq!(*out.get_pixel(6, 6), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(6, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_source_scaled_to_content() {
        // A 2x2 source stretched over 16x16 content
        let src = solid(2, 2);
        let mut warp = WarpPerspective::new(16, 16);

        let out = warp_image(&src, &mut warp);
        assert_eq!(*out.get_pixel(15, 15), ORANGE);
    }

    #[test]
    fn test_brightness_scales_output() {
        let src = solid(4, 4);
        let mut warp = WarpPerspective::new(4, 4);
        warp.set_brightness(0.5);

        let out = warp_image(&src, &mut warp);
        assert_eq!(*out.get_pixel(2, 2), Rgb([100, 50, 25]));
    }

    #[test]
    fn test_empty_window() {
        let src = solid(4, 4);
        let mut warp = WarpPerspective::new(4, 4);
        warp.set_window_size(Point::new(0.0, 0.0));

        let out = warp_image(&src, &mut warp);
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn test_grid_only_in_edit_mode() {
        let mut img = RgbImage::new(32, 32);
        let mut warp = WarpPerspective::new(32, 32);

        draw_edit_grid(&mut img, &mut warp);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));

        warp.set_edit_mode(true);
        warp.select(Some(2));
        draw_edit_grid(&mut img, &mut warp);

        // Top and left border
        assert_eq!(*img.get_pixel(10, 0), GRID_COLOR);
        assert_eq!(*img.get_pixel(0, 10), GRID_COLOR);
        // Main diagonal crosses the middle row near the center
        assert!((15..=17).any(|x| *img.get_pixel(x, 16) == GRID_COLOR));
        // Selected bottom-right control point is filled
        assert_eq!(*img.get_pixel(30, 30), SELECTED_COLOR);
    }
}
