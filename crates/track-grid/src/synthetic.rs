//! Synthetic track images
//!
//! Drawn in the same palette real preprocessed tracks use, so they go through
//! the regular colour classification.

use crate::cell::classify_color;
use crate::grid::OccupancyGrid;
use crate::GridError;
use image::{Rgb, RgbImage};

pub const WALL_RGB: Rgb<u8> = Rgb([0, 0, 0]);
pub const TARMAC_RGB: Rgb<u8> = Rgb([255, 255, 255]);
pub const START_RGB: Rgb<u8> = Rgb([255, 0, 0]);
pub const DIRECTION_RGB: Rgb<u8> = Rgb([255, 255, 0]);
pub const GRAVEL_RGB: Rgb<u8> = Rgb([0, 200, 0]);

/// Circular ring of tarmac between `inner_radius` and `outer_radius`
pub fn annulus(
    width: u32,
    height: u32,
    center: (f64, f64),
    inner_radius: f64,
    outer_radius: f64,
) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f64 + 0.5 - center.0;
        let dy = y as f64 + 0.5 - center.1;
        let r = (dx * dx + dy * dy).sqrt();
        if r >= inner_radius && r <= outer_radius {
            TARMAC_RGB
        } else {
            WALL_RGB
        }
    })
}

/// Rectangular ring: a wall frame `wall_thickness` wide, a tarmac band
/// `track_width` wide inside it, and a solid wall block in the middle
pub fn rectangle_ring(width: u32, height: u32, wall_thickness: u32, track_width: u32) -> RgbImage {
    let inner = wall_thickness + track_width;
    RgbImage::from_fn(width, height, |x, y| {
        let in_outer = x >= wall_thickness
            && y >= wall_thickness
            && x < width.saturating_sub(wall_thickness)
            && y < height.saturating_sub(wall_thickness);
        let in_inner = x >= inner
            && y >= inner
            && x < width.saturating_sub(inner)
            && y < height.saturating_sub(inner);
        if in_outer && !in_inner {
            TARMAC_RGB
        } else {
            WALL_RGB
        }
    })
}

/// Elliptical test circuit with a start line at the top of the ellipse, a
/// direction marker just clockwise of it, and a gravel run-off outside the
/// right-hand hairpin
pub fn elliptical_track(width: u32, height: u32) -> RgbImage {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let rx = width as f64 * 0.375;
    let ry = height as f64 / 3.0;

    let mut img = RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let dist = (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry);
        if (0.6..=1.0).contains(&dist) {
            TARMAC_RGB
        } else if dist > 1.0 && dist <= 1.2 && dx > rx * 0.7 {
            GRAVEL_RGB
        } else {
            WALL_RGB
        }
    });

    let band_top = (cy - ry).max(0.0) as u32;
    let band_bottom = (cy - ry * 0.6f64.sqrt()) as u32;
    let cxi = cx as u32;

    paint_on_tarmac(&mut img, cxi.saturating_sub(3)..cxi + 3, band_top..band_bottom, START_RGB);
    paint_on_tarmac(&mut img, cxi + 20..cxi + 26, band_top..band_bottom, DIRECTION_RGB);

    img
}

fn paint_on_tarmac(
    img: &mut RgbImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    color: Rgb<u8>,
) {
    for y in ys {
        for x in xs.clone() {
            if x < img.width() && y < img.height() && *img.get_pixel(x, y) == TARMAC_RGB {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Classify a synthetic image with the standard colour policy
pub fn to_grid(image: &RgbImage) -> Result<OccupancyGrid, GridError> {
    OccupancyGrid::from_image(image, classify_color)
}
