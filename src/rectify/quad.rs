//! Oriented bounding box of a palm region.
//!
//! Axes come from the eigenvectors of the region covariance. The axis that
//! is closer to the image vertical becomes "down" (pointing to increasing
//! rows); "right" is its clockwise perpendicular, so the corner order
//! TL, TR, BR, BL matches the image frame for an upright hand.

use crate::components::Component;
use image::{ImageBuffer, Luma};

#[derive(Clone, Debug, PartialEq)]
pub struct OrientedBox {
    /// TL, TR, BR, BL in source pixels.
    pub corners: [[f32; 2]; 4],
    /// Extent along the "right" axis.
    pub width: f32,
    /// Extent along the "down" axis.
    pub height: f32,
}

/// Unit principal axes `(right, down)` from central second moments.
pub fn principal_axes(sxx: f64, syy: f64, sxy: f64) -> ([f64; 2], [f64; 2]) {
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let major = [theta.cos(), theta.sin()];
    let minor = [-theta.sin(), theta.cos()];
    let mut down = if major[1].abs() >= minor[1].abs() {
        major
    } else {
        minor
    };
    if down[1] < 0.0 {
        down = [-down[0], -down[1]];
    }
    let right = [down[1], -down[0]];
    (right, down)
}

/// Box enclosing every pixel of `component` in `labels`, aligned to the
/// region's principal axes.
pub fn oriented_box(
    labels: &ImageBuffer<Luma<u32>, Vec<u32>>,
    component: &Component,
) -> Option<OrientedBox> {
    if component.area == 0 {
        return None;
    }
    let (sxx, syy, sxy) = component.covariance();
    let (right, down) = principal_axes(sxx, syy, sxy);
    let [cx, cy] = component.centroid();

    let (mut r_min, mut r_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut d_min, mut d_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for y in component.min_y..=component.max_y {
        for x in component.min_x..=component.max_x {
            if labels.get_pixel(x, y).0[0] != component.label {
                continue;
            }
            // Pixel footprint: extend by half a pixel on each side.
            for (ox, oy) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                let dx = x as f64 + ox - cx;
                let dy = y as f64 + oy - cy;
                let r = dx * right[0] + dy * right[1];
                let d = dx * down[0] + dy * down[1];
                r_min = r_min.min(r);
                r_max = r_max.max(r);
                d_min = d_min.min(d);
                d_max = d_max.max(d);
            }
        }
    }
    if !r_min.is_finite() || !d_min.is_finite() {
        return None;
    }

    // Corner coordinates are offsets from the pixel centre grid; shift by
    // half a pixel so the box lives in continuous image coordinates.
    let corner = |r: f64, d: f64| {
        [
            (cx + 0.5 + r * right[0] + d * down[0]) as f32,
            (cy + 0.5 + r * right[1] + d * down[1]) as f32,
        ]
    };
    Some(OrientedBox {
        corners: [
            corner(r_min, d_min),
            corner(r_max, d_min),
            corner(r_max, d_max),
            corner(r_min, d_max),
        ],
        width: (r_max - r_min) as f32,
        height: (d_max - d_min) as f32,
    })
}
