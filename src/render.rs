//! Debug overlay of a result on the original photograph.

use crate::geometry::OriginalPoint;
use crate::types::PalmResult;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};

pub const HEART_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const HEAD_COLOR: Rgb<u8> = Rgb([0, 128, 0]);
pub const LIFE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const KEYPOINT_COLOR: Rgb<u8> = Rgb([255, 200, 0]);

fn to_px(p: &OriginalPoint, w: u32, h: u32) -> (f32, f32) {
    (p.x * w.saturating_sub(1) as f32, p.y * h.saturating_sub(1) as f32)
}

fn draw_polyline(canvas: &mut RgbImage, points: &[OriginalPoint], color: Rgb<u8>, thickness: i32) {
    let (w, h) = canvas.dimensions();
    for seg in points.windows(2) {
        let (a, b) = (to_px(&seg[0], w, h), to_px(&seg[1], w, h));
        for o in -(thickness / 2)..=(thickness / 2) {
            let off = o as f32;
            draw_line_segment_mut(canvas, (a.0 + off, a.1), (b.0 + off, b.1), color);
            draw_line_segment_mut(canvas, (a.0, a.1 + off), (b.0, b.1 + off), color);
        }
    }
}

/// Copy of `image` with the result's lines and keypoints drawn on it.
pub fn render_overlay(image: &RgbImage, result: &PalmResult) -> RgbImage {
    let mut canvas = image.clone();
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return canvas;
    }
    let thickness = ((w.min(h) / 200) as i32).max(1) | 1;
    if let Some(lines) = &result.lines {
        draw_polyline(&mut canvas, &lines.heart.points, HEART_COLOR, thickness);
        draw_polyline(&mut canvas, &lines.head.points, HEAD_COLOR, thickness);
        draw_polyline(&mut canvas, &lines.life.points, LIFE_COLOR, thickness);
    }
    if let Some(kp) = &result.keypoints {
        let radius = (w.min(h) / 80).max(2) as i32;
        for p in [&kp.palm_root, &kp.tiger_mouth, &kp.palm_center] {
            let (x, y) = to_px(p, w, h);
            let c = (x.round() as i32, y.round() as i32);
            draw_filled_circle_mut(&mut canvas, c, radius, KEYPOINT_COLOR);
            draw_hollow_circle_mut(&mut canvas, c, radius + 1, Rgb([0, 0, 0]));
        }
    }
    canvas
}
