//! Transfer of line points from the rectified frame back to the original
//! photograph.
//!
//! The rectified frame is mirrored (see [`crate::rectify`]): the homography
//! maps reflected source coordinates into the canonical square, so the
//! inverse transfer applies `x' = warped_w - x` before removing padding.

use super::points::{OriginalPoint, RectifiedPoint};
use crate::homography::apply_homography_point;
use crate::types::{HandKeypoints, PalmKeypoints};
use log::{debug, warn};
use nalgebra::Matrix3;
use serde::Deserialize;

/// How the rectified frame relates to the padded input of one attempt.
#[derive(Clone, Debug)]
pub enum FrameMapping {
    /// Rectification succeeded; `homography` maps mirrored padded-input
    /// pixels into the `warped_size` canonical square.
    Rectified {
        homography: Matrix3<f32>,
        warped_size: (u32, u32),
    },
    /// Rectification fell back; the frame is the padded input itself.
    Padded { padded_size: (u32, u32) },
}

impl FrameMapping {
    pub fn is_rectified(&self) -> bool {
        matches!(self, FrameMapping::Rectified { .. })
    }

    pub fn map(
        &self,
        points: &[RectifiedPoint],
        original_size: (u32, u32),
        pad: u32,
    ) -> Vec<OriginalPoint> {
        match self {
            FrameMapping::Rectified {
                homography,
                warped_size,
            } => map_to_original(points, homography, *warped_size, original_size, pad),
            FrameMapping::Padded { padded_size } => {
                unpad_points(points, *padded_size, original_size, pad)
            }
        }
    }
}

#[inline]
fn renormalize(x_padded: f32, y_padded: f32, original_size: (u32, u32), pad: u32) -> OriginalPoint {
    let (ow, oh) = (original_size.0.max(1) as f32, original_size.1.max(1) as f32);
    let pad = pad as f32;
    OriginalPoint::new(
        ((x_padded - pad) / ow).clamp(0.0, 1.0),
        ((y_padded - pad) / oh).clamp(0.0, 1.0),
    )
}

/// Inverse-homography transfer of rectified points into original-normalized
/// coordinates. Points with a vanishing homogeneous weight are dropped; a
/// non-invertible homography drops every point.
pub fn map_to_original(
    points: &[RectifiedPoint],
    homography: &Matrix3<f32>,
    warped_size: (u32, u32),
    original_size: (u32, u32),
    pad: u32,
) -> Vec<OriginalPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let Some(inv) = homography.try_inverse() else {
        warn!("map_to_original homography is singular -> dropping {} points", points.len());
        return Vec::new();
    };
    let (ww, wh) = (warped_size.0 as f32, warped_size.1 as f32);
    let mut dropped = 0usize;
    let mapped: Vec<OriginalPoint> = points
        .iter()
        .filter_map(|p| {
            let src = apply_homography_point(&inv, [p.x * ww, p.y * wh]);
            if src.is_none() {
                dropped += 1;
            }
            src
        })
        .map(|[xf, yf]| renormalize(ww - xf, yf, original_size, pad))
        .collect();
    if dropped > 0 {
        debug!("map_to_original dropped {} points with zero weight", dropped);
    }
    mapped
}

/// Fallback transfer: the frame is the padded input, so only the padding
/// is removed.
pub fn unpad_points(
    points: &[RectifiedPoint],
    padded_size: (u32, u32),
    original_size: (u32, u32),
    pad: u32,
) -> Vec<OriginalPoint> {
    let (pw, ph) = (padded_size.0 as f32, padded_size.1 as f32);
    points
        .iter()
        .map(|p| renormalize(p.x * pw, p.y * ph, original_size, pad))
        .collect()
}

/// Keypoints detected on the padded input, as original-normalized points.
pub fn normalize_keypoints(
    raw: &HandKeypoints,
    original_size: (u32, u32),
    pad: u32,
) -> PalmKeypoints {
    let map = |[x, y]: [f32; 2]| renormalize(x, y, original_size, pad);
    PalmKeypoints {
        palm_root: map(raw.palm_root),
        tiger_mouth: map(raw.tiger_mouth),
        palm_center: map(raw.palm_center),
        flipped: raw.flipped,
        handedness: raw.handedness.clone(),
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// Extension length as a fraction of the polyline length.
    pub ratio: f32,
    pub min_px: f32,
    pub max_px: f32,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            ratio: 0.2,
            min_px: 12.0,
            max_px: 60.0,
        }
    }
}

/// Append one point past the end of the polyline along its last segment.
///
/// Lengths are measured in original pixels; the result is clamped to the
/// image. Polylines with fewer than two points, or whose last segment has
/// zero length, are returned unchanged.
pub fn extend_polyline(
    points: &[OriginalPoint],
    original_size: (u32, u32),
    params: &MapperParams,
) -> Vec<OriginalPoint> {
    let mut out = points.to_vec();
    let n = points.len();
    if n < 2 {
        return out;
    }
    let (ow, oh) = (original_size.0 as f32, original_size.1 as f32);
    let (p0, p1) = (points[n - 2], points[n - 1]);
    let dx = (p1.x - p0.x) * ow;
    let dy = (p1.y - p0.y) * oh;
    let seg_len = dx.hypot(dy);
    if seg_len == 0.0 {
        return out;
    }
    let total: f32 = points
        .windows(2)
        .map(|w| ((w[1].x - w[0].x) * ow).hypot((w[1].y - w[0].y) * oh))
        .sum();
    let extend = (total * params.ratio).clamp(params.min_px, params.max_px);
    let (ux, uy) = (dx / seg_len, dy / seg_len);
    let (ow, oh) = (ow.max(1.0), oh.max(1.0));
    out.push(OriginalPoint::new(
        (p1.x + extend * ux / ow).clamp(0.0, 1.0),
        (p1.y + extend * uy / oh).clamp(0.0, 1.0),
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_homography_applies_mirror_only() {
        let pts = [RectifiedPoint::new(0.25, 0.5)];
        let out = map_to_original(&pts, &Matrix3::identity(), (256, 256), (256, 256), 0);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].x, 0.75);
        assert_relative_eq!(out[0].y, 0.5);
    }

    #[test]
    fn padding_is_removed_and_clamped() {
        // 100x50 original padded by 10 on every side -> 120x70 frame.
        let pts = [
            RectifiedPoint::new(0.5, 0.5),
            RectifiedPoint::new(0.0, 0.0),
            RectifiedPoint::new(1.0, 1.0),
        ];
        let out = unpad_points(&pts, (120, 70), (100, 50), 10);
        assert_relative_eq!(out[0].x, 0.5);
        assert_relative_eq!(out[0].y, 0.5);
        assert_eq!((out[1].x, out[1].y), (0.0, 0.0));
        assert_eq!((out[2].x, out[2].y), (1.0, 1.0));
    }

    #[test]
    fn singular_homography_drops_everything() {
        let pts = [RectifiedPoint::new(0.5, 0.5)];
        let out = map_to_original(&pts, &Matrix3::zeros(), (256, 256), (256, 256), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn scaled_homography_maps_back_through_padding() {
        // Source padded frame of 512x512 squeezed into 256x256 (after mirror).
        let h = Matrix3::new(0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0);
        let mapping = FrameMapping::Rectified {
            homography: h,
            warped_size: (256, 256),
        };
        let out = mapping.map(&[RectifiedPoint::new(0.5, 0.25)], (412, 412), 50);
        // warped (128, 64) -> src (256, 128) -> mirror (0, 128) -> unpad -> clamp
        assert_eq!(out[0].x, 0.0);
        assert_relative_eq!(out[0].y, 78.0 / 412.0, epsilon = 1e-6);
    }

    #[test]
    fn keypoints_lose_padding() {
        let raw = HandKeypoints {
            palm_root: [60.0, 110.0],
            tiger_mouth: [10.0, 10.0],
            palm_center: [60.0, 60.0],
            flipped: false,
            handedness: Some("Right".into()),
        };
        let kp = normalize_keypoints(&raw, (100, 100), 10);
        assert_relative_eq!(kp.palm_root.x, 0.5);
        assert_relative_eq!(kp.palm_root.y, 1.0);
        assert_eq!((kp.tiger_mouth.x, kp.tiger_mouth.y), (0.0, 0.0));
        assert_eq!(kp.handedness.as_deref(), Some("Right"));
    }

    #[test]
    fn extension_continues_last_segment() {
        let pts = [OriginalPoint::new(0.5, 0.1), OriginalPoint::new(0.5, 0.2)];
        let out = extend_polyline(&pts, (100, 100), &MapperParams::default());
        assert_eq!(out.len(), 3);
        // total length 10 px -> 2 px, clamped up to 12 px.
        assert_relative_eq!(out[2].x, 0.5);
        assert_relative_eq!(out[2].y, 0.32, epsilon = 1e-6);
    }

    #[test]
    fn extension_is_capped_and_stays_in_frame() {
        let pts = [OriginalPoint::new(0.0, 0.0), OriginalPoint::new(0.0, 0.9)];
        let out = extend_polyline(&pts, (1000, 1000), &MapperParams::default());
        // 900 px * 0.2 = 180 -> capped at 60 px.
        assert_relative_eq!(out[2].y, 0.96, epsilon = 1e-5);
        let short = [OriginalPoint::new(0.5, 0.5)];
        assert_eq!(extend_polyline(&short, (10, 10), &MapperParams::default()).len(), 1);
        let flat = [OriginalPoint::new(0.5, 0.5), OriginalPoint::new(0.5, 0.5)];
        assert_eq!(extend_polyline(&flat, (10, 10), &MapperParams::default()).len(), 2);
    }
}
