//! Perspective rectification of the hand into a canonical square.
//!
//! The palm region is the largest component of the segmentation mask. Its
//! oriented bounding box gives four corners, which are fitted to the corners
//! of the canonical square with a normalized DLT. The canonical frame is
//! mirrored: source corners are reflected about the canonical width before
//! fitting, so the stored homography `H` maps mirrored source pixels to
//! canonical pixels and the image warp uses `H · mirror`.

mod quad;

pub use quad::{oriented_box, principal_axes, OrientedBox};

use crate::components::Labeling;
use crate::homography::{estimate_homography, is_invertible, mirror_x};
use crate::image::area_ratio;
use crate::outcome::Outcome;
use crate::segment::{SegmentFallback, SegmentOutcome, SegmentParams, Segmenter};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::debug;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RectifyParams {
    /// Side of the square rectified image.
    pub canonical_size: u32,
    /// Minimum fraction of the image covered by the palm region.
    pub min_region_ratio: f32,
    /// Minimum side of the oriented box, in source pixels.
    pub min_side_px: f32,
    /// Fill used outside the warped source.
    pub fill: [u8; 3],
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self {
            canonical_size: 256,
            min_region_ratio: 0.05,
            min_side_px: 8.0,
            fill: [255, 255, 255],
        }
    }
}

/// Rectified image and the homography that produced it.
#[derive(Clone, Debug)]
pub struct Rectification {
    pub image: RgbImage,
    /// Mirrored source pixels → rectified pixels.
    pub homography: Matrix3<f32>,
    pub warped_size: (u32, u32),
    /// Source-pixel box the homography was fitted on.
    pub quad: OrientedBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissCause {
    EmptyInput,
    DegenerateSegmentation,
    RegionTooSmall,
    BoxTooSmall,
    SingularHomography,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RectifyMiss {
    NotDetected(MissCause),
}

pub type RectifyOutcome = Outcome<Rectification, RectifyMiss>;

#[derive(Clone, Debug, Default)]
pub struct Rectifier {
    params: RectifyParams,
    segmenter: Segmenter,
}

impl Rectifier {
    pub fn new(params: RectifyParams, segment: SegmentParams) -> Self {
        Self {
            params,
            segmenter: Segmenter::new(segment),
        }
    }

    pub fn params(&self) -> &RectifyParams {
        &self.params
    }

    /// Segment `image` and rectify it.
    pub fn rectify(&self, image: &RgbImage) -> RectifyOutcome {
        let segmentation = self.segmenter.segment(image);
        self.rectify_with_mask(image, &segmentation)
    }

    /// Rectify `image` using a segmentation computed beforehand.
    pub fn rectify_with_mask(
        &self,
        image: &RgbImage,
        segmentation: &SegmentOutcome,
    ) -> RectifyOutcome {
        let miss = |cause: MissCause| {
            debug!("Rectifier::rectify not detected: {:?}", cause);
            Outcome::Failure(RectifyMiss::NotDetected(cause))
        };
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return miss(MissCause::EmptyInput);
        }
        let seg = match segmentation {
            Outcome::Success(seg) | Outcome::Fallback(seg, SegmentFallback::RawMask) => seg,
            Outcome::Fallback(_, SegmentFallback::Degenerate) | Outcome::Failure(_) => {
                return miss(MissCause::DegenerateSegmentation)
            }
        };

        let labeling = Labeling::of(&seg.mask);
        let Some(region) = labeling.largest() else {
            return miss(MissCause::DegenerateSegmentation);
        };
        let ratio = region.area as f32 / (w as f32 * h as f32);
        debug!(
            "Rectifier::rectify region area={} ratio={:.4} (mask ratio {:.4})",
            region.area,
            ratio,
            area_ratio(&seg.mask)
        );
        if ratio < self.params.min_region_ratio {
            return miss(MissCause::RegionTooSmall);
        }

        let Some(quad) = oriented_box(&labeling.labels, region) else {
            return miss(MissCause::DegenerateSegmentation);
        };
        if quad.width < self.params.min_side_px || quad.height < self.params.min_side_px {
            return miss(MissCause::BoxTooSmall);
        }

        let size = self.params.canonical_size.max(1);
        let side = size as f32;
        let mirrored: Vec<[f32; 2]> = quad.corners.iter().map(|c| [side - c[0], c[1]]).collect();
        let dst = [[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]];
        let Some(homography) = estimate_homography(&mirrored, &dst) else {
            return miss(MissCause::SingularHomography);
        };
        let warp = homography * mirror_x(side);
        if !is_invertible(&warp) {
            return miss(MissCause::SingularHomography);
        }
        let Some(projection) = Projection::from_matrix(matrix_row_major(&warp)) else {
            return miss(MissCause::SingularHomography);
        };

        let mut out = RgbImage::new(size, size);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgb(self.params.fill),
            &mut out,
        );
        debug!(
            "Rectifier::rectify box {:.1}x{:.1} -> {}x{}",
            quad.width, quad.height, size, size
        );
        Outcome::Success(Rectification {
            image: out,
            homography,
            warped_size: (size, size),
            quad,
        })
    }
}

fn matrix_row_major(m: &Matrix3<f32>) -> [f32; 9] {
    [
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{map_to_original, RectifiedPoint};
    use crate::homography::apply_homography_point;

    const SKIN: Rgb<u8> = Rgb([224, 172, 140]);
    const BACKGROUND: Rgb<u8> = Rgb([30, 60, 160]);

    fn rect_image(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                SKIN
            } else {
                BACKGROUND
            }
        })
    }

    #[test]
    fn upright_hand_fills_canonical_square() {
        let img = rect_image(120, 160, 30, 20, 90, 140);
        let rect = match Rectifier::default().rectify(&img) {
            Outcome::Success(r) => r,
            other => panic!("expected rectification, got {:?}", other.reason()),
        };
        assert_eq!(rect.warped_size, (256, 256));
        assert_eq!(rect.image.dimensions(), (256, 256));
        // Centre of the warped image comes from the skin rectangle.
        assert_eq!(rect.image.get_pixel(128, 128), &SKIN);

        // Source TL corner lands at canonical (0, 0) through the mirror.
        let warp = rect.homography * mirror_x(256.0);
        let tl = apply_homography_point(&warp, [30.0, 20.0]).unwrap();
        assert!(tl[0].abs() < 1.0 && tl[1].abs() < 1.0, "{:?}", tl);

        // Canonical centre maps back to the rectangle centre.
        let back = map_to_original(
            &[RectifiedPoint::new(0.5, 0.5)],
            &rect.homography,
            rect.warped_size,
            (120, 160),
            0,
        );
        assert!((back[0].x - 0.5).abs() < 0.02, "{:?}", back[0]);
        assert!((back[0].y - 0.5).abs() < 0.02, "{:?}", back[0]);
    }

    #[test]
    fn small_region_is_not_detected() {
        // ~2.9% of the frame: enough for segmentation, too small for a palm.
        let img = rect_image(200, 200, 83, 83, 117, 117);
        match Rectifier::default().rectify(&img) {
            Outcome::Failure(RectifyMiss::NotDetected(MissCause::RegionTooSmall)) => {}
            other => panic!("unexpected {:?}", other.reason()),
        }
    }

    #[test]
    fn non_skin_image_is_not_detected() {
        let img = RgbImage::from_pixel(64, 64, BACKGROUND);
        let out = Rectifier::default().rectify(&img);
        assert_eq!(
            out.reason(),
            Some(&RectifyMiss::NotDetected(MissCause::DegenerateSegmentation))
        );
    }

    #[test]
    fn empty_input_is_not_detected() {
        let out = Rectifier::default().rectify(&RgbImage::new(0, 0));
        assert_eq!(
            out.reason(),
            Some(&RectifyMiss::NotDetected(MissCause::EmptyInput))
        );
    }
}
