//! Skin/foreground segmentation of colour photographs.
//!
//! Pipeline
//! - HSV skin band → raw mask.
//! - Closing (7×7) then opening (5×5) to fill gaps and drop speckle.
//! - Keep the largest component that stays clear of the image frame, so that
//!   background regions merged with the border are rejected. When every
//!   region touches the frame, keep the largest one.
//! - Area checks: a mask under 2% of the image falls back to the raw mask;
//!   if that is still under 2% the input is returned untouched rather than
//!   painting the whole image white.

use crate::components::Labeling;
use crate::image::{area_ratio, SkinBand};
use crate::outcome::Outcome;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, erode, open};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    pub band: SkinBand,
    /// Side of the square closing element (odd).
    pub close_size: u8,
    /// Side of the square opening element (odd).
    pub open_size: u8,
    /// Minimum mask coverage before falling back.
    pub min_area_ratio: f32,
    /// Colour painted over the removed background.
    pub fill: [u8; 3],
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            band: SkinBand::default(),
            close_size: 7,
            open_size: 5,
            min_area_ratio: 0.02,
            fill: [255, 255, 255],
        }
    }
}

/// Foreground mask and the image with its background removed.
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub mask: GrayImage,
    pub image: RgbImage,
    pub area_ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFallback {
    /// The morphology/component mask was too small; the raw band mask was used.
    RawMask,
    /// Both masks were too small; the image is returned unmodified.
    Degenerate,
}

pub type SegmentOutcome = Outcome<Segmentation, SegmentFallback>;

/// Stateless segmenter bound to a parameter set.
#[derive(Clone, Debug, Default)]
pub struct Segmenter {
    params: SegmentParams,
}

impl Segmenter {
    pub fn new(params: SegmentParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    pub fn segment(&self, image: &RgbImage) -> SegmentOutcome {
        segment(image, &self.params)
    }
}

#[inline]
pub(crate) fn radius(size: u8) -> u8 {
    size / 2
}

/// Largest border-free component, else largest overall; `None` when the
/// mask is empty.
pub fn dominant_component_mask(mask: &GrayImage) -> Option<GrayImage> {
    let labeling = Labeling::of(mask);
    let label = labeling.dominant_foreground()?.label;
    Some(labeling.mask_of(label))
}

/// Segment `image`, returning the mask and the background-removed image.
pub fn segment(image: &RgbImage, params: &SegmentParams) -> SegmentOutcome {
    let (w, h) = image.dimensions();
    let raw = params.band.mask(image);
    if w == 0 || h == 0 {
        return degenerate(image, raw.dimensions());
    }

    let mut mask = close(&raw, Norm::LInf, radius(params.close_size));
    mask = open(&mask, Norm::LInf, radius(params.open_size));
    if let Some(best) = dominant_component_mask(&mask) {
        mask = best;
    }

    let ratio = area_ratio(&mask);
    debug!("segment w={} h={} morph_area_ratio={:.4}", w, h, ratio);
    if ratio >= params.min_area_ratio {
        let image = remove_background(image, &mask, params.fill);
        return Outcome::Success(Segmentation {
            mask,
            image,
            area_ratio: ratio,
        });
    }

    let raw_ratio = area_ratio(&raw);
    if raw_ratio >= params.min_area_ratio {
        warn!(
            "segment mask too small ({:.4}) -> falling back to raw skin mask ({:.4})",
            ratio, raw_ratio
        );
        let image = remove_background(image, &raw, params.fill);
        return Outcome::Fallback(
            Segmentation {
                mask: raw,
                image,
                area_ratio: raw_ratio,
            },
            SegmentFallback::RawMask,
        );
    }

    warn!(
        "segment raw skin mask too small ({:.4}) -> keeping the input unmodified",
        raw_ratio
    );
    degenerate(image, (w, h))
}

fn degenerate(image: &RgbImage, (w, h): (u32, u32)) -> SegmentOutcome {
    Outcome::Fallback(
        Segmentation {
            mask: GrayImage::from_pixel(w, h, Luma([255])),
            image: image.clone(),
            area_ratio: 0.0,
        },
        SegmentFallback::Degenerate,
    )
}

/// Paint every pixel outside `mask` with `fill`.
pub fn remove_background(image: &RgbImage, mask: &GrayImage, fill: [u8; 3]) -> RgbImage {
    let mut out = image.clone();
    for (px, m) in out.pixels_mut().zip(mask.pixels()) {
        if m.0[0] == 0 {
            *px = Rgb(fill);
        }
    }
    out
}

/// Palm region used to gate line pixels.
///
/// Skin band, closing, dominant component. Regions under `min_area_ratio`
/// are replaced by the whole frame; otherwise the region is eroded by
/// `erode_size` to keep line pixels away from the silhouette edge.
pub fn line_region(
    image: &RgbImage,
    band: &SkinBand,
    close_size: u8,
    erode_size: u8,
    min_area_ratio: f32,
) -> GrayImage {
    let (w, h) = image.dimensions();
    let fg = close(&band.mask(image), Norm::LInf, radius(close_size));
    let region = dominant_component_mask(&fg).unwrap_or(fg);
    let ratio = area_ratio(&region);
    if ratio < min_area_ratio {
        debug!(
            "line_region area_ratio={:.4} below {:.4} -> using the whole frame",
            ratio, min_area_ratio
        );
        return GrayImage::from_pixel(w, h, Luma([255]));
    }
    if erode_size > 1 {
        erode(&region, Norm::LInf, radius(erode_size))
    } else {
        region
    }
}
