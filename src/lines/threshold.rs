//! Probability map → binary line mask.

use crate::image::ImageF32;
use crate::outcome::Outcome;
use image::{GrayImage, Luma};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Pixels strictly above this probability are line pixels.
    pub cutoff: f32,
    /// Below this many set pixels the percentile fallback is used.
    pub min_pixels: usize,
    /// Percentile (0..=100) used by the fallback.
    pub percentile: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            cutoff: 0.04,
            min_pixels: 30,
            percentile: 92.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFallback {
    /// The fixed cutoff kept too few pixels; `cutoff` is the percentile
    /// value that was used instead.
    Percentile { cutoff: f32 },
    /// Empty map: no mask at all.
    MaskDegenerate,
}

pub type MaskOutcome = Outcome<GrayImage, MaskFallback>;

/// `q`-th percentile with linear interpolation between order statistics.
pub fn percentile(values: &[f32], q: f32) -> Option<f32> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f32::total_cmp);
    let rank = (q.clamp(0.0, 100.0) / 100.0) as f64 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn binarize(map: &ImageF32, keep: impl Fn(f32) -> bool) -> (GrayImage, usize) {
    let mut mask = GrayImage::new(map.w as u32, map.h as u32);
    let mut count = 0usize;
    for (dst, &p) in mask.pixels_mut().zip(&map.data) {
        if keep(p) {
            *dst = Luma([255]);
            count += 1;
        }
    }
    (mask, count)
}

/// Threshold `map` into a 0/255 mask of the same size.
pub fn threshold(map: &ImageF32, params: &ThresholdParams) -> MaskOutcome {
    if map.is_empty() {
        warn!("threshold received an empty probability map");
        return Outcome::Failure(MaskFallback::MaskDegenerate);
    }
    let (mask, count) = binarize(map, |p| p > params.cutoff);
    debug!(
        "threshold cutoff={:.3} set={} of {}",
        params.cutoff,
        count,
        map.data.len()
    );
    if count >= params.min_pixels {
        return Outcome::Success(mask);
    }
    let Some(cutoff) = percentile(&map.data, params.percentile) else {
        return Outcome::Failure(MaskFallback::MaskDegenerate);
    };
    let (mask, count) = binarize(map, |p| p >= cutoff);
    warn!(
        "threshold kept too few pixels -> percentile {:.0} cutoff={:.4} set={}",
        params.percentile, cutoff, count
    );
    Outcome::Fallback(mask, MaskFallback::Percentile { cutoff })
}
