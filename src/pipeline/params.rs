//! Parameter types configuring the pipeline stages.
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration
//! file only needs the knobs it changes.

use crate::geometry::MapperParams;
use crate::lines::{LineParams, ThresholdParams};
use crate::rectify::RectifyParams;
use crate::segment::SegmentParams;
use serde::Deserialize;

/// Pipeline-wide parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub segment: SegmentParams,
    pub rectify: RectifyParams,
    pub threshold: ThresholdParams,
    pub lines: LineParams,
    pub mapper: MapperParams,
    /// Side of the square image handed to the line model.
    pub model_input_size: u32,
    /// Colour of the padding border.
    pub pad_fill: [u8; 3],
    /// Upper bound of the accepted padding ratio.
    pub max_pad_ratio: f32,
    /// Padding ratio of the single retry after an unpadded fallback.
    pub retry_pad_ratio: f32,
    /// Extend the life line towards the wrist on rectified attempts.
    pub extend_life_line: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            segment: SegmentParams::default(),
            rectify: RectifyParams::default(),
            threshold: ThresholdParams::default(),
            lines: LineParams::default(),
            mapper: MapperParams::default(),
            model_input_size: 256,
            pad_fill: [12, 12, 12],
            max_pad_ratio: 0.4,
            retry_pad_ratio: 0.06,
            extend_life_line: true,
        }
    }
}

impl PipelineParams {
    /// Clamp a requested ratio into `[0, max_pad_ratio]`; non-finite → 0.
    pub fn clamp_pad_ratio(&self, ratio: f32) -> f32 {
        if ratio.is_finite() {
            ratio.clamp(0.0, self.max_pad_ratio)
        } else {
            0.0
        }
    }

    /// Border width in pixels for an image of `size`.
    pub fn pad_px(&self, size: (u32, u32), ratio: f32) -> u32 {
        // Small slack so that e.g. 100 * 0.06 floors to 6, not 5.
        let px = size.0.min(size.1) as f64 * self.clamp_pad_ratio(ratio) as f64;
        (px + 1e-4).floor() as u32
    }
}
