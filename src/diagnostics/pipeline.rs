use crate::diagnostics::TimingBreakdown;
use crate::lines::{LineFailure, MaskFallback};
use crate::outcome::OutcomeKind;
use crate::rectify::RectifyMiss;
use crate::segment::SegmentFallback;
use crate::types::{PalmResult, PalmStatus};
use nalgebra::Matrix3;
use serde::Serialize;

/// Result produced by [`PalmPipeline::process_with_diagnostics`](crate::PalmPipeline).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalmReport {
    pub result: PalmResult,
    pub trace: PipelineTrace,
}

/// End-to-end trace of one request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub attempts: Vec<AttemptTrace>,
}

impl PipelineTrace {
    pub fn adopted(&self) -> Option<&AttemptTrace> {
        self.attempts.iter().find(|a| a.adopted)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: u32,
    pub height: u32,
    pub requested_pad_ratio: f32,
}

/// What each stage of one attempt did.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptTrace {
    pub pad_ratio: f32,
    pub pad_px: u32,
    pub segmentation: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation_fallback: Option<SegmentFallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rectify_miss: Option<RectifyMiss>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homography: Option<Matrix3<f32>>,
    /// `None` when the attempt stopped before thresholding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<OutcomeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_fallback: Option<MaskFallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<OutcomeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_failure: Option<LineFailure>,
    pub status: PalmStatus,
    pub adopted: bool,
    /// Set when the attempt aborted with an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttemptTrace {
    pub fn new(pad_ratio: f32, pad_px: u32) -> Self {
        Self {
            pad_ratio,
            pad_px,
            segmentation: OutcomeKind::Failure,
            segmentation_fallback: None,
            rectify_miss: None,
            homography: None,
            mask: None,
            mask_fallback: None,
            lines: None,
            line_failure: None,
            status: PalmStatus::WarpFailed,
            adopted: false,
            error: None,
        }
    }

    /// Trace of an attempt that stopped with `error`.
    pub fn aborted(pad_ratio: f32, pad_px: u32, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(pad_ratio, pad_px)
        }
    }

    pub fn rectified(&self) -> bool {
        self.homography.is_some()
    }
}
