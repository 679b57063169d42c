#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod image;
pub mod outcome;
pub mod pipeline;
pub mod render;
pub mod types;

// Stage modules – public for tools and tests that drive a single stage.
pub mod components;
pub mod homography;
pub mod lines;
pub mod rectify;
pub mod segment;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{PalmError, Result};
pub use crate::pipeline::{
    InferenceService, KeypointProducer, ModelInput, PalmPipeline, PipelineParams,
    ProbabilityMapProducer, StaticProbabilityMap,
};
pub use crate::types::{PalmDigest, PalmResult, PalmStatus, PrincipalLines};

pub use crate::diagnostics::{PalmReport, PipelineTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use palm_trace::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> palm_trace::Result<()> {
/// let photo = image::RgbImage::new(640, 480);
/// let map = ImageF32::new(256, 256);
/// let service = Arc::new(InferenceService::new(Arc::new(StaticProbabilityMap::new(map))));
/// let pipeline = PalmPipeline::new(PipelineParams::default(), service);
///
/// let result = pipeline.process(&photo, 0.0)?;
/// println!("status={} latency_ms={:.3}", result.status.as_str(), result.latency_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::{
        InferenceService, PalmPipeline, PalmResult, PalmStatus, PipelineParams,
        StaticProbabilityMap,
    };
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::lines::{
        extract_lines, threshold, ClassifiedLines, LineAssigner, LineExtractor, LineFailure,
        LineParams, MaskFallback, PositionalAssigner, ThresholdParams,
    };
    pub use crate::rectify::{MissCause, Rectification, Rectifier, RectifyMiss, RectifyParams};
    pub use crate::segment::{SegmentFallback, SegmentParams, Segmentation, Segmenter};

    pub use crate::diagnostics::{AttemptTrace, InputDescriptor, StageTiming, TimingBreakdown};
}
