//! Diagnostics data model returned by the pipeline.
//!
//! `PalmReport` bundles the caller-facing [`PalmResult`](crate::types::PalmResult)
//! with a `PipelineTrace` describing every attempt and stage that ran.

pub mod pipeline;
pub mod timing;

pub use pipeline::{AttemptTrace, InputDescriptor, PalmReport, PipelineTrace};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
