//! Request orchestration: padding, segmentation, rectification, line
//! extraction, coordinate transfer and the single-retry policy.
//!
//! Typical usage:
//! ```no_run
//! use palm_trace::{InferenceService, PalmPipeline, PipelineParams, StaticProbabilityMap};
//! use palm_trace::image::ImageF32;
//! use std::sync::Arc;
//!
//! # fn example(photo: image::RgbImage, map: ImageF32) -> palm_trace::Result<()> {
//! let service = Arc::new(InferenceService::new(Arc::new(StaticProbabilityMap::new(map))));
//! let pipeline = PalmPipeline::new(PipelineParams::default(), service);
//! let result = pipeline.process(&photo, 0.0)?;
//! println!("status: {}", result.status.as_str());
//! # Ok(())
//! # }
//! ```
//!
//! Attempt stages
//! - Pad the photograph by `floor(min(w, h) * pad_ratio)` pixels.
//! - Segment, then rectify; a missed rectification continues on the padded
//!   image itself.
//! - Segment the working image again, resize it to the model input size and
//!   request the probability map.
//! - Threshold, extract and classify the lines, summarize them in the
//!   rectified frame and map their points back to the original photograph.
//!
//! Retry: when the requested ratio is 0 and the attempt fell back, one more
//! attempt runs with `retry_pad_ratio`; it is adopted only if it is `ok`. A
//! retry that errors leaves the first attempt in place.

pub mod inference;
pub mod params;

pub use inference::{
    InferenceService, KeypointProducer, ModelInput, ProbabilityMapProducer, StaticProbabilityMap,
};
pub use params::PipelineParams;

use crate::diagnostics::{
    elapsed_ms, AttemptTrace, InputDescriptor, PalmReport, PipelineTrace, TimingBreakdown,
};
use crate::error::Result;
use crate::geometry::{
    decimate, extend_polyline, line_confidence, normalize_keypoints, normalize_line, summarize,
    FrameMapping, RectifiedPoint, DECIMATION_STRIDE,
};
use crate::image::{pad_image, resize_nearest};
use crate::lines::{threshold, ClassifiedLines, LineExtractor, LineAssigner};
use crate::outcome::Outcome;
use crate::rectify::Rectifier;
use crate::segment::Segmenter;
use crate::types::{LineRecord, PalmResult, PalmStatus, PrincipalLines};
use image::{Rgb, RgbImage};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Palm line pipeline bound to a parameter set and a shared inference
/// service. Cheap to clone; holds no per-request state.
#[derive(Clone, Debug)]
pub struct PalmPipeline {
    params: PipelineParams,
    segmenter: Segmenter,
    rectifier: Rectifier,
    extractor: LineExtractor,
    service: Arc<InferenceService>,
}

impl PalmPipeline {
    pub fn new(params: PipelineParams, service: Arc<InferenceService>) -> Self {
        Self {
            segmenter: Segmenter::new(params.segment.clone()),
            rectifier: Rectifier::new(params.rectify.clone(), params.segment.clone()),
            extractor: LineExtractor::new(params.lines.clone()),
            params,
            service,
        }
    }

    /// Replace the heart/head/life assignment strategy.
    pub fn with_assigner(mut self, assigner: Arc<dyn LineAssigner>) -> Self {
        self.extractor = self.extractor.with_assigner(assigner);
        self
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run the pipeline on `image` with the requested padding ratio.
    pub fn process(&self, image: &RgbImage, pad_ratio: f32) -> Result<PalmResult> {
        Ok(self.process_with_diagnostics(image, pad_ratio)?.result)
    }

    /// Run the pipeline and capture a trace of every attempt.
    pub fn process_with_diagnostics(&self, image: &RgbImage, pad_ratio: f32) -> Result<PalmReport> {
        let total_start = Instant::now();
        let (w, h) = image.dimensions();
        let requested = self.params.clamp_pad_ratio(pad_ratio);
        debug!(
            "PalmPipeline::process w={} h={} pad_ratio={:.3}",
            w, h, requested
        );
        let mut timings = TimingBreakdown::default();
        let mut attempts = Vec::new();

        let (mut result, mut first) = self.run_once(image, requested, "attempt0", &mut timings)?;
        first.adopted = true;

        let retry = requested == 0.0 && result.status.is_fallback() && w > 0 && h > 0;
        if retry {
            let retry_ratio = self.params.clamp_pad_ratio(self.params.retry_pad_ratio);
            warn!(
                "PalmPipeline::process first attempt {} -> retrying with pad_ratio={:.2}",
                result.status.as_str(),
                retry_ratio
            );
            let second = match self.run_once(image, retry_ratio, "attempt1", &mut timings) {
                Ok((second_result, mut second)) => {
                    if second_result.status == PalmStatus::Ok {
                        first.adopted = false;
                        second.adopted = true;
                        result = second_result;
                    } else {
                        debug!(
                            "PalmPipeline::process retry {} -> keeping first attempt",
                            second_result.status.as_str()
                        );
                    }
                    second
                }
                Err(err) => {
                    warn!(
                        "PalmPipeline::process retry failed: {} -> keeping first attempt",
                        err
                    );
                    let pad = self.params.pad_px((w, h), retry_ratio);
                    AttemptTrace::aborted(retry_ratio, pad, err.to_string())
                }
            };
            attempts.push(first);
            attempts.push(second);
        } else {
            attempts.push(first);
        }

        let total_ms = elapsed_ms(total_start);
        timings.total_ms = total_ms;
        result.latency_ms = total_ms;
        info!(
            "PalmPipeline::process status={} pad_ratio={:.2} attempts={} latency_ms={:.1}",
            result.status.as_str(),
            result.pad_ratio,
            attempts.len(),
            total_ms
        );
        Ok(PalmReport {
            result,
            trace: PipelineTrace {
                input: InputDescriptor {
                    width: w,
                    height: h,
                    requested_pad_ratio: requested,
                },
                timings,
                attempts,
            },
        })
    }

    fn run_once(
        &self,
        image: &RgbImage,
        pad_ratio: f32,
        label: &str,
        timings: &mut TimingBreakdown,
    ) -> Result<(PalmResult, AttemptTrace)> {
        let original_size = image.dimensions();
        let pad = self.params.pad_px(original_size, pad_ratio);
        let mut trace = AttemptTrace::new(pad_ratio, pad);
        if original_size.0 == 0 || original_size.1 == 0 {
            warn!("PalmPipeline::run_once empty input -> warp_failed");
            return Ok((PalmResult::empty(PalmStatus::WarpFailed, pad_ratio), trace));
        }

        let padded = timings.time(format!("{label}.pad"), || {
            pad_image(image, pad, Rgb(self.params.pad_fill))
        });
        let keypoints = timings.time(format!("{label}.keypoints"), || {
            self.service
                .detect_keypoints(&padded)
                .map(|kp| normalize_keypoints(&kp, original_size, pad))
        });

        let segmentation = timings.time(format!("{label}.segment"), || {
            self.segmenter.segment(&padded)
        });
        trace.segmentation = segmentation.kind();
        trace.segmentation_fallback = segmentation.reason().copied();

        let rectification = timings.time(format!("{label}.rectify"), || {
            self.rectifier.rectify_with_mask(&padded, &segmentation)
        });
        drop(segmentation);
        trace.rectify_miss = rectification.reason().copied();
        let (working, mapping) = match rectification {
            Outcome::Success(r) => {
                trace.homography = Some(r.homography);
                (
                    r.image,
                    FrameMapping::Rectified {
                        homography: r.homography,
                        warped_size: r.warped_size,
                    },
                )
            }
            Outcome::Fallback(..) | Outcome::Failure(_) => {
                let padded_size = padded.dimensions();
                (padded, FrameMapping::Padded { padded_size })
            }
        };
        let rectified = mapping.is_rectified();

        let size = self.params.model_input_size.max(1);
        let context = timings.time(format!("{label}.prepare"), || {
            let cleaned = self
                .segmenter
                .segment(&working)
                .into_value()
                .map(|s| s.image)
                .unwrap_or(working);
            resize_nearest(&cleaned, size, size)
        });

        let infer_start = Instant::now();
        let probability = self.service.predict_lines(ModelInput::from_rgb(&context))?;
        timings.push(format!("{label}.inference"), elapsed_ms(infer_start));

        let mask = timings.time(format!("{label}.threshold"), || {
            threshold(&probability, &self.params.threshold)
        });
        trace.mask = Some(mask.kind());
        trace.mask_fallback = mask.reason().copied();

        let extracted = match mask.into_value() {
            Some(mask) => {
                let out = timings.time(format!("{label}.lines"), || {
                    self.extractor.extract(&mask, &context)
                });
                trace.lines = Some(out.kind());
                trace.line_failure = out.reason().copied();
                out.into_value()
            }
            None => None,
        };

        let status = PalmStatus::from_attempt(rectified, extracted.is_some());
        trace.status = status;
        debug!(
            "PalmPipeline::run_once {} pad={} rectified={} status={}",
            label,
            pad,
            rectified,
            status.as_str()
        );

        let mut result = PalmResult::empty(status, pad_ratio);
        result.keypoints = keypoints;
        if let Some(classified) = extracted {
            let (lines, confidences) = timings.time(format!("{label}.geometry"), || {
                self.assemble_lines(&classified, &mapping, original_size, pad)
            });
            result.lines = Some(lines);
            result.confidences = Some(confidences);
        }
        Ok((result, trace))
    }

    fn assemble_lines(
        &self,
        classified: &ClassifiedLines,
        mapping: &FrameMapping,
        original_size: (u32, u32),
        pad: u32,
    ) -> (PrincipalLines<LineRecord>, PrincipalLines<f32>) {
        let (mw, mh) = classified.mask_size;
        let confidences = classified.lines.as_ref().map(|raw| line_confidence(raw.len()));
        let mut records = classified.lines.as_ref().map(|raw| {
            let points: Vec<RectifiedPoint> = normalize_line(raw, mw, mh);
            let summary = summarize(&points).into();
            let kept = decimate(&points, DECIMATION_STRIDE);
            LineRecord {
                points: mapping.map(&kept, original_size, pad),
                summary,
            }
        });
        if self.params.extend_life_line && mapping.is_rectified() {
            records.life.points =
                extend_polyline(&records.life.points, original_size, &self.params.mapper);
        }
        (records, confidences)
    }
}
