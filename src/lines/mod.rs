//! Principal line extraction from a binary line mask.
//!
//! Stages
//! - [`threshold`]: probability map → binary mask (with percentile fallback).
//! - [`filter`]: drop line pixels outside the palm region, then prune small
//!   or distant components.
//! - [`thinning`]: Zhang–Suen skeletonisation.
//! - [`trace`]: longest geodesic per skeleton component.
//! - [`classify`]: heart/head/life assignment and orientation.

pub mod classify;
pub mod filter;
pub mod thinning;
pub mod threshold;
pub mod trace;

pub use classify::{orient, LineAssigner, PositionalAssigner};
pub use filter::{gate_by_region, prune_components, PruneParams};
pub use thinning::thin;
pub use threshold::{percentile, threshold, MaskFallback, MaskOutcome, ThresholdParams};
pub use trace::trace_components;

use crate::geometry::RawLine;
use crate::image::{count_set, resize_nearest, SkinBand};
use crate::outcome::Outcome;
use crate::segment::line_region;
use crate::types::PrincipalLines;
use image::{GrayImage, RgbImage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LineParams {
    pub band: SkinBand,
    /// Closing used when re-deriving the palm region.
    pub region_close_size: u8,
    /// Erosion applied to the palm region.
    pub region_erode_size: u8,
    /// Palm regions under this ratio are replaced by the whole frame.
    pub region_min_area_ratio: f32,
    pub prune: PruneParams,
    pub min_trace_points: usize,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            band: SkinBand::default(),
            region_close_size: 5,
            region_erode_size: 3,
            region_min_area_ratio: 0.02,
            prune: PruneParams::default(),
            min_trace_points: 8,
        }
    }
}

/// Three oriented traces in mask pixel space.
#[derive(Clone, Debug)]
pub struct ClassifiedLines {
    pub lines: PrincipalLines<RawLine>,
    /// Size of the mask the traces live in.
    pub mask_size: (u32, u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFailure {
    /// Fewer than three usable traces, or no consistent assignment.
    Degenerate { traces: usize },
}

pub type LineOutcome = Outcome<ClassifiedLines, LineFailure>;

/// Line extractor with a pluggable identity assignment.
#[derive(Clone)]
pub struct LineExtractor {
    params: LineParams,
    assigner: Arc<dyn LineAssigner>,
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new(LineParams::default())
    }
}

impl std::fmt::Debug for LineExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineExtractor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl LineExtractor {
    pub fn new(params: LineParams) -> Self {
        Self {
            params,
            assigner: Arc::new(PositionalAssigner),
        }
    }

    pub fn with_assigner(mut self, assigner: Arc<dyn LineAssigner>) -> Self {
        self.assigner = assigner;
        self
    }

    pub fn params(&self) -> &LineParams {
        &self.params
    }

    /// Region gating, pruning, thinning, tracing and classification of
    /// `line_mask`; `context` is the colour image the mask was predicted on.
    pub fn extract(&self, line_mask: &GrayImage, context: &RgbImage) -> LineOutcome {
        let (w, h) = line_mask.dimensions();
        if w == 0 || h == 0 {
            return Outcome::Failure(LineFailure::Degenerate { traces: 0 });
        }
        let context = resize_nearest(context, w, h);
        let p = &self.params;
        let region = line_region(
            &context,
            &p.band,
            p.region_close_size,
            p.region_erode_size,
            p.region_min_area_ratio,
        );
        let gated = gate_by_region(line_mask, &region);
        let pruned = prune_components(&gated, &p.prune);
        let skeleton = thin(&pruned);
        debug!(
            "LineExtractor::extract mask={} gated={} pruned={} skeleton={}",
            count_set(line_mask),
            count_set(&gated),
            count_set(&pruned),
            count_set(&skeleton)
        );

        let mut traces = trace_components(&skeleton, p.min_trace_points);
        let found = traces.len();
        if found < 3 {
            warn!("LineExtractor::extract found {} traces, need 3", found);
            return Outcome::Failure(LineFailure::Degenerate { traces: found });
        }
        traces.truncate(3);
        let mut it = traces.into_iter();
        let (Some(a), Some(b), Some(c)) = (it.next(), it.next(), it.next()) else {
            return Outcome::Failure(LineFailure::Degenerate { traces: found });
        };
        match self.assigner.assign([a, b, c]) {
            Some(lines) => Outcome::Success(ClassifiedLines {
                lines: orient(lines),
                mask_size: (w, h),
            }),
            None => {
                warn!("LineExtractor::extract assignment rejected the traces");
                Outcome::Failure(LineFailure::Degenerate { traces: found })
            }
        }
    }
}

/// [`LineExtractor::extract`] with default parameters and assignment.
pub fn extract_lines(line_mask: &GrayImage, context: &RgbImage) -> LineOutcome {
    LineExtractor::default().extract(line_mask, context)
}
