//! Line-mask cleanup: palm-region gating and component pruning.

use crate::components::Labeling;
use image::{GrayImage, Luma};
use log::debug;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PruneParams {
    /// Absolute floor for a kept component's area.
    pub min_area_px: usize,
    /// Floor relative to the dominant component's area.
    pub min_area_ratio: f32,
    /// Maximum centroid distance to the dominant component, as a fraction
    /// of `max(w, h)`.
    pub max_centroid_dist: f32,
}

impl Default for PruneParams {
    fn default() -> Self {
        Self {
            min_area_px: 10,
            min_area_ratio: 0.01,
            max_centroid_dist: 0.5,
        }
    }
}

/// Clear every line pixel outside `region`. Sizes must match; a region of
/// a different size leaves the mask untouched.
pub fn gate_by_region(mask: &GrayImage, region: &GrayImage) -> GrayImage {
    if mask.dimensions() != region.dimensions() {
        debug!(
            "gate_by_region size mismatch {:?} vs {:?} -> skipping",
            mask.dimensions(),
            region.dimensions()
        );
        return mask.clone();
    }
    let mut out = mask.clone();
    for (px, r) in out.pixels_mut().zip(region.pixels()) {
        if r.0[0] == 0 {
            *px = Luma([0]);
        }
    }
    out
}

/// Drop small components and components far from the dominant one.
pub fn prune_components(mask: &GrayImage, params: &PruneParams) -> GrayImage {
    let labeling = Labeling::of(mask);
    let Some(main) = labeling.largest() else {
        return mask.clone();
    };
    let min_area = (params.min_area_ratio * main.area as f32)
        .max(params.min_area_px as f32);
    let (w, h) = mask.dimensions();
    let max_dist = params.max_centroid_dist as f64 * w.max(h) as f64;
    let [mx, my] = main.centroid();

    let keep: Vec<bool> = labeling
        .components
        .iter()
        .map(|c| {
            if c.label == main.label {
                return true;
            }
            let [cx, cy] = c.centroid();
            c.area as f32 >= min_area && (cx - mx).hypot(cy - my) <= max_dist
        })
        .collect();
    let kept = keep.iter().filter(|k| **k).count();
    debug!(
        "prune_components kept {} of {} (min_area={:.1} max_dist={:.1})",
        kept,
        keep.len(),
        min_area,
        max_dist
    );
    labeling.mask_where(|label| keep[(label - 1) as usize])
}
