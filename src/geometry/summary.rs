//! Per-line geometric summaries and the confidence heuristic.

use super::points::{NormalizedPoint, RawLine};
use serde::{Deserialize, Serialize};

/// Decimation stride used for summaries and reported point sequences.
pub const DECIMATION_STRIDE: usize = 4;

/// Trace length at which the confidence saturates.
pub const CONFIDENCE_SATURATION_POINTS: f32 = 120.0;
pub const CONFIDENCE_FLOOR: f32 = 0.55;
pub const CONFIDENCE_CEIL: f32 = 0.95;

/// Geometry of one line, in the frame of its points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LineSummary<F> {
    /// Number of points after decimation.
    pub point_count: usize,
    pub length: f32,
    /// Mean turning angle in radians, `[0, π]`.
    pub curvature: f32,
    pub start: NormalizedPoint<F>,
    pub end: NormalizedPoint<F>,
    pub span_x: f32,
    pub span_y: f32,
}

/// `(row, col)` pixels → points normalized by the mask size.
pub fn normalize_line<F>(line: &RawLine, width: u32, height: u32) -> Vec<NormalizedPoint<F>> {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    line.iter()
        .map(|&(row, col)| NormalizedPoint::new(col as f32 / w, row as f32 / h))
        .collect()
}

/// Keep every `stride`-th point plus the last one.
pub fn decimate<T: Copy>(points: &[T], stride: usize) -> Vec<T> {
    let stride = stride.max(1);
    let last = points.len().saturating_sub(1);
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0 || *i == last)
        .map(|(_, p)| *p)
        .collect()
}

/// Sum of distances between consecutive points.
pub fn polyline_length<F>(points: &[NormalizedPoint<F>]) -> f32 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Mean turning angle over interior points whose adjacent edges are both
/// non-degenerate. Zero when fewer than two such samples exist.
pub fn mean_turning_angle<F>(points: &[NormalizedPoint<F>]) -> f32 {
    let mut total = 0.0f32;
    let mut samples = 0usize;
    for w in points.windows(3) {
        let (v1x, v1y) = (w[1].x - w[0].x, w[1].y - w[0].y);
        let (v2x, v2y) = (w[2].x - w[1].x, w[2].y - w[1].y);
        let n1 = v1x.hypot(v1y);
        let n2 = v2x.hypot(v2y);
        if n1 == 0.0 || n2 == 0.0 {
            continue;
        }
        let cos = ((v1x * v2x + v1y * v2y) / (n1 * n2)).clamp(-1.0, 1.0);
        total += cos.acos();
        samples += 1;
    }
    if samples < 2 {
        0.0
    } else {
        total / samples as f32
    }
}

/// Summarize a point sequence. `None` is the empty summary.
pub fn summarize<F: Copy>(points: &[NormalizedPoint<F>]) -> Option<LineSummary<F>> {
    let kept = decimate(points, DECIMATION_STRIDE);
    let (first, last) = (*kept.first()?, *kept.last()?);
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for p in &kept {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(LineSummary {
        point_count: kept.len(),
        length: round4(polyline_length(&kept)),
        curvature: round4(mean_turning_angle(&kept)),
        start: NormalizedPoint::new(round4(first.x), round4(first.y)),
        end: NormalizedPoint::new(round4(last.x), round4(last.y)),
        span_x: round4(max_x - min_x),
        span_y: round4(max_y - min_y),
    })
}

/// Saturating confidence derived from a trace's point count.
pub fn line_confidence(point_count: usize) -> f32 {
    let raw = point_count as f32 / CONFIDENCE_SATURATION_POINTS;
    (CONFIDENCE_FLOOR + 0.4 * raw.clamp(0.0, 1.0)).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL)
}

#[inline]
fn round4(v: f32) -> f32 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::points::{Rectified, RectifiedPoint};
    use approx::assert_relative_eq;

    fn pts(coords: &[(f32, f32)]) -> Vec<RectifiedPoint> {
        coords.iter().map(|&(x, y)| RectifiedPoint::new(x, y)).collect()
    }

    #[test]
    fn decimation_keeps_first_and_last() {
        for n in 1..20usize {
            let seq: Vec<usize> = (0..n).collect();
            let kept = decimate(&seq, 4);
            assert_eq!(kept.first(), Some(&0));
            assert_eq!(kept.last(), Some(&(n - 1)));
        }
        assert_eq!(decimate(&[0, 1, 2, 3, 4, 5], 4), vec![0, 4, 5]);
    }

    #[test]
    fn empty_input_has_empty_summary() {
        assert!(summarize::<Rectified>(&[]).is_none());
    }

    #[test]
    fn collinear_points_have_zero_curvature() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(mean_turning_angle(&line), 0.0);
    }

    #[test]
    fn right_angles_average_to_half_pi() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)]);
        assert_relative_eq!(
            mean_turning_angle(&line),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-6
        );
        // A single valid sample is not enough.
        let corner = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(mean_turning_angle(&corner), 0.0);
    }

    #[test]
    fn zero_length_edges_are_skipped() {
        let line = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)]);
        assert_relative_eq!(
            mean_turning_angle(&line),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn summary_of_decimated_diagonal() {
        let line: Vec<RectifiedPoint> = (0..=8)
            .map(|i| RectifiedPoint::new(i as f32 * 0.1, i as f32 * 0.05))
            .collect();
        let s = summarize(&line).unwrap();
        assert_eq!(s.point_count, 3); // indices 0, 4, 8
        assert_relative_eq!(s.span_x, 0.8, epsilon = 1e-4);
        assert_relative_eq!(s.span_y, 0.4, epsilon = 1e-4);
        assert_relative_eq!(s.length, (0.8f32).hypot(0.4), epsilon = 1e-4);
        assert_eq!(s.curvature, 0.0);
        assert_eq!(s.start, RectifiedPoint::new(0.0, 0.0));
        assert_relative_eq!(s.end.x, 0.8, epsilon = 1e-4);
    }

    #[test]
    fn confidence_is_floored_and_saturates() {
        assert_relative_eq!(line_confidence(0), 0.55);
        assert_relative_eq!(line_confidence(60), 0.75, epsilon = 1e-6);
        assert_relative_eq!(line_confidence(121), 0.95);
        for n in [0usize, 1, 50, 119, 120, 10_000] {
            let c = line_confidence(n);
            assert!((0.55..=0.95).contains(&c));
        }
    }

    #[test]
    fn normalize_swaps_row_col() {
        let raw: RawLine = vec![(64, 32)];
        let p: Vec<RectifiedPoint> = normalize_line(&raw, 256, 128);
        assert_eq!(p[0], RectifiedPoint::new(0.125, 0.5));
    }
}
