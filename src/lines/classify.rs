//! Identity assignment of the three traced curves.

use crate::geometry::RawLine;
use crate::types::PrincipalLines;
use log::debug;

/// Strategy that names three traces heart, head and life.
///
/// Implementations receive exactly three non-empty traces and return `None`
/// when they cannot make a consistent assignment.
pub trait LineAssigner: Send + Sync {
    fn assign(&self, traces: [RawLine; 3]) -> Option<PrincipalLines<RawLine>>;
}

/// Default positional assignment: life has the largest vertical span; of
/// the two others the upper one (smaller mean row) is heart.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionalAssigner;

fn row_span(line: &RawLine) -> u32 {
    let min = line.iter().map(|p| p.0).min().unwrap_or(0);
    let max = line.iter().map(|p| p.0).max().unwrap_or(0);
    max - min
}

fn mean_row(line: &RawLine) -> f64 {
    if line.is_empty() {
        return 0.0;
    }
    line.iter().map(|p| p.0 as f64).sum::<f64>() / line.len() as f64
}

impl LineAssigner for PositionalAssigner {
    fn assign(&self, traces: [RawLine; 3]) -> Option<PrincipalLines<RawLine>> {
        if traces.iter().any(|t| t.is_empty()) {
            return None;
        }
        let mut traces = traces.to_vec();
        // First maximum wins on ties.
        let life_idx = traces
            .iter()
            .enumerate()
            .fold(0usize, |best, (i, t)| {
                if row_span(t) > row_span(&traces[best]) {
                    i
                } else {
                    best
                }
            });
        let life = traces.remove(life_idx);
        let (a, b) = (traces.remove(0), traces.remove(0));
        let (heart, head) = if mean_row(&a) <= mean_row(&b) {
            (a, b)
        } else {
            (b, a)
        };
        debug!(
            "PositionalAssigner heart={} head={} life={} (life span={})",
            heart.len(),
            head.len(),
            life.len(),
            row_span(&life)
        );
        Some(PrincipalLines { heart, head, life })
    }
}

/// Reverse `line` unless its first point's `key` is at most the last one's.
fn orient_by(mut line: RawLine, key: impl Fn(&(u32, u32)) -> u32) -> RawLine {
    if let (Some(first), Some(last)) = (line.first(), line.last()) {
        if key(first) > key(last) {
            line.reverse();
        }
    }
    line
}

/// Heart and head run left → right; life runs top → bottom.
pub fn orient(lines: PrincipalLines<RawLine>) -> PrincipalLines<RawLine> {
    PrincipalLines {
        heart: orient_by(lines.heart, |p| p.1),
        head: orient_by(lines.head, |p| p.1),
        life: orient_by(lines.life, |p| p.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal(row: u32, c0: u32, c1: u32) -> RawLine {
        (c0..c1).map(|c| (row, c)).collect()
    }

    #[test]
    fn positional_assignment_uses_span_then_height() {
        let head = horizontal(120, 40, 200);
        let heart = horizontal(60, 40, 200);
        let life: RawLine = (50..230).map(|r| (r, 30 + r / 10)).collect();
        let lines = PositionalAssigner
            .assign([head.clone(), life.clone(), heart.clone()])
            .unwrap();
        assert_eq!(lines.heart, heart);
        assert_eq!(lines.head, head);
        assert_eq!(lines.life, life);
    }

    #[test]
    fn empty_trace_is_rejected() {
        let out = PositionalAssigner.assign([horizontal(1, 0, 9), Vec::new(), horizontal(5, 0, 9)]);
        assert!(out.is_none());
    }

    #[test]
    fn orientation_is_normalised() {
        let mut heart = horizontal(10, 0, 20);
        heart.reverse();
        let mut life: RawLine = (0..30).map(|r| (r, 5)).collect();
        life.reverse();
        let lines = orient(PrincipalLines {
            heart,
            head: horizontal(20, 0, 20),
            life,
        });
        assert_eq!(lines.heart[0], (10, 0));
        assert_eq!(lines.life[0], (0, 5));
        assert_eq!(lines.life.last(), Some(&(29, 5)));
    }
}
