//! Skeleton components → ordered pixel paths.
//!
//! Each component is traced along its longest geodesic: a breadth-first
//! search from any pixel finds one extremity, a second search from there
//! finds the other, and the parent chain of the second search is the path.

use crate::components::{Component, Labeling};
use crate::geometry::RawLine;
use image::{GrayImage, ImageBuffer, Luma};
use rayon::prelude::*;
use std::collections::VecDeque;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Component pixels in a local bounding-box grid.
struct Patch {
    x0: u32,
    y0: u32,
    w: usize,
    h: usize,
    /// Row-major membership of each bounding-box pixel.
    on: Vec<bool>,
}

impl Patch {
    fn new(labels: &ImageBuffer<Luma<u32>, Vec<u32>>, c: &Component) -> Self {
        let w = (c.max_x - c.min_x + 1) as usize;
        let h = (c.max_y - c.min_y + 1) as usize;
        let mut on = vec![false; w * h];
        for y in c.min_y..=c.max_y {
            for x in c.min_x..=c.max_x {
                if labels.get_pixel(x, y).0[0] == c.label {
                    on[(y - c.min_y) as usize * w + (x - c.min_x) as usize] = true;
                }
            }
        }
        Self {
            x0: c.min_x,
            y0: c.min_y,
            w,
            h,
            on,
        }
    }

    fn first(&self) -> Option<usize> {
        self.on.iter().position(|v| *v)
    }

    /// BFS from `start`; returns the farthest slot and the parent table.
    fn bfs(&self, start: usize) -> (usize, Vec<usize>) {
        let mut parent = vec![usize::MAX; self.on.len()];
        let mut queue = VecDeque::new();
        parent[start] = start;
        queue.push_back(start);
        let mut last = start;
        while let Some(cur) = queue.pop_front() {
            last = cur;
            let (cx, cy) = ((cur % self.w) as i32, (cur / self.w) as i32);
            for (dx, dy) in NEIGHBOURS {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= self.w as i32 || ny >= self.h as i32 {
                    continue;
                }
                let n = ny as usize * self.w + nx as usize;
                if self.on[n] && parent[n] == usize::MAX {
                    parent[n] = cur;
                    queue.push_back(n);
                }
            }
        }
        (last, parent)
    }

    fn longest_path(&self) -> RawLine {
        let Some(seed) = self.first() else {
            return Vec::new();
        };
        let (a, _) = self.bfs(seed);
        let (b, parent) = self.bfs(a);
        let mut path = Vec::new();
        let mut cur = b;
        loop {
            let (lx, ly) = ((cur % self.w) as u32, (cur / self.w) as u32);
            path.push((self.y0 + ly, self.x0 + lx));
            if cur == a {
                break;
            }
            cur = parent[cur];
        }
        path.reverse();
        path
    }
}

/// Trace every component of `skeleton`, keeping paths with at least
/// `min_points` pixels, longest first.
pub fn trace_components(skeleton: &GrayImage, min_points: usize) -> Vec<RawLine> {
    let labeling = Labeling::of(skeleton);
    let mut traces: Vec<RawLine> = labeling
        .components
        .par_iter()
        .map(|c| Patch::new(&labeling.labels, c).longest_path())
        .filter(|path| path.len() >= min_points)
        .collect();
    // Stable on ties: components are labelled in raster order.
    traces.sort_by(|a, b| b.len().cmp(&a.len()));
    traces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l_shape_is_traced_end_to_end() {
        let mut mask = GrayImage::new(30, 30);
        for x in 5..20 {
            mask.put_pixel(x, 5, Luma([255]));
        }
        for y in 6..25 {
            mask.put_pixel(19, y, Luma([255]));
        }
        let traces = trace_components(&mask, 8);
        assert_eq!(traces.len(), 1);
        let t = &traces[0];
        let ends = [t[0], t[t.len() - 1]];
        assert!(ends.contains(&(5, 5)), "{:?}", ends);
        assert!(ends.contains(&(24, 19)), "{:?}", ends);
        // Consecutive points are 8-neighbours.
        for w in t.windows(2) {
            let dr = (w[0].0 as i32 - w[1].0 as i32).abs();
            let dc = (w[0].1 as i32 - w[1].1 as i32).abs();
            assert!(dr <= 1 && dc <= 1 && dr + dc > 0);
        }
    }

    #[test]
    fn short_traces_are_dropped_and_order_is_by_length() {
        let mut mask = GrayImage::new(40, 20);
        for x in 2..6 {
            mask.put_pixel(x, 2, Luma([255])); // 4 px
        }
        for x in 2..14 {
            mask.put_pixel(x, 8, Luma([255])); // 12 px
        }
        for x in 2..32 {
            mask.put_pixel(x, 15, Luma([255])); // 30 px
        }
        let traces = trace_components(&mask, 8);
        let lens: Vec<usize> = traces.iter().map(|t| t.len()).collect();
        assert_eq!(lens, vec![30, 12]);
    }
}
