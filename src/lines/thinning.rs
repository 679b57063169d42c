//! Zhang–Suen thinning of binary masks to 1-px skeletons.

use image::{GrayImage, Luma};

// Neighbour offsets P2..P9, clockwise from north.
const RING: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

struct Grid {
    w: i32,
    h: i32,
    on: Vec<bool>,
}

impl Grid {
    fn from_mask(mask: &GrayImage) -> Self {
        Self {
            w: mask.width() as i32,
            h: mask.height() as i32,
            on: mask.pixels().map(|p| p.0[0] != 0).collect(),
        }
    }

    #[inline]
    fn at(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.w && y < self.h && self.on[(y * self.w + x) as usize]
    }

    fn ring(&self, x: i32, y: i32) -> [bool; 8] {
        let mut out = [false; 8];
        for (slot, (dx, dy)) in out.iter_mut().zip(RING) {
            *slot = self.at(x + dx, y + dy);
        }
        out
    }

    /// Pixels removable in sub-iteration `step` (0 or 1).
    fn removable(&self, step: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for y in 0..self.h {
            for x in 0..self.w {
                if !self.at(x, y) {
                    continue;
                }
                let p = self.ring(x, y);
                let b = p.iter().filter(|v| **v).count();
                if !(2..=6).contains(&b) {
                    continue;
                }
                let a = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
                if a != 1 {
                    continue;
                }
                // p[0]=P2 p[2]=P4 p[4]=P6 p[6]=P8
                let (c1, c2) = if step == 0 {
                    (p[0] && p[2] && p[4], p[2] && p[4] && p[6])
                } else {
                    (p[0] && p[2] && p[6], p[0] && p[4] && p[6])
                };
                if !c1 && !c2 {
                    out.push((y * self.w + x) as usize);
                }
            }
        }
        out
    }
}

/// Thin `mask` until no pixel can be removed.
pub fn thin(mask: &GrayImage) -> GrayImage {
    let mut grid = Grid::from_mask(mask);
    loop {
        let mut changed = false;
        for step in 0..2 {
            let remove = grid.removable(step);
            changed |= !remove.is_empty();
            for idx in remove {
                grid.on[idx] = false;
            }
        }
        if !changed {
            break;
        }
    }
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (dst, on) in out.pixels_mut().zip(&grid.on) {
        if *on {
            *dst = Luma([255]);
        }
    }
    out
}
