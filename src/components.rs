//! Connected-component labelling with per-region statistics.
//!
//! Labels come from `imageproc` (8-connectivity). For each label we keep the
//! area, bounding box and first/second order moments, which is everything the
//! segmenter (border test), the rectifier (principal axes) and the line
//! filter (centroid distance) need.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Statistics of a single labelled region.
#[derive(Clone, Debug)]
pub struct Component {
    pub label: u32,
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xx: f64,
    pub sum_yy: f64,
    pub sum_xy: f64,
}

impl Component {
    fn new(label: u32) -> Self {
        Self {
            label,
            area: 0,
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_yy: 0.0,
            sum_xy: 0.0,
        }
    }

    fn push(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        let (xf, yf) = (x as f64, y as f64);
        self.sum_x += xf;
        self.sum_y += yf;
        self.sum_xx += xf * xf;
        self.sum_yy += yf * yf;
        self.sum_xy += xf * yf;
    }

    /// Centroid as `[x, y]`.
    pub fn centroid(&self) -> [f64; 2] {
        if self.area == 0 {
            return [0.0, 0.0];
        }
        let n = self.area as f64;
        [self.sum_x / n, self.sum_y / n]
    }

    /// Central second moments `(mu_xx, mu_yy, mu_xy)` normalised by area.
    pub fn covariance(&self) -> (f64, f64, f64) {
        if self.area == 0 {
            return (0.0, 0.0, 0.0);
        }
        let n = self.area as f64;
        let [cx, cy] = self.centroid();
        (
            self.sum_xx / n - cx * cx,
            self.sum_yy / n - cy * cy,
            self.sum_xy / n - cx * cy,
        )
    }

    /// True when the bounding box comes within one pixel of the image frame.
    pub fn touches_border(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as i64, height as i64);
        let bw = (self.max_x - self.min_x + 1) as i64;
        let bh = (self.max_y - self.min_y + 1) as i64;
        let (x, y) = (self.min_x as i64, self.min_y as i64);
        x <= 1 || y <= 1 || x + bw >= w - 2 || y + bh >= h - 2
    }
}

/// Label image plus the statistics of each region.
pub struct Labeling {
    pub labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    /// `components[i].label == i + 1`.
    pub components: Vec<Component>,
}

impl Labeling {
    /// Label the non-zero pixels of `mask`.
    pub fn of(mask: &GrayImage) -> Self {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
        let mut components: Vec<Component> = Vec::new();
        for (x, y, px) in labels.enumerate_pixels() {
            let label = px.0[0];
            if label == 0 {
                continue;
            }
            let idx = (label - 1) as usize;
            while components.len() <= idx {
                components.push(Component::new(components.len() as u32 + 1));
            }
            components[idx].push(x, y);
        }
        Self { labels, components }
    }

    pub fn width(&self) -> u32 {
        self.labels.width()
    }

    pub fn height(&self) -> u32 {
        self.labels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Largest region; ties resolve to the lowest label.
    pub fn largest(&self) -> Option<&Component> {
        self.components
            .iter()
            .fold(None, |best: Option<&Component>, c| match best {
                Some(b) if b.area >= c.area => Some(b),
                _ => Some(c),
            })
    }

    /// Largest region not touching the image border.
    pub fn largest_interior(&self) -> Option<&Component> {
        let (w, h) = (self.width(), self.height());
        self.components
            .iter()
            .filter(|c| !c.touches_border(w, h))
            .fold(None, |best: Option<&Component>, c| match best {
                Some(b) if b.area >= c.area => Some(b),
                _ => Some(c),
            })
    }

    /// Largest interior region, or the largest overall when every region
    /// touches the border.
    pub fn dominant_foreground(&self) -> Option<&Component> {
        self.largest_interior().or_else(|| self.largest())
    }

    /// Binary mask of the regions whose label satisfies `keep`.
    pub fn mask_where(&self, keep: impl Fn(u32) -> bool) -> GrayImage {
        let mut out = GrayImage::new(self.width(), self.height());
        for (src, dst) in self.labels.pixels().zip(out.pixels_mut()) {
            let label = src.0[0];
            if label != 0 && keep(label) {
                *dst = Luma([255]);
            }
        }
        out
    }

    pub fn mask_of(&self, label: u32) -> GrayImage {
        self.mask_where(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_rect(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn interior_component_wins_over_larger_border_blob() {
        let mut mask = GrayImage::new(40, 40);
        fill_rect(&mut mask, 0, 0, 15, 40); // touches the left border
        fill_rect(&mut mask, 20, 10, 30, 20);
        let lab = Labeling::of(&mask);
        assert_eq!(lab.components.len(), 2);
        let largest = lab.largest().unwrap();
        assert_eq!(largest.area, 15 * 40);
        let interior = lab.dominant_foreground().unwrap();
        assert_eq!(interior.area, 100);
        let [cx, cy] = interior.centroid();
        assert!((cx - 24.5).abs() < 1e-9 && (cy - 14.5).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_largest_when_everything_touches_border() {
        let mut mask = GrayImage::new(20, 20);
        fill_rect(&mut mask, 0, 0, 20, 5);
        fill_rect(&mut mask, 0, 15, 5, 20);
        let lab = Labeling::of(&mask);
        assert!(lab.largest_interior().is_none());
        assert_eq!(lab.dominant_foreground().unwrap().area, 100);
    }

    #[test]
    fn covariance_of_horizontal_bar_is_elongated_in_x() {
        let mut mask = GrayImage::new(50, 20);
        fill_rect(&mut mask, 5, 8, 45, 11);
        let lab = Labeling::of(&mask);
        let (sxx, syy, sxy) = lab.components[0].covariance();
        assert!(sxx > 10.0 * syy);
        assert!(sxy.abs() < 1e-6);
    }
}
