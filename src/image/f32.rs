//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Holds the per-pixel line probabilities returned by the external network.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing buffer; `None` when the length does not match.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    /// Build from a grayscale image, mapping 0..=255 to [0, 1].
    pub fn from_gray(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let data = gray.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            w: w as usize,
            h: h as usize,
            data,
        }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Nearest-neighbour resample to `w × h`.
    pub fn resized_nearest(&self, w: usize, h: usize) -> Self {
        if self.is_empty() {
            return Self::new(w, h);
        }
        if (w, h) == (self.w, self.h) {
            return self.clone();
        }
        let mut out = Self::new(w, h);
        for y in 0..h {
            let sy = (y * self.h / h).min(self.h - 1);
            let src = self.row(sy);
            for x in 0..w {
                let sx = (x * self.w / w).min(self.w - 1);
                out.data[y * w + x] = src[sx];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_resample_repeats_pixels() {
        let img = ImageF32::from_vec(2, 1, vec![0.25, 0.75]).unwrap();
        let up = img.resized_nearest(4, 2);
        assert_eq!(up.row(0), &[0.25, 0.25, 0.75, 0.75]);
        assert_eq!(up.row(1), &[0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(ImageF32::from_vec(3, 3, vec![0.0; 8]).is_none());
    }
}
