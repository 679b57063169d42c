//! 8-bit HSV conversion and the skin colour band.
//!
//! Hue follows the common 8-bit convention: degrees halved into `[0, 180)`.
//! Saturation and value are scaled to `[0, 255]`.

use image::{GrayImage, Luma, RgbImage};
use serde::Deserialize;

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;
    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };
    let mut h = if diff <= 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let h8 = (h / 2.0).round().min(179.0) as u8;
    [h8, s.round() as u8, v as u8]
}

/// Inclusive HSV box classifying skin pixels.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkinBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for SkinBand {
    fn default() -> Self {
        Self {
            lower: [0, 20, 80],
            upper: [50, 255, 255],
        }
    }
}

impl SkinBand {
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    /// Binary mask (0/255) of the pixels inside the band.
    pub fn mask(&self, img: &RgbImage) -> GrayImage {
        let (w, h) = img.dimensions();
        let mut out = GrayImage::new(w, h);
        for (src, dst) in img.pixels().zip(out.pixels_mut()) {
            let [r, g, b] = src.0;
            if self.contains(rgb_to_hsv(r, g, b)) {
                *dst = Luma([255]);
            }
        }
        out
    }
}
