//! Image containers and pixel helpers.
//!
//! Colour photographs and masks use the `image` crate buffers directly
//! (`RgbImage`, `GrayImage`). Probability maps produced by the external
//! network live in [`ImageF32`].

pub mod color;
pub mod f32;
pub mod io;

pub use self::color::{rgb_to_hsv, SkinBand};
pub use self::f32::ImageF32;

use image::{imageops, GrayImage, Rgb, RgbImage};

/// Nearest-neighbour resize; returns a clone when the size already matches.
pub fn resize_nearest(img: &RgbImage, w: u32, h: u32) -> RgbImage {
    if img.dimensions() == (w, h) {
        return img.clone();
    }
    imageops::resize(img, w, h, imageops::FilterType::Nearest)
}

/// Add a uniform border of `pad` pixels filled with `fill`.
pub fn pad_image(img: &RgbImage, pad: u32, fill: Rgb<u8>) -> RgbImage {
    if pad == 0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let mut out = RgbImage::from_pixel(w + 2 * pad, h + 2 * pad, fill);
    imageops::replace(&mut out, img, pad as i64, pad as i64);
    out
}

/// Number of non-zero pixels in a mask.
pub fn count_set(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

/// Fraction of non-zero pixels; 0 for an empty mask.
pub fn area_ratio(mask: &GrayImage) -> f32 {
    let total = mask.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    count_set(mask) as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_places_source_in_the_middle() {
        let img = RgbImage::from_pixel(4, 2, Rgb([200, 100, 50]));
        let padded = pad_image(&img, 3, Rgb([12, 12, 12]));
        assert_eq!(padded.dimensions(), (10, 8));
        assert_eq!(padded.get_pixel(0, 0), &Rgb([12, 12, 12]));
        assert_eq!(padded.get_pixel(3, 3), &Rgb([200, 100, 50]));
        assert_eq!(padded.get_pixel(6, 4), &Rgb([200, 100, 50]));
        assert_eq!(padded.get_pixel(7, 4), &Rgb([12, 12, 12]));
    }

    #[test]
    fn area_ratio_of_empty_mask_is_zero() {
        assert_eq!(area_ratio(&GrayImage::new(0, 0)), 0.0);
        let mut m = GrayImage::new(10, 10);
        m.put_pixel(1, 1, image::Luma([255]));
        assert!((area_ratio(&m) - 0.01).abs() < 1e-6);
    }
}
