//! I/O helpers for photographs, probability maps and JSON.
//!
//! - `load_rgb_image`: read a PNG/JPEG into an owned RGB buffer.
//! - `load_probability_map`: read a grayscale PNG as probabilities in [0, 1].
//! - `save_rgb_image`: write an RGB buffer to disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::ImageF32;
use crate::error::{PalmError, Result};
use image::RgbImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| PalmError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgb8())
}

/// Load a grayscale image and rescale it to probabilities.
pub fn load_probability_map(path: &Path) -> Result<ImageF32> {
    let img = image::open(path).map_err(|source| PalmError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageF32::from_gray(&img.into_luma8()))
}

pub fn save_rgb_image(img: &RgbImage, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    img.save(path).map_err(|source| PalmError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| PalmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PalmError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
