//! Error types surfaced by the pipeline and its I/O helpers.
//!
//! Recoverable stage conditions (degenerate segmentation, missing
//! rectification, empty masks, too few lines) are not errors: they travel as
//! [`Outcome`](crate::outcome::Outcome) values and end up in the result
//! status. `PalmError` covers what the pipeline cannot recover from.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PalmError>;

#[derive(Error, Debug)]
pub enum PalmError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The probability-map producer reported a failure.
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference did not finish within {0:?}")]
    InferenceTimeout(Duration),

    #[error("probability map is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    ShapeMismatch {
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },
}
