//! Normalized points tagged with their reference frame.
//!
//! A point in the rectified canonical square and a point in the original
//! photograph are different types; the only way from one to the other is
//! through the functions in [`super::mapping`].

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Canonical square produced by rectification (or the padded input when
/// rectification fell back).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rectified;

/// Original, unpadded photograph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Original;

/// `{x, y}` in `[0, 1]` relative to frame `F`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct NormalizedPoint<F> {
    pub x: f32,
    pub y: f32,
    #[serde(skip)]
    frame: PhantomData<F>,
}

impl<F> NormalizedPoint<F> {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            frame: PhantomData,
        }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub type RectifiedPoint = NormalizedPoint<Rectified>;
pub type OriginalPoint = NormalizedPoint<Original>;

/// Traced pixel coordinates `(row, col)` in mask space, in trace order.
pub type RawLine = Vec<(u32, u32)>;
