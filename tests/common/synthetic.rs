//! Synthetic palms, line maps and fake model producers.

use image::{Rgb, RgbImage};
use palm_trace::image::ImageF32;
use palm_trace::types::HandKeypoints;
use palm_trace::{KeypointProducer, ModelInput, PalmError, ProbabilityMapProducer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub const SKIN: Rgb<u8> = Rgb([224, 172, 140]);
pub const BACKGROUND: Rgb<u8> = Rgb([30, 60, 160]);

/// Rectangular skin "palm" `[x0, x1) × [y0, y1)` on a blue background.
pub fn palm_photo(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            SKIN
        } else {
            BACKGROUND
        }
    })
}

/// Palm touching the left frame edge plus a small skin patch clear of the
/// frame. Unpadded, the patch is the only border-free region.
pub fn edge_palm_photo() -> RgbImage {
    RgbImage::from_fn(200, 200, |x, y| {
        let palm = x < 120 && (20..180).contains(&y);
        let patch = (150..184).contains(&x) && (83..117).contains(&y);
        if palm || patch {
            SKIN
        } else {
            BACKGROUND
        }
    })
}

/// Photo without any skin-coloured pixel.
pub fn non_skin_photo(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, BACKGROUND)
}

#[derive(Clone, Copy, Debug)]
pub enum Stroke {
    Horizontal { row: usize, c0: usize, c1: usize },
    Vertical { col: usize, r0: usize, r1: usize },
}

/// `size × size` probability map with 3 px wide strokes at 0.9.
pub fn line_map(size: usize, strokes: &[Stroke]) -> ImageF32 {
    let mut map = ImageF32::new(size, size);
    for stroke in strokes {
        match *stroke {
            Stroke::Horizontal { row, c0, c1 } => {
                for y in row - 1..=row + 1 {
                    for x in c0..c1 {
                        map.set(x, y, 0.9);
                    }
                }
            }
            Stroke::Vertical { col, r0, r1 } => {
                for y in r0..r1 {
                    for x in col - 1..=col + 1 {
                        map.set(x, y, 0.9);
                    }
                }
            }
        }
    }
    map
}

pub const HEART: Stroke = Stroke::Horizontal {
    row: 80,
    c0: 70,
    c1: 210,
};
pub const HEAD: Stroke = Stroke::Horizontal {
    row: 130,
    c0: 70,
    c1: 210,
};
pub const LIFE: Stroke = Stroke::Vertical {
    col: 40,
    r0: 60,
    r1: 230,
};

pub fn three_line_map() -> ImageF32 {
    line_map(256, &[HEART, HEAD, LIFE])
}

pub fn two_line_map() -> ImageF32 {
    line_map(256, &[HEART, HEAD])
}

/// Returns a fixed map (resized to the request) and counts calls.
pub struct CountingProducer {
    map: ImageF32,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CountingProducer {
    pub fn new(map: ImageF32) -> Self {
        Self {
            map,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(map: ImageF32, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(map)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProbabilityMapProducer for CountingProducer {
    fn predict(&self, input: &ModelInput) -> Result<ImageF32, PalmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        Ok(self.map.resized_nearest(input.size, input.size))
    }
}

/// Producer that always fails.
pub struct FailingProducer;

impl ProbabilityMapProducer for FailingProducer {
    fn predict(&self, _input: &ModelInput) -> Result<ImageF32, PalmError> {
        Err(PalmError::Inference("model unavailable".into()))
    }
}

/// Serves `map` for the first `ok_calls` requests, then fails.
pub struct FailAfter {
    map: ImageF32,
    ok_calls: usize,
    calls: AtomicUsize,
}

impl FailAfter {
    pub fn new(map: ImageF32, ok_calls: usize) -> Self {
        Self {
            map,
            ok_calls,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProbabilityMapProducer for FailAfter {
    fn predict(&self, input: &ModelInput) -> Result<ImageF32, PalmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.ok_calls {
            return Err(PalmError::Inference("model went away".into()));
        }
        Ok(self.map.resized_nearest(input.size, input.size))
    }
}

/// Keypoint producer returning fixed pixel coordinates.
pub struct FixedKeypoints(pub HandKeypoints);

impl KeypointProducer for FixedKeypoints {
    fn detect(&self, _image: &RgbImage) -> Option<HandKeypoints> {
        Some(self.0.clone())
    }
}
