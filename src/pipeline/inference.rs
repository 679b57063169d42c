//! External model seams: probability-map and keypoint producers.
//!
//! The pipeline never loads a network itself. It hands a [`ModelInput`] to a
//! [`ProbabilityMapProducer`] held by the shared [`InferenceService`], which
//! is built once and used read-only from any number of requests.

use crate::error::{PalmError, Result};
use crate::image::ImageF32;
use crate::types::HandKeypoints;
use image::RgbImage;
use log::{debug, warn};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

/// Network input: CHW `f32` RGB in `[0, 1]`, `size × size`.
#[derive(Clone, Debug)]
pub struct ModelInput {
    pub size: usize,
    pub data: Vec<f32>,
}

impl ModelInput {
    /// Pack an RGB image that is already `size × size`.
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let plane = w as usize * h as usize;
        let mut data = vec![0.0f32; plane * 3];
        for (i, px) in image.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = px.0[c] as f32 / 255.0;
            }
        }
        Self {
            size: w.max(h) as usize,
            data,
        }
    }

    /// Channel `c` as a row-major plane.
    pub fn channel(&self, c: usize) -> &[f32] {
        let plane = self.size * self.size;
        &self.data[c * plane..(c + 1) * plane]
    }
}

/// Segmentation network producing a per-pixel line probability.
pub trait ProbabilityMapProducer: Send + Sync {
    fn predict(&self, input: &ModelInput) -> Result<ImageF32>;
}

/// Hand keypoint detector run on the padded input.
pub trait KeypointProducer: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Option<HandKeypoints>;
}

/// Producer returning a fixed map, resized to the requested input size.
#[derive(Clone, Debug)]
pub struct StaticProbabilityMap {
    map: ImageF32,
}

impl StaticProbabilityMap {
    pub fn new(map: ImageF32) -> Self {
        Self { map }
    }
}

impl ProbabilityMapProducer for StaticProbabilityMap {
    fn predict(&self, input: &ModelInput) -> Result<ImageF32> {
        if self.map.is_empty() {
            return Err(PalmError::Inference("static probability map is empty".into()));
        }
        Ok(self.map.resized_nearest(input.size, input.size))
    }
}

/// Shared, immutable handle to the external models.
#[derive(Clone)]
pub struct InferenceService {
    line_model: Arc<dyn ProbabilityMapProducer>,
    keypoints: Option<Arc<dyn KeypointProducer>>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceService")
            .field("keypoints", &self.keypoints.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl InferenceService {
    pub fn new(line_model: Arc<dyn ProbabilityMapProducer>) -> Self {
        Self {
            line_model,
            keypoints: None,
            timeout: None,
        }
    }

    pub fn with_keypoints(mut self, producer: Arc<dyn KeypointProducer>) -> Self {
        self.keypoints = Some(producer);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the line model, enforcing the output shape and the timeout.
    pub fn predict_lines(&self, input: ModelInput) -> Result<ImageF32> {
        let start = Instant::now();
        let size = input.size;
        let map = match self.timeout {
            None => self.line_model.predict(&input)?,
            Some(limit) => {
                let model = Arc::clone(&self.line_model);
                let (tx, rx) = mpsc::channel();
                thread::spawn(move || {
                    // The receiver may be gone after a timeout.
                    let _ = tx.send(model.predict(&input));
                });
                match rx.recv_timeout(limit) {
                    Ok(out) => out?,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        warn!("InferenceService::predict_lines timed out after {:?}", limit);
                        return Err(PalmError::InferenceTimeout(limit));
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        return Err(PalmError::Inference(
                            "line model worker exited without a result".into(),
                        ));
                    }
                }
            }
        };
        if map.w != size || map.h != size {
            return Err(PalmError::ShapeMismatch {
                want_w: size,
                want_h: size,
                got_w: map.w,
                got_h: map.h,
            });
        }
        debug!(
            "InferenceService::predict_lines {}x{} in {:.1} ms",
            size,
            size,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(map)
    }

    pub fn detect_keypoints(&self, image: &RgbImage) -> Option<HandKeypoints> {
        self.keypoints.as_ref()?.detect(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct WrongShape;

    impl ProbabilityMapProducer for WrongShape {
        fn predict(&self, _input: &ModelInput) -> Result<ImageF32> {
            Ok(ImageF32::new(3, 5))
        }
    }

    #[test]
    fn model_input_is_chw_unit_range() {
        let img = RgbImage::from_fn(2, 2, |x, _| if x == 0 { Rgb([255, 0, 51]) } else { Rgb([0, 0, 0]) });
        let input = ModelInput::from_rgb(&img);
        assert_eq!(input.size, 2);
        assert_eq!(input.data.len(), 12);
        assert_eq!(input.channel(0), &[1.0, 0.0, 1.0, 0.0]);
        assert_eq!(input.channel(2)[0], 0.2);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let service = InferenceService::new(Arc::new(WrongShape));
        let input = ModelInput::from_rgb(&RgbImage::new(8, 8));
        match service.predict_lines(input) {
            Err(PalmError::ShapeMismatch { want_w: 8, got_w: 3, got_h: 5, .. }) => {}
            other => panic!("unexpected {:?}", other.map(|m| (m.w, m.h))),
        }
    }

    #[test]
    fn static_map_is_resized_to_input() {
        let service = InferenceService::new(Arc::new(StaticProbabilityMap::new(ImageF32::new(4, 4))))
            .with_timeout(Duration::from_secs(5));
        let map = service.predict_lines(ModelInput::from_rgb(&RgbImage::new(16, 16))).unwrap();
        assert_eq!((map.w, map.h), (16, 16));
    }
}
