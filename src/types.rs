use crate::geometry::{summarize, LineSummary, Original, OriginalPoint, Rectified};
use serde::{Deserialize, Serialize};

/// Outcome of one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PalmStatus {
    /// Rectified and three lines found.
    Ok,
    /// Rectification failed; lines were found on the unrectified image.
    WarpFallback,
    /// Rectification failed and no lines were found.
    WarpFailed,
    /// Rectified, but no lines were found.
    LineDetectionFailed,
}

impl PalmStatus {
    pub fn from_attempt(rectified: bool, lines_found: bool) -> Self {
        match (rectified, lines_found) {
            (true, true) => PalmStatus::Ok,
            (true, false) => PalmStatus::LineDetectionFailed,
            (false, true) => PalmStatus::WarpFallback,
            (false, false) => PalmStatus::WarpFailed,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, PalmStatus::WarpFallback | PalmStatus::WarpFailed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PalmStatus::Ok => "ok",
            PalmStatus::WarpFallback => "warp_fallback",
            PalmStatus::WarpFailed => "warp_failed",
            PalmStatus::LineDetectionFailed => "line_detection_failed",
        }
    }
}

/// One value per principal line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipalLines<T> {
    pub heart: T,
    pub head: T,
    pub life: T,
}

impl<T> PrincipalLines<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PrincipalLines<U> {
        PrincipalLines {
            heart: f(self.heart),
            head: f(self.head),
            life: f(self.life),
        }
    }

    pub fn as_ref(&self) -> PrincipalLines<&T> {
        PrincipalLines {
            heart: &self.heart,
            head: &self.head,
            life: &self.life,
        }
    }

    /// `(name, value)` in heart, head, life order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        [
            ("heart", &self.heart),
            ("head", &self.head),
            ("life", &self.life),
        ]
        .into_iter()
    }
}

/// Keypoints in pixels of the image the producer saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandKeypoints {
    pub palm_root: [f32; 2],
    pub tiger_mouth: [f32; 2],
    pub palm_center: [f32; 2],
    pub flipped: bool,
    pub handedness: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PalmKeypoints {
    pub palm_root: OriginalPoint,
    pub tiger_mouth: OriginalPoint,
    pub palm_center: OriginalPoint,
    pub flipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
}

/// Region of interest in original-normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for Roi {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        }
    }
}

/// One reported line: decimated original-space points plus the summary
/// computed in the rectified frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineRecord {
    pub points: Vec<OriginalPoint>,
    pub summary: SummaryEntry<Rectified>,
}

/// A summary, or `{}` when the line had no points.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged, bound = "")]
pub enum SummaryEntry<F> {
    Line(LineSummary<F>),
    Empty {},
}

impl<F> SummaryEntry<F> {
    pub fn summary(&self) -> Option<&LineSummary<F>> {
        match self {
            SummaryEntry::Line(s) => Some(s),
            SummaryEntry::Empty {} => None,
        }
    }
}

impl<F> From<Option<LineSummary<F>>> for SummaryEntry<F> {
    fn from(s: Option<LineSummary<F>>) -> Self {
        s.map_or(SummaryEntry::Empty {}, SummaryEntry::Line)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PalmResult {
    pub status: PalmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<PrincipalLines<LineRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidences: Option<PrincipalLines<f32>>,
    pub roi: Roi,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<PalmKeypoints>,
    /// Padding ratio of the adopted attempt.
    pub pad_ratio: f32,
    pub latency_ms: f64,
}

impl PalmResult {
    /// Result without lines.
    pub fn empty(status: PalmStatus, pad_ratio: f32) -> Self {
        Self {
            status,
            lines: None,
            confidences: None,
            roi: Roi::default(),
            keypoints: None,
            pad_ratio,
            latency_ms: 0.0,
        }
    }

    /// Geometry record for downstream consumers, with summaries recomputed
    /// in the original frame.
    pub fn digest(&self) -> PalmDigest {
        PalmDigest {
            version: PalmDigest::VERSION,
            lines: self
                .lines
                .as_ref()
                .map(|lines| lines.as_ref().map(|rec| summarize(&rec.points).into())),
            confidences: self.confidences.clone(),
            roi: self.roi,
        }
    }
}

/// Versioned, context-free geometry of a result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PalmDigest {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<PrincipalLines<SummaryEntry<Original>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidences: Option<PrincipalLines<f32>>,
    pub roi: Roi,
}

impl PalmDigest {
    pub const VERSION: u32 = 1;
}
