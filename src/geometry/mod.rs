//! Frame-tagged points, per-line summaries and frame transfer.

pub mod mapping;
pub mod points;
pub mod summary;

pub use self::mapping::{
    extend_polyline, map_to_original, normalize_keypoints, unpad_points, FrameMapping,
    MapperParams,
};
pub use self::points::{NormalizedPoint, Original, OriginalPoint, RawLine, Rectified, RectifiedPoint};
pub use self::summary::{
    decimate, line_confidence, normalize_line, summarize, LineSummary, DECIMATION_STRIDE,
};
