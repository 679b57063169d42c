//! JSON runtime configuration for the demo runner.
//!
//! ```json
//! {
//!   "input_path": "palm.jpg",
//!   "probability_map_path": "palm_lines.png",
//!   "pad_ratio": 0.0,
//!   "output": { "json_out": "out/result.json", "overlay_out": "out/overlay.png" },
//!   "pipeline": { "threshold": { "cutoff": 0.05 } }
//! }
//! ```

use crate::error::{PalmError, Result};
use crate::pipeline::PipelineParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Full report (result + trace) as JSON.
    pub json_out: Option<PathBuf>,
    /// Geometry digest as JSON.
    pub digest_out: Option<PathBuf>,
    /// Original photograph with the lines drawn on it.
    pub overlay_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    /// Precomputed line probability map (grayscale image).
    pub probability_map_path: PathBuf,
    #[serde(default)]
    pub pad_ratio: f32,
    /// Inference timeout in milliseconds.
    #[serde(default)]
    pub inference_timeout_ms: Option<u64>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineParams,
}

impl RuntimeConfig {
    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }

    /// Resolve relative paths against `base`.
    fn rebase(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.input_path);
        join(&mut self.probability_map_path);
        for p in [
            &mut self.output.json_out,
            &mut self.output.digest_out,
            &mut self.output.overlay_out,
        ]
        .into_iter()
        .flatten()
        {
            join(p);
        }
        self
    }
}

/// Parse a runtime configuration from JSON text.
pub fn parse_config(text: &str) -> Result<RuntimeConfig> {
    let config: RuntimeConfig = serde_json::from_str(text)?;
    if !config.pad_ratio.is_finite() || config.pad_ratio < 0.0 {
        return Err(PalmError::Config(format!(
            "pad_ratio must be a non-negative number, got {}",
            config.pad_ratio
        )));
    }
    Ok(config)
}

/// Read the configuration at `path`; relative paths inside it are taken
/// relative to the file's directory.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let contents = fs::read_to_string(path).map_err(|source| PalmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents)
        .map_err(|e| PalmError::Config(format!("{}: {e}", path.display())))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.rebase(base))
}
