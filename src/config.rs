//! Configuration management for the try-on pipeline

use crate::constants::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduling, thresholds and retry policy
    pub pipeline: PipelineConfig,

    /// Normalisation constants of the transform engine
    pub transform: TransformConfig,

    /// Whole-avatar placement
    pub placement: PlacementConfig,

    /// Optional smoothing stage
    pub filter: FilterConfig,

    /// Rig table loaded alongside the mesh; the built-in shirt rig when unset
    pub rig_path: Option<PathBuf>,
}

/// Scheduling and input gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keypoints at or below this confidence are dropped from the frame
    pub part_confidence_threshold: f64,

    /// Detections below this overall score are ignored
    pub min_pose_confidence: f64,

    /// Interval between estimation cycles
    pub estimation_interval_ms: u64,

    /// Interval between render ticks
    pub render_interval_ms: u64,

    /// Consecutive camera or pose source failures before the estimation task is abandoned
    pub max_camera_attempts: u32,

    /// Fixed backoff between camera polls
    pub camera_backoff_ms: u64,
}

/// Normalisation constants used by the head and torso signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Calibration distance is divided by this before normalising horizontal offsets
    pub offset_divisor: f64,

    /// Lower end of the extension range, in calibration distances
    pub extension_min: f64,

    /// Upper end of the extension range, in calibration distances
    pub extension_max: f64,

    /// Vertical offset output range
    pub output_min: f64,
    pub output_max: f64,
}

/// Which parts of the avatar placement are driven by the pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Depth only, from the distance estimate
    DepthOnly,
    /// Lateral and vertical only, from the chest center
    MovementOnly,
    /// Depth, lateral and vertical
    Full,
}

/// Avatar placement fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub mode: PlacementMode,

    /// Distance-estimate confidence required before the avatar is placed
    pub confidence_threshold: f64,

    /// `depth = depth_fit_a * ln(distance) + depth_fit_b`
    pub depth_fit_a: f64,
    pub depth_fit_b: f64,

    /// `x = lateral_scale * chest.x + lateral_offset`
    pub lateral_scale: f64,
    pub lateral_offset: f64,

    /// `y = vertical_scale * chest.y + vertical_offset`
    pub vertical_scale: f64,
    pub vertical_offset: f64,

    /// Position used when the subject is not reliably in frame
    pub fallback_position: [f64; 3],
}

/// Smoothing stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// `none`, `exponential` or `moving_average`
    pub kind: String,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,

    /// Moving average window size
    pub moving_average_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            part_confidence_threshold: DEFAULT_PART_CONFIDENCE,
            min_pose_confidence: DEFAULT_POSE_CONFIDENCE,
            estimation_interval_ms: DEFAULT_ESTIMATION_INTERVAL_MS,
            render_interval_ms: DEFAULT_RENDER_INTERVAL_MS,
            max_camera_attempts: DEFAULT_MAX_CAMERA_ATTEMPTS,
            camera_backoff_ms: DEFAULT_CAMERA_BACKOFF_MS,
        }
    }
}

impl PipelineConfig {
    pub fn estimation_interval(&self) -> Duration {
        Duration::from_millis(self.estimation_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn camera_backoff(&self) -> Duration {
        Duration::from_millis(self.camera_backoff_ms)
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            offset_divisor: OFFSET_DISTANCE_DIVISOR,
            extension_min: EXTENSION_RANGE_MIN,
            extension_max: EXTENSION_RANGE_MAX,
            output_min: SIGNAL_OUT_MIN,
            output_max: SIGNAL_OUT_MAX,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mode: PlacementMode::Full,
            confidence_threshold: DEFAULT_PLACEMENT_CONFIDENCE,
            depth_fit_a: DEFAULT_DEPTH_FIT_A,
            depth_fit_b: DEFAULT_DEPTH_FIT_B,
            lateral_scale: DEFAULT_LATERAL_SCALE,
            lateral_offset: DEFAULT_LATERAL_OFFSET,
            vertical_scale: DEFAULT_VERTICAL_SCALE,
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
            fallback_position: OUT_OF_FRAME_POSITION,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
            exponential_alpha: 0.5,
            moving_average_window: 5,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Create the smoothing stage from configuration
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::SignalFilter>> {
        use crate::filters::{create_filter, exponential::ExponentialFilter, moving_average::MovingAverageFilter};

        match self.filter.kind.as_str() {
            "exponential" => Ok(Box::new(ExponentialFilter::new(self.filter.exponential_alpha))),
            "moving_average" => Ok(Box::new(MovingAverageFilter::new(self.filter.moving_average_window))),
            name => create_filter(name),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate thresholds
        if !(0.0..=1.0).contains(&self.pipeline.part_confidence_threshold) {
            return Err(Error::ConfigError(
                "Part confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pipeline.min_pose_confidence) {
            return Err(Error::ConfigError(
                "Pose confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.placement.confidence_threshold) {
            return Err(Error::ConfigError(
                "Placement confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Validate scheduling
        if self.pipeline.estimation_interval_ms == 0 || self.pipeline.render_interval_ms == 0 {
            return Err(Error::ConfigError("Task intervals must be greater than 0".to_string()));
        }
        if self.pipeline.max_camera_attempts == 0 {
            return Err(Error::ConfigError(
                "Camera attempts must be greater than 0".to_string(),
            ));
        }

        // Validate transform constants
        if !(self.transform.offset_divisor.is_finite() && self.transform.offset_divisor > 0.0) {
            return Err(Error::ConfigError("Offset divisor must be positive".to_string()));
        }
        if (self.transform.extension_max - self.transform.extension_min).abs() < EPSILON {
            return Err(Error::ConfigError(
                "Extension range must not be empty".to_string(),
            ));
        }

        // Validate placement fit
        let fit = [
            self.placement.depth_fit_a,
            self.placement.depth_fit_b,
            self.placement.lateral_scale,
            self.placement.lateral_offset,
            self.placement.vertical_scale,
            self.placement.vertical_offset,
        ];
        if fit.iter().chain(self.placement.fallback_position.iter()).any(|v| !v.is_finite()) {
            return Err(Error::ConfigError("Placement constants must be finite".to_string()));
        }

        // Validate filter parameters
        if self.filter.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if !(self.filter.exponential_alpha > 0.0 && self.filter.exponential_alpha <= 1.0) {
            return Err(Error::ConfigError(
                "Exponential alpha must be in (0, 1]".to_string(),
            ));
        }
        if !matches!(self.filter.kind.as_str(), "none" | "exponential" | "moving_average") {
            return Err(Error::ConfigError(format!("Unknown filter kind: {}", self.filter.kind)));
        }

        // Validate rig path exists
        if let Some(rig_path) = &self.rig_path {
            if !rig_path.exists() {
                return Err(Error::ConfigError(format!(
                    "Rig table not found: {}",
                    rig_path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Virtual Try-On Configuration

# Scheduling and input gating
pipeline:
  part_confidence_threshold: 0.5
  min_pose_confidence: 0.1
  estimation_interval_ms: 100
  render_interval_ms: 16
  max_camera_attempts: 50
  camera_backoff_ms: 200

# Head/torso normalisation
transform:
  offset_divisor: 15.0
  extension_min: 1.5
  extension_max: 2.8
  output_min: -2.0
  output_max: 2.0

# Avatar placement (depth_only, movement_only, full)
placement:
  mode: full
  confidence_threshold: 0.7
  depth_fit_a: -6.035
  depth_fit_b: 30.722
  lateral_scale: 0.0125
  lateral_offset: -4.0
  vertical_scale: -0.0167
  vertical_offset: 4.0
  fallback_position: [0.0, 0.0, -30.0]

# Smoothing stage (none, exponential, moving_average)
filter:
  kind: none
  exponential_alpha: 0.5
  moving_average_window: 5
"#;
