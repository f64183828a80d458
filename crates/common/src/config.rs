//! Detection and camera configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where region profiles and other config files live.
    pub config_dir: PathBuf,

    /// Camera/encoder parameters the detector derives its geometry from.
    pub camera: CameraConfig,

    /// Motion detection tuning.
    pub motion: MotionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Camera and encoder parameters.
///
/// The motion vector grid is `video_width/16 + 1` by `video_height/16 + 1`
/// cells, one cell per 16x16 macroblock plus the encoder's padding column
/// and row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Encoded video width in pixels.
    pub video_width: u32,

    /// Encoded video height in pixels.
    pub video_height: u32,

    /// Encoded video frame rate.
    pub video_fps: u32,

    /// Preview (mjpeg) stream width in pixels. Preview crop boxes are
    /// expressed in this coordinate space.
    pub mjpeg_width: u32,

    /// Preview stream height in pixels.
    pub mjpeg_height: u32,

    /// Ratio of video frames to preview frames. Confirm windows are
    /// counted in preview frames.
    pub mjpeg_divider: u32,
}

/// Motion detection tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Master enable for motion-triggered recording.
    pub enable: bool,

    /// Minimum per-cell vector magnitude considered motion.
    /// Compared squared against `vx*vx + vy*vy`.
    pub magnitude_limit: i32,

    /// Minimum number of direction-confirmed cells for a region composite.
    pub magnitude_limit_count: i32,

    /// Activity count above the noise floor that feeds the burst counter.
    pub burst_count: i32,

    /// Consecutive burst frames required to trigger a burst detect.
    pub burst_frames: i32,

    /// Seconds motion must persist before a vector detect is promoted
    /// from pending. Zero disables the confirm window.
    pub confirm_gap_secs: u32,

    /// Seconds of video kept after the last detect while recording.
    pub post_capture_secs: u32,

    /// Which frame's composite vector selects the saved preview crop.
    pub preview_save_mode: PreviewSaveMode,

    /// Minimum preview crop side length in pixels.
    pub area_min_side: i32,

    /// Suppress detects whose composite vector is near-vertical (rain).
    pub vertical_filter: bool,

    /// Emit one stats line per detected frame.
    pub stats: bool,
}

/// Preview save policy for a motion recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewSaveMode {
    /// Save the preview framed by the first detect of the recording.
    First,
    /// Re-frame whenever a later detect has a better composite vector.
    Best,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vigilcam=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            camera: CameraConfig::default(),
            motion: MotionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            video_width: 1920,
            video_height: 1080,
            video_fps: 24,
            mjpeg_width: 640,
            mjpeg_height: 360,
            mjpeg_divider: 1,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            magnitude_limit: 7,
            magnitude_limit_count: 4,
            burst_count: 200,
            burst_frames: 5,
            confirm_gap_secs: 4,
            post_capture_secs: 5,
            preview_save_mode: PreviewSaveMode::First,
            area_min_side: 60,
            vertical_filter: false,
            stats: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl MotionConfig {
    /// The squared magnitude threshold applied per grid cell.
    pub fn mag2_limit(&self) -> i32 {
        self.magnitude_limit * self.magnitude_limit
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`],
    /// a missing or malformed file is an error.
    pub fn load_from(path: &std::path::Path) -> crate::error::VigilResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Default configuration directory.
fn default_config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("vigilcam")
}
