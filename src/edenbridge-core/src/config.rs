//! Configuration management

use anyhow::{ensure, Context, Result};
use edenbridge_capture::{Resolution, RpiCameraConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Controller configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for H.264 recordings
    #[serde(default = "default_video_path")]
    pub video_path: PathBuf,

    /// Directory for JPEG stills
    #[serde(default = "default_photo_path")]
    pub photo_path: PathBuf,

    /// Resolution while idle
    #[serde(default = "default_detection_resolution")]
    pub detection_resolution: Resolution,

    /// Resolution for stored stills and recordings
    #[serde(default = "default_record_resolution")]
    pub record_resolution: Resolution,

    /// Upper bound for a photo burst; also the burst size when none is given
    #[serde(default = "default_max_photo_count")]
    pub max_photo_count: u32,

    /// Recording length in seconds
    #[serde(default = "default_video_length")]
    pub video_length: u64,

    /// Seconds between snapshots taken during a recording
    #[serde(default = "default_period")]
    pub period: u64,

    /// Motion detection thresholds (motion detection is not enabled)
    #[serde(default)]
    pub motion: MotionConfig,

    /// UDP port the controller listens on
    pub listen_port: u16,

    /// UDP port of the messaging bot
    pub bot_port: u16,

    /// UDP port of the cloud uploader
    pub cloud_port: u16,

    /// Camera warm-up delay after initialization, in seconds
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Receive timeout for the command socket, in seconds
    #[serde(default = "default_recv_timeout_secs")]
    pub recv_timeout_secs: u64,

    /// Capture backend
    #[serde(default)]
    pub camera: CameraBackend,
}

/// Frame differencing thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Minimum contour area counted as motion
    pub min_area: u32,
    /// Pixel delta threshold
    pub delta_threshold: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_area: 500,
            delta_threshold: 5,
        }
    }
}

/// Which camera implementation drives capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CameraBackend {
    Rpicam {
        #[serde(flatten)]
        settings: RpiCameraConfig,
    },
    Simulated,
}

impl Default for CameraBackend {
    fn default() -> Self {
        CameraBackend::Rpicam {
            settings: RpiCameraConfig::default(),
        }
    }
}

// Default value functions
fn default_video_path() -> PathBuf { PathBuf::from("./videos") }
fn default_photo_path() -> PathBuf { PathBuf::from("./photos") }
fn default_detection_resolution() -> Resolution { Resolution::vga() }
fn default_record_resolution() -> Resolution { Resolution::hd_720() }
fn default_max_photo_count() -> u32 { 5 }
fn default_video_length() -> u64 { 60 }
fn default_period() -> u64 { 30 }
fn default_warmup_secs() -> u64 { 2 }
fn default_recv_timeout_secs() -> u64 { 3 }

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_photo_count >= 1, "max_photo_count must be at least 1");
        ensure!(self.period >= 1, "period must be at least 1 second");
        ensure!(self.recv_timeout_secs >= 1, "recv_timeout_secs must be at least 1");
        ensure!(
            self.listen_port != 0 && self.bot_port != 0 && self.cloud_port != 0,
            "ports must be non-zero"
        );
        ensure!(
            self.listen_port != self.bot_port && self.listen_port != self.cloud_port,
            "listen_port must differ from bot_port and cloud_port"
        );
        Ok(())
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_secs(self.recv_timeout_secs)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn period_duration(&self) -> Duration {
        Duration::from_secs(self.period)
    }

    /// Number of snapshots taken during one recording
    pub fn snapshots_per_video(&self) -> u64 {
        self.video_length / self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"listen_port": 10000, "bot_port": 10001, "cloud_port": 10002}"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(MINIMAL).unwrap();
        assert_eq!(config.max_photo_count, 5);
        assert_eq!(config.recv_timeout(), Duration::from_secs(3));
        assert_eq!(config.warmup(), Duration::from_secs(2));
        assert_eq!(config.record_resolution, Resolution::new(1280, 720));
        assert!(matches!(config.camera, CameraBackend::Rpicam { .. }));
    }

    #[test]
    fn test_full_document() {
        let json = r#"{
            "video_path": "/home/pi/videos",
            "photo_path": "/home/pi/photos",
            "detection_resolution": [320, 240],
            "record_resolution": [1920, 1080],
            "max_photo_count": 8,
            "video_length": 60,
            "period": 30,
            "motion": {"min_area": 800, "delta_threshold": 7},
            "listen_port": 1234,
            "bot_port": 1235,
            "cloud_port": 1236,
            "camera": {"backend": "rpicam", "still_program": "libcamera-still"}
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.photo_path, PathBuf::from("/home/pi/photos"));
        assert_eq!(config.detection_resolution, Resolution::new(320, 240));
        assert_eq!(config.motion.min_area, 800);
        assert_eq!(config.snapshots_per_video(), 2);
        match config.camera {
            CameraBackend::Rpicam { settings } => {
                assert_eq!(settings.still_program, "libcamera-still");
                assert_eq!(settings.video_program, "rpicam-vid");
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_example_config_loads() {
        let config = Config::from_json(include_str!("../../../config.example.json")).unwrap();
        assert_eq!(config.listen_port, 23333);
        assert_eq!(config.snapshots_per_video(), 2);
    }

    #[test]
    fn test_simulated_backend() {
        let json = r#"{"listen_port": 1, "bot_port": 2, "cloud_port": 3,
                       "camera": {"backend": "simulated"}}"#;
        let config = Config::from_json(json).unwrap();
        assert!(matches!(config.camera, CameraBackend::Simulated));
    }

    #[test]
    fn test_snapshots_round_down() {
        let json = r#"{"listen_port": 1, "bot_port": 2, "cloud_port": 3,
                       "video_length": 65, "period": 30}"#;
        assert_eq!(Config::from_json(json).unwrap().snapshots_per_video(), 2);
    }

    #[test]
    fn test_rejects_zero_period() {
        let json = r#"{"listen_port": 1, "bot_port": 2, "cloud_port": 3, "period": 0}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_zero_burst_limit() {
        let json = r#"{"listen_port": 1, "bot_port": 2, "cloud_port": 3, "max_photo_count": 0}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_port_clash() {
        let json = r#"{"listen_port": 5, "bot_port": 5, "cloud_port": 3}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_missing_ports() {
        assert!(Config::from_json(r#"{"bot_port": 2}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().listen_port, 10000);
        assert!(Config::from_file(dir.path().join("missing.json")).is_err());
    }
}
