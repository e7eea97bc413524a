//! Camera stand-in for machines without a Pi camera
//!
//! Writes placeholder files where the real backend would write media, so the
//! controller and its downstream sinks can be exercised on a laptop.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::camera::{Camera, Resolution};
use crate::error::{CaptureError, Result};

/// Smallest byte sequence most JPEG readers accept as an (empty) image
const PLACEHOLDER_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

pub struct SimulatedCamera {
    resolution: Resolution,
    recording: Option<PathBuf>,
    stills_taken: u64,
}

impl SimulatedCamera {
    pub fn new(resolution: Resolution) -> Self {
        info!("using simulated camera at {}", resolution);
        Self {
            resolution,
            recording: None,
            stills_taken: 0,
        }
    }

    pub fn stills_taken(&self) -> u64 {
        self.stills_taken
    }
}

impl Camera for SimulatedCamera {
    fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    async fn capture_still(&mut self, path: &Path) -> Result<()> {
        tokio::fs::write(path, PLACEHOLDER_JPEG).await?;
        self.stills_taken += 1;
        debug!("simulated still {:?} at {}", path, self.resolution);
        Ok(())
    }

    async fn start_recording(&mut self, path: &Path) -> Result<()> {
        if self.recording.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        tokio::fs::File::create(path).await?;
        self.recording = Some(path.to_path_buf());
        debug!("simulated recording started {:?}", path);
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<()> {
        let path = self.recording.take().ok_or(CaptureError::NotRecording)?;
        debug!("simulated recording stopped {:?}", path);
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_still_writes_file() {
        let dir = tempdir().unwrap();
        let mut cam = SimulatedCamera::new(Resolution::vga());
        let path = dir.path().join("still.jpg");

        cam.capture_still(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), PLACEHOLDER_JPEG);
        assert_eq!(cam.stills_taken(), 1);
    }

    #[tokio::test]
    async fn test_recording_state() {
        let dir = tempdir().unwrap();
        let mut cam = SimulatedCamera::new(Resolution::hd_720());
        let path = dir.path().join("clip.h264");

        cam.start_recording(&path).await.unwrap();
        assert!(cam.is_recording());
        assert!(path.exists());
        assert!(matches!(
            cam.start_recording(&path).await,
            Err(CaptureError::AlreadyRecording)
        ));

        // Stills while recording are allowed
        cam.capture_still(&dir.path().join("mid.jpg")).await.unwrap();

        cam.stop_recording().await.unwrap();
        assert!(!cam.is_recording());
        assert!(matches!(
            cam.stop_recording().await,
            Err(CaptureError::NotRecording)
        ));
    }
}
