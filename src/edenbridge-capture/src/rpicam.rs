//! Pi camera backend built on the rpicam-apps command line tools
//!
//! Stills are taken with one `rpicam-still` invocation each. Recordings run a
//! long-lived `rpicam-vid` child that writes H.264 straight to the target file.
//! Stopping a recording sends the child SIGINT so it flushes and closes the
//! file; it is only killed if it has not exited within `stop_timeout_ms`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::camera::{Camera, Resolution};
use crate::error::{CaptureError, Result};

/// rpicam-apps settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpiCameraConfig {
    /// Still capture binary (`libcamera-still` on older images)
    pub still_program: String,
    /// Video capture binary (`libcamera-vid` on older images)
    pub video_program: String,
    /// Preview time before a still is taken, in milliseconds
    pub still_timeout_ms: u32,
    /// Video framerate
    pub fps: u32,
    /// How long a stopping recorder may take to flush before it is killed
    pub stop_timeout_ms: u64,
}

impl Default for RpiCameraConfig {
    fn default() -> Self {
        Self {
            still_program: "rpicam-still".to_string(),
            video_program: "rpicam-vid".to_string(),
            still_timeout_ms: 1,
            fps: 30,
            stop_timeout_ms: 5000,
        }
    }
}

/// Pi camera driven through rpicam-still / rpicam-vid
pub struct RpiCamera {
    config: RpiCameraConfig,
    resolution: Resolution,
    recorder: Option<Child>,
    busy_warned: bool,
}

impl RpiCamera {
    pub fn new(config: RpiCameraConfig, resolution: Resolution) -> Self {
        info!(
            "using {} / {} at {}",
            config.still_program, config.video_program, resolution
        );
        Self {
            config,
            resolution,
            recorder: None,
            busy_warned: false,
        }
    }

    fn still_args(&self, path: &Path) -> Vec<String> {
        vec![
            "-n".to_string(), // No preview window
            "--immediate".to_string(),
            "-t".to_string(),
            self.config.still_timeout_ms.to_string(),
            "--width".to_string(),
            self.resolution.width.to_string(),
            "--height".to_string(),
            self.resolution.height.to_string(),
            "-e".to_string(),
            "jpg".to_string(),
            "-o".to_string(),
            path.display().to_string(),
        ]
    }

    fn video_args(&self, path: &Path) -> Vec<String> {
        vec![
            "-n".to_string(),
            "-t".to_string(),
            "0".to_string(), // Run until interrupted
            "--flush".to_string(),
            "--width".to_string(),
            self.resolution.width.to_string(),
            "--height".to_string(),
            self.resolution.height.to_string(),
            "--framerate".to_string(),
            self.config.fps.to_string(),
            "--codec".to_string(),
            "h264".to_string(),
            "-o".to_string(),
            path.display().to_string(),
        ]
    }
}

impl Camera for RpiCamera {
    fn set_resolution(&mut self, resolution: Resolution) {
        if resolution != self.resolution {
            debug!("camera resolution {} -> {}", self.resolution, resolution);
            self.resolution = resolution;
        }
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    async fn capture_still(&mut self, path: &Path) -> Result<()> {
        let program = &self.config.still_program;
        let args = self.still_args(path);
        debug!("{} args: {:?}", program, args);

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CaptureError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            // libcamera serves one client at a time
            if self.recorder.is_some() && !self.busy_warned {
                self.busy_warned = true;
                warn!(
                    "{} failed while {} holds the camera; stills will not work during recordings",
                    program, self.config.video_program
                );
            }
            return Err(CaptureError::CommandFailed {
                program: program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("captured still {:?}", path);
        Ok(())
    }

    async fn start_recording(&mut self, path: &Path) -> Result<()> {
        if self.recorder.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let program = &self.config.video_program;
        let args = self.video_args(path);
        info!("starting {} to {:?} ({})", program, path, self.resolution);
        debug!("{} args: {:?}", program, args);

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: program.clone(),
                source,
            })?;

        self.recorder = Some(child);
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<()> {
        let mut child = self.recorder.take().ok_or(CaptureError::NotRecording)?;
        let program = &self.config.video_program;

        // The recorder may have died on its own (camera busy, disk full)
        if let Some(status) = child.try_wait()? {
            warn!("{} exited early with {}", program, status);
            return check_exit(program, status);
        }

        if interrupt(&child) {
            let grace = Duration::from_millis(self.config.stop_timeout_ms);
            match timeout(grace, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    info!("stopped {}", program);
                    return check_exit(program, status);
                }
                Err(_) => warn!("{} still running after {:?}, killing it", program, grace),
            }
        }

        child.kill().await?;
        warn!("killed {}, the recording may be truncated", program);
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }
}

impl Drop for RpiCamera {
    fn drop(&mut self) {
        if let Some(mut child) = self.recorder.take() {
            info!("stopping recording on shutdown");
            if !interrupt(&child) {
                let _ = child.start_kill();
            }
        }
    }
}

/// Send SIGINT, which rpicam-vid handles by closing its output file
#[cfg(unix)]
fn interrupt(child: &Child) -> bool {
    match child.id() {
        // SAFETY: the pid belongs to our own child, which has not been reaped
        Some(pid) => unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) == 0 },
        None => false,
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) -> bool {
    false
}

fn check_exit(program: &str, status: ExitStatus) -> Result<()> {
    if status.success() || interrupted(status) {
        return Ok(());
    }
    Err(CaptureError::CommandFailed {
        program: program.to_string(),
        status,
        stderr: String::new(),
    })
}

#[cfg(unix)]
fn interrupted(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(libc::SIGINT)
}

#[cfg(not(unix))]
fn interrupted(_status: ExitStatus) -> bool {
    false
}
