//! Camera abstraction shared by all capture backends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::Path;

use crate::error::Result;

/// Capture resolution in pixels
///
/// Serialized as a `[width, height]` pair, which is how the controller
/// configuration file spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 640x480, used while idle
    pub const fn vga() -> Self {
        Self::new(640, 480)
    }

    /// 1280x720, used for stored media
    pub const fn hd_720() -> Self {
        Self::new(1280, 720)
    }
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for [u32; 2] {
    fn from(res: Resolution) -> Self {
        [res.width, res.height]
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A still/video capture device
///
/// Calls are sequential: the controller never issues a second call before the
/// previous one resolved. Stills may be requested while a recording is running.
pub trait Camera {
    /// Resolution used by subsequent captures and recordings
    fn set_resolution(&mut self, resolution: Resolution);

    fn resolution(&self) -> Resolution;

    /// Capture a single JPEG still to `path`
    fn capture_still(&mut self, path: &Path) -> impl Future<Output = Result<()>>;

    /// Start continuous H.264 recording to `path`
    fn start_recording(&mut self, path: &Path) -> impl Future<Output = Result<()>>;

    /// Stop the running recording and flush it to disk
    fn stop_recording(&mut self) -> impl Future<Output = Result<()>>;

    fn is_recording(&self) -> bool;
}
