//! edenbridge-capture - Camera capture for Edenbridge
//!
//! Provides the `Camera` trait, an rpicam-apps backend for the Pi camera
//! and a simulated backend for development machines.

pub mod camera;
pub mod rpicam;
pub mod simulated;
pub mod error;

pub use camera::{Camera, Resolution};
pub use rpicam::{RpiCamera, RpiCameraConfig};
pub use simulated::SimulatedCamera;
pub use error::CaptureError;
