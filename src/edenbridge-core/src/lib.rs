//! Edenbridge Core Library
//!
//! Capture controller for the Edenbridge camera: configuration, the UDP
//! command and notification formats, and the command loop.

pub mod config;
pub mod media;
pub mod protocol;
pub mod notifier;
pub mod controller;
pub mod colored_logger;

pub use config::Config;
pub use controller::{Controller, ControllerState};
