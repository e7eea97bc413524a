//! Edenbridge camera controller
//!
//! Listens for `take_photo` / `take_video` commands on a loopback UDP port,
//! drives the Pi camera and tells the messaging bot and the cloud uploader
//! about every file it produces.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use edenbridge_capture::{RpiCamera, SimulatedCamera};
use edenbridge_core::colored_logger::init_component_logger;
use edenbridge_core::config::{CameraBackend, Config};
use edenbridge_core::controller::{Controller, ControllerState};
use edenbridge_core::notifier::UdpNotifier;

#[derive(Parser)]
#[command(name = "edenbridge-camera")]
#[command(about = "Pi camera controller for the Edenbridge home-security assistant")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_component_logger(cli.verbose)?;

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    info!("starting edenbridge camera controller");
    info!("config: {:?}", cli.config);
    info!(
        "photos: {:?}, videos: {:?}",
        config.photo_path, config.video_path
    );

    // Setup signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let state = cmd_run(config, running)?;

    info!("controller stopped ({:?})", state);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn cmd_run(config: Config, running: Arc<AtomicBool>) -> Result<ControllerState> {
    let notifier = UdpNotifier::bind(config.bot_port, config.cloud_port).await?;
    let detection = config.detection_resolution;

    let result = match config.camera.clone() {
        CameraBackend::Rpicam { settings } => {
            let camera = RpiCamera::new(settings, detection);
            match Controller::new(config, camera, notifier).await {
                Ok(controller) => controller.run(running).await,
                Err(e) => Err(e),
            }
        }
        CameraBackend::Simulated => {
            let camera = SimulatedCamera::new(detection);
            match Controller::new(config, camera, notifier).await {
                Ok(controller) => controller.run(running).await,
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
