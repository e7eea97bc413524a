//! Command loop and capture sequencing
//!
//! The controller owns the command socket, the camera and the notifier. It
//! handles one datagram at a time: a photo burst or a recording runs to
//! completion before the next command is read.

use anyhow::{Context, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use edenbridge_capture::Camera;

use crate::config::Config;
use crate::media::{MediaFile, MediaStamp};
use crate::notifier::Notifier;
use crate::protocol::{burst_count, Command, Notification, Server};

/// Commands are small JSON objects; anything longer is truncated and rejected
const MAX_COMMAND_SIZE: usize = 4096;

/// Command loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Serving commands
    Normal,
    /// Asked to stop; terminal
    Stop,
    /// Command socket failed; terminal
    Error,
}

/// Capture controller
pub struct Controller<C: Camera, N: Notifier> {
    config: Config,
    socket: UdpSocket,
    camera: C,
    notifier: N,
    state: ControllerState,
}

impl<C: Camera, N: Notifier> Controller<C, N> {
    /// Bind the command socket, prepare storage and warm up the camera
    pub async fn new(config: Config, mut camera: C, notifier: N) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, config.listen_port))
            .await
            .with_context(|| {
                format!("Failed to bind command socket on port {}", config.listen_port)
            })?;
        info!("listening for commands on {}", socket.local_addr()?);

        // create_dir_all treats an existing directory as success
        std::fs::create_dir_all(&config.photo_path)
            .with_context(|| format!("Failed to create {:?}", config.photo_path))?;
        std::fs::create_dir_all(&config.video_path)
            .with_context(|| format!("Failed to create {:?}", config.video_path))?;

        camera.set_resolution(config.detection_resolution);
        debug!("camera warm-up {:?}", config.warmup());
        sleep(config.warmup()).await;

        Ok(Self {
            config,
            socket,
            camera,
            notifier,
            state: ControllerState::Normal,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve commands until stopped
    ///
    /// Stops on an empty datagram, a `stop` command, or when `running` is
    /// cleared. Consumes the controller so the socket and camera are released
    /// on every exit path.
    pub async fn run(mut self, running: Arc<AtomicBool>) -> Result<ControllerState> {
        info!(
            "command loop started (bot port {}, cloud port {})",
            self.config.bot_port, self.config.cloud_port
        );

        let mut buf = vec![0u8; MAX_COMMAND_SIZE];
        let recv_timeout = self.config.recv_timeout();

        while self.state == ControllerState::Normal {
            if !running.load(Ordering::SeqCst) {
                info!("shutdown requested");
                self.state = ControllerState::Stop;
                break;
            }

            let (len, peer) = match timeout(recv_timeout, self.socket.recv_from(&mut buf)).await {
                Err(_) => continue,
                Ok(Err(e)) => {
                    error!("command socket failed: {}", e);
                    self.state = ControllerState::Error;
                    return Err(e).context("Failed to receive command");
                }
                Ok(Ok(received)) => received,
            };

            if len == 0 {
                info!("empty datagram from {}, stopping", peer);
                self.state = ControllerState::Stop;
                break;
            }

            match Command::decode(&buf[..len]) {
                Ok(command) => {
                    debug!("command from {}: {:?}", peer, command);
                    self.dispatch(command).await;
                }
                Err(e) => {
                    warn!("ignoring malformed command from {}: {}", peer, e);
                }
            }
        }

        info!("command loop stopped ({:?})", self.state);
        Ok(self.state)
    }

    /// Execute one decoded command
    pub async fn dispatch(&mut self, command: Command) {
        match command {
            Command::TakePhoto { count } => {
                if let Err(e) = self.take_photo(count).await {
                    error!("photo burst failed: {:#}", e);
                }
            }
            Command::TakeVideo { init_photo } => {
                if let Err(e) = self.take_video(init_photo).await {
                    error!("recording failed: {:#}", e);
                }
            }
            Command::Stop => {
                info!("stop command received");
                self.state = ControllerState::Stop;
            }
            Command::Unknown => {
                debug!("ignoring unknown command");
            }
        }
    }

    /// Take a burst of stills back-to-back, notifying the bot of each one
    ///
    /// Returns the number of stills taken.
    pub async fn take_photo(&mut self, requested: i64) -> Result<u32> {
        let count = burst_count(requested, self.config.max_photo_count);
        info!("taking {} photo(s)", count);

        self.camera.set_resolution(self.config.record_resolution);
        let result = self.photo_burst(count).await;
        self.camera.set_resolution(self.config.detection_resolution);
        result
    }

    async fn photo_burst(&mut self, count: u32) -> Result<u32> {
        for index in 0..count {
            let file =
                MediaFile::photo(&self.config.photo_path, MediaStamp::now(), u64::from(index));
            self.camera
                .capture_still(&file.path)
                .await
                .with_context(|| format!("Failed to capture {:?}", file.path))?;
            info!("captured {:?}", file.path);
            self.send(Notification::photo(&file, Server::Telegram)).await;
        }
        Ok(count)
    }

    /// Record a video, sampling a still every `period` seconds, then hand
    /// the recording to the cloud uploader
    pub async fn take_video(&mut self, init_photo: bool) -> Result<()> {
        self.camera.set_resolution(self.config.record_resolution);
        let result = self.record_video(init_photo).await;
        self.camera.set_resolution(self.config.detection_resolution);
        result
    }

    async fn record_video(&mut self, init_photo: bool) -> Result<()> {
        let video = MediaFile::video(&self.config.video_path, MediaStamp::now());
        self.camera
            .start_recording(&video.path)
            .await
            .with_context(|| format!("Failed to start recording {:?}", video.path))?;
        info!(
            "recording {:?} for {}s, snapshot every {}s",
            video.path, self.config.video_length, self.config.period
        );

        if init_photo {
            self.snapshot(0, Server::Telegram).await;
        }

        let period = self.config.period_duration();
        for index in 1..=self.config.snapshots_per_video() {
            sleep(period).await;
            self.snapshot(index, Server::Email).await;
        }

        // The file on disk is handed over even if the recorder ended badly;
        // it may still hold everything up to the failure
        match self.camera.stop_recording().await {
            Ok(()) => info!("recorded {:?}", video.path),
            Err(e) => warn!("recording {:?} did not stop cleanly: {}", video.path, e),
        }

        self.send(Notification::video(&video)).await;
        Ok(())
    }

    /// Still taken while recording; failures are logged and sampling goes on
    async fn snapshot(&mut self, index: u64, server: Server) {
        let file = MediaFile::photo(&self.config.photo_path, MediaStamp::now(), index);
        match self.camera.capture_still(&file.path).await {
            Ok(()) => {
                debug!("snapshot {:?}", file.path);
                self.send(Notification::photo(&file, server)).await;
            }
            Err(e) => warn!("snapshot {:?} failed: {}", file.path, e),
        }
    }

    async fn send(&mut self, message: Notification) {
        if let Err(e) = self.notifier.notify(message).await {
            warn!("notification dropped: {:#}", e);
        }
    }
}
