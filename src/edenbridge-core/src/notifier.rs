//! Fire-and-forget delivery of notifications to the bot and cloud sinks

use anyhow::{Context, Result};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::protocol::{Notification, Sink};

/// Outbound side of the controller
pub trait Notifier {
    /// Deliver one notification to the sink it is addressed to
    fn notify(&mut self, message: Notification) -> impl Future<Output = Result<()>>;
}

/// Sends each notification as a single JSON datagram to a loopback port
pub struct UdpNotifier {
    socket: UdpSocket,
    bot_addr: SocketAddr,
    cloud_addr: SocketAddr,
}

impl UdpNotifier {
    pub async fn bind(bot_port: u16, cloud_port: u16) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("Failed to bind notification socket")?;
        Ok(Self {
            socket,
            bot_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, bot_port)),
            cloud_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, cloud_port)),
        })
    }

    pub fn addr_for(&self, sink: Sink) -> SocketAddr {
        match sink {
            Sink::Bot => self.bot_addr,
            Sink::Cloud => self.cloud_addr,
        }
    }
}

impl Notifier for UdpNotifier {
    async fn notify(&mut self, message: Notification) -> Result<()> {
        let addr = self.addr_for(message.sink());
        let payload = message.encode()?;
        self.socket
            .send_to(&payload, addr)
            .await
            .with_context(|| format!("Failed to send notification to {}", addr))?;
        debug!("sent {:?} for {} to {}", message.cmd, message.file_name, addr);
        Ok(())
    }
}
