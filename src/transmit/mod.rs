//! # Transmit Module
//!
//! Delivers command packets to the drive and arm microcontrollers.
//!
//! This module handles:
//! - Frame-rate gating ([`gate`])
//! - Microcontroller links over UDP or serial ([`link`])
//! - Per-frame dispatch with packet logging on the `packets` target

pub mod gate;
pub mod link;

use tracing::{info, warn};

use crate::config::TransportConfig;
use crate::error::Result;
use crate::packet::{ArmPacket, DrivePacket};

pub use gate::TransmissionGate;
pub use link::{Link, LinkIo};

/// Log target carrying one line per emitted packet.
pub const PACKET_LOG_TARGET: &str = "packets";

/// Send counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitStats {
    pub frames: u64,
    pub sent: u64,
    pub failures: u64,
}

/// Dispatches each frame's packets to the configured links.
///
/// A missing link means the packet is only logged.
#[derive(Debug, Default)]
pub struct Transmitter {
    drive: Option<Link>,
    arm: Option<Link>,
    stats: TransmitStats,
}

impl Transmitter {
    /// Opens every configured link.
    ///
    /// # Errors
    ///
    /// Returns the first link that fails to open. Startup treats this as fatal.
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        let drive = match &config.drive {
            Some(endpoint) => Some(Link::open("drive", endpoint).await?),
            None => None,
        };
        let arm = match &config.arm {
            Some(endpoint) => Some(Link::open("arm", endpoint).await?),
            None => None,
        };

        if drive.is_none() && arm.is_none() {
            info!("No transport endpoints configured, packets are logged only");
        }

        Ok(Self::from_links(drive, arm))
    }

    /// Transmitter without links.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn from_links(drive: Option<Link>, arm: Option<Link>) -> Self {
        Self {
            drive,
            arm,
            stats: TransmitStats::default(),
        }
    }

    /// Logs and sends both packets of one frame.
    ///
    /// Send failures are logged and counted, never retried. Returns the
    /// number of failed sends for this frame.
    pub async fn dispatch(&mut self, drive: &DrivePacket, arm: &ArmPacket) -> usize {
        info!(target: PACKET_LOG_TARGET, "{}", drive);
        info!(target: PACKET_LOG_TARGET, "{}", arm);

        self.stats.frames += 1;
        let mut failed = 0;

        if let Some(link) = self.drive.as_mut() {
            failed += Self::send_on(link, &drive.to_wire(), &mut self.stats).await;
        }
        if let Some(link) = self.arm.as_mut() {
            failed += Self::send_on(link, &arm.to_wire(), &mut self.stats).await;
        }

        failed
    }

    async fn send_on(link: &mut Link, bytes: &[u8], stats: &mut TransmitStats) -> usize {
        match link.send(bytes).await {
            Ok(()) => {
                stats.sent += 1;
                0
            }
            Err(e) => {
                stats.failures += 1;
                warn!("{}", e);
                1
            }
        }
    }

    pub fn stats(&self) -> TransmitStats {
        self.stats
    }

    pub fn has_links(&self) -> bool {
        self.drive.is_some() || self.arm.is_some()
    }

    /// Drops both links.
    pub fn close(&mut self) {
        if let Some(link) = self.drive.take() {
            info!("Closed {} link to {}", link.name(), link.endpoint());
        }
        if let Some(link) = self.arm.take() {
            info!("Closed {} link to {}", link.name(), link.endpoint());
        }
    }
}
