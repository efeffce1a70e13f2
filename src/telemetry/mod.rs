//! # Telemetry Module
//!
//! Records emitted frames to JSONL files with rotation.
//!
//! This module handles:
//! - Building one [`FrameRecord`] per emitted frame
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files

pub mod recorder;

pub use recorder::FrameRecorder;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actuator::{ActuatorState, DriveMode};
use crate::packet::{ArmPacket, DrivePacket};

/// One emitted frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub device: Option<String>,
    /// Step count of the left drive mode, 0 for continuous
    pub left_mode: u8,
    pub right_mode: u8,
    pub drive: String,
    pub arm: String,
    pub actuators: ActuatorState,
}

impl FrameRecord {
    pub fn new(
        at: DateTime<Utc>,
        device: Option<&str>,
        modes: (DriveMode, DriveMode),
        packets: (&DrivePacket, &ArmPacket),
        actuators: ActuatorState,
    ) -> Self {
        Self {
            timestamp: at.to_rfc3339(),
            device: device.map(str::to_string),
            left_mode: modes.0.option(),
            right_mode: modes.1.option(),
            drive: packets.0.to_string(),
            arm: packets.1.to_string(),
            actuators,
        }
    }
}
