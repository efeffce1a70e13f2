//! # Command Packet Module
//!
//! Text command packets sent to the rover microcontrollers.
//!
//! ```text
//! DriveCommand_<leftWheel1>_<rightWheel1>_<leftWheel2>_<rightWheel2>_<leftWheel3>_<rightWheel3>
//! ArmCommand_<upperExtender>_<lowerExtender>_<screwdriver>_<claw>_<hoist>_<swivel>
//! ```
//!
//! Fields are decimal integers separated by a single underscore, with no
//! trailing separator. On the wire each packet is one `\n`-terminated line.
//!
//! This module handles:
//! - Building both packets from an [`ActuatorState`](crate::actuator::ActuatorState)
//! - Wire encoding
//! - Parsing packets back (microcontroller side, loopback checks)

pub mod decoder;
pub mod encoder;

pub use encoder::format;

use std::fmt;

use thiserror::Error;

/// Prefix of drive packets.
pub const DRIVE_PREFIX: &str = "DriveCommand";

/// Prefix of arm packets.
pub const ARM_PREFIX: &str = "ArmCommand";

/// Field separator.
pub const SEPARATOR: char = '_';

/// Number of value fields in either packet.
pub const FIELD_COUNT: usize = 6;

/// Wheel commands in wire order: l1, r1, l2, r2, l3, r3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrivePacket {
    pub fields: [i32; FIELD_COUNT],
}

/// Arm commands in wire order: upperExtender, lowerExtender, screwdriver,
/// claw, hoist, swivel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmPacket {
    pub fields: [i32; FIELD_COUNT],
}

fn write_packet(f: &mut fmt::Formatter<'_>, prefix: &str, fields: &[i32]) -> fmt::Result {
    f.write_str(prefix)?;
    for field in fields {
        write!(f, "{}{}", SEPARATOR, field)?;
    }
    Ok(())
}

impl fmt::Display for DrivePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_packet(f, DRIVE_PREFIX, &self.fields)
    }
}

impl fmt::Display for ArmPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_packet(f, ARM_PREFIX, &self.fields)
    }
}

/// Packet parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Packet does not start with the expected command name
    #[error("expected prefix {expected}, got {found:?}")]
    Prefix { expected: &'static str, found: String },

    /// Wrong number of value fields
    #[error("expected 6 fields, got {0}")]
    FieldCount(usize),

    /// A field is not a decimal integer
    #[error("field {index} is not an integer: {value:?}")]
    Field { index: usize, value: String },
}
