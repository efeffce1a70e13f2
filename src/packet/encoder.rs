//! # Packet Encoder
//!
//! Builds drive and arm packets from the actuator state.

use bytes::{BufMut, Bytes, BytesMut};

use super::{ArmPacket, DrivePacket};
use crate::actuator::ActuatorState;

/// Formats both command packets for one frame.
///
/// Pure and total: every [`ActuatorState`] yields exactly one packet of each
/// kind.
///
/// # Examples
///
/// ```
/// use rover_controller::actuator::ActuatorState;
/// use rover_controller::packet::format;
///
/// let state = ActuatorState {
///     left_wheel1: 10,
///     right_wheel1: -10,
///     claw: 100,
///     ..ActuatorState::neutral()
/// };
/// let (drive, arm) = format(&state);
///
/// assert_eq!(drive.to_string(), "DriveCommand_10_-10_0_0_0_0");
/// assert_eq!(arm.to_string(), "ArmCommand_0_0_0_100_0_0");
/// ```
#[must_use]
pub fn format(state: &ActuatorState) -> (DrivePacket, ArmPacket) {
    let drive = DrivePacket {
        fields: [
            state.left_wheel1,
            state.right_wheel1,
            state.left_wheel2,
            state.right_wheel2,
            state.left_wheel3,
            state.right_wheel3,
        ],
    };
    let arm = ArmPacket {
        fields: [
            state.upper_extender,
            state.lower_extender,
            state.screwdriver,
            state.claw,
            state.hoist,
            state.swivel,
        ],
    };
    (drive, arm)
}

/// Encodes a packet as one `\n`-terminated ASCII line.
fn encode_line(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(text.len() + 1);
    buf.put_slice(text.as_bytes());
    buf.put_u8(b'\n');
    buf.freeze()
}

impl DrivePacket {
    /// Wire bytes of this packet.
    #[must_use]
    pub fn to_wire(&self) -> Bytes {
        encode_line(&self.to_string())
    }
}

impl ArmPacket {
    /// Wire bytes of this packet.
    #[must_use]
    pub fn to_wire(&self) -> Bytes {
        encode_line(&self.to_string())
    }
}
