//! # Packet Decoder
//!
//! Parses command packets from their text form. Surrounding whitespace,
//! including the line terminator, is ignored.

use std::str::FromStr;

use super::{ArmPacket, DrivePacket, PacketError, ARM_PREFIX, DRIVE_PREFIX, FIELD_COUNT, SEPARATOR};

/// Splits `<prefix>_<f0>_..._<f5>` into its six integer fields.
fn parse_fields(line: &str, prefix: &'static str) -> Result<[i32; FIELD_COUNT], PacketError> {
    let mut parts = line.trim().split(SEPARATOR);

    let found = parts.next().unwrap_or_default();
    if found != prefix {
        return Err(PacketError::Prefix {
            expected: prefix,
            found: found.to_string(),
        });
    }

    let values: Vec<&str> = parts.collect();
    if values.len() != FIELD_COUNT {
        return Err(PacketError::FieldCount(values.len()));
    }

    let mut fields = [0i32; FIELD_COUNT];
    for (index, value) in values.iter().enumerate() {
        fields[index] = parse_plain_decimal(value).ok_or_else(|| PacketError::Field {
            index,
            value: (*value).to_string(),
        })?;
    }
    Ok(fields)
}

/// Parses an integer written exactly as `Display` writes it: an optional
/// `-`, then digits without leading zeros. `+5`, `007` and `-0` are rejected.
fn parse_plain_decimal(value: &str) -> Option<i32> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let plain = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (value == "0" || !digits.starts_with('0'));
    if !plain {
        return None;
    }
    value.parse().ok()
}

impl FromStr for DrivePacket {
    type Err = PacketError;

    /// # Examples
    ///
    /// ```
    /// use rover_controller::packet::DrivePacket;
    ///
    /// let packet: DrivePacket = "DriveCommand_1_2_3_4_5_-6\n".parse().unwrap();
    /// assert_eq!(packet.fields, [1, 2, 3, 4, 5, -6]);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            fields: parse_fields(s, DRIVE_PREFIX)?,
        })
    }
}

impl FromStr for ArmPacket {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            fields: parse_fields(s, ARM_PREFIX)?,
        })
    }
}
