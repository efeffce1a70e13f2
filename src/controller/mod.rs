//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - The [`InputProvider`] seam that supplies attach/detach events and raw
//!   axis, button and hat readings
//! - Linux evdev gamepad discovery and hot-plug via [`evdev_provider`]
//! - Tracking attached devices and the single active device
//! - Mapping raw readings to labelled inputs and decoding the D-pad
//! - Deadzones and expo curves

pub mod calibration;
pub mod evdev_provider;
pub mod mapper;
pub mod tracker;

use std::fmt;

use crate::error::Result;

/// Stable identifier of an attached input device.
///
/// Unique for as long as the device stays attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Device description reported by a provider when a device is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    /// Provider instance id, when the provider can supply one.
    pub instance_id: Option<DeviceId>,
    /// Position of the device in the provider's enumeration.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Platform GUID, absent when the platform cannot report one.
    pub guid: Option<String>,
    pub axis_count: usize,
    pub button_count: usize,
    pub hat_count: usize,
}

/// An attached device as tracked by [`tracker::DeviceTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Tracker id, unique among attached devices.
    pub id: DeviceId,
    /// Id the provider knows the device by (instance id, else enumeration
    /// index). Used for reads and matched against detach events.
    pub source: DeviceId,
    pub name: String,
    pub guid: Option<String>,
    pub axis_count: usize,
    pub button_count: usize,
    pub hat_count: usize,
}

/// Discrete events drained from the provider once per loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A device was connected.
    Attached(RawDevice),
    /// A device was disconnected, identified by the provider's id.
    Detached(DeviceId),
    /// The user asked the application to close.
    Quit,
}

/// Hat (D-pad) reading: `x` is -1 left / 1 right, `y` is -1 down / 1 up.
pub type HatState = (i8, i8);

/// Raw readings of one device for one frame.
///
/// Axes are normalised to -1.0..=1.0. Sticks report +1.0 for up and right;
/// analog triggers idle at -1.0 and reach +1.0 when fully pressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatState>,
}

impl InputSnapshot {
    /// Snapshot with no axes, buttons or hats (no active device).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Source of attach/detach events and per-device raw readings.
///
/// Reads of a device that has gone away fail with
/// [`RoverError::DeviceUnavailable`](crate::error::RoverError::DeviceUnavailable).
pub trait InputProvider {
    /// Currently attached devices.
    fn list_devices(&self) -> Vec<RawDevice>;

    /// Drain events that occurred since the previous call.
    fn poll_events(&mut self) -> Vec<DeviceEvent>;

    /// Axis values of a device, in the provider's layout order.
    fn read_axes(&mut self, id: DeviceId) -> Result<Vec<f32>>;

    /// Button states of a device.
    fn read_buttons(&mut self, id: DeviceId) -> Result<Vec<bool>>;

    /// Hat states of a device.
    fn read_hats(&mut self, id: DeviceId) -> Result<Vec<HatState>>;

    /// Read axes, buttons and hats of a device in one go.
    fn snapshot(&mut self, id: DeviceId) -> Result<InputSnapshot> {
        Ok(InputSnapshot {
            axes: self.read_axes(id)?,
            buttons: self.read_buttons(id)?,
            hats: self.read_hats(id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoverError;

    struct FixedProvider {
        snapshot: InputSnapshot,
        attached: bool,
    }

    impl InputProvider for FixedProvider {
        fn list_devices(&self) -> Vec<RawDevice> {
            Vec::new()
        }

        fn poll_events(&mut self) -> Vec<DeviceEvent> {
            Vec::new()
        }

        fn read_axes(&mut self, id: DeviceId) -> Result<Vec<f32>> {
            if !self.attached {
                return Err(RoverError::DeviceUnavailable(id));
            }
            Ok(self.snapshot.axes.clone())
        }

        fn read_buttons(&mut self, _id: DeviceId) -> Result<Vec<bool>> {
            Ok(self.snapshot.buttons.clone())
        }

        fn read_hats(&mut self, _id: DeviceId) -> Result<Vec<HatState>> {
            Ok(self.snapshot.hats.clone())
        }
    }

    #[test]
    fn test_snapshot_composes_reads() {
        let expected = InputSnapshot {
            axes: vec![0.0, 0.5],
            buttons: vec![true, false],
            hats: vec![(1, -1)],
        };
        let mut provider = FixedProvider {
            snapshot: expected.clone(),
            attached: true,
        };

        let snapshot = provider.snapshot(DeviceId(3)).unwrap();
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn test_snapshot_propagates_unavailable() {
        let mut provider = FixedProvider {
            snapshot: InputSnapshot::empty(),
            attached: false,
        };

        match provider.snapshot(DeviceId(7)) {
            Err(RoverError::DeviceUnavailable(id)) => assert_eq!(id, DeviceId(7)),
            other => panic!("Expected DeviceUnavailable, got: {:?}", other),
        }
    }

    #[test]
    fn test_device_id_display() {
        assert_eq!(DeviceId(4).to_string(), "#4");
    }
}
