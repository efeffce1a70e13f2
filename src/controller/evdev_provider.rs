//! # Evdev Gamepad Provider
//!
//! [`InputProvider`] backed by the Linux evdev interface.
//!
//! ## Discovery
//!
//! Every `/dev/input/event*` node that exposes `BTN_SOUTH` and at least one
//! absolute axis is treated as a gamepad. The directory is rescanned at a
//! fixed interval so controllers can be plugged in and out while running.
//! A node that vanishes, or whose state can no longer be read, produces a
//! [`DeviceEvent::Detached`].
//!
//! ## Layouts
//!
//! | Pad | Sticks | Triggers |
//! |-----|--------|----------|
//! | Xbox (xpad) | ABS_X/ABS_Y, ABS_RX/ABS_RY | ABS_Z, ABS_RZ |
//! | DualSense (0x054c:0x0ce6) | ABS_X/ABS_Y, ABS_Z/ABS_RZ | ABS_RX, ABS_RY |
//!
//! Axes are normalised from the kernel min/max to -1.0..=1.0. Stick Y axes
//! and hat Y axes are inverted so up reads positive.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use evdev::{AbsoluteAxisType, Device as EvdevDevice, Key};
use tracing::{debug, info, warn};

use super::calibration::normalize_abs;
use super::{DeviceEvent, DeviceId, HatState, InputProvider, RawDevice};
use crate::error::{Result, RoverError};

/// Directory scanned for input event nodes.
pub const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Buttons in label order (A, B, X, Y, LB, RB, BACK, START, LS, RS).
const GAMEPAD_BUTTONS: [Key; 10] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_WEST,
    Key::BTN_NORTH,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_SELECT,
    Key::BTN_START,
    Key::BTN_THUMBL,
    Key::BTN_THUMBR,
];

const HAT_AXES: [(AbsoluteAxisType, AbsoluteAxisType); 4] = [
    (AbsoluteAxisType::ABS_HAT0X, AbsoluteAxisType::ABS_HAT0Y),
    (AbsoluteAxisType::ABS_HAT1X, AbsoluteAxisType::ABS_HAT1Y),
    (AbsoluteAxisType::ABS_HAT2X, AbsoluteAxisType::ABS_HAT2Y),
    (AbsoluteAxisType::ABS_HAT3X, AbsoluteAxisType::ABS_HAT3Y),
];

/// Which kernel axis feeds which label position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PadKind {
    Xbox,
    DualSense,
}

impl PadKind {
    fn detect(vendor: u16, product: u16) -> Self {
        if vendor == DUALSENSE_VENDOR_ID && product == DUALSENSE_PRODUCT_ID {
            PadKind::DualSense
        } else {
            PadKind::Xbox
        }
    }

    /// Preferred axis order: LS-LR, LS-UD, RS-LR, RS-UD, LT, RT.
    fn axis_order(self) -> [AbsoluteAxisType; 6] {
        match self {
            PadKind::Xbox => [
                AbsoluteAxisType::ABS_X,
                AbsoluteAxisType::ABS_Y,
                AbsoluteAxisType::ABS_RX,
                AbsoluteAxisType::ABS_RY,
                AbsoluteAxisType::ABS_Z,
                AbsoluteAxisType::ABS_RZ,
            ],
            PadKind::DualSense => [
                AbsoluteAxisType::ABS_X,
                AbsoluteAxisType::ABS_Y,
                AbsoluteAxisType::ABS_Z,
                AbsoluteAxisType::ABS_RZ,
                AbsoluteAxisType::ABS_RX,
                AbsoluteAxisType::ABS_RY,
            ],
        }
    }

    fn inverted_axes(self) -> [AbsoluteAxisType; 2] {
        match self {
            PadKind::Xbox => [AbsoluteAxisType::ABS_Y, AbsoluteAxisType::ABS_RY],
            PadKind::DualSense => [AbsoluteAxisType::ABS_Y, AbsoluteAxisType::ABS_RZ],
        }
    }
}

/// Positional layout of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    axes: Vec<AbsoluteAxisType>,
    inverted: Vec<AbsoluteAxisType>,
    buttons: Vec<Key>,
    hats: Vec<(AbsoluteAxisType, AbsoluteAxisType)>,
}

impl Layout {
    fn build(kind: PadKind, supported_axes: &[AbsoluteAxisType], supported_keys: &[Key]) -> Self {
        let is_hat = |axis: &AbsoluteAxisType| HAT_AXES.iter().any(|(x, y)| x == axis || y == axis);

        let mut axes: Vec<AbsoluteAxisType> = kind
            .axis_order()
            .into_iter()
            .filter(|axis| supported_axes.contains(axis))
            .collect();
        let mut rest: Vec<AbsoluteAxisType> = supported_axes
            .iter()
            .copied()
            .filter(|axis| !axes.contains(axis) && !is_hat(axis))
            .collect();
        rest.sort_by_key(|axis| axis.0);
        axes.extend(rest);

        let mut buttons: Vec<Key> = GAMEPAD_BUTTONS
            .into_iter()
            .filter(|key| supported_keys.contains(key))
            .collect();
        let mut extra: Vec<Key> = supported_keys
            .iter()
            .copied()
            .filter(|key| !buttons.contains(key))
            .collect();
        extra.sort_by_key(|key| key.code());
        buttons.extend(extra);

        let hats = HAT_AXES
            .into_iter()
            .filter(|(x, y)| supported_axes.contains(x) && supported_axes.contains(y))
            .collect();

        Self {
            axes,
            inverted: kind.inverted_axes().to_vec(),
            buttons,
            hats,
        }
    }
}

/// An opened gamepad node.
struct OpenDevice {
    path: PathBuf,
    device: EvdevDevice,
    layout: Layout,
    raw: RawDevice,
}

/// Gamepad provider reading `/dev/input/event*` nodes.
pub struct EvdevProvider {
    input_dir: PathBuf,
    name_filter: Option<String>,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
    next_instance_id: u32,
    devices: BTreeMap<DeviceId, OpenDevice>,
    /// Nodes inspected and rejected; forgotten once the node disappears.
    ignored: HashSet<PathBuf>,
    pending: Vec<DeviceEvent>,
}

impl std::fmt::Debug for EvdevProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevProvider")
            .field("input_dir", &self.input_dir)
            .field("devices", &self.devices.len())
            .finish_non_exhaustive()
    }
}

impl EvdevProvider {
    /// Creates a provider scanning [`DEFAULT_INPUT_DIR`].
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the input directory does not exist.
    pub fn new(name_filter: Option<String>, rescan_interval: Duration) -> Result<Self> {
        Self::with_input_dir(DEFAULT_INPUT_DIR, name_filter, rescan_interval)
    }

    /// Creates a provider scanning a custom directory.
    pub fn with_input_dir<P: AsRef<Path>>(
        input_dir: P,
        name_filter: Option<String>,
        rescan_interval: Duration,
    ) -> Result<Self> {
        let input_dir = input_dir.as_ref().to_path_buf();
        if !input_dir.is_dir() {
            return Err(RoverError::Controller(format!(
                "{} directory not found",
                input_dir.display()
            )));
        }

        Ok(Self {
            input_dir,
            name_filter: name_filter
                .filter(|filter| !filter.is_empty())
                .map(|filter| filter.to_lowercase()),
            rescan_interval,
            last_scan: None,
            next_instance_id: 0,
            devices: BTreeMap::new(),
            ignored: HashSet::new(),
            pending: Vec::new(),
        })
    }

    fn rescan_due(&self, now: Instant) -> bool {
        self.last_scan
            .map_or(true, |last| now.duration_since(last) >= self.rescan_interval)
    }

    fn event_nodes(&self) -> Result<Vec<PathBuf>> {
        let mut nodes: Vec<PathBuf> = std::fs::read_dir(&self.input_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with("event"))
                    .unwrap_or(false)
            })
            .collect();

        // Sorted for deterministic enumeration order
        nodes.sort();
        Ok(nodes)
    }

    fn rescan(&mut self) {
        let nodes = match self.event_nodes() {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Failed to scan {}: {}", self.input_dir.display(), e);
                return;
            }
        };

        // Nodes that disappeared since the last scan
        let gone: Vec<DeviceId> = self
            .devices
            .iter()
            .filter(|(_, open)| !nodes.contains(&open.path))
            .map(|(id, _)| *id)
            .collect();
        for id in gone {
            self.detach(id);
        }
        self.ignored.retain(|path| nodes.contains(path));

        for (index, path) in nodes.into_iter().enumerate() {
            let known = self.devices.values().any(|open| open.path == path);
            if known || self.ignored.contains(&path) {
                continue;
            }

            match EvdevDevice::open(&path) {
                Ok(device) => {
                    if let Some(open) = self.inspect(path.clone(), index, device) {
                        info!(
                            "Found gamepad at {}: {}",
                            open.path.display(),
                            open.raw.name
                        );
                        let id = open.raw.instance_id.unwrap_or(DeviceId(0));
                        self.pending.push(DeviceEvent::Attached(open.raw.clone()));
                        self.devices.insert(id, open);
                    } else {
                        self.ignored.insert(path);
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                    self.ignored.insert(path);
                }
            }
        }
    }

    /// Builds the layout of a candidate node, or `None` if it is not a
    /// gamepad we accept.
    fn inspect(&mut self, path: PathBuf, index: usize, device: EvdevDevice) -> Option<OpenDevice> {
        let keys: Vec<Key> = device
            .supported_keys()
            .map(|keys| keys.iter().collect())
            .unwrap_or_default();
        let axes: Vec<AbsoluteAxisType> = device
            .supported_absolute_axes()
            .map(|axes| axes.iter().collect())
            .unwrap_or_default();

        if !keys.contains(&Key::BTN_SOUTH) || axes.is_empty() {
            debug!("Skipping non-gamepad input device {}", path.display());
            return None;
        }

        let name = device.name().unwrap_or("Unknown gamepad").to_string();
        if let Some(filter) = &self.name_filter {
            if !name.to_lowercase().contains(filter) {
                debug!("Skipping {} ({}): does not match name filter", path.display(), name);
                return None;
            }
        }

        let id = device.input_id();
        let kind = PadKind::detect(id.vendor(), id.product());
        let layout = Layout::build(kind, &axes, &keys);

        let instance_id = DeviceId(self.next_instance_id);
        self.next_instance_id = self.next_instance_id.wrapping_add(1);

        let raw = RawDevice {
            instance_id: Some(instance_id),
            index,
            name,
            guid: sdl_guid(id.bus_type().0, id.vendor(), id.product(), id.version()),
            axis_count: layout.axes.len(),
            button_count: layout.buttons.len(),
            hat_count: layout.hats.len(),
        };

        Some(OpenDevice {
            path,
            device,
            layout,
            raw,
        })
    }

    fn detach(&mut self, id: DeviceId) {
        if let Some(open) = self.devices.remove(&id) {
            info!("Gamepad at {} went away", open.path.display());
            self.pending.push(DeviceEvent::Detached(id));
        }
    }

    /// Runs a state read on an open device, detaching it when the read fails.
    fn read_with<T>(
        &mut self,
        id: DeviceId,
        read: impl FnOnce(&OpenDevice) -> std::io::Result<T>,
    ) -> Result<T> {
        let open = self
            .devices
            .get(&id)
            .ok_or(RoverError::DeviceUnavailable(id))?;

        match read(open) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Failed to read controller {}: {}", id, e);
                self.detach(id);
                Err(RoverError::DeviceUnavailable(id))
            }
        }
    }
}

impl InputProvider for EvdevProvider {
    fn list_devices(&self) -> Vec<RawDevice> {
        self.devices.values().map(|open| open.raw.clone()).collect()
    }

    fn poll_events(&mut self) -> Vec<DeviceEvent> {
        let now = Instant::now();
        if self.rescan_due(now) {
            self.last_scan = Some(now);
            self.rescan();
        }
        std::mem::take(&mut self.pending)
    }

    fn read_axes(&mut self, id: DeviceId) -> Result<Vec<f32>> {
        self.read_with(id, |open| {
            let state = open.device.get_abs_state()?;
            Ok(open
                .layout
                .axes
                .iter()
                .map(|axis| {
                    let info = &state[axis.0 as usize];
                    let value = normalize_abs(info.value, info.minimum, info.maximum);
                    if open.layout.inverted.contains(axis) {
                        -value
                    } else {
                        value
                    }
                })
                .collect())
        })
    }

    fn read_buttons(&mut self, id: DeviceId) -> Result<Vec<bool>> {
        self.read_with(id, |open| {
            let state = open.device.get_key_state()?;
            Ok(open
                .layout
                .buttons
                .iter()
                .map(|key| state.contains(*key))
                .collect())
        })
    }

    fn read_hats(&mut self, id: DeviceId) -> Result<Vec<HatState>> {
        self.read_with(id, |open| {
            let state = open.device.get_abs_state()?;
            Ok(open
                .layout
                .hats
                .iter()
                .map(|(x, y)| {
                    let hat_x = state[x.0 as usize].value.signum() as i8;
                    // Kernel reports -1 for up
                    let hat_y = -(state[y.0 as usize].value.signum() as i8);
                    (hat_x, hat_y)
                })
                .collect())
        })
    }
}

/// SDL-compatible joystick GUID built from the evdev input id.
///
/// Returns `None` when the device reports neither vendor nor product.
#[must_use]
pub fn sdl_guid(bus: u16, vendor: u16, product: u16, version: u16) -> Option<String> {
    if vendor == 0 && product == 0 {
        return None;
    }

    let mut bytes = [0u8; 16];
    bytes[0..2].copy_from_slice(&bus.to_le_bytes());
    bytes[4..6].copy_from_slice(&vendor.to_le_bytes());
    bytes[8..10].copy_from_slice(&product.to_le_bytes());
    bytes[12..14].copy_from_slice(&version.to_le_bytes());

    Some(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}
