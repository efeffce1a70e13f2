//! # Controller Input Mapper Module
//!
//! Turns a positional [`InputSnapshot`] into labelled inputs.
//!
//! ## Axis Labels
//!
//! | Index | Label | Description |
//! |-------|-------|-------------|
//! | 0 | LS-LR | Left stick left/right |
//! | 1 | LS-UD | Left stick up/down (left wheels) |
//! | 2 | RS-LR | Right stick left/right |
//! | 3 | RS-UD | Right stick up/down (right wheels) |
//! | 4 | LT | Left trigger (idles at -1.0) |
//! | 5 | RT | Right trigger (idles at -1.0) |
//!
//! ## Button Labels
//!
//! | Index | Label |
//! |-------|-------|
//! | 0 | A |
//! | 1 | B |
//! | 2 | X |
//! | 3 | Y |
//! | 4 | LB |
//! | 5 | RB |
//! | 6 | BACK |
//! | 7 | START |
//! | 8 | LS |
//! | 9 | RS |
//!
//! Only the first [`ACTUAL_BUTTONS_IN_USE`] buttons are mapped, whatever the
//! device reports. Axes past the label table are ignored.
//!
//! ## D-Pad
//!
//! Each hat decodes independently into a horizontal (`left`/`right`/"") and
//! a vertical (`up`/`down`/"") label.
//!
//! ## Usage
//!
//! ```
//! use rover_controller::controller::InputSnapshot;
//! use rover_controller::controller::mapper::{map, Axis, Button, Horizontal, Vertical};
//!
//! let snapshot = InputSnapshot {
//!     axes: vec![0.0, 1.0, 0.0, 0.5, -1.0, -1.0],
//!     buttons: vec![true, false],
//!     hats: vec![(1, 1)],
//! };
//! let mapped = map(&snapshot);
//!
//! assert_eq!(mapped.axis(Axis::LeftStickY), Some(1.0));
//! assert!(mapped.pressed(Button::A));
//! assert_eq!(mapped.dpad().horizontal, Horizontal::Right);
//! assert_eq!(mapped.dpad().vertical, Vertical::Up);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use super::{HatState, InputSnapshot};

/// Number of buttons with a semantic mapping.
pub const ACTUAL_BUTTONS_IN_USE: usize = 10;

/// Axis labels in positional order.
pub const AXIS_LABELS: [&str; 6] = ["LS-LR", "LS-UD", "RS-LR", "RS-UD", "LT", "RT"];

/// Button labels in positional order.
pub const BUTTON_LABELS: [&str; ACTUAL_BUTTONS_IN_USE] =
    ["A", "B", "X", "Y", "LB", "RB", "BACK", "START", "LS", "RS"];

/// Labelled analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
}

impl Axis {
    /// All axes in positional order.
    pub const ALL: [Axis; 6] = [
        Axis::LeftStickX,
        Axis::LeftStickY,
        Axis::RightStickX,
        Axis::RightStickY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];

    /// Display label of this axis.
    #[must_use]
    pub fn label(self) -> &'static str {
        AXIS_LABELS[self as usize]
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Labelled digital button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    LeftStick,
    RightStick,
}

impl Button {
    /// All mapped buttons in positional order.
    pub const ALL: [Button; ACTUAL_BUTTONS_IN_USE] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Back,
        Button::Start,
        Button::LeftStick,
        Button::RightStick,
    ];

    /// Display label of this button.
    #[must_use]
    pub fn label(self) -> &'static str {
        BUTTON_LABELS[self as usize]
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Horizontal D-pad direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Horizontal {
    Left,
    Right,
    #[default]
    Neutral,
}

impl Horizontal {
    /// `"left"`, `"right"` or `""`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Horizontal::Left => "left",
            Horizontal::Right => "right",
            Horizontal::Neutral => "",
        }
    }
}

/// Vertical D-pad direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vertical {
    Up,
    Down,
    #[default]
    Neutral,
}

impl Vertical {
    /// `"up"`, `"down"` or `""`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Vertical::Up => "up",
            Vertical::Down => "down",
            Vertical::Neutral => "",
        }
    }
}

/// Decoded D-pad state of one hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DPad {
    pub horizontal: Horizontal,
    pub vertical: Vertical,
}

impl DPad {
    /// Decodes a hat reading.
    ///
    /// # Examples
    ///
    /// ```
    /// use rover_controller::controller::mapper::{DPad, Horizontal, Vertical};
    ///
    /// let dpad = DPad::decode((-1, -1));
    /// assert_eq!(dpad.horizontal, Horizontal::Left);
    /// assert_eq!(dpad.vertical, Vertical::Down);
    /// ```
    #[must_use]
    pub fn decode(hat: HatState) -> Self {
        let horizontal = match hat.0 {
            1 => Horizontal::Right,
            -1 => Horizontal::Left,
            _ => Horizontal::Neutral,
        };
        let vertical = match hat.1 {
            1 => Vertical::Up,
            -1 => Vertical::Down,
            _ => Vertical::Neutral,
        };
        Self {
            horizontal,
            vertical,
        }
    }

    /// -1 (left), 0 or 1 (right).
    #[must_use]
    pub fn x(&self) -> i32 {
        match self.horizontal {
            Horizontal::Left => -1,
            Horizontal::Right => 1,
            Horizontal::Neutral => 0,
        }
    }

    /// -1 (down), 0 or 1 (up).
    #[must_use]
    pub fn y(&self) -> i32 {
        match self.vertical {
            Vertical::Down => -1,
            Vertical::Up => 1,
            Vertical::Neutral => 0,
        }
    }
}

/// Labelled view of one snapshot.
///
/// Inputs the device does not have are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedInput {
    pub axes: BTreeMap<Axis, f32>,
    pub buttons: BTreeMap<Button, bool>,
    pub dpads: Vec<DPad>,
}

impl MappedInput {
    /// Value of an axis, if the device has it.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> Option<f32> {
        self.axes.get(&axis).copied()
    }

    /// Whether a button is held. Missing buttons read as released.
    #[must_use]
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons.get(&button).copied().unwrap_or(false)
    }

    /// The first hat, or a neutral D-pad when the device has none.
    #[must_use]
    pub fn dpad(&self) -> DPad {
        self.dpads.first().copied().unwrap_or_default()
    }

    /// Whether nothing was mapped at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.buttons.is_empty() && self.dpads.is_empty()
    }
}

/// Maps a raw snapshot to labelled inputs.
#[must_use]
pub fn map(snapshot: &InputSnapshot) -> MappedInput {
    let axes = Axis::ALL
        .iter()
        .zip(snapshot.axes.iter())
        .map(|(&axis, &value)| (axis, value))
        .collect();

    let buttons = Button::ALL
        .iter()
        .zip(snapshot.buttons.iter())
        .map(|(&button, &pressed)| (button, pressed))
        .collect();

    let dpads = snapshot.hats.iter().map(|&hat| DPad::decode(hat)).collect();

    MappedInput {
        axes,
        buttons,
        dpads,
    }
}
