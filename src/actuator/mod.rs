//! # Actuator Module
//!
//! The twelve rover actuator commands and the per-side drive mode.
//!
//! | Group | Fields |
//! |-------|--------|
//! | Drive | leftWheel1..3, rightWheel1..3 |
//! | Arm | upperExtender, lowerExtender, screwdriver, claw, hoist, swivel |
//!
//! Every field is an integer command in `-max_command..=max_command`
//! (100 by default) and is rewritten on every frame by [`resolver`].

pub mod resolver;

use std::fmt;

use serde::Serialize;

/// Drive mode options in cycling order.
///
/// The option is the number of discrete speed steps per direction; `0` is
/// continuous proportional control.
pub const DRIVE_MODE_OPTIONS: [u8; 5] = [0, 1, 2, 3, 6];

/// Selected drive mode of one side of the rover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveMode {
    index: usize,
}

impl DriveMode {
    /// Mode at `index`, wrapped into the option list.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self {
            index: index % DRIVE_MODE_OPTIONS.len(),
        }
    }

    /// Position in [`DRIVE_MODE_OPTIONS`].
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// Option value (speed steps, 0 = continuous).
    #[must_use]
    pub fn option(self) -> u8 {
        DRIVE_MODE_OPTIONS[self.index]
    }

    /// The next mode, wrapping from the last option back to the first.
    ///
    /// # Examples
    ///
    /// ```
    /// use rover_controller::actuator::DriveMode;
    ///
    /// let mode = DriveMode::from_index(4);
    /// assert_eq!(mode.option(), 6);
    /// assert_eq!(mode.next().option(), 0);
    /// ```
    #[must_use]
    pub fn next(self) -> Self {
        Self::from_index(self.index + 1)
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.option() {
            0 => write!(f, "continuous"),
            steps => write!(f, "{}-step", steps),
        }
    }
}

/// Commands for every actuator on the rover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorState {
    pub left_wheel1: i32,
    pub left_wheel2: i32,
    pub left_wheel3: i32,
    pub right_wheel1: i32,
    pub right_wheel2: i32,
    pub right_wheel3: i32,
    pub upper_extender: i32,
    pub lower_extender: i32,
    pub screwdriver: i32,
    pub claw: i32,
    pub hoist: i32,
    pub swivel: i32,
}

impl ActuatorState {
    /// All actuators stopped.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Whether every actuator is stopped.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_mode_default_is_continuous() {
        let mode = DriveMode::default();
        assert_eq!(mode.index(), 0);
        assert_eq!(mode.option(), 0);
        assert_eq!(mode.to_string(), "continuous");
    }

    #[test]
    fn test_drive_mode_cycles_in_order() {
        let mut mode = DriveMode::default();
        let mut seen = vec![mode.option()];
        for _ in 1..DRIVE_MODE_OPTIONS.len() {
            mode = mode.next();
            seen.push(mode.option());
        }
        assert_eq!(seen, DRIVE_MODE_OPTIONS.to_vec());
    }

    #[test]
    fn test_drive_mode_wraps() {
        let last = DriveMode::from_index(DRIVE_MODE_OPTIONS.len() - 1);
        assert_eq!(last.next(), DriveMode::default());
        assert_eq!(DriveMode::from_index(7).index(), 2);
    }

    #[test]
    fn test_drive_mode_display() {
        assert_eq!(DriveMode::from_index(3).to_string(), "3-step");
    }

    #[test]
    fn test_neutral_state() {
        let state = ActuatorState::neutral();
        assert!(state.is_neutral());

        let moving = ActuatorState {
            claw: 1,
            ..ActuatorState::neutral()
        };
        assert!(!moving.is_neutral());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = ActuatorState {
            left_wheel1: 5,
            upper_extender: -3,
            ..ActuatorState::neutral()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"leftWheel1\":5"));
        assert!(json.contains("\"upperExtender\":-3"));
    }
}
