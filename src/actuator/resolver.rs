//! # Actuator State Resolver
//!
//! Converts labelled controller input into the twelve actuator commands.
//!
//! ## Input Assignments
//!
//! | Actuator | Input | Positive direction |
//! |----------|-------|--------------------|
//! | leftWheel1..3 | LS-UD | stick up (forward) |
//! | rightWheel1..3 | RS-UD | stick up (forward) |
//! | upperExtender | D-pad vertical | up |
//! | lowerExtender | Y / A | Y |
//! | screwdriver | RT − LT | RT |
//! | claw | B / X | B (close) |
//! | hoist | RB / LB | RB |
//! | swivel | D-pad horizontal | right |
//! | left drive mode | LS click | cycles on press |
//! | right drive mode | RS click | cycles on press |
//!
//! ## Wheel Curve
//!
//! `command = round(quantize(calibrate(stick), mode) * max_command)`, where
//! `calibrate` applies the stick deadzone and expo and `quantize` snaps to the
//! drive mode's step count (see
//! [`quantize`](crate::controller::calibration::quantize)). Mode 0 is
//! proportional, so full stick is exactly `max_command`.
//!
//! Mode buttons are edge-triggered: holding a stick click advances the mode
//! once, on the frame where it goes from released to pressed.

use tracing::info;

use super::{ActuatorState, DriveMode};
use crate::controller::calibration::{quantize, to_command, InputCalibration};
use crate::controller::mapper::{Axis, Button, MappedInput};

/// Default full-scale actuator command.
pub const DEFAULT_MAX_COMMAND: i32 = 100;

/// Fixed parameters of the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub calibration: InputCalibration,
    /// Full-scale command value; outputs stay within `-max..=max`. Negative
    /// values count as 0.
    pub max_command: i32,
    pub left_mode_button: Button,
    pub right_mode_button: Button,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            calibration: InputCalibration::default(),
            max_command: DEFAULT_MAX_COMMAND,
            left_mode_button: Button::LeftStick,
            right_mode_button: Button::RightStick,
        }
    }
}

/// State carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverMemory {
    pub left_mode: DriveMode,
    pub right_mode: DriveMode,
    left_button_was_down: bool,
    right_button_was_down: bool,
}

impl ResolverMemory {
    /// Memory with the given modes and both mode buttons released.
    #[must_use]
    pub fn with_modes(left_mode: DriveMode, right_mode: DriveMode) -> Self {
        Self {
            left_mode,
            right_mode,
            ..Self::default()
        }
    }
}

/// Resolves one frame.
///
/// Pure: the returned memory must be passed back in for the next frame.
#[must_use]
pub fn resolve(
    input: &MappedInput,
    previous: &ResolverMemory,
    settings: &ResolverSettings,
) -> (ActuatorState, ResolverMemory) {
    let left_down = input.pressed(settings.left_mode_button);
    let right_down = input.pressed(settings.right_mode_button);

    let mut memory = *previous;
    if left_down && !previous.left_button_was_down {
        memory.left_mode = previous.left_mode.next();
    }
    if right_down && !previous.right_button_was_down {
        memory.right_mode = previous.right_mode.next();
    }
    memory.left_button_was_down = left_down;
    memory.right_button_was_down = right_down;

    let max = settings.max_command.max(0);
    let left = wheel_command(input.axis(Axis::LeftStickY), memory.left_mode, settings);
    let right = wheel_command(input.axis(Axis::RightStickY), memory.right_mode, settings);

    let dpad = input.dpad();
    let triggers = settings
        .calibration
        .apply_trigger(input.axis(Axis::RightTrigger).unwrap_or(-1.0))
        - settings
            .calibration
            .apply_trigger(input.axis(Axis::LeftTrigger).unwrap_or(-1.0));

    let state = ActuatorState {
        left_wheel1: left,
        left_wheel2: left,
        left_wheel3: left,
        right_wheel1: right,
        right_wheel2: right,
        right_wheel3: right,
        upper_extender: dpad.y() * max,
        lower_extender: button_pair(input, Button::Y, Button::A) * max,
        screwdriver: to_command(triggers, max),
        claw: button_pair(input, Button::B, Button::X) * max,
        hoist: button_pair(input, Button::RightBumper, Button::LeftBumper) * max,
        swivel: dpad.x() * max,
    };

    (state, memory)
}

fn wheel_command(stick: Option<f32>, mode: DriveMode, settings: &ResolverSettings) -> i32 {
    let shaped = settings.calibration.drive.apply(stick.unwrap_or(0.0));
    to_command(quantize(shaped, mode.option()), settings.max_command)
}

/// +1 when only `positive` is held, -1 when only `negative` is, else 0.
fn button_pair(input: &MappedInput, positive: Button, negative: Button) -> i32 {
    i32::from(input.pressed(positive)) - i32::from(input.pressed(negative))
}

/// Stateful wrapper keeping [`ResolverMemory`] between frames.
#[derive(Debug, Clone, Default)]
pub struct ActuatorResolver {
    settings: ResolverSettings,
    memory: ResolverMemory,
}

impl ActuatorResolver {
    #[must_use]
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            memory: ResolverMemory::default(),
        }
    }

    /// Resolves the next frame and remembers mode and button state.
    pub fn resolve(&mut self, input: &MappedInput) -> ActuatorState {
        let (state, memory) = resolve(input, &self.memory, &self.settings);

        if memory.left_mode != self.memory.left_mode {
            info!("Left drive mode -> {}", memory.left_mode);
        }
        if memory.right_mode != self.memory.right_mode {
            info!("Right drive mode -> {}", memory.right_mode);
        }

        self.memory = memory;
        state
    }

    #[must_use]
    pub fn memory(&self) -> &ResolverMemory {
        &self.memory
    }

    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }
}
