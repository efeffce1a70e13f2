//! # Calibration Module
//!
//! Shapes normalised controller input before it becomes an actuator command.
//!
//! ## Deadzone
//!
//! Stick readings within the deadzone map to 0.0 so a resting stick never
//! creeps the wheels. Readings outside are rescaled to use the full range.
//!
//! ## Exponential Curve
//!
//! `output = (1 - expo) * input + expo * input³` softens the response near
//! center while keeping full deflection at the endpoints.
//!
//! ## Quantization
//!
//! Drive modes other than 0 snap the shaped value to `n` discrete speed
//! steps per direction, see [`quantize`].
//!
//! ## Usage
//!
//! ```
//! use rover_controller::controller::calibration::{Calibration, quantize, to_command};
//!
//! let cal = Calibration::new(0.05, 0.0);
//! assert_eq!(cal.apply(0.02), 0.0);
//!
//! let shaped = cal.apply(1.0);
//! assert_eq!(to_command(quantize(shaped, 3), 100), 100);
//! ```

/// Deadzone and expo applied to a value in -1.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Deadzone as a fraction (0.0 to 0.25).
    deadzone: f32,
    /// Exponential curve factor (0.0 to 1.0).
    expo: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            deadzone: 0.05,
            expo: 0.0,
        }
    }
}

impl Calibration {
    /// Creates a calibration, clamping deadzone to 0.0..=0.25 and expo to
    /// 0.0..=1.0.
    #[must_use]
    pub fn new(deadzone: f32, expo: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.25),
            expo: expo.clamp(0.0, 1.0),
        }
    }

    /// No deadzone, no expo.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            deadzone: 0.0,
            expo: 0.0,
        }
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    #[must_use]
    pub fn expo(&self) -> f32 {
        self.expo
    }

    /// Applies deadzone then expo. Input outside -1.0..=1.0 is clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use rover_controller::controller::calibration::Calibration;
    ///
    /// let cal = Calibration::new(0.05, 0.3);
    /// assert_eq!(cal.apply(-0.02), 0.0);
    /// assert!((cal.apply(-1.0) + 1.0).abs() < 0.001);
    /// ```
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        let input = input.clamp(-1.0, 1.0);
        let sign = input.signum();
        let shaped = self.apply_expo(self.apply_deadzone(input.abs()));
        sign * shaped
    }

    #[inline]
    fn apply_deadzone(&self, abs_input: f32) -> f32 {
        if abs_input <= self.deadzone {
            0.0
        } else {
            (abs_input - self.deadzone) / (1.0 - self.deadzone)
        }
    }

    #[inline]
    fn apply_expo(&self, input: f32) -> f32 {
        if self.expo == 0.0 {
            input
        } else {
            (1.0 - self.expo) * input + self.expo * input * input * input
        }
    }
}

/// Calibration for the stick axes that drive the wheels and for the arm
/// triggers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputCalibration {
    /// Applied to LS-UD and RS-UD.
    pub drive: Calibration,
    /// Deadzone on trigger travel (0.0 to 0.25).
    pub trigger_deadzone: f32,
}

impl Default for InputCalibration {
    fn default() -> Self {
        Self {
            drive: Calibration::new(0.05, 0.0),
            trigger_deadzone: 0.10,
        }
    }
}

impl InputCalibration {
    /// Builds the calibration from the `[input]` config values.
    #[must_use]
    pub fn from_config(deadzone_stick: f32, deadzone_trigger: f32, expo_drive: f32) -> Self {
        Self {
            drive: Calibration::new(deadzone_stick, expo_drive),
            trigger_deadzone: deadzone_trigger.clamp(0.0, 0.25),
        }
    }

    /// Converts a trigger axis (-1.0 idle, 1.0 fully pressed) to travel in
    /// 0.0..=1.0 with the trigger deadzone applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use rover_controller::controller::calibration::InputCalibration;
    ///
    /// let cal = InputCalibration::default();
    /// assert_eq!(cal.apply_trigger(-1.0), 0.0);
    /// assert!((cal.apply_trigger(1.0) - 1.0).abs() < 0.001);
    /// ```
    #[must_use]
    pub fn apply_trigger(&self, axis_value: f32) -> f32 {
        let travel = trigger_travel(axis_value);
        if travel <= self.trigger_deadzone {
            0.0
        } else {
            (travel - self.trigger_deadzone) / (1.0 - self.trigger_deadzone)
        }
    }
}

/// Maps a raw kernel axis value in `min..=max` to -1.0..=1.0.
///
/// A degenerate range (`max <= min`) reads as center.
#[must_use]
pub fn normalize_abs(value: i32, min: i32, max: i32) -> f32 {
    if max <= min {
        return 0.0;
    }
    let span = (max as f32) - (min as f32);
    let offset = (value as f32) - (min as f32);
    (2.0 * offset / span - 1.0).clamp(-1.0, 1.0)
}

/// Trigger axis (-1.0..=1.0) to travel (0.0..=1.0).
#[must_use]
pub fn trigger_travel(axis_value: f32) -> f32 {
    ((axis_value.clamp(-1.0, 1.0) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Snaps a value in -1.0..=1.0 to `steps` discrete levels per direction.
///
/// `steps == 0` leaves the value continuous. Otherwise the magnitude is
/// rounded to the nearest multiple of `1/steps`, so full deflection stays
/// full and the mapping is monotonic.
///
/// # Examples
///
/// ```
/// use rover_controller::controller::calibration::quantize;
///
/// assert_eq!(quantize(0.4, 0), 0.4);
/// assert_eq!(quantize(0.4, 1), 0.0);
/// assert_eq!(quantize(0.6, 1), 1.0);
/// assert_eq!(quantize(-0.6, 2), -0.5);
/// ```
#[must_use]
pub fn quantize(value: f32, steps: u8) -> f32 {
    let value = value.clamp(-1.0, 1.0);
    if steps == 0 {
        return value;
    }
    let steps = f32::from(steps);
    value.signum() * (value.abs() * steps).round() / steps
}

/// Scales a value in -1.0..=1.0 to an integer command in
/// `-max_command..=max_command`. A negative `max_command` counts as 0.
#[must_use]
pub fn to_command(normalized: f32, max_command: i32) -> i32 {
    let max_command = max_command.max(0);
    let clamped = normalized.clamp(-1.0, 1.0);
    let scaled = (clamped * max_command as f32).round() as i32;
    scaled.clamp(-max_command, max_command)
}
