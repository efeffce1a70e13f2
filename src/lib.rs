//! # Rover Controller Library
//!
//! Drive a six-wheel rover and its arm from a gamepad.
//!
//! Gamepad input is read through an [`InputProvider`](controller::InputProvider),
//! resolved into twelve actuator commands and sent as two text packets per
//! frame (`DriveCommand_...` and `ArmCommand_...`) to the drive and arm
//! microcontrollers over UDP or serial links.

pub mod actuator;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod packet;
pub mod telemetry;
pub mod transmit;
