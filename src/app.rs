//! # Application Context
//!
//! One iteration of the control loop, with all loop state owned by [`App`].
//!
//! Each [`App::step`] runs, in order:
//! 1. Drain provider events (attach, detach, quit)
//! 2. Ask the transmission gate whether a frame is due
//! 3. Snapshot the active device, map, resolve and format
//! 4. Dispatch both packets and record the frame

use chrono::Utc;
use tracing::{debug, info, trace, warn};

use crate::actuator::resolver::{ActuatorResolver, ResolverSettings};
use crate::actuator::ActuatorState;
use crate::config::Config;
use crate::controller::calibration::InputCalibration;
use crate::controller::mapper::map;
use crate::controller::tracker::DeviceTracker;
use crate::controller::{DeviceEvent, InputProvider, InputSnapshot};
use crate::error::RoverError;
use crate::packet::{format, ArmPacket, DrivePacket};
use crate::telemetry::{FrameRecord, FrameRecorder};
use crate::transmit::{TransmissionGate, Transmitter};

/// Number of frames between status log messages (10 s at 60 FPS).
pub const LOG_INTERVAL_FRAMES: u64 = 600;

/// Outcome of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No frame was due.
    Idle,
    /// A frame was emitted.
    Frame(FrameReport),
    /// A quit event was received; the loop should stop.
    Shutdown,
}

/// What was emitted for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub device: Option<String>,
    pub state: ActuatorState,
    pub drive: DrivePacket,
    pub arm: ArmPacket,
    pub failed_sends: usize,
}

/// Resolver settings derived from the `[input]` and `[drive]` sections.
pub fn resolver_settings(config: &Config) -> ResolverSettings {
    ResolverSettings {
        calibration: InputCalibration::from_config(
            config.input.deadzone_stick,
            config.input.deadzone_trigger,
            config.input.expo_drive,
        ),
        max_command: config.drive.max_command,
        ..ResolverSettings::default()
    }
}

/// Control loop state.
pub struct App<P: InputProvider> {
    provider: P,
    tracker: DeviceTracker,
    resolver: ActuatorResolver,
    gate: TransmissionGate,
    transmitter: Transmitter,
    recorder: Option<FrameRecorder>,
    frames: u64,
    quit_requested: bool,
}

impl<P: InputProvider> App<P> {
    pub fn new(
        provider: P,
        settings: ResolverSettings,
        gate: TransmissionGate,
        transmitter: Transmitter,
        recorder: Option<FrameRecorder>,
    ) -> Self {
        Self {
            provider,
            tracker: DeviceTracker::new(),
            resolver: ActuatorResolver::new(settings),
            gate,
            transmitter,
            recorder,
            frames: 0,
            quit_requested: false,
        }
    }

    /// Runs one loop iteration at monotonic time `now_ms`.
    pub async fn step(&mut self, now_ms: u64) -> Step {
        self.drain_events();

        let step = if self.gate.tick(now_ms) {
            Step::Frame(self.emit_frame().await)
        } else {
            Step::Idle
        };

        if self.quit_requested {
            Step::Shutdown
        } else {
            step
        }
    }

    /// Makes the next [`step`](Self::step) return [`Step::Shutdown`].
    pub fn request_shutdown(&mut self) {
        self.quit_requested = true;
    }

    /// Closes links and logs totals.
    pub fn shutdown(&mut self) {
        let stats = self.transmitter.stats();
        info!(
            "Shutting down after {} frames ({} packets sent, {} send failures)",
            stats.frames, stats.sent, stats.failures
        );
        self.transmitter.close();
        self.recorder = None;
    }

    pub fn tracker(&self) -> &DeviceTracker {
        &self.tracker
    }

    pub fn resolver(&self) -> &ActuatorResolver {
        &self.resolver
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.transmitter
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    fn drain_events(&mut self) {
        for event in self.provider.poll_events() {
            match event {
                DeviceEvent::Attached(raw) => {
                    self.tracker.on_attach(raw);
                }
                DeviceEvent::Detached(id) => {
                    self.tracker.on_detach(id);
                }
                DeviceEvent::Quit => {
                    info!("Quit requested");
                    self.quit_requested = true;
                }
            }
        }
    }

    fn read_active(&mut self) -> (Option<String>, InputSnapshot) {
        let Some(device) = self.tracker.select_active() else {
            return (None, InputSnapshot::empty());
        };
        let id = device.id;
        let source = device.source;
        let name = device.name.clone();

        match self.provider.snapshot(source) {
            Ok(snapshot) => (Some(name), snapshot),
            Err(e) => {
                match e {
                    RoverError::DeviceUnavailable(_) => {
                        warn!("Lost controller {} ({}), stopping all actuators", id, name)
                    }
                    other => warn!(
                        "Failed to read controller {} ({}): {}, stopping all actuators",
                        id, name, other
                    ),
                }
                self.tracker.remove(id);
                (None, InputSnapshot::empty())
            }
        }
    }

    async fn emit_frame(&mut self) -> FrameReport {
        let (device, snapshot) = self.read_active();
        let input = map(&snapshot);
        let state = self.resolver.resolve(&input);
        let (drive, arm) = format(&state);

        let failed_sends = self.transmitter.dispatch(&drive, &arm).await;
        self.record(device.as_deref(), &drive, &arm, state);

        self.frames += 1;
        trace!("Frame {}: {} {}", self.frames, drive, arm);
        if self.frames % LOG_INTERVAL_FRAMES == 0 {
            let memory = self.resolver.memory();
            debug!(
                "Sent {} frames (controller: {}, left mode {}, right mode {})",
                self.frames,
                device.as_deref().unwrap_or("none"),
                memory.left_mode,
                memory.right_mode
            );
        }

        FrameReport {
            device,
            state,
            drive,
            arm,
            failed_sends,
        }
    }

    fn record(&mut self, device: Option<&str>, drive: &DrivePacket, arm: &ArmPacket, state: ActuatorState) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        let memory = self.resolver.memory();
        let record = FrameRecord::new(
            Utc::now(),
            device,
            (memory.left_mode, memory.right_mode),
            (drive, arm),
            state,
        );
        if let Err(e) = recorder.record(&record) {
            warn!("{}, disabling frame recording", e);
            self.recorder = None;
        }
    }
}
