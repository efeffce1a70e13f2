//! # Transmission Gate
//!
//! Fixed-rate limiter deciding on which loop iterations a frame is emitted.
//!
//! Elapsed time accumulates between ticks. Once it reaches
//! `ceil(1000 / fps)` milliseconds the gate emits and keeps only the
//! remainder below one period, so a slow host loop emits late but never
//! emits twice to catch up.

/// Nominal frame rate.
pub const DEFAULT_FPS: u32 = 60;

/// Frame period in whole milliseconds for a frame rate, rounded up.
///
/// # Examples
///
/// ```
/// use rover_controller::transmit::gate::frame_every_millis;
///
/// assert_eq!(frame_every_millis(60), 17);
/// assert_eq!(frame_every_millis(50), 20);
/// ```
#[must_use]
pub fn frame_every_millis(fps: u32) -> u64 {
    let fps = u64::from(fps.max(1));
    (1000 + fps - 1) / fps
}

/// Accumulating frame-rate gate.
#[derive(Debug, Clone)]
pub struct TransmissionGate {
    threshold_ms: u64,
    accumulated_ms: u64,
    last_now_ms: Option<u64>,
}

impl Default for TransmissionGate {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl TransmissionGate {
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            threshold_ms: frame_every_millis(fps),
            accumulated_ms: 0,
            last_now_ms: None,
        }
    }

    /// Feeds the current monotonic time in milliseconds.
    ///
    /// The first call only establishes the time base. A clock that goes
    /// backwards counts as zero elapsed time.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let elapsed = match self.last_now_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        self.last_now_ms = Some(now_ms);
        self.advance(elapsed)
    }

    /// Adds elapsed time and reports whether a frame is due.
    pub fn advance(&mut self, elapsed_ms: u64) -> bool {
        self.accumulated_ms = self.accumulated_ms.saturating_add(elapsed_ms);
        if self.accumulated_ms < self.threshold_ms {
            return false;
        }
        self.accumulated_ms %= self.threshold_ms;
        true
    }

    #[must_use]
    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    #[must_use]
    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_for_60_fps() {
        assert_eq!(TransmissionGate::default().threshold_ms(), 17);
    }

    #[test]
    fn test_frame_every_millis_exact_division() {
        assert_eq!(frame_every_millis(250), 4);
        assert_eq!(frame_every_millis(1000), 1);
        assert_eq!(frame_every_millis(0), 1000); // clamped to 1 fps
    }

    #[test]
    fn test_below_threshold_never_emits() {
        let mut gate = TransmissionGate::default();
        for elapsed in [3, 5, 4, 4] {
            assert!(!gate.advance(elapsed));
        }
        assert_eq!(gate.accumulated_ms(), 16);
    }

    #[test]
    fn test_emits_once_and_keeps_remainder() {
        let mut gate = TransmissionGate::default();
        assert!(!gate.advance(10));
        assert!(gate.advance(10));
        assert_eq!(gate.accumulated_ms(), 3);
        assert!(!gate.advance(13));
        assert!(gate.advance(1));
        assert_eq!(gate.accumulated_ms(), 0);
    }

    #[test]
    fn test_slow_loop_does_not_catch_up() {
        let mut gate = TransmissionGate::default();
        assert!(gate.advance(100));
        assert!(gate.accumulated_ms() < gate.threshold_ms());
        assert!(!gate.advance(0));
    }

    #[test]
    fn test_tick_uses_time_differences() {
        let mut gate = TransmissionGate::default();
        assert!(!gate.tick(1_000));
        assert!(!gate.tick(1_008));
        assert!(!gate.tick(1_016));
        assert!(gate.tick(1_017));
        assert!(!gate.tick(1_020));
    }

    #[test]
    fn test_tick_ignores_backwards_clock() {
        let mut gate = TransmissionGate::default();
        gate.tick(500);
        assert!(!gate.tick(100));
        assert_eq!(gate.accumulated_ms(), 0);
        assert!(gate.tick(117));
    }
}
