//! Monotonic frame clock.

use std::time::{Duration, Instant};

/// Largest `dt` reported for one frame.  A stalled window (drag, sleep)
/// should not turn into one giant smoothing step.
const MAX_FRAME_DT: Duration = Duration::from_millis(100);

/// Seconds since start plus the clamped time between ticks.
pub struct FrameClock {
    start: Instant,
    last:  Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        FrameClock { start: now, last: now }
    }

    /// Advance one frame.  Returns `(now, dt)` in seconds.
    pub fn tick(&mut self) -> (f64, f32) {
        let now = Instant::now();
        let dt = now.duration_since(self.last).min(MAX_FRAME_DT);
        self.last = now;
        (now.duration_since(self.start).as_secs_f64(), dt.as_secs_f32())
    }

    /// Seconds since start without advancing.
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_monotonic() {
        let mut c = FrameClock::new();
        let (a, _) = c.tick();
        let (b, dt) = c.tick();
        assert!(b >= a);
        assert!(dt >= 0.0);
    }

    #[test]
    fn dt_is_clamped() {
        let mut c = FrameClock::new();
        if let Some(earlier) = c.last.checked_sub(Duration::from_secs(5)) {
            c.last = earlier;
        }
        let (_, dt) = c.tick();
        assert!(dt <= MAX_FRAME_DT.as_secs_f32() + 1e-6);
    }
}
