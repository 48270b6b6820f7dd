//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame.
//! Delta time is clamped from above so a debugger pause or long stall cannot
//! explode the animation step. There is no lower clamp: a zero delta must
//! stay zero so that animation state is exactly idempotent when no time has
//! elapsed.

use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing [`FrameTime`] snapshots.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock with the default stall clamp (250 ms).
    pub fn new() -> Self {
        Self::with_stall_clamp(Duration::from_millis(250))
    }

    /// Creates a clock with a custom upper clamp on delta time.
    pub fn with_stall_clamp(dt_max: Duration) -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_max,
        }
    }

    /// Resets the clock baseline, e.g. after a long suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new [`FrameTime`].
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = clamp_delta(now.saturating_duration_since(self.last), self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_delta(dt: Duration, dt_max: Duration) -> Duration {
    if dt > dt_max { dt_max } else { dt }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_passes_small_deltas_through() {
        let max = Duration::from_millis(250);
        assert_eq!(clamp_delta(Duration::ZERO, max), Duration::ZERO);
        assert_eq!(
            clamp_delta(Duration::from_millis(16), max),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn clamp_caps_stalls() {
        let max = Duration::from_millis(250);
        assert_eq!(clamp_delta(Duration::from_secs(5), max), max);
    }

    #[test]
    fn reset_rebaselines_without_touching_frame_index() {
        let mut clock = FrameClock::new();
        clock.tick();
        std::thread::sleep(Duration::from_millis(30));
        clock.reset();
        let t = clock.tick();
        assert_eq!(t.frame_index, 1);
        // The slept interval happened before the reset, so it must not show
        // up in the delta.
        assert!(t.dt < 0.030);
    }

    #[test]
    fn tick_advances_frame_index() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(b.dt >= 0.0);
    }
}
