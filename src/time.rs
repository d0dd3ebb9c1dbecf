//! Frame clock for the render loop.
//!
//! Measures wall-clock time between frames and hands the integrator a delta
//! clamped to `max_delta`, so a stalled frame (window drag, breakpoint,
//! suspended laptop) produces one bounded step instead of a jump.
//!
//! ```ignore
//! let mut clock = FrameClock::new(0.1);
//! // once per redraw:
//! let dt = clock.tick();
//! simulation.step(dt, &hands);
//! ```

use std::time::{Duration, Instant};

/// Default clamp on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Per-frame timing with delta clamping, pause and FPS.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    max_delta: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
}

impl FrameClock {
    /// Clock starting now, clamping deltas to `max_delta` seconds.
    pub fn new(max_delta: f32) -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            max_delta: max_delta.max(0.0),
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
        }
    }

    /// Advance one frame and return the clamped delta. Zero while paused.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        if self.paused {
            0.0
        } else {
            self.clamp(raw)
        }
    }

    /// Clamp a raw delta into `[0, max_delta]`.
    #[inline]
    pub fn clamp(&self, raw: f32) -> f32 {
        if raw.is_finite() {
            raw.clamp(0.0, self.max_delta)
        } else {
            0.0
        }
    }

    /// Frames per second, refreshed twice a second. Counts paused frames too.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::default();
        assert_eq!(clock.fps(), 0.0);
        assert!(!clock.is_paused());
        assert_eq!(clock.clamp(1.0), DEFAULT_MAX_DELTA);
    }

    #[test]
    fn test_tick_measures_time() {
        let mut clock = FrameClock::new(1.0);
        thread::sleep(Duration::from_millis(10));
        let dt = clock.tick();
        assert!(dt > 0.0 && dt <= 1.0);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new(0.05);
        thread::sleep(Duration::from_millis(80));
        assert_eq!(clock.tick(), 0.05);
    }

    #[test]
    fn test_clamp() {
        let clock = FrameClock::new(0.1);
        assert_eq!(clock.clamp(0.016), 0.016);
        assert_eq!(clock.clamp(2.0), 0.1);
        assert_eq!(clock.clamp(-1.0), 0.0);
        assert_eq!(clock.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn test_pause() {
        let mut clock = FrameClock::default();
        clock.tick();
        clock.toggle_pause();
        assert!(clock.is_paused());

        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.tick(), 0.0);

        clock.toggle_pause();
        assert!(!clock.is_paused());
        thread::sleep(Duration::from_millis(10));
        assert!(clock.tick() > 0.0);
    }
}
