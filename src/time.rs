//! Frame timing for the driver loop.
//!
//! [`FrameClock`] turns wall-clock ticks into per-frame delta times. The first tick only
//! establishes a baseline and yields no delta, long frames (a debugger break, a window
//! drag) are clamped so the flock never jumps across the world, and a paused clock yields
//! nothing at all.
//!
//! # Example
//!
//! ```
//! use maxboid::FrameClock;
//!
//! let mut clock = FrameClock::new(0.5).with_fixed_delta(1.0 / 60.0);
//! assert_eq!(clock.tick(), None);
//! assert_eq!(clock.tick(), Some(1.0 / 60.0));
//! assert_eq!(clock.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Delta-time source with clamping and pause.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Baseline for the next delta. `None` until the first tick.
    last_tick: Option<Instant>,
    /// Upper bound on any reported delta, in seconds.
    max_delta: f32,
    /// Report this instead of measured time.
    fixed_delta: Option<f32>,
    paused: bool,
    /// Frames that produced a delta.
    frame_count: u64,
    /// Sum of reported deltas.
    elapsed_secs: f32,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Option<Instant>,
    fps_update_interval: Duration,
}

impl FrameClock {
    /// A wall-clock timer whose deltas never exceed `max_delta` seconds.
    pub fn new(max_delta: f32) -> Self {
        Self {
            last_tick: None,
            max_delta,
            fixed_delta: None,
            paused: false,
            frame_count: 0,
            elapsed_secs: 0.0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: None,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Report `delta` every frame regardless of elapsed wall time.
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta);
        self
    }

    /// Mark a new frame now. See [`tick_at`](Self::tick_at).
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    /// Mark a new frame at `now` and return its delta in seconds.
    ///
    /// Returns `None` on the first tick, after [`resume`](Self::resume), and while
    /// paused.
    pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
        if self.paused {
            return None;
        }

        let last = self.last_tick.replace(now)?;
        let measured = now.saturating_duration_since(last).as_secs_f32();
        let raw = self.fixed_delta.unwrap_or(measured);
        let delta = if raw > self.max_delta {
            log::warn!("Frame took {:.3}s, clamping to {:.3}s", raw, self.max_delta);
            self.max_delta
        } else {
            raw
        };

        self.frame_count += 1;
        self.elapsed_secs += delta;
        self.update_fps(now);
        Some(delta)
    }

    fn update_fps(&mut self, now: Instant) {
        let since = match self.fps_update_time {
            Some(t) => now.saturating_duration_since(t),
            None => {
                self.fps_update_time = Some(now);
                self.fps_frame_count = self.frame_count;
                return;
            }
        };
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = Some(now);
        }
    }

    /// Stop producing deltas until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Start ticking again. The next tick re-establishes the baseline, so the paused
    /// interval never shows up as a delta.
    pub fn resume(&mut self) {
        self.paused = false;
        self.last_tick = None;
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frames that produced a delta so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Simulated seconds so far (sum of reported deltas).
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }
}
