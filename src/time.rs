//! Frame timing.
//!
//! [`FrameClock`] turns wall-clock readings (or a fixed step) into the
//! `(elapsed, delta)` pair every layer is stepped with. Elapsed time is the
//! sum of the deltas handed out, so a fixed step replays identically.
//!
//! # Example
//!
//! ```ignore
//! use evergreen::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame loop:
//! let (elapsed, delta) = clock.update();
//! let snapshot = scene.step(elapsed, delta);
//! ```

use crate::blend::sanitize_delta;
use std::time::Instant;

/// Largest delta handed out for a single frame, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_window: f32,
    /// How often FPS is recalculated, in seconds.
    fps_update_interval: f32,
    paused: bool,
    /// Fixed delta for deterministic runs.
    fixed_delta: Option<f32>,
    time_scale: f32,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window: 0.0,
            fps_update_interval: 0.5,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// A clock that always advances by `delta` seconds.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Read the wall clock and advance. Call once per frame.
    ///
    /// Returns `(elapsed, delta)`.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.tick(raw)
    }

    /// Advance by a measured frame time.
    ///
    /// The fixed delta, if set, replaces `raw_delta`. The result is scaled,
    /// then clamped to `[0, max_delta]`; NaN counts as zero.
    pub fn tick(&mut self, raw_delta: f32) -> (f32, f32) {
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let delta = self.fixed_delta.unwrap_or(raw_delta) * self.time_scale;
        self.delta_secs = sanitize_delta(delta).min(self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        // fps follows the unscaled frame time
        self.fps_window += sanitize_delta(raw_delta);
        if self.fps_window >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / self.fps_window;
            self.fps_frame_count = self.frame_count;
            self.fps_window = 0.0;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames advanced so far. Paused frames are not counted.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// While paused, `delta()` is 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Pass `None` to use real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(sanitize_delta);
    }

    /// - `1.0` = normal speed
    /// - `0.5` = half speed
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = sanitize_delta(scale);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
