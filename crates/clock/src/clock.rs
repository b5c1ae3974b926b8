use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::source::{SystemTime, TimeSource};
use crate::window::FrameWindow;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Clock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed simulation rate. Also the per-update catch-up cap.
    pub ticks_per_second: u32,
    /// Number of frame times kept for the rolling FPS average.
    pub frame_window: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 30,
            frame_window: 100,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("ticks per second must be greater than zero")]
    InvalidTickRate,
    #[error("frame window must hold at least one sample")]
    InvalidWindow,
}

/// Converts wall-clock time into whole simulation ticks plus the fraction
/// toward the next tick.
///
/// Progress toward the next tick is held in fixed point (elapsed nanoseconds
/// scaled by the tick rate), so tick counts are exact for whole-nanosecond
/// deltas and never drift over long runs.
#[derive(Debug)]
pub struct TickClock<T: TimeSource = SystemTime> {
    source: T,
    ticks_per_second: u32,
    start: Duration,
    last: Duration,
    last_delta: Duration,
    /// Progress in units of `1 / NANOS_PER_SEC` ticks.
    progress: u128,
    ticks_elapsed: u32,
    paused: bool,
    frames: FrameWindow,
}

impl<T: TimeSource> TickClock<T> {
    /// Start a clock at `ticks_per_second`, sampling the start time now.
    pub fn new(ticks_per_second: u32, source: T) -> Result<Self, ClockError> {
        Self::from_config(
            &ClockConfig {
                ticks_per_second,
                ..ClockConfig::default()
            },
            source,
        )
    }

    pub fn from_config(config: &ClockConfig, source: T) -> Result<Self, ClockError> {
        if config.ticks_per_second == 0 {
            return Err(ClockError::InvalidTickRate);
        }
        if config.frame_window == 0 {
            return Err(ClockError::InvalidWindow);
        }
        let now = source.now();
        tracing::debug!(
            tps = config.ticks_per_second,
            window = config.frame_window,
            "tick clock started"
        );
        Ok(Self {
            source,
            ticks_per_second: config.ticks_per_second,
            start: now,
            last: now,
            last_delta: Duration::ZERO,
            progress: 0,
            ticks_elapsed: 0,
            paused: false,
            frames: FrameWindow::new(config.frame_window),
        })
    }

    /// Sample the time source and work out how many ticks are due this frame.
    ///
    /// Call once per frame, after the previous frame's ticks have been run.
    pub fn update(&mut self) {
        let now = self.source.now();
        let delta = now.saturating_sub(self.last);
        self.last = now;
        self.last_delta = delta;
        self.frames.record(delta);

        // Ticks reported last update have been run; keep only the partial tick.
        if self.ticks_elapsed > 0 {
            self.progress %= NANOS_PER_SEC;
        }

        if self.paused {
            self.ticks_elapsed = 0;
            return;
        }

        self.progress += delta.as_nanos() * u128::from(self.ticks_per_second);
        let whole = self.progress / NANOS_PER_SEC;
        // Whatever exceeds the cap is discarded when progress is reduced to
        // its remainder next update.
        self.ticks_elapsed = whole.min(u128::from(self.ticks_per_second)) as u32;

        tracing::trace!(
            delta_us = delta.as_micros() as u64,
            ticks = self.ticks_elapsed,
            "clock update"
        );
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks due since the previous update, at most one second's worth.
    pub fn ticks_elapsed(&self) -> u32 {
        self.ticks_elapsed
    }

    /// Fraction of the way from the last tick to the next, in `[0, 1)`.
    pub fn interpolation_factor(&self) -> f32 {
        ((self.progress % NANOS_PER_SEC) as f64 / NANOS_PER_SEC as f64) as f32
    }

    /// Accumulated progress in ticks, including whole ticks not yet consumed.
    pub fn progress(&self) -> f64 {
        self.progress as f64 / NANOS_PER_SEC as f64
    }

    /// Rolling-average frames per second, 0 until a nonzero frame time is seen.
    pub fn fps(&self) -> f64 {
        self.frames.rate()
    }

    /// Rolling-average seconds per frame.
    pub fn spf(&self) -> f64 {
        self.frames.average_secs()
    }

    pub fn tps(&self) -> u32 {
        self.ticks_per_second
    }

    /// Seconds per tick.
    pub fn spt(&self) -> f64 {
        1.0 / f64::from(self.ticks_per_second)
    }

    /// Last frame's duration measured in ticks.
    pub fn frame_tick_fraction(&self) -> f64 {
        self.last_delta.as_secs_f64() * f64::from(self.ticks_per_second)
    }

    pub fn ticks_for_seconds(&self, seconds: f64) -> f64 {
        seconds * f64::from(self.ticks_per_second)
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.source.now().saturating_sub(self.start)
    }

    pub fn last_delta(&self) -> Duration {
        self.last_delta
    }

    pub fn frame_window(&self) -> &FrameWindow {
        &self.frames
    }
}

impl TickClock<SystemTime> {
    /// Wall-clock driven clock.
    pub fn realtime(ticks_per_second: u32) -> Result<Self, ClockError> {
        Self::new(ticks_per_second, SystemTime::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ManualTime;

    fn manual(tps: u32) -> (TickClock<ManualTime>, ManualTime) {
        let time = ManualTime::new();
        let clock = TickClock::new(tps, time.clone()).unwrap();
        (clock, time)
    }

    #[test]
    fn zero_tick_rate_rejected() {
        assert!(matches!(
            TickClock::new(0, ManualTime::new()),
            Err(ClockError::InvalidTickRate)
        ));
    }

    #[test]
    fn zero_window_rejected() {
        let config = ClockConfig {
            ticks_per_second: 30,
            frame_window: 0,
        };
        assert!(matches!(
            TickClock::from_config(&config, ManualTime::new()),
            Err(ClockError::InvalidWindow)
        ));
    }

    #[test]
    fn long_stall_is_capped_at_one_second_of_ticks() {
        let (mut clock, time) = manual(20);
        time.advance(Duration::from_secs(5));
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 20);

        // The excess is not replayed afterwards.
        time.advance_millis(10);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
    }

    #[test]
    fn no_time_no_ticks() {
        let (mut clock, _time) = manual(30);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
        assert_eq!(clock.interpolation_factor(), 0.0);
    }

    #[test]
    fn ticks_are_conserved_across_uneven_frames() {
        let (mut clock, time) = manual(50);
        // 10 ticks at 50 tps is 200 ms, split into awkward frame lengths.
        let frames = [7, 13, 31, 5, 44, 20, 19, 33, 28];
        assert_eq!(frames.iter().sum::<u64>(), 200);

        let mut total = 0;
        for ms in frames {
            time.advance_millis(ms);
            clock.update();
            total += clock.ticks_elapsed();
        }
        assert_eq!(total, 10);
        assert_eq!(clock.interpolation_factor(), 0.0);
    }

    #[test]
    fn interpolation_factor_tracks_partial_tick() {
        let (mut clock, time) = manual(25);
        // One tick is 40 ms.
        time.advance_millis(50);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 1);
        assert!((clock.interpolation_factor() - 0.25).abs() < 1e-6);
        assert!((clock.progress() - 1.25).abs() < 1e-9);

        time.advance_millis(10);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
        assert!((clock.interpolation_factor() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn thirty_tps_over_a_hundred_ms_runs_three_ticks() {
        let (mut clock, time) = manual(30);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);

        time.advance_millis(100);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 3);
    }

    #[test]
    fn pause_freezes_ticks_and_interpolation() {
        let (mut clock, time) = manual(20);
        time.advance_millis(25);
        clock.update();
        let frozen = clock.interpolation_factor();

        clock.pause();
        assert!(clock.is_paused());
        time.advance(Duration::from_secs(3));
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
        assert_eq!(clock.interpolation_factor(), frozen);

        // Paused wall time is not caught up after resuming.
        clock.resume();
        time.advance_millis(25);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 1);
    }

    #[test]
    fn ticks_run_before_pause_are_not_reported_again() {
        let (mut clock, time) = manual(20);
        time.advance_millis(150);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 3);

        clock.pause();
        time.advance_millis(10);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);

        clock.resume();
        time.advance_millis(10);
        clock.update();
        assert_eq!(clock.ticks_elapsed(), 0);
        assert!((clock.interpolation_factor() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn fps_is_zero_before_any_time_passes() {
        let (mut clock, time) = manual(30);
        assert_eq!(clock.fps(), 0.0);
        clock.update();
        assert_eq!(clock.fps(), 0.0);

        time.advance_millis(20);
        clock.update();
        // One zero frame and one 20 ms frame.
        assert!((clock.spf() - 0.01).abs() < 1e-12);
        assert!((clock.fps() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn derived_rates() {
        let (mut clock, time) = manual(20);
        assert_eq!(clock.tps(), 20);
        assert!((clock.spt() - 0.05).abs() < 1e-12);
        assert!((clock.ticks_for_seconds(1.5) - 30.0).abs() < 1e-9);

        time.advance_millis(25);
        clock.update();
        assert_eq!(clock.last_delta(), Duration::from_millis(25));
        assert!((clock.frame_tick_fraction() - 0.5).abs() < 1e-9);
        assert_eq!(clock.elapsed(), Duration::from_millis(25));
    }

    #[test]
    fn config_defaults() {
        let config = ClockConfig::default();
        assert_eq!(config.ticks_per_second, 30);
        assert_eq!(config.frame_window, 100);
    }
}
