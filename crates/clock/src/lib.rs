//! Fixed-timestep clock: turns frame-rate wall-clock time into a whole number
//! of simulation ticks plus an interpolation fraction for rendering.
//!
//! # Invariants
//! - `ticks_elapsed` never exceeds the tick rate; excess time is dropped.
//! - Progress is reduced to its fractional part only on the update after
//!   ticks were reported, so callers must consume ticks before updating again.
//! - While paused no ticks are reported and the interpolation factor holds.

pub mod clock;
pub mod source;
pub mod window;

pub use clock::{ClockConfig, ClockError, TickClock};
pub use source::{ManualTime, SystemTime, TimeSource};
pub use window::FrameWindow;

/// Returns the crate version for diagnostics.
pub fn crate_info() -> &'static str {
    "tickframe-clock v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_info_works() {
        assert!(crate_info().contains("clock"));
    }
}
