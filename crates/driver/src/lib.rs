//! Frame driver: decouples fixed-rate simulation ticks from rendered frames.
//!
//! # Invariants
//! - Each frame samples the clock exactly once, then runs that many ticks.
//! - Every tick is bracketed by `before_tick` and `on_tick_end`; the frame's
//!   draw happens after the last tick and reads only uploaded data.
//! - A frame with zero ticks redraws the previous tick's uploads at a new
//!   interpolation factor.

pub mod config;
pub mod driver;
pub mod error;

pub use config::EngineConfig;
pub use driver::{FrameDriver, FrameReport, Simulation};
pub use error::DriverError;

pub fn crate_info() -> &'static str {
    "tickframe-driver v0.1.0"
}
