use tickframe_clock::{SystemTime, TickClock, TimeSource};
use tickframe_render::{Fog, GpuBackend, RenderError, RenderView, Renderer};

use crate::config::EngineConfig;
use crate::error::DriverError;

/// Game-side state advanced at the fixed tick rate.
pub trait Simulation<G: GpuBackend> {
    /// Advance one tick and submit its drawables. `tick` counts from 1.
    fn step(&mut self, tick: u64, renderer: &mut Renderer<G>) -> Result<(), RenderError>;

    /// Camera for a frame drawn `lerp` of the way from the previous tick to
    /// the current one.
    fn view(&self, lerp: f32) -> RenderView;

    fn fog(&self) -> Fog {
        Fog::default()
    }
}

/// What one call to [`FrameDriver::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub ticks_run: u32,
    pub total_ticks: u64,
    pub lerp_factor: f32,
    pub draw_calls: u32,
    pub fps: f64,
}

/// Owns the tick clock and runs frames against a simulation and renderer.
#[derive(Debug)]
pub struct FrameDriver<T: TimeSource = SystemTime> {
    clock: TickClock<T>,
    frame: u64,
    total_ticks: u64,
}

impl<T: TimeSource> FrameDriver<T> {
    pub fn new(clock: TickClock<T>) -> Self {
        Self {
            clock,
            frame: 0,
            total_ticks: 0,
        }
    }

    pub fn from_config(config: &EngineConfig, source: T) -> Result<Self, DriverError> {
        Ok(Self::new(TickClock::from_config(&config.clock, source)?))
    }

    /// Sample the clock, run every tick that is due, then draw once.
    ///
    /// Ticks due in the same frame accumulate into one batch window: batches
    /// are reset before the first of them and flushed after the last. A frame
    /// with no ticks due redraws the previous upload.
    pub fn run_frame<G, S>(
        &mut self,
        sim: &mut S,
        renderer: &mut Renderer<G>,
    ) -> Result<FrameReport, DriverError>
    where
        G: GpuBackend,
        S: Simulation<G>,
    {
        self.frame += 1;
        let _span = tracing::info_span!("frame", frame = self.frame).entered();

        self.clock.update();
        let ticks = self.clock.ticks_elapsed();

        if ticks > 0 {
            renderer.before_tick();
            for _ in 0..ticks {
                self.total_ticks += 1;
                let _tick = tracing::trace_span!("tick", tick = self.total_ticks).entered();
                sim.step(self.total_ticks, renderer)?;
            }
            let uploaded = renderer.on_tick_end();
            tracing::trace!(uploaded, ticks, "ticks flushed");
        }

        let lerp = self.clock.interpolation_factor();
        let stats = renderer.render_frame(&sim.view(lerp), &sim.fog(), lerp);

        let report = FrameReport {
            frame: self.frame,
            ticks_run: ticks,
            total_ticks: self.total_ticks,
            lerp_factor: lerp,
            draw_calls: stats.draw_calls,
            fps: self.clock.fps(),
        };
        tracing::trace!(?report, "frame done");
        Ok(report)
    }

    pub fn clock(&self) -> &TickClock<T> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut TickClock<T> {
        &mut self.clock
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}
