//! Render batching: accumulates drawables into contiguous GPU buffers once
//! per tick and draws them every frame with an interpolation factor.
//!
//! # Invariants
//! - Per tick: `before_tick`, submissions, `on_tick_end`; draws read only
//!   what the last `on_tick_end` uploaded.
//! - A batch's cursor never passes its backing length, which never passes
//!   the ceiling derived from the byte budget.
//! - Capacity exhaustion is reported as `false`, never as an error.
//! - Every render type's shader is resolved when the renderer is built.
//!
//! The [`GpuBackend`] trait is the only contact with a graphics API;
//! [`RecordingGpu`] implements it headlessly.

pub mod batch;
pub mod bounded;
pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod manager;
pub mod recording;
pub mod render_type;
pub mod renderer;
pub mod shaders;

pub use batch::Batch;
pub use bounded::BoundedArray;
pub use camera::{FlyCamera, RenderView};
pub use config::{BatchConfig, BatchLimits, Projection};
pub use error::RenderError;
pub use gpu::{BufferSetId, BufferSlot, DrawCall, DrawKind, FrameUniforms, GpuBackend};
pub use manager::{BatchKey, BatchManager};
pub use recording::{GpuEvent, RecordingGpu};
pub use render_type::{BatchCategory, Primitive, RenderType};
pub use renderer::{FrameStats, Fog, Renderer};
pub use shaders::{ShaderTable, register_builtin_shaders};

pub fn crate_info() -> &'static str {
    "tickframe-render v0.1.0"
}
