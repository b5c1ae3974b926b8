//! Shared value types for the tickframe engine: GPU-layout records, models and
//! asset handles.
//!
//! # Invariants
//! - Every record is `#[repr(C)]` + `Pod`; its byte size is its GPU stride.
//! - Records carry no references, so batches copy them freely.

pub mod model;
pub mod prefab;
pub mod records;
pub mod types;

pub use model::{Model, PointCloudModel};
pub use records::{DrawCommand, PointParticle, Sprite3D, Vertex};
pub use types::{ShaderHandle, TextureHandle, Transform};

pub fn crate_info() -> &'static str {
    "tickframe-common v0.1.0"
}
