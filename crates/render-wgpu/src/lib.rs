//! wgpu backend for tickframe batching.
//!
//! Each buffer set owns device buffers sized to its byte budget plus a
//! small uniform block. Draws are queued by [`WgpuBackend`] and replayed
//! into a render pass on [`WgpuBackend::encode_pass`].
//!
//! # Invariants
//! - Uploads never write past a buffer's end; out-of-range writes are
//!   logged and dropped.
//! - Indirect batches multi-draw when the device supports it and fall back
//!   to one indexed draw per command otherwise.
//! - Pipelines are built once per shader and render type.

mod gpu;
pub mod shaders;

pub use gpu::{DEPTH_FORMAT, WgpuBackend, create_depth_texture};

pub fn crate_info() -> &'static str {
    "tickframe-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }
}
