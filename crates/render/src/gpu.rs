//! The seam between batching and a graphics API.

use glam::{Mat4, Vec3};
use tickframe_common::{ShaderHandle, TextureHandle};

use crate::error::RenderError;
use crate::render_type::{Primitive, RenderType};

/// Identity of one set of GPU buffers created for a batch or static draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferSetId(pub u64);

/// Which buffer of a set an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferSlot {
    Vertex,
    Index,
    /// Per-instance records: point particles or sprites.
    Instance,
    Matrix,
    Position,
    Indirect,
}

impl BufferSlot {
    pub const ALL: [BufferSlot; 6] = [
        BufferSlot::Vertex,
        BufferSlot::Index,
        BufferSlot::Instance,
        BufferSlot::Matrix,
        BufferSlot::Position,
        BufferSlot::Indirect,
    ];
}

/// Values every draw in a frame shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub ortho: Mat4,
    pub camera_pos: Vec3,
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub fog_gradient: f32,
    /// Blend factor between the previous and current tick, in `[0, 1)`.
    pub lerp_factor: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            ortho: Mat4::IDENTITY,
            camera_pos: Vec3::ZERO,
            fog_color: Vec3::ONE,
            fog_density: 0.0,
            fog_gradient: 1.0,
            lerp_factor: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Indexed {
        index_count: u32,
    },
    Instanced {
        vertices_per_instance: u32,
        instance_count: u32,
    },
    /// `command_count` commands read from the start of the indirect buffer.
    MultiIndirect {
        command_count: u32,
    },
}

/// One draw issued against a buffer set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub render_type: RenderType,
    pub shader: ShaderHandle,
    pub texture: Option<TextureHandle>,
    pub primitive: Primitive,
    pub uniforms: FrameUniforms,
    pub kind: DrawKind,
}

/// Buffer creation, partial uploads and draws on some graphics API.
///
/// Uploads always start at the front of a buffer; a draw only reads what the
/// most recent uploads wrote.
pub trait GpuBackend {
    /// Create a set of buffers for `render_type`, each `byte_budget` bytes.
    fn create_dynamic(
        &mut self,
        render_type: RenderType,
        byte_budget: usize,
    ) -> Result<BufferSetId, RenderError>;

    fn upload(&mut self, set: BufferSetId, slot: BufferSlot, offset: usize, bytes: &[u8]);

    fn draw(&mut self, set: BufferSetId, call: &DrawCall);

    fn delete(&mut self, set: BufferSetId);
}
