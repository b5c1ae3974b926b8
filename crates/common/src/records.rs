//! Fixed-layout records copied byte-for-byte into GPU buffers.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One mesh vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const SIZE_BYTES: usize = std::mem::size_of::<Self>();

    pub const fn new(position: [f32; 3], color: [f32; 4], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            uv,
        }
    }

    /// White vertex with zero uv.
    pub const fn at(position: [f32; 3]) -> Self {
        Self::new(position, [1.0, 1.0, 1.0, 1.0], [0.0, 0.0])
    }
}

/// A point particle drawn as a camera-facing sphere billboard.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointParticle {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub radius: f32,
    /// 1.0 enables fake ambient occlusion shading in the sphere shader.
    pub ambient_occlusion: f32,
}

impl PointParticle {
    pub const SIZE_BYTES: usize = std::mem::size_of::<Self>();

    pub fn new(position: Vec3, color: [f32; 4], radius: f32, ambient_occlusion: bool) -> Self {
        Self {
            position: position.to_array(),
            color,
            radius,
            ambient_occlusion: if ambient_occlusion { 1.0 } else { 0.0 },
        }
    }
}

/// A textured camera-facing quad placed in world space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Sprite3D {
    pub position: [f32; 3],
    pub scale: [f32; 2],
    pub color: [f32; 4],
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

impl Sprite3D {
    pub const SIZE_BYTES: usize = std::mem::size_of::<Self>();

    pub fn new(position: Vec3, scale: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            scale,
            color,
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
        }
    }
}

/// One indexed indirect draw.
///
/// Field order matches the driver's indexed indirect argument layout, so an
/// array of these can be uploaded directly as an indirect buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    /// Object id; the shader uses it to select this object's transforms.
    pub base_instance: u32,
}

impl DrawCommand {
    pub const SIZE_BYTES: usize = std::mem::size_of::<Self>();

    pub const fn new(
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        base_instance: u32,
    ) -> Self {
        Self {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            base_instance,
        }
    }
}
