use glam::Mat4;
use serde::{Deserialize, Serialize};
use tickframe_common::{DrawCommand, PointParticle, Sprite3D, Vertex};

const MAT4_BYTES: usize = std::mem::size_of::<Mat4>();
const VEC3_BYTES: usize = std::mem::size_of::<[f32; 3]>();
const INDEX_BYTES: usize = std::mem::size_of::<u32>();

/// Batching configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Byte budget of each GPU buffer in a batch. Element ceilings derive from it.
    pub max_buffer_bytes: usize,
    /// Starting length of every backing array.
    pub initial_array_len: usize,
    /// Overflow slots allowed under one batch key.
    pub max_batches_per_key: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 8 * 1024 * 1024,
            initial_array_len: 32,
            max_batches_per_key: 16,
        }
    }
}

impl BatchConfig {
    pub fn limits(&self) -> BatchLimits {
        BatchLimits::from_budget(self.max_buffer_bytes)
    }
}

/// Per-family element ceilings: the byte budget divided by element stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub vertices: usize,
    pub indices: usize,
    pub points: usize,
    pub sprites: usize,
    pub matrices: usize,
    pub positions: usize,
    pub draw_commands: usize,
}

impl BatchLimits {
    pub fn from_budget(bytes: usize) -> Self {
        Self {
            vertices: bytes / Vertex::SIZE_BYTES,
            indices: bytes / INDEX_BYTES,
            points: bytes / PointParticle::SIZE_BYTES,
            sprites: bytes / Sprite3D::SIZE_BYTES,
            matrices: bytes / MAT4_BYTES,
            positions: bytes / VEC3_BYTES,
            draw_commands: bytes / DrawCommand::SIZE_BYTES,
        }
    }
}

/// Perspective parameters plus the viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fov_degrees: f32,
    pub width: u32,
    pub height: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            width: 1280,
            height: 720,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn perspective(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect(),
            self.near,
            self.far,
        )
    }

    /// Pixel-space orthographic matrix centred on the viewport, for GUI.
    pub fn orthographic(&self) -> Mat4 {
        let hw = self.width as f32 * 0.5;
        let hh = self.height as f32 * 0.5;
        Mat4::orthographic_rh(-hw, hw, -hh, hh, 0.1, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_eight_mib_budget() {
        let limits = BatchConfig::default().limits();
        assert_eq!(limits.indices, 2 * 1024 * 1024);
        assert_eq!(limits.vertices, 8 * 1024 * 1024 / 36);
        assert_eq!(limits.matrices, 8 * 1024 * 1024 / 64);
        assert_eq!(limits.draw_commands, 8 * 1024 * 1024 / 20);
    }

    #[test]
    fn projection_aspect_guards_zero_height() {
        let p = Projection {
            height: 0,
            ..Projection::default()
        };
        assert_eq!(p.aspect(), 1.0);
        assert!(!p.perspective().col(0).x.is_nan());
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let cfg: BatchConfig = serde_json::from_str(r#"{ "max_batches_per_key": 2 }"#).unwrap();
        assert_eq!(cfg.max_batches_per_key, 2);
        assert_eq!(cfg.initial_array_len, 32);
    }
}
