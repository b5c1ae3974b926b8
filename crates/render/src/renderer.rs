use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use tickframe_assets::AssetRegistry;
use tickframe_common::{
    Model, PointCloudModel, PointParticle, ShaderHandle, Sprite3D, TextureHandle,
};

use crate::camera::RenderView;
use crate::config::{BatchConfig, Projection};
use crate::error::RenderError;
use crate::gpu::{BufferSetId, BufferSlot, DrawCall, DrawKind, FrameUniforms, GpuBackend};
use crate::manager::BatchManager;
use crate::render_type::RenderType;
use crate::shaders::ShaderTable;

/// Distance fog applied by every shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub density: f32,
    pub gradient: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.6, 0.7, 0.8),
            density: 0.003,
            gradient: 2.0,
        }
    }
}

/// Per-frame draw statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub static_draws: u32,
    pub batch_draws: u32,
    pub batches: usize,
    pub lerp_factor: f32,
}

/// Geometry uploaded once and drawn every frame until removed.
#[derive(Debug)]
struct StaticDraw {
    render_type: RenderType,
    shader: ShaderHandle,
    texture: Option<TextureHandle>,
    set: BufferSetId,
    kind: DrawKind,
}

/// Owns the GPU backend, the batches and everything needed to draw a frame.
pub struct Renderer<G: GpuBackend> {
    gpu: G,
    shaders: ShaderTable,
    batches: BatchManager,
    projection: Projection,
    projection_matrix: Mat4,
    ortho_matrix: Mat4,
    statics: BTreeMap<String, StaticDraw>,
    frame_draws: u32,
}

impl<G: GpuBackend> Renderer<G> {
    /// Resolve every render type's shader up front; a missing one is fatal.
    pub fn new(
        gpu: G,
        assets: &AssetRegistry,
        batching: BatchConfig,
        projection: Projection,
    ) -> Result<Self, RenderError> {
        let shaders = ShaderTable::resolve(assets)?;
        tracing::info!(
            shaders = assets.shader_count(),
            textures = assets.texture_count(),
            width = projection.width,
            height = projection.height,
            "renderer ready"
        );
        Ok(Self {
            gpu,
            shaders,
            batches: BatchManager::new(batching),
            projection_matrix: projection.perspective(),
            ortho_matrix: projection.orthographic(),
            projection,
            statics: BTreeMap::new(),
            frame_draws: 0,
        })
    }

    pub fn request_render_model(
        &mut self,
        render_type: RenderType,
        texture: Option<TextureHandle>,
        model: &Model,
    ) -> Result<bool, RenderError> {
        self.batches
            .request_model(&mut self.gpu, &self.shaders, render_type, texture, model)
    }

    pub fn request_render_point_cloud(
        &mut self,
        cloud: &PointCloudModel,
        transparent: bool,
        lerp: bool,
    ) -> Result<bool, RenderError> {
        self.batches
            .request_point_cloud(&mut self.gpu, &self.shaders, cloud, transparent, lerp)
    }

    pub fn request_render_point(
        &mut self,
        point: PointParticle,
        transparent: bool,
    ) -> Result<bool, RenderError> {
        self.batches
            .request_point(&mut self.gpu, &self.shaders, point, transparent)
    }

    pub fn request_render_lerp_point(
        &mut self,
        point: PointParticle,
        prev: PointParticle,
        transparent: bool,
    ) -> Result<bool, RenderError> {
        self.batches
            .request_lerp_point(&mut self.gpu, &self.shaders, point, prev, transparent)
    }

    pub fn request_render_sprite(
        &mut self,
        sprite: Sprite3D,
        texture: Option<TextureHandle>,
    ) -> Result<bool, RenderError> {
        self.batches
            .request_sprite(&mut self.gpu, &self.shaders, sprite, texture)
    }

    pub fn before_tick(&mut self) {
        self.batches.before_tick();
    }

    /// Upload this tick's batch data. Returns the bytes uploaded.
    pub fn on_tick_end(&mut self) -> usize {
        self.batches.on_tick_end(&mut self.gpu)
    }

    /// Draw static geometry, then every used batch.
    pub fn render_frame(&mut self, view: &RenderView, fog: &Fog, lerp_factor: f32) -> FrameStats {
        let _span = tracing::trace_span!("render_frame").entered();
        self.frame_draws = 0;

        let uniforms = FrameUniforms {
            projection: self.projection_matrix,
            view: view.view_matrix(),
            ortho: self.ortho_matrix,
            camera_pos: view.eye,
            fog_color: fog.color,
            fog_density: fog.density,
            fog_gradient: fog.gradient,
            lerp_factor,
        };

        let mut static_draws = 0;
        for s in self.statics.values() {
            self.gpu.draw(
                s.set,
                &DrawCall {
                    render_type: s.render_type,
                    shader: s.shader,
                    texture: s.texture,
                    primitive: s.render_type.primitive(),
                    uniforms,
                    kind: s.kind,
                },
            );
            static_draws += 1;
        }
        let batch_draws = self.batches.draw_all(&mut self.gpu, &uniforms);
        self.frame_draws = static_draws + batch_draws;

        FrameStats {
            draw_calls: self.frame_draws,
            static_draws,
            batch_draws,
            batches: self.batches.batch_count(),
            lerp_factor,
        }
    }

    /// Rebuild projection matrices for a new viewport. Zero sizes are ignored.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return;
        }
        self.projection.width = width;
        self.projection.height = height;
        self.projection_matrix = self.projection.perspective();
        self.ortho_matrix = self.projection.orthographic();
    }

    /// Add (or replace) a static triangle mesh. Returns false for an empty model.
    pub fn add_static_triangles(
        &mut self,
        name: &str,
        texture: Option<TextureHandle>,
        model: &Model,
    ) -> Result<bool, RenderError> {
        self.add_static_mesh(name, RenderType::Triangles, texture, model)
    }

    pub fn add_static_lines(&mut self, name: &str, model: &Model) -> Result<bool, RenderError> {
        self.add_static_mesh(name, RenderType::Lines, None, model)
    }

    pub fn add_static_points(
        &mut self,
        name: &str,
        points: &[PointParticle],
        transparent: bool,
    ) -> Result<bool, RenderError> {
        self.remove_static(name);
        if points.is_empty() {
            tracing::warn!(name, "empty static point draw skipped");
            return Ok(false);
        }
        let render_type = RenderType::for_points(transparent, false);
        let bytes: &[u8] = bytemuck::cast_slice(points);
        let set = self.gpu.create_dynamic(render_type, bytes.len())?;
        self.gpu.upload(set, BufferSlot::Instance, 0, bytes);
        self.insert_static(
            name,
            render_type,
            None,
            set,
            DrawKind::Instanced {
                vertices_per_instance: 4,
                instance_count: points.len() as u32,
            },
        )
    }

    fn add_static_mesh(
        &mut self,
        name: &str,
        render_type: RenderType,
        texture: Option<TextureHandle>,
        model: &Model,
    ) -> Result<bool, RenderError> {
        self.remove_static(name);
        if model.is_empty() {
            tracing::warn!(name, ?render_type, "empty static draw skipped");
            return Ok(false);
        }
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&model.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&model.indices);
        let set = self
            .gpu
            .create_dynamic(render_type, vertex_bytes.len().max(index_bytes.len()))?;
        self.gpu.upload(set, BufferSlot::Vertex, 0, vertex_bytes);
        self.gpu.upload(set, BufferSlot::Index, 0, index_bytes);
        self.insert_static(
            name,
            render_type,
            texture,
            set,
            DrawKind::Indexed {
                index_count: model.indices.len() as u32,
            },
        )
    }

    fn insert_static(
        &mut self,
        name: &str,
        render_type: RenderType,
        texture: Option<TextureHandle>,
        set: BufferSetId,
        kind: DrawKind,
    ) -> Result<bool, RenderError> {
        let shader = self.shaders.get(render_type)?;
        tracing::debug!(name, ?render_type, "added static draw");
        self.statics.insert(
            name.to_string(),
            StaticDraw {
                render_type,
                shader,
                texture,
                set,
                kind,
            },
        );
        Ok(true)
    }

    /// Remove a static draw and free its buffers. Returns whether it existed.
    pub fn remove_static(&mut self, name: &str) -> bool {
        match self.statics.remove(name) {
            Some(s) => {
                self.gpu.delete(s.set);
                true
            }
            None => false,
        }
    }

    pub fn static_names(&self) -> impl Iterator<Item = &str> {
        self.statics.keys().map(String::as_str)
    }

    /// Draw calls issued by the most recent frame.
    pub fn frame_draws(&self) -> u32 {
        self.frame_draws
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn ortho_matrix(&self) -> Mat4 {
        self.ortho_matrix
    }

    pub fn batches(&self) -> &BatchManager {
        &self.batches
    }

    pub fn shaders(&self) -> &ShaderTable {
        &self.shaders
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Free every static and batch buffer and hand the backend back.
    pub fn shutdown(mut self) -> G {
        let names: Vec<String> = self.statics.keys().cloned().collect();
        for name in names {
            self.remove_static(&name);
        }
        self.batches.delete_all(&mut self.gpu);
        tracing::info!("renderer shut down");
        self.gpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingGpu;
    use crate::shaders::register_builtin_shaders;
    use tickframe_assets::AssetError;
    use tickframe_common::prefab;

    fn renderer() -> Renderer<RecordingGpu> {
        let mut assets = AssetRegistry::new();
        register_builtin_shaders(&mut assets).unwrap();
        Renderer::new(
            RecordingGpu::new(),
            &assets,
            BatchConfig::default(),
            Projection::default(),
        )
        .unwrap()
    }

    #[test]
    fn missing_shader_fails_at_startup() {
        let assets = AssetRegistry::new();
        let err = Renderer::new(
            RecordingGpu::new(),
            &assets,
            BatchConfig::default(),
            Projection::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RenderError::MissingShader { .. }));
    }

    #[test]
    fn asset_errors_convert() {
        let err: RenderError = AssetError::MissingTexture("x".into()).into();
        assert!(err.to_string().contains("texture not found"));
    }

    #[test]
    fn static_draw_replace_and_remove() {
        let mut r = renderer();
        assert!(r.add_static_lines("grid", &prefab::grid_lines(2, 1.0)).unwrap());
        assert!(r.add_static_lines("grid", &prefab::grid_lines(1, 1.0)).unwrap());
        assert_eq!(r.static_names().collect::<Vec<_>>(), vec!["grid"]);
        assert_eq!(r.gpu().live_sets(), 1);

        assert!(r.remove_static("grid"));
        assert!(!r.remove_static("grid"));
        assert_eq!(r.gpu().live_sets(), 0);
    }

    #[test]
    fn empty_static_draw_is_skipped() {
        let mut r = renderer();
        let empty = Model::new(Vec::new(), Vec::new());
        assert!(!r.add_static_triangles("nothing", None, &empty).unwrap());
        assert!(!r.add_static_points("nothing", &[], false).unwrap());
        assert_eq!(r.static_names().count(), 0);
    }

    #[test]
    fn frame_draws_statics_then_batches_and_resets_counter() {
        let mut r = renderer();
        r.add_static_triangles("floor", None, &prefab::unit_quad()).unwrap();
        r.add_static_points(
            "stars",
            &[PointParticle::new(Vec3::Y, [1.0; 4], 0.1, false)],
            true,
        )
        .unwrap();

        r.before_tick();
        r.request_render_model(RenderType::Triangles, None, &prefab::unit_cube())
            .unwrap();
        r.on_tick_end();

        let stats = r.render_frame(&RenderView::default(), &Fog::default(), 0.25);
        assert_eq!(stats.static_draws, 2);
        assert_eq!(stats.batch_draws, 1);
        assert_eq!(stats.draw_calls, 3);

        let stats = r.render_frame(&RenderView::default(), &Fog::default(), 0.5);
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(r.frame_draws(), 3);

        let (_, last) = r.gpu().draws().last().unwrap();
        assert_eq!(last.uniforms.lerp_factor, 0.5);
    }

    #[test]
    fn resize_rebuilds_projection() {
        let mut r = renderer();
        let before = r.projection_matrix();
        r.on_resize(800, 800);
        assert_ne!(r.projection_matrix(), before);
        assert_eq!(r.projection().aspect(), 1.0);

        let after = r.projection_matrix();
        r.on_resize(0, 600);
        assert_eq!(r.projection_matrix(), after);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut r = renderer();
        r.add_static_lines("grid", &prefab::grid_lines(1, 1.0)).unwrap();
        r.request_render_sprite(Sprite3D::default(), None).unwrap();
        let gpu = r.shutdown();
        assert_eq!(gpu.live_sets(), 0);
    }
}
