use std::collections::HashMap;

use tickframe_common::{Model, PointCloudModel, PointParticle, Sprite3D, TextureHandle};

use crate::batch::Batch;
use crate::config::BatchConfig;
use crate::error::RenderError;
use crate::gpu::{FrameUniforms, GpuBackend};
use crate::render_type::RenderType;
use crate::shaders::ShaderTable;

/// Logical identity of a batch. Several slots may share one key when a
/// tick's submissions overflow a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKey {
    Model {
        render_type: RenderType,
        texture: Option<TextureHandle>,
    },
    Points {
        transparent: bool,
        lerp: bool,
    },
    Sprites {
        texture: Option<TextureHandle>,
    },
}

#[derive(Debug, Default)]
struct Slots {
    /// Indices into `BatchManager::batches`, oldest first.
    batches: Vec<usize>,
    /// Slot currently being filled this tick.
    active: usize,
}

/// Routes submissions to batches, creating batches and overflow slots on
/// demand, and draws them in a fixed order.
#[derive(Debug)]
pub struct BatchManager {
    config: BatchConfig,
    batches: Vec<Batch>,
    slots: HashMap<BatchKey, Slots>,
    total_draws: u64,
}

impl BatchManager {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            batches: Vec::new(),
            slots: HashMap::new(),
            total_draws: 0,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn request_model<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        render_type: RenderType,
        texture: Option<TextureHandle>,
        model: &Model,
    ) -> Result<bool, RenderError> {
        if !render_type.category().is_model() {
            return Err(RenderError::WrongBatchKind {
                render_type,
                expected: "model",
            });
        }
        if model.is_empty() {
            tracing::warn!(?render_type, "empty model submission dropped");
            return Ok(false);
        }
        self.route(
            gpu,
            shaders,
            BatchKey::Model {
                render_type,
                texture,
            },
            |b| b.add_model(model),
        )
    }

    pub fn request_point_cloud<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        cloud: &PointCloudModel,
        transparent: bool,
        lerp: bool,
    ) -> Result<bool, RenderError> {
        if cloud.is_empty() {
            return Ok(true);
        }
        self.route(gpu, shaders, BatchKey::Points { transparent, lerp }, |b| {
            b.add_point_cloud(cloud)
        })
    }

    pub fn request_point<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        point: PointParticle,
        transparent: bool,
    ) -> Result<bool, RenderError> {
        self.route(
            gpu,
            shaders,
            BatchKey::Points {
                transparent,
                lerp: false,
            },
            |b| b.add_point(point),
        )
    }

    pub fn request_lerp_point<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        point: PointParticle,
        prev: PointParticle,
        transparent: bool,
    ) -> Result<bool, RenderError> {
        self.route(
            gpu,
            shaders,
            BatchKey::Points {
                transparent,
                lerp: true,
            },
            |b| b.add_lerp_point(point, prev),
        )
    }

    pub fn request_sprite<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        sprite: Sprite3D,
        texture: Option<TextureHandle>,
    ) -> Result<bool, RenderError> {
        self.route(gpu, shaders, BatchKey::Sprites { texture }, |b| {
            b.add_sprite(sprite)
        })
    }

    /// Offer a submission to the active slot for `key`, moving on to the next
    /// slot (creating it if needed) whenever the active one is full.
    fn route<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        shaders: &ShaderTable,
        key: BatchKey,
        mut submit: impl FnMut(&mut Batch) -> bool,
    ) -> Result<bool, RenderError> {
        loop {
            let slots = self.slots.entry(key).or_default();
            let idx = match slots.batches.get(slots.active) {
                Some(&idx) => idx,
                None => {
                    if slots.batches.len() >= self.config.max_batches_per_key {
                        tracing::warn!(
                            ?key,
                            slots = slots.batches.len(),
                            "batch slot limit reached, submission dropped"
                        );
                        return Ok(false);
                    }
                    let batch = create_batch(key, &self.config, shaders, gpu)?;
                    let idx = self.batches.len();
                    self.batches.push(batch);
                    slots.batches.push(idx);
                    if slots.batches.len() > 1 {
                        tracing::debug!(?key, slot = slots.batches.len() - 1, "overflow batch slot");
                    }
                    idx
                }
            };

            let batch = &mut self.batches[idx];
            if submit(batch) {
                return Ok(true);
            }
            if !batch.has_been_used_in_current_tick() {
                tracing::warn!(?key, "submission larger than an empty batch, dropped");
                return Ok(false);
            }
            slots.active += 1;
        }
    }

    /// Reset every batch for a new tick.
    pub fn before_tick(&mut self) {
        for batch in &mut self.batches {
            batch.on_tick_start();
        }
        for slots in self.slots.values_mut() {
            slots.active = 0;
        }
    }

    /// Upload what this tick wrote. Returns the bytes uploaded.
    pub fn on_tick_end<G: GpuBackend>(&mut self, gpu: &mut G) -> usize {
        self.batches
            .iter_mut()
            .map(|b| b.on_tick_end(gpu))
            .sum()
    }

    /// Draw used batches: opaque first, then transparent, then GUI text.
    /// Returns the number of draw calls issued.
    pub fn draw_all<G: GpuBackend>(&mut self, gpu: &mut G, uniforms: &FrameUniforms) -> u32 {
        let mut issued = 0;
        for pass in 0..3 {
            for batch in &self.batches {
                if draw_pass(batch) != pass {
                    continue;
                }
                if batch.draw(gpu, uniforms) {
                    issued += 1;
                }
            }
        }
        self.total_draws += u64::from(issued);
        tracing::trace!(issued, batches = self.batches.len(), "drew batches");
        issued
    }

    /// Release every batch's GPU buffers and forget all keys.
    pub fn delete_all<G: GpuBackend>(&mut self, gpu: &mut G) {
        for batch in &mut self.batches {
            batch.delete(gpu);
        }
        tracing::debug!(count = self.batches.len(), "deleted all batches");
        self.batches.clear();
        self.slots.clear();
    }

    /// Draw calls issued since creation.
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Batches in creation order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Batches under `key`, oldest slot first.
    pub fn slots(&self, key: &BatchKey) -> impl Iterator<Item = &Batch> {
        self.slots
            .get(key)
            .into_iter()
            .flat_map(move |s| s.batches.iter().map(move |&i| &self.batches[i]))
    }
}

fn draw_pass(batch: &Batch) -> u8 {
    if batch.transparent_gui() {
        2
    } else if batch.requires_sorting() {
        1
    } else {
        0
    }
}

fn create_batch<G: GpuBackend>(
    key: BatchKey,
    config: &BatchConfig,
    shaders: &ShaderTable,
    gpu: &mut G,
) -> Result<Batch, RenderError> {
    match key {
        BatchKey::Model {
            render_type,
            texture,
        } => Batch::for_model(render_type, texture, config, shaders, gpu),
        BatchKey::Points { transparent, lerp } => {
            Batch::for_points(transparent, lerp, config, shaders, gpu)
        }
        BatchKey::Sprites { texture } => Batch::for_sprites(texture, config, shaders, gpu),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::BufferSlot;
    use crate::recording::RecordingGpu;
    use crate::shaders::register_builtin_shaders;
    use glam::Vec3;
    use tickframe_assets::AssetRegistry;
    use tickframe_common::{Vertex, prefab};

    fn setup(config: BatchConfig) -> (BatchManager, RecordingGpu, ShaderTable) {
        let mut assets = AssetRegistry::new();
        register_builtin_shaders(&mut assets).unwrap();
        (
            BatchManager::new(config),
            RecordingGpu::new(),
            ShaderTable::resolve(&assets).unwrap(),
        )
    }

    fn nine_vertex_config() -> BatchConfig {
        BatchConfig {
            max_buffer_bytes: 9 * Vertex::SIZE_BYTES,
            initial_array_len: 4,
            max_batches_per_key: 3,
        }
    }

    #[test]
    fn three_triangles_in_one_tick_upload_nine_vertices() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        mgr.before_tick();
        for _ in 0..3 {
            let ok = mgr
                .request_model(&mut gpu, &shaders, RenderType::Triangles, None, &prefab::unit_triangle())
                .unwrap();
            assert!(ok);
        }
        mgr.on_tick_end(&mut gpu);

        assert_eq!(mgr.batch_count(), 1);
        let set = mgr.batches()[0].buffers().unwrap();
        assert_eq!(
            gpu.contents(set, BufferSlot::Vertex).unwrap().len(),
            9 * Vertex::SIZE_BYTES
        );
    }

    #[test]
    fn overflow_creates_second_slot() {
        let (mut mgr, mut gpu, shaders) = setup(nine_vertex_config());
        let key = BatchKey::Model {
            render_type: RenderType::Triangles,
            texture: None,
        };
        for _ in 0..4 {
            assert!(
                mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, None, &prefab::unit_triangle())
                    .unwrap()
            );
        }
        let counts: Vec<_> = mgr.slots(&key).map(|b| b.vertex_count()).collect();
        assert_eq!(counts, vec![9, 3]);
    }

    #[test]
    fn slots_are_refilled_from_the_first_after_reset() {
        let (mut mgr, mut gpu, shaders) = setup(nine_vertex_config());
        for _ in 0..2 {
            mgr.before_tick();
            for _ in 0..4 {
                mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, None, &prefab::unit_triangle())
                    .unwrap();
            }
        }
        assert_eq!(mgr.batch_count(), 2);
    }

    #[test]
    fn object_larger_than_a_batch_is_dropped() {
        let (mut mgr, mut gpu, shaders) = setup(nine_vertex_config());
        let ok = mgr
            .request_model(&mut gpu, &shaders, RenderType::Triangles, None, &prefab::unit_cube())
            .unwrap();
        assert!(!ok);
        assert_eq!(mgr.batch_count(), 1);
    }

    #[test]
    fn slot_limit_drops_submission() {
        let (mut mgr, mut gpu, shaders) = setup(nine_vertex_config());
        let mut accepted = 0;
        for _ in 0..12 {
            if mgr
                .request_model(&mut gpu, &shaders, RenderType::Triangles, None, &prefab::unit_triangle())
                .unwrap()
            {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 9);
        assert_eq!(mgr.batch_count(), 3);
    }

    #[test]
    fn textures_and_point_flags_are_separate_keys() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        let tri = prefab::unit_triangle();
        let p = PointParticle::new(Vec3::ZERO, [1.0; 4], 1.0, false);
        mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, None, &tri).unwrap();
        mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, Some(TextureHandle(1)), &tri)
            .unwrap();
        mgr.request_point(&mut gpu, &shaders, p, false).unwrap();
        mgr.request_point(&mut gpu, &shaders, p, true).unwrap();
        mgr.request_lerp_point(&mut gpu, &shaders, p, p, false).unwrap();
        mgr.request_sprite(&mut gpu, &shaders, Sprite3D::default(), None).unwrap();
        assert_eq!(mgr.batch_count(), 6);
    }

    #[test]
    fn transparent_and_gui_draw_after_opaque() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        let tri = prefab::unit_triangle();
        for rt in [
            RenderType::GuiText,
            RenderType::TrianglesTransparent,
            RenderType::Triangles,
        ] {
            mgr.request_model(&mut gpu, &shaders, rt, None, &tri).unwrap();
        }
        mgr.on_tick_end(&mut gpu);
        assert_eq!(mgr.draw_all(&mut gpu, &FrameUniforms::default()), 3);

        let order: Vec<_> = gpu.draws().map(|(_, c)| c.render_type).collect();
        assert_eq!(
            order,
            vec![
                RenderType::Triangles,
                RenderType::TrianglesTransparent,
                RenderType::GuiText
            ]
        );
        assert_eq!(mgr.total_draws(), 3);
    }

    #[test]
    fn unused_batches_are_skipped() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        mgr.request_model(&mut gpu, &shaders, RenderType::Lines, None, &prefab::grid_lines(1, 1.0))
            .unwrap();
        mgr.before_tick();
        assert_eq!(mgr.draw_all(&mut gpu, &FrameUniforms::default()), 0);
    }

    #[test]
    fn wrong_kind_and_gpu_failure_are_errors() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        let tri = prefab::unit_triangle();
        assert!(matches!(
            mgr.request_model(&mut gpu, &shaders, RenderType::Spheres, None, &tri),
            Err(RenderError::WrongBatchKind { .. })
        ));

        gpu.set_fail_creates(true);
        assert!(matches!(
            mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, None, &tri),
            Err(RenderError::Gpu(_))
        ));
    }

    #[test]
    fn delete_all_releases_buffers() {
        let (mut mgr, mut gpu, shaders) = setup(BatchConfig::default());
        let tri = prefab::unit_triangle();
        mgr.request_model(&mut gpu, &shaders, RenderType::Triangles, None, &tri).unwrap();
        mgr.request_model(&mut gpu, &shaders, RenderType::LerpTriangles, None, &tri).unwrap();
        assert_eq!(gpu.live_sets(), 2);
        mgr.delete_all(&mut gpu);
        assert_eq!(gpu.live_sets(), 0);
        assert_eq!(mgr.batch_count(), 0);
    }
}
