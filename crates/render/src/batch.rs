//! One GPU buffer set filled with many drawables of a single render type.
//!
//! A batch is reset at the start of every tick, filled by submissions during
//! the tick, uploaded once at the end of the tick and drawn every frame until
//! the next upload.

use glam::{Mat4, Vec3};
use tickframe_common::{
    DrawCommand, Model, PointCloudModel, PointParticle, ShaderHandle, Sprite3D, TextureHandle,
    Vertex,
};

use crate::bounded::BoundedArray;
use crate::config::{BatchConfig, BatchLimits};
use crate::error::RenderError;
use crate::gpu::{BufferSetId, BufferSlot, DrawCall, DrawKind, FrameUniforms, GpuBackend};
use crate::render_type::{BatchCategory, RenderType};
use crate::shaders::ShaderTable;

/// Vertices drawn per billboard instance.
const BILLBOARD_VERTICES: u32 = 4;

#[derive(Debug)]
enum Storage {
    Mesh {
        vertices: BoundedArray<Vertex>,
        indices: BoundedArray<u32>,
    },
    Points {
        lerp: bool,
        points: BoundedArray<PointParticle>,
    },
    Sprites {
        sprites: BoundedArray<Sprite3D>,
    },
    IndirectMatrices {
        vertices: BoundedArray<Vertex>,
        indices: BoundedArray<u32>,
        /// `[cur0, prev0, cur1, prev1, ...]`
        matrices: BoundedArray<Mat4>,
        commands: BoundedArray<DrawCommand>,
    },
    IndirectPositions {
        lerp: bool,
        vertices: BoundedArray<Vertex>,
        indices: BoundedArray<u32>,
        /// Interlaced like matrices when `lerp`, one per object otherwise.
        positions: BoundedArray<Vec3>,
        commands: BoundedArray<DrawCommand>,
    },
}

impl Storage {
    fn new(category: BatchCategory, config: &BatchConfig, limits: &BatchLimits) -> Self {
        let init = config.initial_array_len;
        match category {
            BatchCategory::Mesh => Storage::Mesh {
                vertices: BoundedArray::new(init, limits.vertices),
                indices: BoundedArray::new(init, limits.indices),
            },
            BatchCategory::Points { lerp } => Storage::Points {
                lerp,
                points: BoundedArray::new(init, limits.points),
            },
            BatchCategory::Sprites => Storage::Sprites {
                sprites: BoundedArray::new(init, limits.sprites),
            },
            BatchCategory::IndirectMatrices => Storage::IndirectMatrices {
                vertices: BoundedArray::new(init, limits.vertices),
                indices: BoundedArray::new(init, limits.indices),
                matrices: BoundedArray::new(init, limits.matrices),
                commands: BoundedArray::new(init, limits.draw_commands),
            },
            BatchCategory::IndirectPositions { lerp } => Storage::IndirectPositions {
                lerp,
                vertices: BoundedArray::new(init, limits.vertices),
                indices: BoundedArray::new(init, limits.indices),
                positions: BoundedArray::new(init, limits.positions),
                commands: BoundedArray::new(init, limits.draw_commands),
            },
        }
    }
}

#[derive(Debug)]
pub struct Batch {
    render_type: RenderType,
    texture: Option<TextureHandle>,
    shader: ShaderHandle,
    buffers: Option<BufferSetId>,
    storage: Storage,
    /// Objects submitted this tick; doubles as the next object's id.
    objects: u32,
    limits: BatchLimits,
    requires_sorting: bool,
    transparent_gui: bool,
    dirty: bool,
}

impl Batch {
    /// Batch for mesh, lerp-matrix and text render types.
    pub fn for_model<G: GpuBackend>(
        render_type: RenderType,
        texture: Option<TextureHandle>,
        config: &BatchConfig,
        shaders: &ShaderTable,
        gpu: &mut G,
    ) -> Result<Self, RenderError> {
        if !render_type.category().is_model() {
            return Err(RenderError::WrongBatchKind {
                render_type,
                expected: "model",
            });
        }
        Self::create(render_type, texture, config, shaders, gpu)
    }

    /// Batch for point particles, picking the sphere type from the flags.
    pub fn for_points<G: GpuBackend>(
        transparent: bool,
        lerp: bool,
        config: &BatchConfig,
        shaders: &ShaderTable,
        gpu: &mut G,
    ) -> Result<Self, RenderError> {
        let render_type = RenderType::for_points(transparent, lerp);
        Self::create(render_type, None, config, shaders, gpu)
    }

    pub fn for_sprites<G: GpuBackend>(
        texture: Option<TextureHandle>,
        config: &BatchConfig,
        shaders: &ShaderTable,
        gpu: &mut G,
    ) -> Result<Self, RenderError> {
        Self::create(RenderType::SpriteCylinder, texture, config, shaders, gpu)
    }

    fn create<G: GpuBackend>(
        render_type: RenderType,
        texture: Option<TextureHandle>,
        config: &BatchConfig,
        shaders: &ShaderTable,
        gpu: &mut G,
    ) -> Result<Self, RenderError> {
        let shader = shaders.get(render_type)?;
        let limits = config.limits();
        let buffers = gpu.create_dynamic(render_type, config.max_buffer_bytes)?;
        tracing::debug!(?render_type, ?texture, ?buffers, "created batch");
        Ok(Self {
            render_type,
            texture,
            shader,
            buffers: Some(buffers),
            storage: Storage::new(render_type.category(), config, &limits),
            objects: 0,
            limits,
            requires_sorting: render_type.requires_sorting(),
            transparent_gui: render_type.transparent_gui(),
            dirty: false,
        })
    }

    fn misrouted(&self, submission: &'static str) -> bool {
        tracing::error!(
            render_type = ?self.render_type,
            submission,
            "submission does not match batch kind"
        );
        false
    }

    /// Append a model. Returns false, changing nothing, if any buffer family
    /// would pass its ceiling.
    pub fn add_model(&mut self, model: &Model) -> bool {
        let nv = model.vertices.len();
        let ni = model.indices.len();
        let object = self.objects;

        if model.indices.iter().any(|&i| i as usize >= nv) {
            tracing::warn!(
                render_type = ?self.render_type,
                vertices = nv,
                "model index out of range"
            );
            return false;
        }

        let accepted = match &mut self.storage {
            Storage::Mesh { vertices, indices } => {
                if !(vertices.fits(nv) && indices.fits(ni)) {
                    return false;
                }
                let base = vertices.len() as u32;
                vertices.extend_from_slice(&model.vertices);
                indices.extend_exact(ni, model.indices.iter().map(|i| i + base))
            }
            Storage::IndirectMatrices {
                vertices,
                indices,
                matrices,
                commands,
            } => {
                if !(vertices.fits(nv) && indices.fits(ni) && matrices.fits(2) && commands.fits(1))
                {
                    return false;
                }
                commands.push(DrawCommand::new(
                    ni as u32,
                    1,
                    indices.len() as u32,
                    vertices.len() as i32,
                    object,
                ));
                matrices.extend_from_slice(&[model.model_matrix, model.prev_model_matrix]);
                vertices.extend_from_slice(&model.vertices);
                indices.extend_from_slice(&model.indices)
            }
            Storage::IndirectPositions {
                lerp,
                vertices,
                indices,
                positions,
                commands,
            } => {
                let np = if *lerp { 2 } else { 1 };
                if !(vertices.fits(nv)
                    && indices.fits(ni)
                    && positions.fits(np)
                    && commands.fits(1))
                {
                    return false;
                }
                commands.push(DrawCommand::new(
                    ni as u32,
                    1,
                    indices.len() as u32,
                    vertices.len() as i32,
                    object,
                ));
                if *lerp {
                    positions.extend_from_slice(&[model.world_pos, model.prev_world_pos]);
                } else {
                    positions.push(model.world_pos);
                }
                vertices.extend_from_slice(&model.vertices);
                indices.extend_from_slice(&model.indices)
            }
            Storage::Points { .. } | Storage::Sprites { .. } => return self.misrouted("model"),
        };

        if accepted {
            self.objects += 1;
            self.dirty = true;
        }
        accepted
    }

    /// Append one point to a non-lerp point batch.
    pub fn add_point(&mut self, point: PointParticle) -> bool {
        let accepted = match &mut self.storage {
            Storage::Points {
                lerp: false,
                points,
            } => points.push(point),
            _ => return self.misrouted("point"),
        };
        self.mark(accepted, 1)
    }

    /// Append a point and its previous-tick state to a lerp point batch.
    pub fn add_lerp_point(&mut self, point: PointParticle, prev: PointParticle) -> bool {
        let accepted = match &mut self.storage {
            Storage::Points { lerp: true, points } => points.extend_from_slice(&[point, prev]),
            _ => return self.misrouted("lerp point"),
        };
        self.mark(accepted, 1)
    }

    /// Append a whole cloud. Lerp batches interlace current and previous
    /// points per slot and need both lists to be the same length.
    pub fn add_point_cloud(&mut self, cloud: &PointCloudModel) -> bool {
        let n = cloud.points.len();
        let accepted = match &mut self.storage {
            Storage::Points { lerp: false, points } => points.extend_from_slice(&cloud.points),
            Storage::Points { lerp: true, points } => {
                if cloud.prev_points.len() != n {
                    tracing::warn!(
                        current = n,
                        previous = cloud.prev_points.len(),
                        "lerp point cloud lengths differ, dropped"
                    );
                    return false;
                }
                let interlaced = cloud
                    .points
                    .iter()
                    .zip(&cloud.prev_points)
                    .flat_map(|(cur, prev)| [*cur, *prev]);
                points.extend_exact(n * 2, interlaced)
            }
            _ => return self.misrouted("point cloud"),
        };
        self.mark(accepted, n as u32)
    }

    pub fn add_sprite(&mut self, sprite: Sprite3D) -> bool {
        let accepted = match &mut self.storage {
            Storage::Sprites { sprites } => sprites.push(sprite),
            _ => return self.misrouted("sprite"),
        };
        self.mark(accepted, 1)
    }

    fn mark(&mut self, accepted: bool, objects: u32) -> bool {
        if accepted {
            self.objects += objects;
            self.dirty = true;
        }
        accepted
    }

    /// Zero every cursor. Backing storage is kept.
    pub fn on_tick_start(&mut self) {
        match &mut self.storage {
            Storage::Mesh { vertices, indices } => {
                vertices.clear();
                indices.clear();
            }
            Storage::Points { points, .. } => points.clear(),
            Storage::Sprites { sprites } => sprites.clear(),
            Storage::IndirectMatrices {
                vertices,
                indices,
                matrices,
                commands,
            } => {
                vertices.clear();
                indices.clear();
                matrices.clear();
                commands.clear();
            }
            Storage::IndirectPositions {
                vertices,
                indices,
                positions,
                commands,
                ..
            } => {
                vertices.clear();
                indices.clear();
                positions.clear();
                commands.clear();
            }
        }
        self.objects = 0;
    }

    /// Upload the written prefix of every family. Returns the bytes uploaded.
    pub fn on_tick_end<G: GpuBackend>(&mut self, gpu: &mut G) -> usize {
        if !self.dirty {
            return 0;
        }
        self.dirty = false;
        let Some(set) = self.buffers else {
            tracing::warn!(render_type = ?self.render_type, "tick end on deleted batch");
            return 0;
        };

        let mut uploader = Uploader { gpu, set, bytes: 0 };
        match &self.storage {
            Storage::Mesh { vertices, indices } => {
                uploader.put(BufferSlot::Vertex, vertices);
                uploader.put(BufferSlot::Index, indices);
            }
            Storage::Points { points, .. } => uploader.put(BufferSlot::Instance, points),
            Storage::Sprites { sprites } => uploader.put(BufferSlot::Instance, sprites),
            Storage::IndirectMatrices {
                vertices,
                indices,
                matrices,
                commands,
            } => {
                uploader.put(BufferSlot::Matrix, matrices);
                uploader.put(BufferSlot::Indirect, commands);
                uploader.put(BufferSlot::Vertex, vertices);
                uploader.put(BufferSlot::Index, indices);
            }
            Storage::IndirectPositions {
                vertices,
                indices,
                positions,
                commands,
                ..
            } => {
                uploader.put(BufferSlot::Position, positions);
                uploader.put(BufferSlot::Indirect, commands);
                uploader.put(BufferSlot::Vertex, vertices);
                uploader.put(BufferSlot::Index, indices);
            }
        }
        uploader.bytes
    }

    /// Issue this batch's single draw call. Returns whether one was issued.
    pub fn draw<G: GpuBackend>(&self, gpu: &mut G, uniforms: &FrameUniforms) -> bool {
        if !self.has_been_used_in_current_tick() {
            return false;
        }
        let Some(set) = self.buffers else {
            tracing::warn!(render_type = ?self.render_type, "draw on deleted batch skipped");
            return false;
        };

        let kind = match &self.storage {
            Storage::Mesh { indices, .. } => DrawKind::Indexed {
                index_count: indices.len() as u32,
            },
            Storage::Points { lerp, points } => DrawKind::Instanced {
                vertices_per_instance: BILLBOARD_VERTICES,
                instance_count: if *lerp {
                    (points.len() / 2) as u32
                } else {
                    points.len() as u32
                },
            },
            Storage::Sprites { sprites } => DrawKind::Instanced {
                vertices_per_instance: BILLBOARD_VERTICES,
                instance_count: sprites.len() as u32,
            },
            Storage::IndirectMatrices { commands, .. }
            | Storage::IndirectPositions { commands, .. } => DrawKind::MultiIndirect {
                command_count: commands.len() as u32,
            },
        };

        gpu.draw(
            set,
            &DrawCall {
                render_type: self.render_type,
                shader: self.shader,
                texture: self.texture,
                primitive: self.render_type.primitive(),
                uniforms: *uniforms,
                kind,
            },
        );
        true
    }

    pub fn has_been_used_in_current_tick(&self) -> bool {
        match &self.storage {
            Storage::Mesh { vertices, .. }
            | Storage::IndirectMatrices { vertices, .. }
            | Storage::IndirectPositions { vertices, .. } => !vertices.is_empty(),
            Storage::Points { points, .. } => !points.is_empty(),
            Storage::Sprites { sprites } => !sprites.is_empty(),
        }
    }

    /// Release the GPU buffers. The batch draws nothing afterwards.
    pub fn delete<G: GpuBackend>(&mut self, gpu: &mut G) {
        if let Some(set) = self.buffers.take() {
            gpu.delete(set);
        }
    }

    pub fn render_type(&self) -> RenderType {
        self.render_type
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    pub fn buffers(&self) -> Option<BufferSetId> {
        self.buffers
    }

    pub fn requires_sorting(&self) -> bool {
        self.requires_sorting
    }

    pub fn transparent_gui(&self) -> bool {
        self.transparent_gui
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    /// Objects submitted this tick. A lerp point counts once.
    pub fn object_count(&self) -> u32 {
        self.objects
    }

    pub fn written_vertices(&self) -> &[Vertex] {
        match &self.storage {
            Storage::Mesh { vertices, .. }
            | Storage::IndirectMatrices { vertices, .. }
            | Storage::IndirectPositions { vertices, .. } => vertices.as_slice(),
            _ => &[],
        }
    }

    pub fn written_indices(&self) -> &[u32] {
        match &self.storage {
            Storage::Mesh { indices, .. }
            | Storage::IndirectMatrices { indices, .. }
            | Storage::IndirectPositions { indices, .. } => indices.as_slice(),
            _ => &[],
        }
    }

    pub fn draw_commands(&self) -> &[DrawCommand] {
        match &self.storage {
            Storage::IndirectMatrices { commands, .. }
            | Storage::IndirectPositions { commands, .. } => commands.as_slice(),
            _ => &[],
        }
    }

    pub fn written_matrices(&self) -> &[Mat4] {
        match &self.storage {
            Storage::IndirectMatrices { matrices, .. } => matrices.as_slice(),
            _ => &[],
        }
    }

    pub fn written_positions(&self) -> &[Vec3] {
        match &self.storage {
            Storage::IndirectPositions { positions, .. } => positions.as_slice(),
            _ => &[],
        }
    }

    pub fn written_points(&self) -> &[PointParticle] {
        match &self.storage {
            Storage::Points { points, .. } => points.as_slice(),
            _ => &[],
        }
    }

    pub fn written_sprites(&self) -> &[Sprite3D] {
        match &self.storage {
            Storage::Sprites { sprites } => sprites.as_slice(),
            _ => &[],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.written_vertices().len()
    }

    pub fn index_count(&self) -> usize {
        self.written_indices().len()
    }
}

struct Uploader<'a, G: GpuBackend> {
    gpu: &'a mut G,
    set: BufferSetId,
    bytes: usize,
}

impl<G: GpuBackend> Uploader<'_, G> {
    fn put<T: bytemuck::Pod>(&mut self, slot: BufferSlot, array: &BoundedArray<T>) {
        let bytes = array.as_bytes();
        if bytes.is_empty() {
            return;
        }
        self.gpu.upload(self.set, slot, 0, bytes);
        self.bytes += bytes.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingGpu;
    use crate::shaders::register_builtin_shaders;
    use tickframe_assets::AssetRegistry;
    use tickframe_common::prefab;

    fn shaders() -> ShaderTable {
        let mut assets = AssetRegistry::new();
        register_builtin_shaders(&mut assets).unwrap();
        ShaderTable::resolve(&assets).unwrap()
    }

    fn triangle() -> Model {
        prefab::unit_triangle()
    }

    fn point(x: f32) -> PointParticle {
        PointParticle::new(Vec3::new(x, 0.0, 0.0), [1.0; 4], 0.5, false)
    }

    /// Budget holding exactly `vertices` vertices; other families are larger.
    fn tight_config(vertices: usize) -> BatchConfig {
        BatchConfig {
            max_buffer_bytes: vertices * Vertex::SIZE_BYTES,
            initial_array_len: 2,
            max_batches_per_key: 4,
        }
    }

    #[test]
    fn mesh_indices_are_rebased() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::Triangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();

        assert!(b.add_model(&triangle()));
        assert!(b.add_model(&triangle()));
        assert_eq!(b.written_indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(b.vertex_count(), 6);
    }

    #[test]
    fn model_with_out_of_range_index_is_rejected() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::Triangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();
        assert!(b.add_model(&triangle()));

        let mut past_end = triangle();
        past_end.indices = vec![0, 1, 3];
        assert!(!b.add_model(&past_end));

        let mut huge = triangle();
        huge.indices = vec![0, 1, u32::MAX];
        assert!(!b.add_model(&huge));

        assert_eq!(b.vertex_count(), 3);
        assert_eq!(b.written_indices(), &[0, 1, 2]);
        assert_eq!(b.object_count(), 1);
    }

    #[test]
    fn filling_to_ceiling_then_rejecting_mutates_nothing() {
        let mut gpu = RecordingGpu::new();
        let mut b =
            Batch::for_model(RenderType::Triangles, None, &tight_config(9), &shaders(), &mut gpu)
                .unwrap();

        for _ in 0..3 {
            assert!(b.add_model(&triangle()));
        }
        assert_eq!(b.vertex_count(), 9);
        let indices_before = b.written_indices().to_vec();

        assert!(!b.add_model(&triangle()));
        assert_eq!(b.vertex_count(), 9);
        assert_eq!(b.written_indices(), indices_before.as_slice());
        assert_eq!(b.object_count(), 3);
    }

    #[test]
    fn upload_covers_written_prefix_only() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::Triangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();
        for _ in 0..5 {
            b.add_model(&triangle());
        }
        let bytes = b.on_tick_end(&mut gpu);
        assert_eq!(bytes, 15 * Vertex::SIZE_BYTES + 15 * 4);

        let set = b.buffers().unwrap();
        assert_eq!(
            gpu.contents(set, BufferSlot::Vertex).unwrap().len(),
            15 * Vertex::SIZE_BYTES
        );
    }

    #[test]
    fn reset_then_flush_uploads_nothing() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_points(false, false, &BatchConfig::default(), &shaders(), &mut gpu)
            .unwrap();
        b.on_tick_start();
        assert_eq!(b.on_tick_end(&mut gpu), 0);
        assert_eq!(gpu.uploaded_bytes(), 0);
        assert!(!b.has_been_used_in_current_tick());
    }

    #[test]
    fn on_tick_start_keeps_capacity() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::Triangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();
        for _ in 0..20 {
            b.add_model(&triangle());
        }
        b.on_tick_start();
        assert_eq!(b.vertex_count(), 0);
        assert_eq!(b.object_count(), 0);
        assert!(b.add_model(&triangle()));
        assert_eq!(b.written_indices(), &[0, 1, 2]);
    }

    #[test]
    fn lerp_matrices_interlace_and_emit_draw_commands() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::LerpTriangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();

        let a_cur = Mat4::from_translation(Vec3::X);
        let b_cur = Mat4::from_translation(Vec3::Y);
        let b_prev = Mat4::from_translation(Vec3::Z);
        assert!(b.add_model(&triangle().with_matrices(a_cur, Mat4::IDENTITY)));
        assert!(b.add_model(&prefab::unit_quad().with_matrices(b_cur, b_prev)));

        assert_eq!(
            b.written_matrices(),
            &[a_cur, Mat4::IDENTITY, b_cur, b_prev]
        );
        assert_eq!(
            b.draw_commands(),
            &[DrawCommand::new(3, 1, 0, 0, 0), DrawCommand::new(6, 1, 3, 3, 1)]
        );
        // Indirect types keep indices relative to their own object.
        assert_eq!(b.written_indices(), &[0, 1, 2, 0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn text_positions_depend_on_lerp() {
        let mut gpu = RecordingGpu::new();
        let config = BatchConfig::default();
        let table = shaders();
        let model = triangle().with_positions(Vec3::ONE, Vec3::ZERO);

        let mut plain = Batch::for_model(RenderType::Text3D, None, &config, &table, &mut gpu).unwrap();
        plain.add_model(&model);
        assert_eq!(plain.written_positions(), &[Vec3::ONE]);

        let mut lerp =
            Batch::for_model(RenderType::LerpText3D, None, &config, &table, &mut gpu).unwrap();
        lerp.add_model(&model);
        assert_eq!(lerp.written_positions(), &[Vec3::ONE, Vec3::ZERO]);
    }

    #[test]
    fn lerp_point_cloud_interlaces_per_slot() {
        let mut gpu = RecordingGpu::new();
        let mut b =
            Batch::for_points(false, true, &BatchConfig::default(), &shaders(), &mut gpu).unwrap();
        let cloud = PointCloudModel::with_previous(
            vec![point(1.0), point(2.0)],
            vec![point(-1.0), point(-2.0)],
        );
        assert!(b.add_point_cloud(&cloud));
        assert_eq!(
            b.written_points(),
            &[point(1.0), point(-1.0), point(2.0), point(-2.0)]
        );

        b.on_tick_end(&mut gpu);
        assert!(b.draw(&mut gpu, &FrameUniforms::default()));
        let (_, call) = gpu.draws().last().unwrap();
        assert_eq!(
            call.kind,
            DrawKind::Instanced {
                vertices_per_instance: 4,
                instance_count: 2
            }
        );
    }

    #[test]
    fn mismatched_lerp_cloud_is_rejected() {
        let mut gpu = RecordingGpu::new();
        let mut b =
            Batch::for_points(true, true, &BatchConfig::default(), &shaders(), &mut gpu).unwrap();
        let cloud = PointCloudModel::with_previous(vec![point(0.0), point(1.0)], vec![point(0.0)]);
        assert!(!b.add_point_cloud(&cloud));
        assert!(b.written_points().is_empty());
    }

    #[test]
    fn misrouted_submissions_are_rejected() {
        let mut gpu = RecordingGpu::new();
        let config = BatchConfig::default();
        let table = shaders();

        let mut mesh = Batch::for_model(RenderType::Lines, None, &config, &table, &mut gpu).unwrap();
        assert!(!mesh.add_point(point(0.0)));
        assert!(!mesh.add_sprite(Sprite3D::default()));

        let mut points = Batch::for_points(false, false, &config, &table, &mut gpu).unwrap();
        assert!(!points.add_model(&triangle()));
        assert!(!points.add_lerp_point(point(0.0), point(1.0)));
        assert!(!points.has_been_used_in_current_tick());
    }

    #[test]
    fn point_render_type_refused_by_model_constructor() {
        let mut gpu = RecordingGpu::new();
        let err = Batch::for_model(
            RenderType::LerpSpheres,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::WrongBatchKind { .. }));
        assert_eq!(gpu.live_sets(), 0);
    }

    #[test]
    fn draw_kinds_per_category() {
        let mut gpu = RecordingGpu::new();
        let config = BatchConfig::default();
        let table = shaders();
        let u = FrameUniforms::default();

        let mut mesh = Batch::for_model(RenderType::Triangles, None, &config, &table, &mut gpu).unwrap();
        mesh.add_model(&prefab::unit_cube());
        assert!(mesh.draw(&mut gpu, &u));

        let mut indirect =
            Batch::for_model(RenderType::LerpLines, None, &config, &table, &mut gpu).unwrap();
        indirect.add_model(&triangle());
        indirect.add_model(&triangle());
        assert!(indirect.draw(&mut gpu, &u));

        let mut sprites = Batch::for_sprites(None, &config, &table, &mut gpu).unwrap();
        sprites.add_sprite(Sprite3D::default());
        assert!(sprites.draw(&mut gpu, &u));

        let kinds: Vec<_> = gpu.draws().map(|(_, c)| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DrawKind::Indexed { index_count: 36 },
                DrawKind::MultiIndirect { command_count: 2 },
                DrawKind::Instanced {
                    vertices_per_instance: 4,
                    instance_count: 1
                },
            ]
        );
    }

    #[test]
    fn unused_and_deleted_batches_do_not_draw() {
        let mut gpu = RecordingGpu::new();
        let mut b = Batch::for_model(
            RenderType::Triangles,
            None,
            &BatchConfig::default(),
            &shaders(),
            &mut gpu,
        )
        .unwrap();
        assert!(!b.draw(&mut gpu, &FrameUniforms::default()));

        b.add_model(&triangle());
        b.delete(&mut gpu);
        assert!(b.buffers().is_none());
        assert!(!b.draw(&mut gpu, &FrameUniforms::default()));
        assert_eq!(gpu.draw_count(), 0);
        assert_eq!(gpu.live_sets(), 0);
    }
}
