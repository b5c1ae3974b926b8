use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use tickframe_common::{DrawCommand, PointParticle, ShaderHandle, Sprite3D, TextureHandle, Vertex};
use tickframe_render::{
    BatchCategory, BufferSetId, BufferSlot, DrawCall, DrawKind, FrameUniforms, GpuBackend,
    Primitive, RenderError, RenderType,
};
use wgpu::util::DeviceExt;

use crate::shaders;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.15,
    a: 1.0,
};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform block as laid out in WGSL, padded to a 16-byte multiple.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameBlock {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    ortho: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    fog_density: f32,
    fog_color: [f32; 3],
    fog_gradient: f32,
    lerp_factor: f32,
    _pad: [f32; 3],
}

impl From<&FrameUniforms> for FrameBlock {
    fn from(u: &FrameUniforms) -> Self {
        Self {
            projection: u.projection.to_cols_array_2d(),
            view: u.view.to_cols_array_2d(),
            ortho: u.ortho.to_cols_array_2d(),
            camera_pos: u.camera_pos.to_array(),
            fog_density: u.fog_density,
            fog_color: u.fog_color.to_array(),
            fog_gradient: u.fog_gradient,
            lerp_factor: u.lerp_factor,
            _pad: [0.0; 3],
        }
    }
}

static VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x4,
    2 => Float32x2,
];

static POINT_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x4,
    2 => Float32,
    3 => Float32,
];

// Current and previous particle interlaced in one instance step.
static LERP_POINT_ATTRS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x4,
    2 => Float32,
    3 => Float32,
    4 => Float32x3,
    5 => Float32x4,
    6 => Float32,
    7 => Float32,
];

static SPRITE_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x4,
    3 => Float32x2,
    4 => Float32x2,
];

fn vertex_layout(category: BatchCategory) -> wgpu::VertexBufferLayout<'static> {
    match category {
        BatchCategory::Mesh
        | BatchCategory::IndirectMatrices
        | BatchCategory::IndirectPositions { .. } => wgpu::VertexBufferLayout {
            array_stride: Vertex::SIZE_BYTES as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRS,
        },
        BatchCategory::Points { lerp: false } => wgpu::VertexBufferLayout {
            array_stride: PointParticle::SIZE_BYTES as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &POINT_ATTRS,
        },
        BatchCategory::Points { lerp: true } => wgpu::VertexBufferLayout {
            array_stride: 2 * PointParticle::SIZE_BYTES as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &LERP_POINT_ATTRS,
        },
        BatchCategory::Sprites => wgpu::VertexBufferLayout {
            array_stride: Sprite3D::SIZE_BYTES as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &SPRITE_ATTRS,
        },
    }
}

/// Buffers a set of `category` owns.
fn slots_for(category: BatchCategory) -> &'static [BufferSlot] {
    match category {
        BatchCategory::Mesh => &[BufferSlot::Vertex, BufferSlot::Index],
        BatchCategory::IndirectMatrices => &[
            BufferSlot::Vertex,
            BufferSlot::Index,
            BufferSlot::Matrix,
            BufferSlot::Indirect,
        ],
        BatchCategory::IndirectPositions { .. } => &[
            BufferSlot::Vertex,
            BufferSlot::Index,
            BufferSlot::Position,
            BufferSlot::Indirect,
        ],
        BatchCategory::Points { .. } | BatchCategory::Sprites => &[BufferSlot::Instance],
    }
}

fn usage_for(slot: BufferSlot) -> wgpu::BufferUsages {
    let usage = match slot {
        BufferSlot::Vertex | BufferSlot::Instance => wgpu::BufferUsages::VERTEX,
        BufferSlot::Index => wgpu::BufferUsages::INDEX,
        BufferSlot::Matrix | BufferSlot::Position => wgpu::BufferUsages::STORAGE,
        BufferSlot::Indirect => wgpu::BufferUsages::INDIRECT,
    };
    usage | wgpu::BufferUsages::COPY_DST
}

fn topology(primitive: Primitive) -> wgpu::PrimitiveTopology {
    match primitive {
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Primitive::Lines => wgpu::PrimitiveTopology::LineList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

fn aligned(bytes: usize) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    (bytes.max(1) as u64).div_ceil(align) * align
}

struct GpuSet {
    render_type: RenderType,
    buffers: HashMap<BufferSlot, wgpu::Buffer>,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// CPU copy of the indirect commands, replayed one by one when the
    /// device cannot multi-draw.
    indirect_shadow: Vec<DrawCommand>,
}

struct QueuedDraw {
    set: BufferSetId,
    pipeline: (ShaderHandle, RenderType),
    texture: Option<TextureHandle>,
    kind: DrawKind,
}

/// Color and depth attachments for headless rendering.
struct OffscreenTarget {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

/// [`GpuBackend`] on wgpu. Draws are queued as they arrive and replayed
/// into a render pass by [`WgpuBackend::encode_pass`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    frame_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    placeholder_storage: wgpu::Buffer,
    sets: HashMap<BufferSetId, GpuSet>,
    pipelines: HashMap<(ShaderHandle, RenderType), wgpu::RenderPipeline>,
    textures: HashMap<TextureHandle, wgpu::BindGroup>,
    queued: Vec<QueuedDraw>,
    multi_draw: bool,
    next_id: u64,
    offscreen: Option<OffscreenTarget>,
}

impl WgpuBackend {
    /// Features used when the adapter offers them.
    pub const OPTIONAL_FEATURES: wgpu::Features =
        wgpu::Features::MULTI_DRAW_INDIRECT.union(wgpu::Features::INDIRECT_FIRST_INSTANCE);

    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let multi_draw = device.features().contains(Self::OPTIONAL_FEATURES);
        if !multi_draw {
            tracing::info!("multi-draw indirect unavailable, replaying commands on the CPU");
        }

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            ..Default::default()
        });

        // Bound at binding 1 for categories that read no storage data.
        let placeholder_storage = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("placeholder_storage"),
            size: 64,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let white = Self::texture_bind_group(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            "white_texture",
            1,
            1,
            &[255, 255, 255, 255],
        );

        Self {
            device,
            queue,
            target_format,
            frame_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            white,
            placeholder_storage,
            sets: HashMap::new(),
            pipelines: HashMap::new(),
            textures: HashMap::new(),
            queued: Vec::new(),
            multi_draw,
            next_id: 1,
            offscreen: None,
        }
    }

    /// A backend on the default adapter that renders into an offscreen
    /// target of the given size.
    pub fn headless(width: u32, height: u32) -> Result<Self, RenderError> {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok_or_else(|| RenderError::Gpu("no suitable adapter".into()))?;
            let info = adapter.get_info();
            tracing::info!(adapter = %info.name, backend = ?info.backend, "adapter selected");

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("tickframe_device"),
                        required_features: adapter.features() & Self::OPTIONAL_FEATURES,
                        ..Default::default()
                    },
                    None,
                )
                .await
                .map_err(|e| RenderError::Gpu(e.to_string()))?;

            let mut backend = Self::new(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb);
            backend.resize_offscreen(width, height);
            Ok(backend)
        })
    }

    pub fn supports_multi_draw(&self) -> bool {
        self.multi_draw
    }

    /// Upload RGBA8 pixels for `handle`. Draws naming an unknown texture
    /// sample plain white.
    pub fn upload_texture(
        &mut self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::Gpu(format!(
                "texture {width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        let bind_group = Self::texture_bind_group(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            "batch_texture",
            width,
            height,
            rgba,
        );
        self.textures.insert(handle, bind_group);
        Ok(())
    }

    /// Recreate the offscreen target. Zero sizes are ignored.
    pub fn resize_offscreen(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&Default::default());
        let depth_view = create_depth_texture(&self.device, width, height);
        self.offscreen = Some(OffscreenTarget {
            _color: color,
            color_view,
            depth_view,
        });
    }

    /// Encode and submit all queued draws into the offscreen target.
    /// Returns the number of draws replayed.
    pub fn present_offscreen(&mut self) -> Result<usize, RenderError> {
        let Some(target) = self.offscreen.take() else {
            return Err(RenderError::Gpu("no offscreen target".into()));
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen_encoder"),
            });
        let drawn = self.encode_pass(&mut encoder, &target.color_view, &target.depth_view);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.offscreen = Some(target);
        Ok(drawn)
    }

    /// Replay queued draws into one render pass that clears `color` and
    /// `depth`. Returns the number of draws replayed.
    pub fn encode_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
    ) -> usize {
        let queued = std::mem::take(&mut self.queued);
        let mut drawn = 0;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("batch_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        for draw in &queued {
            // A set deleted after its draw was queued has nothing to show.
            let Some(set) = self.sets.get(&draw.set) else {
                continue;
            };
            let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                continue;
            };
            let texture = draw
                .texture
                .and_then(|t| self.textures.get(&t))
                .unwrap_or(&self.white);

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &set.bind_group, &[]);
            pass.set_bind_group(1, texture, &[]);

            match draw.kind {
                DrawKind::Indexed { index_count } => {
                    let (Some(vertices), Some(indices)) = (
                        set.buffers.get(&BufferSlot::Vertex),
                        set.buffers.get(&BufferSlot::Index),
                    ) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, vertices.slice(..));
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..index_count, 0, 0..1);
                }
                DrawKind::Instanced {
                    vertices_per_instance,
                    instance_count,
                } => {
                    let Some(instances) = set.buffers.get(&BufferSlot::Instance) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, instances.slice(..));
                    pass.draw(0..vertices_per_instance, 0..instance_count);
                }
                DrawKind::MultiIndirect { command_count } => {
                    let (Some(vertices), Some(indices), Some(commands)) = (
                        set.buffers.get(&BufferSlot::Vertex),
                        set.buffers.get(&BufferSlot::Index),
                        set.buffers.get(&BufferSlot::Indirect),
                    ) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, vertices.slice(..));
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    if self.multi_draw {
                        pass.multi_draw_indexed_indirect(commands, 0, command_count);
                    } else {
                        for cmd in set.indirect_shadow.iter().take(command_count as usize) {
                            pass.draw_indexed(
                                cmd.first_index..cmd.first_index + cmd.index_count,
                                cmd.base_vertex,
                                cmd.base_instance..cmd.base_instance + cmd.instance_count,
                            );
                        }
                    }
                }
            }
            drawn += 1;
        }

        drawn
    }

    fn ensure_pipeline(&mut self, shader: ShaderHandle, render_type: RenderType) {
        let key = (shader, render_type);
        if self.pipelines.contains_key(&key) {
            return;
        }
        let category = render_type.category();
        let source = shaders::builtin_source(category);
        let (vs, fs) = shaders::entry_points(render_type);
        let gui = vs == "vs_gui";
        let blended = gui || render_type.requires_sorting() || render_type.transparent_gui();

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(render_type.shader_name()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(render_type.shader_name()),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(vs),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout(category)],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: Some(if blended {
                            wgpu::BlendState::ALPHA_BLENDING
                        } else {
                            wgpu::BlendState::REPLACE
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology(render_type.primitive()),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: !blended,
                    depth_compare: if gui {
                        wgpu::CompareFunction::Always
                    } else {
                        wgpu::CompareFunction::Less
                    },
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        tracing::debug!(?render_type, shader = shader.0, "pipeline built");
        self.pipelines.insert(key, pipeline);
    }

    #[allow(clippy::too_many_arguments)]
    fn texture_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> wgpu::BindGroup {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&Default::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

impl GpuBackend for WgpuBackend {
    fn create_dynamic(
        &mut self,
        render_type: RenderType,
        byte_budget: usize,
    ) -> Result<BufferSetId, RenderError> {
        let size = aligned(byte_budget);
        let limits = self.device.limits();
        if size > limits.max_buffer_size {
            return Err(RenderError::Gpu(format!(
                "buffer of {size} bytes exceeds device limit {}",
                limits.max_buffer_size
            )));
        }

        let category = render_type.category();
        let mut buffers = HashMap::new();
        for &slot in slots_for(category) {
            if matches!(slot, BufferSlot::Matrix | BufferSlot::Position)
                && size > u64::from(limits.max_storage_buffer_binding_size)
            {
                return Err(RenderError::Gpu(format!(
                    "storage buffer of {size} bytes exceeds binding limit {}",
                    limits.max_storage_buffer_binding_size
                )));
            }
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(render_type.shader_name()),
                size,
                usage: usage_for(slot),
                mapped_at_creation: false,
            });
            buffers.insert(slot, buffer);
        }

        let uniforms = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("frame_uniforms"),
                contents: bytemuck::bytes_of(&FrameBlock::from(&FrameUniforms::default())),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let storage = buffers
            .get(&BufferSlot::Matrix)
            .or_else(|| buffers.get(&BufferSlot::Position))
            .unwrap_or(&self.placeholder_storage);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: storage.as_entire_binding(),
                },
            ],
        });

        let id = BufferSetId(self.next_id);
        self.next_id += 1;
        self.sets.insert(
            id,
            GpuSet {
                render_type,
                buffers,
                uniforms,
                bind_group,
                indirect_shadow: Vec::new(),
            },
        );
        tracing::debug!(set = id.0, ?render_type, bytes = size, "buffer set created");
        Ok(id)
    }

    fn upload(&mut self, set: BufferSetId, slot: BufferSlot, offset: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let Some(gpu_set) = self.sets.get_mut(&set) else {
            tracing::error!(set = set.0, "upload to unknown buffer set");
            return;
        };
        let Some(buffer) = gpu_set.buffers.get(&slot) else {
            tracing::error!(set = set.0, ?slot, render_type = ?gpu_set.render_type, "set has no such buffer");
            return;
        };
        let end = (offset + bytes.len()) as u64;
        if end > buffer.size() {
            tracing::error!(set = set.0, ?slot, end, size = buffer.size(), "upload past buffer end");
            return;
        }
        self.queue.write_buffer(buffer, offset as u64, bytes);

        if slot == BufferSlot::Indirect && !self.multi_draw {
            let first = offset / DrawCommand::SIZE_BYTES;
            let commands: Vec<DrawCommand> = bytemuck::pod_collect_to_vec(bytes);
            let shadow = &mut gpu_set.indirect_shadow;
            shadow.truncate(first);
            shadow.resize(first, DrawCommand::default());
            shadow.extend(commands);
        }
    }

    fn draw(&mut self, set: BufferSetId, call: &DrawCall) {
        let Some(gpu_set) = self.sets.get(&set) else {
            tracing::error!(set = set.0, "draw of unknown buffer set");
            return;
        };
        self.queue.write_buffer(
            &gpu_set.uniforms,
            0,
            bytemuck::bytes_of(&FrameBlock::from(&call.uniforms)),
        );
        self.ensure_pipeline(call.shader, call.render_type);
        self.queued.push(QueuedDraw {
            set,
            pipeline: (call.shader, call.render_type),
            texture: call.texture,
            kind: call.kind,
        });
    }

    fn delete(&mut self, set: BufferSetId) {
        if let Some(gpu_set) = self.sets.remove(&set) {
            for buffer in gpu_set.buffers.values() {
                buffer.destroy();
            }
            gpu_set.uniforms.destroy();
        }
    }
}

/// Depth attachment matching the pipelines' depth state.
pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
