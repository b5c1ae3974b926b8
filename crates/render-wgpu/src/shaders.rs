//! Built-in WGSL, one module per batch category. Each module is the shared
//! prelude followed by a category body.

use tickframe_render::{BatchCategory, RenderType};

/// Frame uniforms, texture bindings, fog and the default fragment stage.
pub const PRELUDE: &str = r#"
struct Frame {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    ortho: mat4x4<f32>,
    camera_pos: vec3<f32>,
    fog_density: f32,
    fog_color: vec3<f32>,
    fog_gradient: f32,
    lerp_factor: f32,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var tex: texture_2d<f32>;
@group(1) @binding(1)
var tex_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) visibility: f32,
};

fn fog_visibility(world_pos: vec3<f32>) -> f32 {
    let dist = length((frame.view * vec4<f32>(world_pos, 1.0)).xyz);
    return clamp(exp(-pow(dist * frame.fog_density, frame.fog_gradient)), 0.0, 1.0);
}

fn world_out(world_pos: vec3<f32>, color: vec4<f32>, uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.projection * frame.view * vec4<f32>(world_pos, 1.0);
    out.color = color;
    out.uv = uv;
    out.visibility = fog_visibility(world_pos);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(tex, tex_sampler, in.uv) * in.color;
    if texel.a < 0.01 {
        discard;
    }
    return vec4<f32>(mix(frame.fog_color, texel.rgb, in.visibility), texel.a);
}
"#;

const VERTEX_INPUT: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) uv: vec2<f32>,
};
"#;

/// Vertices already in world space, or in pixels for GUI types.
pub const MESH_BODY: &str = r#"
@vertex
fn vs_main(v: VertexInput) -> VertexOutput {
    return world_out(v.position, v.color, v.uv);
}

@vertex
fn vs_gui(v: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.ortho * vec4<f32>(v.position, 1.0);
    out.color = v.color;
    out.uv = v.uv;
    out.visibility = 1.0;
    return out;
}
"#;

/// Object `i` reads matrices `2i` (current) and `2i + 1` (previous).
pub const INDIRECT_MATRICES_BODY: &str = r#"
@group(0) @binding(1)
var<storage, read> matrices: array<mat4x4<f32>>;

@vertex
fn vs_main(v: VertexInput, @builtin(instance_index) object: u32) -> VertexOutput {
    let local = vec4<f32>(v.position, 1.0);
    let cur = matrices[object * 2u] * local;
    let prev = matrices[object * 2u + 1u] * local;
    let world = mix(prev, cur, frame.lerp_factor);
    return world_out(world.xyz, v.color, v.uv);
}
"#;

/// Positions are packed as three floats each.
pub const INDIRECT_POSITIONS_BODY: &str = r#"
@group(0) @binding(1)
var<storage, read> positions: array<f32>;

fn position_at(slot: u32) -> vec3<f32> {
    let i = slot * 3u;
    return vec3<f32>(positions[i], positions[i + 1u], positions[i + 2u]);
}

@vertex
fn vs_main(v: VertexInput, @builtin(instance_index) object: u32) -> VertexOutput {
    return world_out(v.position + position_at(object), v.color, v.uv);
}

@vertex
fn vs_lerp(v: VertexInput, @builtin(instance_index) object: u32) -> VertexOutput {
    let offset = mix(position_at(object * 2u + 1u), position_at(object * 2u), frame.lerp_factor);
    return world_out(v.position + offset, v.color, v.uv);
}
"#;

/// Camera-facing sphere impostors, four strip vertices per instance.
pub const POINTS_BODY: &str = r#"
struct PointInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) radius: f32,
    @location(3) ao: f32,
};

struct PrevPointInput {
    @location(4) position: vec3<f32>,
    @location(5) color: vec4<f32>,
    @location(6) radius: f32,
    @location(7) ao: f32,
};

struct SphereOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) corner: vec2<f32>,
    @location(2) visibility: f32,
    @location(3) ao: f32,
};

fn billboard(center: vec3<f32>, radius: f32, color: vec4<f32>, ao: f32, vi: u32) -> SphereOutput {
    let corner = vec2<f32>(f32(vi & 1u), f32(vi >> 1u)) * 2.0 - 1.0;
    let right = vec3<f32>(frame.view[0][0], frame.view[1][0], frame.view[2][0]);
    let up = vec3<f32>(frame.view[0][1], frame.view[1][1], frame.view[2][1]);
    let world = center + (right * corner.x + up * corner.y) * radius;

    var out: SphereOutput;
    out.clip_position = frame.projection * frame.view * vec4<f32>(world, 1.0);
    out.color = color;
    out.corner = corner;
    out.visibility = fog_visibility(center);
    out.ao = ao;
    return out;
}

@vertex
fn vs_main(p: PointInput, @builtin(vertex_index) vi: u32) -> SphereOutput {
    return billboard(p.position, p.radius, p.color, p.ao, vi);
}

@vertex
fn vs_lerp(p: PointInput, prev: PrevPointInput, @builtin(vertex_index) vi: u32) -> SphereOutput {
    let t = frame.lerp_factor;
    return billboard(
        mix(prev.position, p.position, t),
        mix(prev.radius, p.radius, t),
        mix(prev.color, p.color, t),
        p.ao,
        vi,
    );
}

@fragment
fn fs_sphere(in: SphereOutput) -> @location(0) vec4<f32> {
    let d = dot(in.corner, in.corner);
    if d > 1.0 {
        discard;
    }
    let shade = mix(1.0, sqrt(1.0 - d), in.ao);
    let rgb = in.color.rgb * shade;
    return vec4<f32>(mix(frame.fog_color, rgb, in.visibility), in.color.a);
}
"#;

/// Quads that turn about the vertical axis to face the camera.
pub const SPRITES_BODY: &str = r#"
struct SpriteInput {
    @location(0) position: vec3<f32>,
    @location(1) scale: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) uv_min: vec2<f32>,
    @location(4) uv_max: vec2<f32>,
};

@vertex
fn vs_main(s: SpriteInput, @builtin(vertex_index) vi: u32) -> VertexOutput {
    let c = vec2<f32>(f32(vi & 1u), f32(vi >> 1u));
    let corner = c * 2.0 - 1.0;
    let right = normalize(vec3<f32>(frame.view[0][0], 0.0, frame.view[2][0]));
    let world = s.position + right * corner.x * s.scale.x + vec3<f32>(0.0, corner.y * s.scale.y, 0.0);
    let uv = mix(s.uv_min, s.uv_max, vec2<f32>(c.x, 1.0 - c.y));
    return world_out(world, s.color, uv);
}
"#;

/// Full WGSL source for a category.
pub fn builtin_source(category: BatchCategory) -> String {
    let body = match category {
        BatchCategory::Mesh => MESH_BODY,
        BatchCategory::IndirectMatrices => INDIRECT_MATRICES_BODY,
        BatchCategory::IndirectPositions { .. } => INDIRECT_POSITIONS_BODY,
        BatchCategory::Points { .. } => return format!("{PRELUDE}{POINTS_BODY}"),
        BatchCategory::Sprites => return format!("{PRELUDE}{SPRITES_BODY}"),
    };
    format!("{PRELUDE}{VERTEX_INPUT}{body}")
}

/// Vertex and fragment entry points for a render type.
pub fn entry_points(render_type: RenderType) -> (&'static str, &'static str) {
    match render_type.category() {
        BatchCategory::Mesh => match render_type {
            RenderType::GuiCutout | RenderType::GuiText => ("vs_gui", "fs_main"),
            _ => ("vs_main", "fs_main"),
        },
        BatchCategory::Points { lerp } => (if lerp { "vs_lerp" } else { "vs_main" }, "fs_sphere"),
        BatchCategory::Sprites | BatchCategory::IndirectMatrices => ("vs_main", "fs_main"),
        BatchCategory::IndirectPositions { lerp } => {
            (if lerp { "vs_lerp" } else { "vs_main" }, "fs_main")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_point_exists_in_its_source() {
        for rt in RenderType::ALL {
            let source = builtin_source(rt.category());
            let (vs, fs) = entry_points(rt);
            assert!(source.contains(&format!("fn {vs}(")), "{rt:?} missing {vs}");
            assert!(source.contains(&format!("fn {fs}(")), "{rt:?} missing {fs}");
        }
    }

    #[test]
    fn storage_bindings_only_where_needed() {
        assert!(builtin_source(BatchCategory::IndirectMatrices).contains("matrices"));
        assert!(builtin_source(BatchCategory::IndirectPositions { lerp: true }).contains("positions"));
        assert!(!builtin_source(BatchCategory::Mesh).contains("var<storage"));
    }
}
