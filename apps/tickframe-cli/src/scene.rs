use glam::{Mat4, Vec3};
use tickframe_common::{PointParticle, Sprite3D, TextureHandle, prefab};
use tickframe_driver::Simulation;
use tickframe_render::{FlyCamera, GpuBackend, RenderError, RenderType, RenderView, Renderer};

const BOX_HALF_EXTENT: f32 = 20.0;

/// Splitmix64 step, for reproducible scene layout.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Uniform value in `[-1, 1)` and the next state.
fn unit(state: u64) -> (f32, u64) {
    let next = splitmix64(state);
    let v = (next >> 40) as f32 / (1u64 << 24) as f32;
    (v * 2.0 - 1.0, next)
}

struct Body {
    position: Vec3,
    prev: Vec3,
    velocity: Vec3,
}

/// Bouncing lerp cubes, orbiting particles, a row of sprites and a slowly
/// turning camera.
pub struct DemoScene {
    bodies: Vec<Body>,
    particles: usize,
    sprites: Vec<Sprite3D>,
    sprite_texture: Option<TextureHandle>,
    camera: FlyCamera,
    tick_secs: f32,
    dropped: u64,
}

impl DemoScene {
    pub fn new(
        objects: usize,
        ticks_per_second: u32,
        seed: u64,
        sprite_texture: Option<TextureHandle>,
    ) -> Self {
        let mut state = seed;
        let mut bodies = Vec::with_capacity(objects);
        for _ in 0..objects {
            let mut next = || {
                let (v, s) = unit(state);
                state = s;
                v
            };
            let position = Vec3::new(next(), next().abs(), next()) * BOX_HALF_EXTENT;
            let velocity = Vec3::new(next(), next(), next()) * 6.0;
            bodies.push(Body {
                position,
                prev: position,
                velocity,
            });
        }

        let sprites = (0..8)
            .map(|i| {
                Sprite3D::new(
                    Vec3::new(i as f32 * 4.0 - 14.0, 1.0, -BOX_HALF_EXTENT),
                    [1.0, 2.0],
                    [1.0, 0.9, 0.6, 1.0],
                )
            })
            .collect();

        Self {
            bodies,
            particles: objects * 4,
            sprites,
            sprite_texture,
            camera: FlyCamera::new(
                Vec3::new(0.0, 12.0, 45.0),
                -90.0_f32.to_radians(),
                -15.0_f32.to_radians(),
            ),
            tick_secs: 1.0 / ticks_per_second.max(1) as f32,
            dropped: 0,
        }
    }

    /// Upload the floor grid once.
    pub fn install_statics<G: GpuBackend>(
        &self,
        renderer: &mut Renderer<G>,
    ) -> Result<(), RenderError> {
        renderer.add_static_lines("floor_grid", &prefab::grid_lines(25, 2.0))?;
        Ok(())
    }

    /// Submissions refused for lack of capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn note(&mut self, accepted: bool) {
        if !accepted {
            self.dropped += 1;
        }
    }

    fn particle(&self, i: usize, tick: u64) -> PointParticle {
        let phase = i as f32 * 0.37 + tick as f32 * self.tick_secs;
        let radius = 5.0 + (i % 7) as f32;
        let position = Vec3::new(phase.cos() * radius, 2.0 + (i % 5) as f32, phase.sin() * radius);
        let hue = (i % 3) as f32 / 3.0;
        PointParticle::new(position, [0.4 + hue, 0.8 - hue, 1.0, 0.9], 0.3, true)
    }
}

impl<G: GpuBackend> Simulation<G> for DemoScene {
    fn step(&mut self, tick: u64, renderer: &mut Renderer<G>) -> Result<(), RenderError> {
        self.camera.begin_tick();
        self.camera.rotate(0.5, 0.0);

        let dt = self.tick_secs;
        let cube = prefab::unit_cube();
        let mut accepted = Vec::with_capacity(self.bodies.len());
        for body in &mut self.bodies {
            body.prev = body.position;
            body.position += body.velocity * dt;
            for axis in 0..3 {
                let lo = if axis == 1 { 0.0 } else { -BOX_HALF_EXTENT };
                if body.position[axis] < lo || body.position[axis] > BOX_HALF_EXTENT {
                    body.velocity[axis] = -body.velocity[axis];
                    body.position[axis] = body.position[axis].clamp(lo, BOX_HALF_EXTENT);
                }
            }
            let model = cube.clone().with_matrices(
                Mat4::from_translation(body.position),
                Mat4::from_translation(body.prev),
            );
            accepted.push(renderer.request_render_model(RenderType::LerpTriangles, None, &model)?);
        }
        for ok in accepted {
            self.note(ok);
        }

        for i in 0..self.particles {
            let current = self.particle(i, tick);
            let prev = self.particle(i, tick.saturating_sub(1));
            let ok = renderer.request_render_lerp_point(current, prev, i % 4 == 0)?;
            self.note(ok);
        }

        for i in 0..self.sprites.len() {
            let ok = renderer.request_render_sprite(self.sprites[i], self.sprite_texture)?;
            self.note(ok);
        }
        Ok(())
    }

    fn view(&self, lerp: f32) -> RenderView {
        self.camera.view(lerp)
    }
}
