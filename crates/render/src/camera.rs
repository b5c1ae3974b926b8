use glam::{Mat4, Vec3};

/// Eye and look-at point for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

/// Fly camera moved once per tick and interpolated per frame.
///
/// Movement methods take a time step so callers can drive them with the
/// tick length.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    prev_position: Vec3,
    prev_yaw: f32,
    prev_pitch: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 10.0, 15.0), -90.0_f32.to_radians(), -30.0_f32.to_radians())
    }
}

impl FlyCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            speed: 10.0,
            sensitivity: 0.003,
            prev_position: position,
            prev_yaw: yaw,
            prev_pitch: pitch,
        }
    }

    /// Remember the current pose as the previous tick's. Call at the start
    /// of each tick, before moving.
    pub fn begin_tick(&mut self) {
        self.prev_position = self.position;
        self.prev_yaw = self.yaw;
        self.prev_pitch = self.pitch;
    }

    pub fn prev_position(&self) -> Vec3 {
        self.prev_position
    }

    pub fn forward(&self) -> Vec3 {
        forward(self.yaw, self.pitch)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.forward() * self.speed * dt;
    }

    pub fn move_backward(&mut self, dt: f32) {
        self.position -= self.forward() * self.speed * dt;
    }

    pub fn move_left(&mut self, dt: f32) {
        self.position -= self.right() * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right() * self.speed * dt;
    }

    pub fn move_up(&mut self, dt: f32) {
        self.position.y += self.speed * dt;
    }

    pub fn move_down(&mut self, dt: f32) {
        self.position.y -= self.speed * dt;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Interpolated eye position, `lerp` of the way from the previous tick.
    pub fn lerp_eye(&self, lerp: f32) -> Vec3 {
        self.prev_position.lerp(self.position, lerp)
    }

    pub fn view(&self, lerp: f32) -> RenderView {
        let eye = self.lerp_eye(lerp);
        let yaw = self.prev_yaw + (self.yaw - self.prev_yaw) * lerp;
        let pitch = self.prev_pitch + (self.pitch - self.prev_pitch) * lerp;
        RenderView {
            eye,
            target: eye + forward(yaw, pitch),
        }
    }
}

fn forward(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = FlyCamera::default();
        assert!(cam.position.y > 0.0);
        let view = cam.view(0.5).view_matrix();
        assert!(!view.col(0).x.is_nan());
    }

    #[test]
    fn camera_movement() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.move_forward(1.0);
        assert_ne!(cam.position, start);
    }

    #[test]
    fn view_interpolates_between_ticks() {
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.begin_tick();
        cam.position = Vec3::new(2.0, 0.0, 0.0);

        assert_eq!(cam.view(0.0).eye, Vec3::ZERO);
        assert_eq!(cam.view(0.5).eye, Vec3::new(1.0, 0.0, 0.0));
        let v = cam.view(0.5);
        assert!((v.target - v.eye - Vec3::X).length() < 1e-5);
    }
}
