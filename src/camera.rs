use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

// Splat scenes are authored Y-down; rotate them upright before viewing.
#[rustfmt::skip]
pub const SCENE_FLIP: Mat4 = Mat4::from_cols_array(&[
    1.0,  0.0,  0.0, 0.0,
    0.0, -1.0,  0.0, 0.0,
    0.0,  0.0, -1.0, 0.0,
    0.0,  0.0,  0.0, 1.0,
]);

pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up) * SCENE_FLIP
    }

    pub fn projection_matrix(&self) -> Mat4 {
        OPENGL_TO_WGPU_MATRIX * Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Focal lengths in pixels for the given framebuffer size.
    pub fn focal_length(&self, width: f32, height: f32) -> Vec2 {
        let fov_x = 2.0 * ((self.fovy * 0.5).tan() * self.aspect).atan();
        let fx = width / (2.0 * (fov_x * 0.5).tan());
        let fy = height / (2.0 * (self.fovy * 0.5).tan());
        Vec2::new(fx, fy)
    }
}

pub struct OrbitController {
    sensitivity: f32,
    zoom_speed: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    dragging: bool,
}

impl OrbitController {
    pub fn new(distance: f32, sensitivity: f32) -> Self {
        Self {
            sensitivity,
            zoom_speed: 0.4,
            yaw: -90.0_f32.to_radians(), // Start looking "forward" along -Z
            pitch: 0.0,
            distance,
            dragging: false,
        }
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };
                self.distance = (self.distance - lines * self.zoom_speed).clamp(0.5, 100.0);
                true
            }
            _ => false,
        }
    }

    pub fn process_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        if !self.dragging {
            return;
        }

        self.yaw += (mouse_dx as f32) * self.sensitivity;
        self.pitch -= (mouse_dy as f32) * self.sensitivity;

        // Clamp pitch so you don't flip over
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn update_camera(&self, camera: &mut Camera) {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        let forward = Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize();

        camera.eye = camera.target - forward * self.distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera {
            eye: Vec3::new(0.0, 0.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 16.0 / 9.0,
            fovy: 45.0_f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    #[test]
    fn test_focal_length_square_pixels() {
        let camera = test_camera();
        let focal = camera.focal_length(1600.0, 900.0);

        // Square pixels: both axes share one focal length
        assert_relative_eq!(focal.x, focal.y, epsilon = 1e-2);
        assert_relative_eq!(
            focal.y,
            900.0 / (2.0 * (camera.fovy * 0.5).tan()),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = test_camera();
        let clip = camera.build_view_projection_matrix() * camera.target.extend(1.0);

        assert!(clip.w > 0.0, "target must sit in front of the camera");
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orbit_places_eye_at_distance() {
        let mut camera = test_camera();
        let controller = OrbitController::new(4.0, 0.005);
        controller.update_camera(&mut camera);

        assert_relative_eq!((camera.eye - camera.target).length(), 4.0, epsilon = 1e-4);
        // Default yaw looks down -Z, so the eye sits on +Z of the target
        assert_relative_eq!(camera.eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.z, 4.0, epsilon = 1e-4);
    }
}
