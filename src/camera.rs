//! Viewpoints.
//!
//! Anything that can be rendered from implements [`Eye`]. The interactive
//! [`Camera`] is one; the shadow-casting [`PointLight`](crate::light::PointLight)
//! is the other.

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};

use crate::settings::Settings;

/// Maps OpenGL clip space (z in -1..1) to wgpu clip space (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub trait Eye {
    fn view_matrix(&self) -> Matrix4<f32>;
    fn projection_matrix(&self) -> Matrix4<f32>;

    fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Closest the camera may get to the origin.
pub const MIN_DISTANCE: f32 = 0.05;

/// Orbits the origin in the XZ plane. Dragging with the pointer button held
/// changes the angle, scrolling changes the distance.
#[derive(Clone, Debug)]
pub struct Camera {
    rotation: Rad<f32>,
    distance: f32,
    angular_speed: f32,
    zoom_speed: f32,
    fovy: Rad<f32>,
    aspect: f32,
    znear: f32,
    zfar: f32,
    dragging: bool,
}

impl Camera {
    pub fn new(settings: &Settings, width: u32, height: u32) -> Self {
        Self {
            rotation: Rad(0.0),
            distance: settings.camera_distance.max(MIN_DISTANCE),
            angular_speed: settings.camera_angular_speed,
            zoom_speed: settings.camera_zoom_speed,
            fovy: Rad(std::f32::consts::FRAC_PI_2),
            aspect: aspect(width, height),
            znear: 0.005,
            zfar: 100.0,
            dragging: false,
        }
    }

    pub fn rotation(&self) -> Rad<f32> {
        self.rotation
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_orbit(&mut self, rotation: Rad<f32>, distance: f32) {
        self.rotation = rotation;
        self.distance = distance.max(MIN_DISTANCE);
    }

    pub fn eye_position(&self) -> Point3<f32> {
        let (sin, cos) = self.rotation.0.sin_cos();
        Point3::new(self.distance * cos, 0.0, self.distance * sin)
    }

    pub fn handle_pointer_button(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    /// Horizontal pointer movement in pixels.
    pub fn handle_pointer_motion(&mut self, dx: f32) {
        if self.dragging {
            self.rotation += Rad(dx * self.angular_speed);
        }
    }

    /// Positive `lines` zoom in.
    pub fn handle_scroll(&mut self, lines: f32) {
        self.distance = (self.distance - lines * self.zoom_speed).max(MIN_DISTANCE);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect(width, height);
    }
}

impl Eye for Camera {
    fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye_position(), Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{InnerSpace, Transform, Vector4};

    fn camera() -> Camera {
        Camera::new(&Settings::default(), 800, 600)
    }

    #[test]
    fn starts_on_the_x_axis() {
        let camera = camera();
        assert_eq!(camera.rotation(), Rad(0.0));
        assert_relative_eq!(camera.distance(), 1.0);
        assert_relative_eq!(camera.eye_position(), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn view_looks_at_the_origin_with_y_up() {
        let view = camera().view_matrix();
        // the eye sits at the view-space origin
        assert_relative_eq!(
            view.transform_point(Point3::new(1.0, 0.0, 0.0)),
            Point3::new(0.0, 0.0, 0.0),
            epsilon = 1e-6
        );
        // the origin is straight ahead, one unit down -z
        assert_relative_eq!(
            view.transform_point(Point3::new(0.0, 0.0, 0.0)),
            Point3::new(0.0, 0.0, -1.0),
            epsilon = 1e-6
        );
        // world up stays up
        let up = view * Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert_relative_eq!(up.truncate().normalize(), Vector3::unit_y(), epsilon = 1e-6);
    }

    #[test]
    fn orbits_only_while_dragging() {
        let mut camera = camera();
        camera.handle_pointer_motion(100.0);
        assert_eq!(camera.rotation(), Rad(0.0));

        camera.handle_pointer_button(true);
        camera.handle_pointer_motion(100.0);
        assert_relative_eq!(camera.rotation().0, 0.5);
        camera.handle_pointer_button(false);
        camera.handle_pointer_motion(100.0);
        assert_relative_eq!(camera.rotation().0, 0.5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = camera();
        camera.handle_scroll(10.0);
        assert_relative_eq!(camera.distance(), 0.8);
        camera.handle_scroll(1000.0);
        assert_relative_eq!(camera.distance(), MIN_DISTANCE);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let camera = camera();
        let clip = camera.projection_matrix() * Vector4::new(0.0, 0.0, -0.005, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-4);
        let clip = camera.projection_matrix() * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(clip.z / clip.w, 1.0, epsilon = 1e-4);
    }
}
