//! The shadow-casting point light.

use cgmath::{InnerSpace, Matrix4, Point3, Quaternion, Rad, Rotation, Rotation3, Vector3, ortho};

use crate::camera::{Eye, OPENGL_TO_WGPU_MATRIX};
use crate::gpu::{Gpu, UniformValue};
use crate::shader::ShaderProgram;

/// Half the width of the square the light's orthographic frustum covers.
pub const SHADOW_EXTENT: f32 = 2.0;

/// A point light that always looks at the origin. Doubles as the viewpoint of
/// the shadow pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    position: Point3<f32>,
    projection: Matrix4<f32>,
}

impl PointLight {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            projection: OPENGL_TO_WGPU_MATRIX
                * ortho(
                    -SHADOW_EXTENT,
                    SHADOW_EXTENT,
                    -SHADOW_EXTENT,
                    SHADOW_EXTENT,
                    0.005,
                    100.0,
                ),
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Rotates the light around the Y axis.
    pub fn orbit(&mut self, angle: Rad<f32>) {
        self.position = Quaternion::from_angle_y(angle).rotate_point(self.position);
    }

    /// World to light clip space.
    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        self.view_projection()
    }

    /// Pushes `light_position` and `light_matrix` into the program in use.
    pub fn bind(&self, gpu: &mut dyn Gpu, program: &ShaderProgram) {
        let position = Vector3::new(self.position.x, self.position.y, self.position.z);
        gpu.set_uniform(program.uniforms.light_position, position.into());
        gpu.set_uniform(
            program.uniforms.light_matrix,
            UniformValue::from(self.light_space_matrix()),
        );
    }
}

impl Eye for PointLight {
    fn view_matrix(&self) -> Matrix4<f32> {
        let to_origin = Point3::new(0.0, 0.0, 0.0) - self.position;
        let direction = if to_origin.magnitude2() > 1e-6 {
            to_origin.normalize()
        } else {
            -Vector3::unit_z()
        };
        // looking straight up or down needs another up vector
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_x()
        } else {
            Vector3::unit_y()
        };
        Matrix4::look_at_rh(self.position, self.position + direction, up)
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }
}
