//! Scenes: what is on screen at one time.

use cgmath::Rad;

use crate::camera::Eye;
use crate::data_structures::material::RenderContext;
use crate::gpu::Gpu;
use crate::library::Library;
use crate::light::PointLight;
use crate::render::{DrawContext, Drawable};
use crate::shader::ShaderProgram;

/// A fixed list of drawables, drawn in order, plus an optional light they all
/// share. Whether the light orbits is the only thing that changes at runtime.
#[derive(Debug)]
pub struct Scene {
    name: String,
    drawables: Vec<Drawable>,
    light: Option<PointLight>,
    orbit_light: bool,
}

impl Scene {
    pub fn new(name: &str, drawables: Vec<Drawable>) -> Self {
        Self {
            name: name.to_owned(),
            drawables,
            light: None,
            orbit_light: false,
        }
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = Some(light);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn light(&self) -> Option<&PointLight> {
        self.light.as_ref()
    }

    pub fn orbits_light(&self) -> bool {
        self.orbit_light
    }

    pub fn toggle_light_orbit(&mut self) -> bool {
        self.orbit_light = !self.orbit_light;
        self.orbit_light
    }

    /// Steps every drawable, and the light when it orbits.
    pub fn update(&mut self, gpu: &mut dyn Gpu, dt: f32, light_orbit_speed: f32) {
        for drawable in &mut self.drawables {
            drawable.update(gpu, dt);
        }
        if self.orbit_light {
            if let Some(light) = &mut self.light {
                light.orbit(Rad(light_orbit_speed * dt));
            }
        }
    }

    pub fn draw(
        &self,
        gpu: &mut dyn Gpu,
        library: &Library,
        render: &RenderContext,
        eye: &dyn Eye,
        shader_override: Option<&ShaderProgram>,
    ) {
        let ctx = DrawContext {
            library,
            render,
            light: self.light.as_ref(),
        };
        for drawable in &self.drawables {
            drawable.draw(gpu, &ctx, eye, shader_override);
        }
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        for drawable in self.drawables {
            drawable.release(gpu);
        }
    }
}
