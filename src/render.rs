//! Drawables.
//!
//! This module defines the [`Drawable`] enum, the unit a [`Scene`] is made of.
//! A drawable knows how to issue its own draw call for any [`Eye`], optionally
//! with a program that overrides the one its material asks for (the shadow pass
//! renders everything with a single depth-only program).
//!
//! # Variants
//!
//! - `Model` draws an indexed triangle mesh, static once placed
//! - `Particles` draws point sprites and steps its simulation every frame
//!
//! [`Scene`]: crate::data_structures::scene::Scene

use crate::camera::Eye;
use crate::data_structures::material::RenderContext;
use crate::data_structures::model_instance::ModelInstance;
use crate::data_structures::particles::ParticleSystem;
use crate::gpu::Gpu;
use crate::library::Library;
use crate::light::PointLight;
use crate::shader::ShaderProgram;

/// Everything a draw call may consult besides the eye.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub library: &'a Library,
    pub render: &'a RenderContext,
    /// The scene's light, if it has one.
    pub light: Option<&'a PointLight>,
}

#[derive(Debug)]
pub enum Drawable {
    Model(ModelInstance),
    Particles(ParticleSystem),
}

impl Drawable {
    pub fn draw(
        &self,
        gpu: &mut dyn Gpu,
        ctx: &DrawContext<'_>,
        eye: &dyn Eye,
        shader_override: Option<&ShaderProgram>,
    ) {
        match self {
            Drawable::Model(model) => model.draw(gpu, ctx, eye, shader_override),
            Drawable::Particles(particles) => particles.draw(gpu, ctx, eye, shader_override),
        }
    }

    /// Static models ignore time.
    pub fn update(&mut self, gpu: &mut dyn Gpu, dt: f32) {
        match self {
            Drawable::Model(_) => (),
            Drawable::Particles(particles) => particles.update(gpu, dt),
        }
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        match self {
            Drawable::Model(model) => model.release(gpu),
            Drawable::Particles(particles) => particles.release(gpu),
        }
    }
}

impl From<ModelInstance> for Drawable {
    fn from(model: ModelInstance) -> Self {
        Drawable::Model(model)
    }
}

impl From<ParticleSystem> for Drawable {
    fn from(particles: ParticleSystem) -> Self {
        Drawable::Particles(particles)
    }
}
