//! Materials: a shader plus the textures it samples.
//!
//! Texture units are fixed per slot, so shaders and materials agree on them
//! without talking to each other: diffuse 0, specular 1, normal 2, height 3
//! and the shadow map on [`SHADOW_MAP_UNIT`].

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::gpu::{Gpu, TextureHandle, UniformValue};
use crate::library::ShaderId;
use crate::shader::ShaderProgram;

pub const SHADOW_MAP_UNIT: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::Diffuse,
        TextureSlot::Specular,
        TextureSlot::Normal,
        TextureSlot::Height,
    ];

    pub fn unit(self) -> u32 {
        match self {
            TextureSlot::Diffuse => 0,
            TextureSlot::Specular => 1,
            TextureSlot::Normal => 2,
            TextureSlot::Height => 3,
        }
    }
}

/// Frame-wide state every material binds: the shadow map written by the
/// shadow pass and the depth bias used when sampling it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderContext {
    pub shadow_map: TextureHandle,
    pub shadow_bias: f32,
}

#[derive(Debug)]
pub struct Material {
    name: String,
    shader: ShaderId,
    textures: BTreeMap<TextureSlot, TextureHandle>,
}

impl Material {
    pub fn new(name: &str, shader: ShaderId) -> Self {
        Self {
            name: name.to_owned(),
            shader,
            textures: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        self.textures.get(&slot).copied()
    }

    /// Decodes `bytes` (any format `image` understands) and attaches the result.
    pub fn attach_texture(
        &mut self,
        gpu: &mut dyn Gpu,
        program: &ShaderProgram,
        slot: TextureSlot,
        bytes: &[u8],
    ) -> Result<()> {
        let image = image::load_from_memory(bytes)
            .with_context(|| format!("decoding the {slot:?} texture of `{}`", self.name))?
            .to_rgba8();
        self.attach_image(gpu, program, slot, &image);
        Ok(())
    }

    /// Reads and attaches an image file.
    pub fn attach_texture_file(
        &mut self,
        gpu: &mut dyn Gpu,
        program: &ShaderProgram,
        slot: TextureSlot,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        log::info!("loading the {slot:?} texture of `{}` from {}", self.name, path.display());
        let bytes = crate::resources::load_binary(path)?;
        self.attach_texture(gpu, program, slot, &bytes)
    }

    /// Uploads `image` to the slot's unit and points the program's sampler
    /// uniform at it. Replaces (and releases) whatever the slot held before.
    pub fn attach_image(
        &mut self,
        gpu: &mut dyn Gpu,
        program: &ShaderProgram,
        slot: TextureSlot,
        image: &image::RgbaImage,
    ) {
        let label = format!("{} {slot:?}", self.name);
        let texture = gpu.create_texture(&label, image);
        if let Some(previous) = self.textures.insert(slot, texture) {
            log::warn!("`{}`: replacing the {slot:?} texture", self.name);
            gpu.delete_texture(previous);
        }
        gpu.use_program(Some(program.handle()));
        gpu.set_uniform(program.texture_location(slot), UniformValue::Int(slot.unit() as i32));
        gpu.use_program(None);
    }

    /// Binds every configured slot, then the shadow map and bias, against
    /// `program` (the one currently in use, which may be an override).
    pub fn bind(&self, gpu: &mut dyn Gpu, program: &ShaderProgram, ctx: &RenderContext) {
        for (slot, texture) in &self.textures {
            gpu.bind_texture(slot.unit(), *texture);
            gpu.set_uniform(program.texture_location(*slot), UniformValue::Int(slot.unit() as i32));
        }
        gpu.bind_texture(SHADOW_MAP_UNIT, ctx.shadow_map);
        gpu.set_uniform(
            program.uniforms.shadow_map,
            UniformValue::Int(SHADOW_MAP_UNIT as i32),
        );
        gpu.set_uniform(program.uniforms.shadow_bias, UniformValue::Float(ctx.shadow_bias));
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        for texture in self.textures.into_values() {
            gpu.delete_texture(texture);
        }
    }
}
