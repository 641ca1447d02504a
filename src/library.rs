//! Named storage for the shared resources drawables point at.
//!
//! Meshes and programs are shared between many drawables, materials between
//! a few. The library owns all of them and hands out typed indices; drawables
//! keep the index, never the resource.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::data_structures::material::{Material, TextureSlot};
use crate::data_structures::mesh::Mesh;
use crate::gpu::Gpu;
use crate::shader::ShaderProgram;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

#[derive(Debug, Default)]
pub struct Library {
    meshes: Vec<Mesh>,
    shaders: Vec<ShaderProgram>,
    materials: Vec<Material>,
    mesh_names: HashMap<String, MeshId>,
    shader_names: HashMap<String, ShaderId>,
    material_names: HashMap<String, MaterialId>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.mesh_names.insert(mesh.name().to_owned(), id);
        self.meshes.push(mesh);
        id
    }

    pub fn add_shader(&mut self, shader: ShaderProgram) -> ShaderId {
        let id = ShaderId(self.shaders.len());
        self.shader_names.insert(shader.label().to_owned(), id);
        self.shaders.push(shader);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.material_names.insert(material.name().to_owned(), id);
        self.materials.push(material);
        id
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    pub fn shader(&self, id: ShaderId) -> &ShaderProgram {
        &self.shaders[id.0]
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    /// The program a material draws with.
    pub fn material_shader(&self, id: MaterialId) -> &ShaderProgram {
        self.shader(self.material(id).shader())
    }

    pub fn mesh_id(&self, name: &str) -> Option<MeshId> {
        self.mesh_names.get(name).copied()
    }

    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.shader_names.get(name).copied()
    }

    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.material_names.get(name).copied()
    }

    /// Decodes `bytes` into `slot` of a material, wiring the sampler uniform of
    /// the material's own program.
    pub fn attach_texture(
        &mut self,
        gpu: &mut dyn Gpu,
        material: MaterialId,
        slot: TextureSlot,
        bytes: &[u8],
    ) -> Result<()> {
        let material = &mut self.materials[material.0];
        let program = &self.shaders[material.shader().0];
        material.attach_texture(gpu, program, slot, bytes)
    }

    pub fn attach_texture_file(
        &mut self,
        gpu: &mut dyn Gpu,
        material: MaterialId,
        slot: TextureSlot,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let material = &mut self.materials[material.0];
        let program = &self.shaders[material.shader().0];
        material.attach_texture_file(gpu, program, slot, path)
    }

    pub fn attach_image(
        &mut self,
        gpu: &mut dyn Gpu,
        material: MaterialId,
        slot: TextureSlot,
        image: &image::RgbaImage,
    ) {
        let material = &mut self.materials[material.0];
        let program = &self.shaders[material.shader().0];
        material.attach_image(gpu, program, slot, image);
    }

    /// Releases materials, then meshes, then programs.
    pub fn release(self, gpu: &mut dyn Gpu) {
        for material in self.materials {
            material.release(gpu);
        }
        for mesh in self.meshes {
            mesh.release(gpu);
        }
        for shader in self.shaders {
            shader.unload(gpu);
        }
    }
}
