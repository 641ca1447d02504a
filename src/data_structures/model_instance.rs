//! A mesh drawn with a material at some place in the world.

use cgmath::Matrix4;

use crate::camera::Eye;
use crate::data_structures::mesh::MeshVertex;
use crate::data_structures::transform::Transform;
use crate::gpu::{Gpu, VertexArrayDesc, VertexArrayHandle};
use crate::library::{Library, MaterialId, MeshId};
use crate::render::DrawContext;
use crate::shader::ShaderProgram;

#[derive(Debug)]
pub struct ModelInstance {
    mesh: MeshId,
    material: MaterialId,
    transform: Transform,
    vertex_array: VertexArrayHandle,
    index_count: u32,
}

impl ModelInstance {
    /// Describes the mesh's interleaved layout against the material's program
    /// once; every draw reuses it.
    pub fn new(gpu: &mut dyn Gpu, library: &Library, mesh: MeshId, material: MaterialId) -> Self {
        let data = library.mesh(mesh);
        let program = library.material_shader(material);
        let attributes = MeshVertex::attributes(program);
        let vertex_array = gpu.create_vertex_array(&VertexArrayDesc {
            label: &format!("{} with {}", data.name(), library.material(material).name()),
            vertex_buffer: data.vertex_buffer(),
            index_buffer: Some(data.index_buffer()),
            stride: MeshVertex::STRIDE,
            attributes: &attributes,
        });
        Self {
            mesh,
            material,
            transform: Transform::default(),
            vertex_array,
            index_count: data.index_count(),
        }
    }

    /// Replaces the transform with a translation.
    pub fn moved(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform = Transform::at(x, y, z);
        self
    }

    /// Scales uniformly on top of the current transform.
    pub fn scaled(mut self, scale: f32) -> Self {
        self.transform.scale *= scale;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn transform(&self) -> Matrix4<f32> {
        self.transform.to_matrix()
    }

    pub fn draw(
        &self,
        gpu: &mut dyn Gpu,
        ctx: &DrawContext<'_>,
        eye: &dyn Eye,
        shader_override: Option<&ShaderProgram>,
    ) {
        let material = ctx.library.material(self.material);
        let program = shader_override.unwrap_or_else(|| ctx.library.shader(material.shader()));
        let model = self.transform.to_matrix();
        let mvp = eye.projection_matrix() * eye.view_matrix() * model;

        gpu.use_program(Some(program.handle()));
        gpu.set_uniform(program.uniforms.model_matrix, model.into());
        gpu.set_uniform(program.uniforms.mvp_matrix, mvp.into());
        if let Some(light) = ctx.light {
            light.bind(gpu, program);
        }
        material.bind(gpu, program, ctx.render);
        gpu.draw_elements(self.vertex_array, self.index_count);
        gpu.use_program(None);
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        gpu.delete_vertex_array(self.vertex_array);
    }
}
