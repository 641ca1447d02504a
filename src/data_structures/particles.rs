//! A fountain of point sprites.
//!
//! [`ParticleSimulation`] is the CPU side: explicit Euler steps under gravity
//! and a respawning floor. [`ParticleSystem`] owns the GPU buffer the active
//! positions are streamed into every frame.

use cgmath::{Matrix4, One, Vector3};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::camera::Eye;
use crate::gpu::{
    BufferHandle, BufferUsage, Gpu, VertexArrayDesc, VertexArrayHandle, VertexAttribute,
};
use crate::library::{Library, MaterialId};
use crate::render::DrawContext;
use crate::shader::ShaderProgram;

pub const MAX_PARTICLES: usize = 1000;
pub const GRAVITY: Vector3<f32> = Vector3::new(0.0, -1.0, 0.0);
/// Particles that fall below this height respawn at the origin.
pub const FLOOR: f32 = -1.0;

#[derive(Debug)]
pub struct ParticleSimulation {
    positions: Vec<[f32; 3]>,
    velocities: Vec<Vector3<f32>>,
    rng: StdRng,
}

impl ParticleSimulation {
    pub fn new(seed: u64) -> Self {
        Self {
            positions: Vec::with_capacity(MAX_PARTICLES),
            velocities: Vec::with_capacity(MAX_PARTICLES),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Activates up to `n` more particles at the origin. Returns how many were
    /// actually added.
    pub fn add(&mut self, n: usize) -> usize {
        let added = n.min(MAX_PARTICLES - self.active());
        if added < n {
            log::warn!("particle limit of {MAX_PARTICLES} reached, dropping {}", n - added);
        }
        for _ in 0..added {
            let velocity = self.random_velocity();
            self.positions.push([0.0; 3]);
            self.velocities.push(velocity);
        }
        added
    }

    pub fn active(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector3<f32>] {
        &self.velocities
    }

    pub fn step(&mut self, dt: f32) {
        for i in 0..self.positions.len() {
            self.velocities[i] += GRAVITY * dt;
            let position = Vector3::from(self.positions[i]) + self.velocities[i] * dt;
            if position.y < FLOOR {
                self.positions[i] = [0.0; 3];
                self.velocities[i] = self.random_velocity();
            } else {
                self.positions[i] = position.into();
            }
        }
    }

    fn random_velocity(&mut self) -> Vector3<f32> {
        Vector3::new(
            self.rng.random_range(-1.0..1.0),
            self.rng.random_range(0.0..5.0),
            self.rng.random_range(-1.0..1.0),
        )
    }
}

#[derive(Debug)]
pub struct ParticleSystem {
    simulation: ParticleSimulation,
    material: MaterialId,
    transform: Matrix4<f32>,
    buffer: BufferHandle,
    vertex_array: VertexArrayHandle,
}

impl ParticleSystem {
    pub fn new(gpu: &mut dyn Gpu, library: &Library, material: MaterialId, seed: u64) -> Self {
        let name = library.material(material).name();
        let zeros = vec![[0.0f32; 3]; MAX_PARTICLES];
        let buffer = gpu.create_buffer(
            &format!("{name} particle buffer"),
            BufferUsage::Dynamic,
            bytemuck::cast_slice(&zeros),
        );
        let program = library.material_shader(material);
        let vertex_array = gpu.create_vertex_array(&VertexArrayDesc {
            label: &format!("{name} particles"),
            vertex_buffer: buffer,
            index_buffer: None,
            stride: std::mem::size_of::<[f32; 3]>() as u64,
            attributes: &[VertexAttribute {
                location: program.attributes.position,
                components: 3,
                offset: 0,
            }],
        });
        Self {
            simulation: ParticleSimulation::new(seed),
            material,
            transform: Matrix4::one(),
            buffer,
            vertex_array,
        }
    }

    pub fn with_particles(mut self, n: usize) -> Self {
        self.add(n);
        self
    }

    pub fn add(&mut self, n: usize) -> usize {
        self.simulation.add(n)
    }

    pub fn simulation(&self) -> &ParticleSimulation {
        &self.simulation
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Steps the simulation and streams the active positions to the GPU.
    pub fn update(&mut self, gpu: &mut dyn Gpu, dt: f32) {
        self.simulation.step(dt);
        let positions = self.simulation.positions();
        if !positions.is_empty() {
            gpu.write_buffer(self.buffer, 0, bytemuck::cast_slice(positions));
        }
    }

    /// Particles don't cast shadows: a draw with an override program (the
    /// depth-only pass) is skipped.
    pub fn draw(
        &self,
        gpu: &mut dyn Gpu,
        ctx: &DrawContext<'_>,
        eye: &dyn Eye,
        shader_override: Option<&ShaderProgram>,
    ) {
        if shader_override.is_some() {
            return;
        }
        let material = ctx.library.material(self.material);
        let program = ctx.library.shader(material.shader());
        let mvp = eye.projection_matrix() * eye.view_matrix() * self.transform;

        gpu.use_program(Some(program.handle()));
        gpu.set_uniform(program.uniforms.model_matrix, self.transform.into());
        gpu.set_uniform(program.uniforms.mvp_matrix, mvp.into());
        material.bind(gpu, program, ctx.render);
        gpu.draw_points(self.vertex_array, self.simulation.active() as u32);
        gpu.use_program(None);
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        gpu.delete_vertex_array(self.vertex_array);
        gpu.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn add_is_capped() {
        let mut sim = ParticleSimulation::new(1);
        assert_eq!(sim.add(600), 600);
        assert_eq!(sim.add(600), MAX_PARTICLES - 600);
        assert_eq!(sim.active(), MAX_PARTICLES);
        assert_eq!(sim.add(1), 0);
    }

    #[test]
    fn initial_velocities_are_biased_upward() {
        let mut sim = ParticleSimulation::new(2);
        sim.add(200);
        for v in sim.velocities() {
            assert!((-1.0..1.0).contains(&v.x));
            assert!((0.0..5.0).contains(&v.y));
            assert!((-1.0..1.0).contains(&v.z));
        }
        assert!(sim.positions().iter().all(|p| *p == [0.0; 3]));
    }

    #[test]
    fn euler_step_applies_gravity_first() {
        let mut sim = ParticleSimulation::new(3);
        sim.add(1);
        let v0 = sim.velocities()[0];
        sim.step(0.1);
        let v1 = sim.velocities()[0];
        assert_relative_eq!(v1, v0 + GRAVITY * 0.1, epsilon = 1e-6);
        assert_relative_eq!(Vector3::from(sim.positions()[0]), v1 * 0.1, epsilon = 1e-6);
    }

    #[test]
    fn particles_below_the_floor_respawn() {
        let mut sim = ParticleSimulation::new(4);
        sim.add(50);
        for _ in 0..2000 {
            sim.step(0.05);
            assert!(sim.positions().iter().all(|p| p[1] >= FLOOR));
        }
        assert_eq!(sim.active(), 50);
    }

    #[test]
    fn empty_simulation_steps() {
        let mut sim = ParticleSimulation::new(5);
        sim.step(1.0);
        assert_eq!(sim.active(), 0);
        assert!(sim.positions().is_empty());
    }

    #[test]
    fn seeds_are_reproducible() {
        let mut a = ParticleSimulation::new(9);
        let mut b = ParticleSimulation::new(9);
        a.add(10);
        b.add(10);
        assert_eq!(a.velocities(), b.velocities());
    }
}
