//! shading-sandbox
//!
//! An interactive sandbox for comparing shading techniques (flat colour,
//! vertex colour, texture mapping, Phong, normal, parallax and shadow mapping)
//! on loaded meshes. The user cycles through a list of scenes; each frame is a
//! shadow pass from the scene's light followed by a colour pass from the
//! orbiting camera.
//!
//! High-level modules
//! - `gpu`: the device seam (`Gpu`) and its wgpu implementation
//! - `shader`: shader sources, programs and naga-based reflection
//! - `data_structures`: meshes, materials, drawables and scenes
//! - `camera` / `light`: the two viewpoints a scene can be drawn from
//! - `renderer`: the per-frame shadow pass + colour pass
//! - `resources`: mesh, image and text loading
//! - `flow`: the winit event loop driving the renderer
//! - `showcase`: the programs, materials and scenes the binary ships with

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod gpu;
pub mod input;
pub mod library;
pub mod light;
pub mod pipelines;
pub mod render;
pub mod renderer;
pub mod resources;
pub mod settings;
pub mod shader;
pub mod showcase;
