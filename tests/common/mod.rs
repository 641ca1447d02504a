#![allow(dead_code)]

pub mod recording_gpu;

use std::path::PathBuf;

use shading_sandbox::data_structures::mesh::{Mesh, MeshData, SourceMesh};
use shading_sandbox::gpu::Gpu;
use shading_sandbox::settings::Settings;
use shading_sandbox::shader::{ShaderProgram, ShaderSources};

pub use recording_gpu::{Call, RecordingGpu};

pub fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join("shaders")
}

/// Default settings pointed at the repository's assets.
pub fn settings() -> Settings {
    Settings {
        asset_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
        ..Settings::default()
    }
}

pub fn program(gpu: &mut dyn Gpu, stem: &str) -> ShaderProgram {
    let sources = ShaderSources::load(shader_dir(), stem).expect("shipped shader sources");
    ShaderProgram::compile(gpu, stem, &sources).expect("shipped shader compiles")
}

pub fn cube(gpu: &mut dyn Gpu) -> Mesh {
    let data = MeshData::from_sources(&[SourceMesh::cube()]).expect("cube fits 16-bit indices");
    Mesh::upload(gpu, "cube", data)
}
