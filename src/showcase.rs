//! The scenes the sandbox ships with.
//!
//! The box, floor and particle scenes are built from procedural meshes and
//! always exist. The eyeball and rock scenes need model and texture files from
//! the asset directory and are skipped, with a warning, when any of them is
//! missing.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::data_structures::material::{Material, TextureSlot};
use crate::data_structures::mesh::{Mesh, MeshData, SourceMesh};
use crate::data_structures::model_instance::ModelInstance;
use crate::data_structures::particles::ParticleSystem;
use crate::data_structures::scene::Scene;
use crate::gpu::Gpu;
use crate::library::{Library, MaterialId, MeshId, ShaderId};
use crate::light::PointLight;
use crate::resources;
use crate::settings::Settings;
use crate::shader::ShaderProgram;

/// `(label, file stem)` of every program, in load order.
pub const PROGRAMS: [(&str, &str); 8] = [
    ("Single color", "single_color"),
    ("Vertex colors", "vertex_colors"),
    ("Texture mapping", "texture_mapping"),
    ("Phong shading", "phong"),
    ("Normal mapping", "normal_mapping"),
    ("Parallax mapping", "parallax_mapping"),
    ("Shadow mapping", "shadow_mapping"),
    ("Particles", "particles"),
];

/// The depth-only program of the shadow pass.
pub const DEPTH_PROGRAM: (&str, &str) = ("Depth", "depth");

const FOUNTAIN_PARTICLES: usize = 500;
/// Imported models are authored three times larger than the scenes expect.
const MODEL_SCALE: f32 = 1.0 / 3.0;

pub struct Showcase {
    pub library: Library,
    pub scenes: Vec<Scene>,
    pub depth_shader: ShaderId,
}

pub fn build(gpu: &mut dyn Gpu, settings: &Settings) -> Result<Showcase> {
    let mut library = Library::new();
    let shader_dir = settings.shader_dir();
    for (label, stem) in PROGRAMS {
        load_program(gpu, &mut library, &shader_dir, label, stem)?;
    }
    let (label, stem) = DEPTH_PROGRAM;
    let depth_shader = load_program(gpu, &mut library, &shader_dir, label, stem)?;

    let shader = |library: &Library, label: &str| {
        library
            .shader_id(label)
            .with_context(|| format!("no program `{label}`"))
    };
    let single_color = shader(&library, "Single color")?;
    let vertex_colors = shader(&library, "Vertex colors")?;
    let texture_mapping = shader(&library, "Texture mapping")?;
    let phong = shader(&library, "Phong shading")?;
    let normal_mapping = shader(&library, "Normal mapping")?;
    let parallax_mapping = shader(&library, "Parallax mapping")?;
    let shadow_mapping = shader(&library, "Shadow mapping")?;
    let particles = shader(&library, "Particles")?;

    let cube = library.add_mesh(Mesh::upload(
        gpu,
        "Box",
        MeshData::from_sources(&[SourceMesh::cube()])?,
    ));
    let floor = library.add_mesh(Mesh::upload(
        gpu,
        "Floor",
        MeshData::from_sources(&[SourceMesh::plane(1.5)])?,
    ));
    let assets = settings.asset_dir.as_path();
    let eye = load_mesh(gpu, &mut library, assets, "Eye", "eyeball.obj");
    let rocks = load_mesh(gpu, &mut library, assets, "Rocks", "wall.obj");

    let flat = library.add_material(Material::new("Single color", single_color));
    let coloured = library.add_material(Material::new("Vertex colors", vertex_colors));
    let sparks = library.add_material(Material::new("Sparks", particles));

    let checker = library.add_material(Material::new("Checker", shadow_mapping));
    library.attach_image(gpu, checker, TextureSlot::Diffuse, &checkerboard(256, 8));

    let eye_diffuse = textured(
        gpu,
        &mut library,
        assets,
        "Eye diffuse",
        texture_mapping,
        &[(TextureSlot::Diffuse, "eyeball_diffuse.png")],
    );
    let eye_phong = textured(
        gpu,
        &mut library,
        assets,
        "Eye Phong",
        phong,
        &[
            (TextureSlot::Diffuse, "eyeball_diffuse.png"),
            (TextureSlot::Specular, "eyeball_specular.png"),
        ],
    );
    let eye_normal = textured(
        gpu,
        &mut library,
        assets,
        "Eye normal",
        normal_mapping,
        &[
            (TextureSlot::Diffuse, "eyeball_diffuse.png"),
            (TextureSlot::Specular, "eyeball_specular.png"),
            (TextureSlot::Normal, "eyeball_normal.png"),
        ],
    );
    let rock = textured(
        gpu,
        &mut library,
        assets,
        "Rock",
        texture_mapping,
        &[(TextureSlot::Diffuse, "floor_albedo_ao.png")],
    );
    let rock_parallax = textured(
        gpu,
        &mut library,
        assets,
        "Rock parallax",
        parallax_mapping,
        &[
            (TextureSlot::Diffuse, "floor_albedo_ao.png"),
            (TextureSlot::Specular, "floor_specular2.png"),
            (TextureSlot::Normal, "floor_normal.png"),
            (TextureSlot::Height, "floor_height.png"),
        ],
    );

    let mut scenes = vec![
        Scene::new(
            "Box, single colour",
            vec![ModelInstance::new(gpu, &library, cube, flat).scaled(0.5).into()],
        ),
        Scene::new(
            "Box, vertex colours",
            vec![ModelInstance::new(gpu, &library, cube, coloured).scaled(0.5).into()],
        ),
    ];

    let imported: [(&str, Option<MeshId>, Option<MaterialId>, Option<PointLight>); 5] = [
        ("Eye, diffuse texture", eye, eye_diffuse, None),
        ("Eye, Phong", eye, eye_phong, Some(PointLight::new(5.0, 1.0, 10.0))),
        (
            "Eye, normal mapping",
            eye,
            eye_normal,
            Some(PointLight::new(5.0, 1.0, 10.0)),
        ),
        ("Rocks, diffuse texture", rocks, rock, None),
        (
            "Rocks, parallax mapping",
            rocks,
            rock_parallax,
            Some(PointLight::new(1.0, 5.0, -10.0)),
        ),
    ];
    for (name, mesh, material, light) in imported {
        let (Some(mesh), Some(material)) = (mesh, material) else {
            log::warn!("skipping scene `{name}`: its assets did not load");
            continue;
        };
        let instance = ModelInstance::new(gpu, &library, mesh, material).scaled(MODEL_SCALE);
        let mut scene = Scene::new(name, vec![instance.into()]);
        if let Some(light) = light {
            scene = scene.with_light(light);
        }
        scenes.push(scene);
    }

    scenes.push(Scene::new(
        "Particle fountain",
        vec![
            ModelInstance::new(gpu, &library, floor, flat)
                .moved(0.0, -1.0, 0.0)
                .into(),
            ParticleSystem::new(gpu, &library, sparks, settings.particle_seed)
                .with_particles(FOUNTAIN_PARTICLES)
                .into(),
        ],
    ));
    scenes.push(
        Scene::new(
            "Shadow mapping",
            vec![
                ModelInstance::new(gpu, &library, floor, checker)
                    .moved(0.0, -0.5, 0.0)
                    .into(),
                ModelInstance::new(gpu, &library, cube, checker)
                    .scaled(0.25)
                    .into(),
            ],
        )
        .with_light(PointLight::new(1.0, 3.0, 2.0)),
    );

    log::info!("{} scenes ready", scenes.len());
    Ok(Showcase {
        library,
        scenes,
        depth_shader,
    })
}

/// Shader errors are fatal, so they propagate.
fn load_program(
    gpu: &mut dyn Gpu,
    library: &mut Library,
    dir: &Path,
    label: &str,
    stem: &str,
) -> Result<ShaderId> {
    log::info!("compiling `{label}` from {}", dir.join(stem).display());
    let sources = crate::shader::ShaderSources::load(dir, stem)?;
    let program = ShaderProgram::compile(gpu, label, &sources)?;
    Ok(library.add_shader(program))
}

fn load_mesh(
    gpu: &mut dyn Gpu,
    library: &mut Library,
    assets: &Path,
    name: &str,
    file: &str,
) -> Option<MeshId> {
    match resources::load_mesh(assets.join(file)) {
        Ok(data) => Some(library.add_mesh(Mesh::upload(gpu, name, data))),
        Err(e) => {
            log::warn!("mesh `{name}` unavailable: {e:#}");
            None
        }
    }
}

/// A material whose every texture loaded, or `None`.
fn textured(
    gpu: &mut dyn Gpu,
    library: &mut Library,
    assets: &Path,
    name: &str,
    shader: ShaderId,
    textures: &[(TextureSlot, &str)],
) -> Option<MaterialId> {
    let mut material = Material::new(name, shader);
    for (slot, file) in textures {
        let program = library.shader(shader);
        if let Err(e) = material.attach_texture_file(gpu, program, *slot, assets.join(file)) {
            log::warn!("material `{name}` unavailable: {e:#}");
            material.release(gpu);
            return None;
        }
    }
    Some(library.add_material(material))
}

fn checkerboard(size: u32, squares: u32) -> image::RgbaImage {
    let square = (size / squares).max(1);
    image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / square + y / square) % 2 == 0 {
            image::Rgba([230, 230, 230, 255])
        } else {
            image::Rgba([90, 90, 110, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates() {
        let image = checkerboard(8, 4);
        assert_eq!(image.get_pixel(0, 0), image.get_pixel(3, 3));
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(2, 0));
    }
}
