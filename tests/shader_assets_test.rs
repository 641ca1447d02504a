mod common;

use common::RecordingGpu;
use shading_sandbox::data_structures::material::TextureSlot;
use shading_sandbox::gpu::Location;
use shading_sandbox::shader::{ShaderError, ShaderProgram, ShaderSources};
use shading_sandbox::showcase::{DEPTH_PROGRAM, PROGRAMS};

fn load(gpu: &mut RecordingGpu, stem: &str) -> ShaderProgram {
    ShaderProgram::load(gpu, common::shader_dir(), stem)
        .unwrap_or_else(|e| panic!("{stem}: {e}"))
}

#[test]
fn every_shipped_program_links_with_position_at_zero() {
    let mut gpu = RecordingGpu::new();
    for (label, stem) in PROGRAMS.into_iter().chain([DEPTH_PROGRAM]) {
        let program = load(&mut gpu, stem);
        assert_eq!(program.attributes.position, Location(0), "{label}");
        assert!(program.uniforms.mvp_matrix.is_used(), "{label}");
    }
}

#[test]
fn texture_slots_match_what_each_program_samples() {
    let mut gpu = RecordingGpu::new();
    let used = |program: &ShaderProgram| -> Vec<TextureSlot> {
        TextureSlot::ALL
            .into_iter()
            .filter(|slot| program.texture_location(*slot).is_used())
            .collect()
    };

    assert_eq!(used(&load(&mut gpu, "single_color")), vec![]);
    assert_eq!(used(&load(&mut gpu, "texture_mapping")), vec![TextureSlot::Diffuse]);
    assert_eq!(
        used(&load(&mut gpu, "phong")),
        vec![TextureSlot::Diffuse, TextureSlot::Specular]
    );
    assert_eq!(
        used(&load(&mut gpu, "normal_mapping")),
        vec![TextureSlot::Diffuse, TextureSlot::Specular, TextureSlot::Normal]
    );
    assert_eq!(used(&load(&mut gpu, "parallax_mapping")), TextureSlot::ALL.to_vec());
}

#[test]
fn only_lit_programs_see_the_light() {
    let mut gpu = RecordingGpu::new();

    let shadow = load(&mut gpu, "shadow_mapping");
    assert!(shadow.uniforms.shadow_map.is_used());
    assert!(shadow.uniforms.shadow_bias.is_used());
    assert!(shadow.uniforms.light_matrix.is_used());

    let phong = load(&mut gpu, "phong");
    assert!(phong.uniforms.light_position.is_used());
    assert!(!phong.uniforms.shadow_map.is_used());

    let depth = load(&mut gpu, "depth");
    assert!(!depth.uniforms.light_position.is_used());
    assert!(!depth.uniforms.shadow_map.is_used());
    assert_eq!(depth.attributes.texcoord, Location::UNUSED);
}

#[test]
fn vertex_colors_reads_the_color_attribute() {
    let mut gpu = RecordingGpu::new();
    let program = load(&mut gpu, "vertex_colors");
    assert_eq!(program.attributes.color, Location(4));
}

#[test]
fn missing_stage_file_names_the_path() {
    match ShaderSources::load(common::shader_dir(), "no_such_program") {
        Err(ShaderError::Io { path, .. }) => {
            assert!(path.ends_with("no_such_program.vert"));
        }
        other => panic!("expected an io error, got {other:?}"),
    }
}
