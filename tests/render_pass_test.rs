mod common;

use common::{Call, RecordingGpu};
use shading_sandbox::data_structures::material::{Material, SHADOW_MAP_UNIT};
use shading_sandbox::data_structures::model_instance::ModelInstance;
use shading_sandbox::data_structures::particles::ParticleSystem;
use shading_sandbox::data_structures::scene::Scene;
use shading_sandbox::gpu::{PassTarget, UniformValue};
use shading_sandbox::input::{Command, InputEvent};
use shading_sandbox::library::{Library, ShaderId};
use shading_sandbox::light::PointLight;
use shading_sandbox::renderer::Renderer;

const LIGHT_NAMES: [&str; 2] = ["light_position", "light_matrix"];

fn one_box(gpu: &mut RecordingGpu, light: Option<PointLight>) -> (Library, Vec<Scene>, ShaderId) {
    let mut library = Library::new();
    let lit = library.add_shader(common::program(gpu, "shadow_mapping"));
    let depth = library.add_shader(common::program(gpu, "depth"));
    let mesh = library.add_mesh(common::cube(gpu));
    let material = library.add_material(Material::new("lit", lit));
    let instance = ModelInstance::new(gpu, &library, mesh, material);
    let mut scene = Scene::new("box", vec![instance.into()]);
    if let Some(light) = light {
        scene = scene.with_light(light);
    }
    (library, vec![scene], depth)
}

fn renderer(light: Option<PointLight>) -> Renderer<RecordingGpu> {
    let mut gpu = RecordingGpu::new();
    let (library, scenes, depth) = one_box(&mut gpu, light);
    let mut renderer = Renderer::new(gpu, library, scenes, depth, &common::settings());
    renderer.gpu_mut().clear();
    renderer
}

#[test]
fn shadow_pass_runs_before_colour_pass_and_feeds_light_uniforms() {
    let mut renderer = renderer(Some(PointLight::new(1.0, 3.0, 2.0)));
    renderer.render_frame().unwrap();

    let passes = renderer.gpu().passes();
    assert_eq!(passes.len(), 2);
    assert_eq!(
        passes[0].0,
        PassTarget::Shadow {
            map: renderer.shadow_map(),
            size: 2048
        }
    );
    assert_eq!(passes[1].0, PassTarget::Screen);

    let depth = renderer.library().shader_id("depth").unwrap();
    let depth = renderer.library().shader(depth).handle();
    let lit = renderer.library().shader_id("shadow_mapping").unwrap();
    let lit = renderer.library().shader(lit).handle();
    let draws = |calls: &[Call]| -> Vec<_> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawElements { program, count, .. } => Some((*program, *count)),
                _ => None,
            })
            .collect()
    };
    assert_eq!(draws(&passes[0].1), vec![(depth, 36)]);
    assert_eq!(draws(&passes[1].1), vec![(lit, 36)]);

    let writes = RecordingGpu::uniform_writes(&passes[1].1);
    let value = |name: &str| writes.iter().find(|w| w.1 == name).map(|w| w.2);
    assert_eq!(value("light_position"), Some(UniformValue::Vec3([1.0, 3.0, 2.0])));
    assert!(matches!(value("light_matrix"), Some(UniformValue::Mat4(_))));
    assert_eq!(value("shadow_map"), Some(UniformValue::Int(SHADOW_MAP_UNIT as i32)));
    assert_eq!(value("shadow_bias"), Some(UniformValue::Float(0.005)));
    assert!(
        passes[1]
            .1
            .contains(&Call::BindTexture(SHADOW_MAP_UNIT, renderer.shadow_map()))
    );
}

#[test]
fn depth_program_ignores_light_and_material_uniforms() {
    let mut renderer = renderer(Some(PointLight::new(1.0, 3.0, 2.0)));
    renderer.render_frame().unwrap();

    let passes = renderer.gpu().passes();
    let names: Vec<String> = RecordingGpu::uniform_writes(&passes[0].1)
        .into_iter()
        .map(|w| w.1)
        .collect();
    assert_eq!(names, vec!["model_matrix", "mvp_matrix"]);
}

#[test]
fn without_a_light_only_the_colour_pass_runs() {
    let mut renderer = renderer(None);
    renderer.render_frame().unwrap();

    let passes = renderer.gpu().passes();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].0, PassTarget::Screen);
    let light_writes = RecordingGpu::uniform_writes(&renderer.gpu().calls)
        .into_iter()
        .filter(|w| LIGHT_NAMES.contains(&w.1.as_str()))
        .count();
    assert_eq!(light_writes, 0);
}

#[test]
fn frame_is_bracketed() {
    let mut renderer = renderer(None);
    renderer.render_frame().unwrap();
    let calls = &renderer.gpu().calls;
    assert_eq!(calls.first(), Some(&Call::BeginFrame));
    assert_eq!(calls.last(), Some(&Call::EndFrame));
}

#[test]
fn no_scene_still_clears_the_screen() {
    let mut gpu = RecordingGpu::new();
    let mut library = Library::new();
    let depth = library.add_shader(common::program(&mut gpu, "depth"));
    let mut renderer = Renderer::new(gpu, library, Vec::new(), depth, &common::settings());
    renderer.render_frame().unwrap();

    let passes = renderer.gpu().passes();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].0, PassTarget::Screen);
    assert!(passes[0].1.is_empty());
    assert!(renderer.active_scene().is_none());
}

#[test]
fn shadow_bias_keys_adjust_and_clamp() {
    let mut renderer = renderer(Some(PointLight::new(1.0, 3.0, 2.0)));
    renderer.handle_input(InputEvent::Command(Command::IncreaseShadowBias));
    approx::assert_relative_eq!(renderer.shadow_bias(), 0.0055, epsilon = 1e-7);

    renderer.set_shadow_bias(0.0002);
    renderer.handle_input(InputEvent::Command(Command::DecreaseShadowBias));
    assert_eq!(renderer.shadow_bias(), 0.0);

    renderer.render_frame().unwrap();
    let writes = RecordingGpu::uniform_writes(&renderer.gpu().calls);
    assert!(
        writes
            .iter()
            .any(|w| w.1 == "shadow_bias" && w.2 == UniformValue::Float(0.0))
    );
}

#[test]
fn particles_skip_the_shadow_pass() {
    let mut gpu = RecordingGpu::new();
    let mut library = Library::new();
    let lit = library.add_shader(common::program(&mut gpu, "shadow_mapping"));
    let sparks = library.add_shader(common::program(&mut gpu, "particles"));
    let depth = library.add_shader(common::program(&mut gpu, "depth"));
    let mesh = library.add_mesh(common::cube(&mut gpu));
    let lit = library.add_material(Material::new("lit", lit));
    let sparks = library.add_material(Material::new("sparks", sparks));
    let drawables = vec![
        ModelInstance::new(&mut gpu, &library, mesh, lit).into(),
        ParticleSystem::new(&mut gpu, &library, sparks, 3)
            .with_particles(10)
            .into(),
    ];
    let scene = Scene::new("fountain", drawables).with_light(PointLight::new(1.0, 3.0, 2.0));

    let mut renderer = Renderer::new(gpu, library, vec![scene], depth, &common::settings());
    renderer.render_frame().unwrap();
    let passes = renderer.gpu().passes();
    let points = |calls: &[Call]| {
        calls
            .iter()
            .filter(|c| matches!(c, Call::DrawPoints { count: 10, .. }))
            .count()
    };
    let elements = |calls: &[Call]| {
        calls
            .iter()
            .filter(|c| matches!(c, Call::DrawElements { .. }))
            .count()
    };
    assert_eq!((elements(&passes[0].1), points(&passes[0].1)), (1, 0));
    assert_eq!((elements(&passes[1].1), points(&passes[1].1)), (1, 1));
}

#[test]
fn moving_replaces_and_scaling_accumulates() {
    let mut gpu = RecordingGpu::new();
    let (mut library, _, _) = one_box(&mut gpu, None);
    let lit = library.shader_id("shadow_mapping").unwrap();
    let material = library.add_material(Material::new("placed", lit));
    let mesh = library.mesh_id("cube").unwrap();
    let translation = cgmath::Matrix4::from_translation(cgmath::Vector3::new(0.0, -0.5, 0.0));

    let scaled_after = ModelInstance::new(&mut gpu, &library, mesh, material)
        .moved(0.0, -0.5, 0.0)
        .scaled(0.5)
        .scaled(0.5);
    assert_eq!(
        scaled_after.transform(),
        translation * cgmath::Matrix4::from_scale(0.25)
    );

    let moved_after = ModelInstance::new(&mut gpu, &library, mesh, material)
        .scaled(0.25)
        .moved(0.0, -0.5, 0.0);
    assert_eq!(moved_after.transform(), translation);
}
