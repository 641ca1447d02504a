//! Frame orchestration.
//!
//! Each frame is two strictly ordered passes over the active scene:
//!
//! 1. the shadow pass, only when the scene has a light: the scene is drawn
//!    from the light with the depth-only program into the shadow map,
//! 2. the colour pass: the scene is drawn from the camera, every drawable with
//!    its own material, sampling the shadow map written in step 1.
//!
//! The shadow map and its bias are the only renderer-wide state materials see;
//! they are handed to them as a [`RenderContext`] every frame.

use std::time::Duration;

use anyhow::Result;

use crate::camera::Camera;
use crate::data_structures::material::RenderContext;
use crate::data_structures::scene::Scene;
use crate::gpu::{Gpu, PassTarget, TextureHandle};
use crate::input::{Command, InputEvent};
use crate::library::{Library, ShaderId};
use crate::settings::Settings;

pub struct Renderer<G: Gpu> {
    gpu: G,
    library: Library,
    scenes: Vec<Scene>,
    current: usize,
    camera: Camera,
    depth_shader: ShaderId,
    shadow_map: TextureHandle,
    shadow_map_size: u32,
    shadow_bias: f32,
    shadow_bias_step: f32,
    light_orbit_speed: f32,
}

impl<G: Gpu> Renderer<G> {
    /// Takes ownership of everything built at startup. The last scene is
    /// active.
    pub fn new(
        mut gpu: G,
        library: Library,
        scenes: Vec<Scene>,
        depth_shader: ShaderId,
        settings: &Settings,
    ) -> Self {
        let shadow_map = gpu.create_depth_texture("shadow map", settings.shadow_map_size);
        let current = scenes.len().saturating_sub(1);
        if let Some(scene) = scenes.get(current) {
            log::info!("showing scene `{}`", scene.name());
        }
        Self {
            gpu,
            library,
            scenes,
            current,
            camera: Camera::new(settings, settings.width, settings.height),
            depth_shader,
            shadow_map,
            shadow_map_size: settings.shadow_map_size,
            shadow_bias: settings.shadow_bias,
            shadow_bias_step: settings.shadow_bias_step,
            light_orbit_speed: settings.light_orbit_speed,
        }
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn active_index(&self) -> usize {
        self.current
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.current)
    }

    pub fn shadow_map(&self) -> TextureHandle {
        self.shadow_map
    }

    pub fn shadow_bias(&self) -> f32 {
        self.shadow_bias
    }

    pub fn set_shadow_bias(&mut self, bias: f32) {
        self.shadow_bias = bias.max(0.0);
    }

    /// Moves `steps` scenes forward (or back, when negative), wrapping at
    /// both ends. Returns the new index.
    pub fn cycle_scene(&mut self, steps: isize) -> usize {
        if self.scenes.is_empty() {
            return 0;
        }
        self.current = cycle(self.current, steps, self.scenes.len());
        log::info!("showing scene `{}`", self.scenes[self.current].name());
        self.current
    }

    pub fn update(&mut self, dt: Duration) {
        if let Some(scene) = self.scenes.get_mut(self.current) {
            scene.update(&mut self.gpu, dt.as_secs_f32(), self.light_orbit_speed);
        }
    }

    pub fn render_frame(&mut self) -> Result<()> {
        let render = RenderContext {
            shadow_map: self.shadow_map,
            shadow_bias: self.shadow_bias,
        };

        self.gpu.begin_frame()?;
        if let Some(scene) = self.scenes.get(self.current) {
            if let Some(light) = scene.light() {
                let depth = self.library.shader(self.depth_shader);
                self.gpu.begin_pass(PassTarget::Shadow {
                    map: self.shadow_map,
                    size: self.shadow_map_size,
                });
                scene.draw(&mut self.gpu, &self.library, &render, light, Some(depth));
                self.gpu.end_pass();
            }

            self.gpu.begin_pass(PassTarget::Screen);
            scene.draw(&mut self.gpu, &self.library, &render, &self.camera, None);
            self.gpu.end_pass();
        } else {
            self.gpu.begin_pass(PassTarget::Screen);
            self.gpu.end_pass();
        }
        self.gpu.end_frame()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.resize(width, height);
        self.gpu.resize(width, height);
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved { dx, .. } => self.camera.handle_pointer_motion(dx),
            InputEvent::PointerButton { pressed } => self.camera.handle_pointer_button(pressed),
            InputEvent::Scroll { lines } => self.camera.handle_scroll(lines),
            InputEvent::Command(command) => self.run(command),
        }
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::NextScene => {
                self.cycle_scene(1);
            }
            Command::PreviousScene => {
                self.cycle_scene(-1);
            }
            Command::ToggleLightOrbit => {
                if let Some(scene) = self.scenes.get_mut(self.current) {
                    let orbiting = scene.toggle_light_orbit();
                    log::info!("light orbit {}", if orbiting { "on" } else { "off" });
                }
            }
            Command::IncreaseShadowBias => {
                self.set_shadow_bias(self.shadow_bias + self.shadow_bias_step);
                log::info!("shadow bias {:.4}", self.shadow_bias);
            }
            Command::DecreaseShadowBias => {
                self.set_shadow_bias(self.shadow_bias - self.shadow_bias_step);
                log::info!("shadow bias {:.4}", self.shadow_bias);
            }
        }
    }

    /// Releases every scene, the library and the shadow map, and hands the
    /// device back.
    pub fn shutdown(mut self) -> G {
        for scene in self.scenes.drain(..) {
            scene.release(&mut self.gpu);
        }
        self.library.release(&mut self.gpu);
        self.gpu.delete_texture(self.shadow_map);
        self.gpu
    }
}

fn cycle(current: usize, steps: isize, len: usize) -> usize {
    (current as isize + steps).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::cycle;

    #[test]
    fn cycling_wraps_both_ways() {
        assert_eq!(cycle(0, -1, 5), 4);
        assert_eq!(cycle(4, 1, 5), 0);
        assert_eq!(cycle(2, 13, 5), 0);
        assert_eq!(cycle(2, -13, 5), 4);
    }

    #[test]
    fn forward_then_back_returns_home() {
        for len in 1..7 {
            for start in 0..len {
                for n in 0..20isize {
                    let there = cycle(start, n, len);
                    assert_eq!(cycle(there, -n, len), start);
                }
            }
        }
    }
}
