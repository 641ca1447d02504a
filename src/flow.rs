//! The winit event loop.
//!
//! [`run`] opens the window, builds the showcase on a [`WgpuGpu`] and then
//! feeds window and device events to the [`Renderer`], redrawing continuously.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::context::Context;
use crate::gpu::wgpu_gpu::WgpuGpu;
use crate::input::{Command, InputEvent};
use crate::renderer::Renderer;
use crate::settings::Settings;
use crate::showcase;

/// Pixels of a touchpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 20.0;

struct App {
    settings: Settings,
    async_runtime: tokio::runtime::Runtime,
    renderer: Option<Renderer<WgpuGpu>>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(settings: Settings) -> Result<Self> {
        let async_runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("starting the async runtime")?;
        Ok(Self {
            settings,
            async_runtime,
            renderer: None,
            last_time: Instant::now(),
            error: None,
        })
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<Renderer<WgpuGpu>> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating the window")?,
        );

        let ctx = self.async_runtime.block_on(Context::new(window))?;
        let (width, height) = ctx.size();
        let mut gpu = WgpuGpu::new(ctx, self.settings.clear_colour);
        let showcase = showcase::build(&mut gpu, &self.settings)?;
        let mut renderer = Renderer::new(
            gpu,
            showcase.library,
            showcase.scenes,
            showcase.depth_shader,
            &self.settings,
        );
        renderer.resize(width, height);
        Ok(renderer)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(renderer) => {
                renderer.gpu().context().window().request_redraw();
                self.renderer = Some(renderer);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            renderer.handle_input(InputEvent::PointerMoved {
                dx: dx as f32,
                dy: dy as f32,
            });
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => renderer.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    event_loop.exit();
                } else if let Some(command) = key_command(&event.logical_key) {
                    renderer.handle_input(InputEvent::Command(command));
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => renderer.handle_input(InputEvent::PointerButton {
                pressed: state.is_pressed(),
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
                };
                renderer.handle_input(InputEvent::Scroll { lines });
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                renderer.update(dt);
                if let Err(e) = renderer.render_frame() {
                    log::warn!("frame dropped: {e:#}");
                }
                renderer.gpu().context().window().request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            log::info!("releasing GPU resources");
            drop(renderer.shutdown());
        }
    }
}

fn key_command(key: &Key) -> Option<Command> {
    match key {
        Key::Named(NamedKey::ArrowRight) => Some(Command::NextScene),
        Key::Named(NamedKey::ArrowLeft) => Some(Command::PreviousScene),
        Key::Character(text) => text.chars().next().and_then(Command::from_char),
        _ => None,
    }
}

pub fn run(settings: Settings) -> Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
