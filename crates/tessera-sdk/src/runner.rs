// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The windowed application loop.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tessera_core::platform::window::TesseraWindow;
use tessera_core::renderer::{CommandEncoder, GraphicsDevice, RenderContext, RenderSystem};
use tessera_infra::platform::input::{translate_device_event, translate_winit_input};
use tessera_infra::platform::window::{WinitWindow, WinitWindowBuilder};
use tessera_infra::WgpuRenderSystem;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

use crate::config::RendererConfig;
use crate::pipeline::FramePipeline;
use crate::scene::SceneAssets;
use crate::state::{RendererState, StateCommand};

/// Everything that exists once the window and device are up.
struct Session {
    device: Arc<dyn GraphicsDevice>,
    pipeline: Option<FramePipeline>,
    state: RendererState,
}

/// Runs a forward+ renderer in a window until it is closed.
pub struct Renderer {
    config: RendererConfig,
    window: Option<WinitWindow>,
    render_system: Option<Box<dyn RenderSystem>>,
    session: Option<Session>,
    last_frame: Option<Instant>,
    failure: Option<anyhow::Error>,
}

impl Renderer {
    /// Creates a renderer for `config`. Nothing is created until the event
    /// loop resumes.
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            window: None,
            render_system: None,
            session: None,
            last_frame: None,
            failure: None,
        }
    }

    /// Opens the window and blocks until it is closed.
    ///
    /// Startup failures (no adapter, unreadable model, shader errors) end the
    /// loop and are returned here.
    pub fn run(config: RendererConfig) -> Result<()> {
        config.validate()?;
        log::info!("Renderer: Starting...");
        let event_loop = EventLoop::new()?;
        let mut renderer = Self::new(config);
        event_loop.run_app(&mut renderer)?;
        match renderer.failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = WinitWindowBuilder::new()
            .with_title(self.config.title.clone())
            .with_dimensions(self.config.window_width, self.config.window_height)
            .build(event_loop)
            .context("Failed to create the window")?;

        let mut render_system: Box<dyn RenderSystem> = Box::new(WgpuRenderSystem::new());
        render_system
            .init(&window)
            .context("Failed to initialize the render system")?;
        let device = render_system
            .graphics_device()
            .context("Render system exposes no graphics device")?;
        let color_format = device
            .get_surface_format()
            .context("Surface has no color format")?;
        let viewport = render_system.surface_size();

        let mut state = RendererState::from_config(&self.config, viewport);
        let lights = state
            .lights
            .allocate(device.as_ref(), self.config.light_count)
            .context("Failed to allocate the light pool")?;
        state
            .lights
            .initialize(
                device.as_ref(),
                self.config.light_count,
                &self.config.light_bounds,
                self.config.light_radius,
                self.config.rng_seed,
            )
            .context("Failed to initialize the light pool")?;

        let scene = SceneAssets::load(device.as_ref(), &self.config)?;
        let pipeline = FramePipeline::new(device.clone(), color_format, viewport, scene, lights)
            .context("Failed to build the frame pipeline")?;

        window.set_cursor_captured(true);
        self.window = Some(window);
        self.render_system = Some(render_system);
        self.session = Some(Session {
            device,
            pipeline: Some(pipeline),
            state,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(render_system), Some(session)) =
            (self.render_system.as_mut(), self.session.as_mut())
        else {
            return;
        };
        let Session {
            device,
            pipeline: Some(pipeline),
            state,
        } = session
        else {
            return;
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .replace(now)
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        if let Err(e) = state.advance(device.as_ref(), dt) {
            log::error!("Renderer: Failed to update lights: {e}");
        }

        let frame_state: &RendererState = state;
        let result = render_system.render_with_encoder(
            self.config.clear_color,
            Box::new(|encoder: &mut dyn CommandEncoder, ctx: &RenderContext| {
                pipeline.encode_frame(encoder, ctx, frame_state)
            }),
        );
        match result {
            Ok(true) => match pipeline.finish_frame(state) {
                Ok(Some(report)) => log::debug!(
                    "Renderer: Culling check done over {} tiles",
                    report.per_tile.len()
                ),
                Ok(None) => {}
                Err(e) => log::error!("Renderer: Culling check failed: {e}"),
            },
            Ok(false) => log::trace!("Renderer: Frame skipped"),
            Err(e) => {
                pipeline.abandon_frame();
                log::error!("Rendering error: {e}");
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(render_system) = self.render_system.as_mut() {
            render_system.resize(width, height);
        }
        if width == 0 || height == 0 {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.state.viewport = (width, height);
            if let Some(pipeline) = session.pipeline.as_mut() {
                if let Err(e) = pipeline.resize(width, height) {
                    log::error!("Renderer: Failed to resize the frame pipeline: {e}");
                }
            }
        }
    }

    fn apply(&mut self, command: StateCommand, event_loop: &ActiveEventLoop) {
        if command == StateCommand::Exit {
            log::info!("Shutdown requested, exiting event loop...");
            event_loop.exit();
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        log::info!("Renderer is being dropped. Performing controlled shutdown...");
        if let Some(mut session) = self.session.take() {
            if let Some(pipeline) = session.pipeline.take() {
                pipeline.destroy();
            }
            session.state.lights.destroy(session.device.as_ref());
        }
        if let Some(mut render_system) = self.render_system.take() {
            render_system.shutdown();
        }
        log::info!("Renderer shutdown complete.");
    }
}

impl ApplicationHandler for Renderer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        log::info!("Application resumed. Initializing window and renderer...");
        if let Err(e) = self.start(event_loop) {
            log::error!("Renderer: Startup failed: {e:#}");
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.winit().id() != id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutdown requested, exiting event loop...");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Window resized to: {}x{}", size.width, size.height);
                self.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::Focused(focused) => window.set_cursor_captured(focused),
            _ => {
                if let (Some(input), Some(session)) =
                    (translate_winit_input(&event), self.session.as_mut())
                {
                    let command = session.state.handle_input(&input);
                    self.apply(command, event_loop);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let (Some(input), Some(session)) =
            (translate_device_event(&event), self.session.as_mut())
        {
            session.state.handle_input(&input);
        }
    }

    /// Requests continuous redraws.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
