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

use anyhow::{anyhow, Context as _, Result};
use tessera_core::platform::TesseraWindowHandle;
use wgpu::{Adapter, Instance};

use super::adapter::request_adapter;

/// Holds the core WGPU state objects required for rendering.
///
/// A windowed context owns a configured surface; a headless context (tests,
/// offline culling checks) has none and reports a fixed target format.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    pub(crate) surface: Option<wgpu::Surface<'static>>,
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,

    // Configuration for the surface's swapchain behavior
    pub(crate) surface_config: wgpu::SurfaceConfiguration,

    pub(crate) adapter_name: String,
    pub(crate) adapter_backend: wgpu::Backend,
}

async fn request_device(adapter: &Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Tessera Logical Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        })
        .await
        .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
    log::info!("Logical device and command queue created.");

    device.on_uncaptured_error(Box::new(|e| {
        log::error!("WGPU Uncaptured Error: {e:?}");
    }));
    Ok((device, queue))
}

impl WgpuGraphicsContext {
    /// Initializes the graphics context for a window surface.
    ///
    /// ## Arguments
    /// * `instance` - The shared `wgpu::Instance`.
    /// * `window_handle` - A thread-safe handle to the target window.
    /// * `window_size` - The initial physical size of the window surface.
    pub async fn new(
        instance: &Instance,
        window_handle: TesseraWindowHandle,
        window_size: (u32, u32),
    ) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context...");

        // --- 1. Create Surface ---
        let surface = instance
            .create_surface(window_handle)
            .context("Failed to create the window surface")?;
        log::debug!("WGPU surface created for the window.");

        // --- 2. Adapter, logical device and command queue ---
        let adapter = request_adapter(instance, Some(&surface)).await?;
        let adapter_info = adapter.get_info();
        let (device, queue) = request_device(&adapter).await?;

        // --- 3. Configure Surface ---
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("The surface reports no supported format"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: window_size.0.max(1),
            height: window_size.1.max(1),
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|m| *m == wgpu::PresentMode::Mailbox)
                .unwrap_or(wgpu::PresentMode::Fifo), // Fifo is guaranteed to be supported
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "Surface configured: {:?}, {:?}, {}x{}",
            surface_config.format,
            surface_config.present_mode,
            surface_config.width,
            surface_config.height
        );

        Ok(WgpuGraphicsContext {
            surface: Some(surface),
            adapter,
            device,
            queue,
            surface_config,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
        })
    }

    /// Initializes a context without a surface, rendering into offscreen targets.
    pub async fn new_headless(instance: &Instance, size: (u32, u32)) -> Result<Self> {
        log::info!("Initializing headless WGPU Graphics Context...");
        let adapter = request_adapter(instance, None).await?;
        let adapter_info = adapter.get_info();
        let (device, queue) = request_device(&adapter).await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(WgpuGraphicsContext {
            surface: None,
            adapter,
            device,
            queue,
            surface_config,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
        })
    }

    /// Reconfigures the underlying surface (swapchain) when the window is resized.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            log::info!(
                "WgpuGraphicsContext: Resizing surface configuration to {new_width}x{new_height}"
            );
            self.surface_config.width = new_width;
            self.surface_config.height = new_height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, &self.surface_config);
            }
        } else {
            log::warn!(
                "WgpuGraphicsContext: Ignoring resize request to zero dimensions: {new_width}x{new_height}"
            );
        }
    }

    /// Re-applies the current configuration, used after a lost or outdated surface.
    pub fn reconfigure(&self) {
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Acquires the next swapchain texture.
    ///
    /// Fails with `SurfaceError::Lost` on a headless context.
    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        match &self.surface {
            Some(surface) => surface.get_current_texture(),
            None => Err(wgpu::SurfaceError::Lost),
        }
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The adapter the device was created from.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Name and backend of the active adapter, for logging.
    pub fn adapter_summary(&self) -> String {
        format!(
            "{} ({})",
            self.adapter_name,
            super::adapter::backend_name(self.adapter_backend)
        )
    }

    /// Returns the size of the surface configuration.
    pub fn get_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }
}
