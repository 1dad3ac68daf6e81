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

//! The concrete, WGPU-based implementation of the `RenderSystem` trait.

use std::fmt;
use std::sync::{Arc, Mutex};

use tessera_core::math::LinearRgba;
use tessera_core::platform::{TesseraWindow, TesseraWindowHandle};
use tessera_core::renderer::api::{RenderContext, TextureViewId};
use tessera_core::renderer::{FrameRecorder, GraphicsDevice, RenderError, RenderSystem};

use super::context::WgpuGraphicsContext;
use super::device::WgpuDevice;

/// The concrete, WGPU-based implementation of the [`RenderSystem`] trait.
///
/// Owns the graphics context, the logical device and the per-frame swapchain view.
/// Depth targets and every other frame resource belong to the frame pipeline that
/// records into the encoder.
pub struct WgpuRenderSystem {
    graphics_context_shared: Option<Arc<Mutex<WgpuGraphicsContext>>>,
    wgpu_device: Option<Arc<WgpuDevice>>,
    current_width: u32,
    current_height: u32,
    frame_count: u64,
    current_frame_view_id: Option<TextureViewId>,
}

impl fmt::Debug for WgpuRenderSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuRenderSystem")
            .field("initialized", &self.graphics_context_shared.is_some())
            .field("current_width", &self.current_width)
            .field("current_height", &self.current_height)
            .field("frame_count", &self.frame_count)
            .field("current_frame_view_id", &self.current_frame_view_id)
            .finish()
    }
}

impl Default for WgpuRenderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuRenderSystem {
    /// Creates a new, uninitialized `WgpuRenderSystem`.
    ///
    /// The system is not usable until [`RenderSystem::init`] is called.
    pub fn new() -> Self {
        log::info!("WgpuRenderSystem created (uninitialized).");
        Self {
            graphics_context_shared: None,
            wgpu_device: None,
            current_width: 0,
            current_height: 0,
            frame_count: 0,
            current_frame_view_id: None,
        }
    }

    /// Creates a system with a device but no surface.
    ///
    /// [`RenderSystem::render_with_encoder`] fails on such a system; work is
    /// recorded through [`RenderSystem::graphics_device`] instead.
    pub fn new_headless(width: u32, height: u32) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let context =
            pollster::block_on(WgpuGraphicsContext::new_headless(&instance, (width, height)))
                .map_err(|e| RenderError::InitializationFailed(format!("{e:#}")))?;
        let mut system = Self::new();
        system.install(context);
        Ok(system)
    }

    async fn initialize(
        &mut self,
        window_handle: TesseraWindowHandle,
        window_size: (u32, u32),
    ) -> Result<(), RenderError> {
        if self.graphics_context_shared.is_some() {
            return Err(RenderError::InitializationFailed(
                "WgpuRenderSystem is already initialized.".to_string(),
            ));
        }
        log::info!("WgpuRenderSystem: Initializing...");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let context = WgpuGraphicsContext::new(&instance, window_handle, window_size)
            .await
            .map_err(|e| RenderError::InitializationFailed(format!("{e:#}")))?;
        self.install(context);
        Ok(())
    }

    fn install(&mut self, context: WgpuGraphicsContext) {
        (self.current_width, self.current_height) = context.get_size();
        log::info!(
            "WgpuRenderSystem: GraphicsContext created on {} with size: {}x{}",
            context.adapter_summary(),
            self.current_width,
            self.current_height
        );
        let context_arc = Arc::new(Mutex::new(context));
        self.wgpu_device = Some(Arc::new(WgpuDevice::new(context_arc.clone())));
        self.graphics_context_shared = Some(context_arc);
    }

    /// The concrete device, for callers that need backend-specific helpers.
    pub fn wgpu_device(&self) -> Option<Arc<WgpuDevice>> {
        self.wgpu_device.clone()
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl RenderSystem for WgpuRenderSystem {
    fn init(&mut self, window: &dyn TesseraWindow) -> Result<(), RenderError> {
        let window_size = window.inner_size();
        let window_handle_arc = window.clone_handle_arc();
        pollster::block_on(self.initialize(window_handle_arc, window_size))
    }

    fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            log::warn!(
                "WgpuRenderSystem::resize called with zero size ({new_width}, {new_height}). Ignoring."
            );
            return;
        }
        log::debug!("WgpuRenderSystem: resize called with W:{new_width}, H:{new_height}");
        self.current_width = new_width;
        self.current_height = new_height;
        if let Some(gc) = &self.graphics_context_shared {
            match gc.lock() {
                Ok(mut gc_guard) => gc_guard.resize(new_width, new_height),
                Err(e) => log::error!("WgpuRenderSystem: context mutex poisoned: {e}"),
            }
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.current_width, self.current_height)
    }

    fn render_with_encoder(
        &mut self,
        clear_color: LinearRgba,
        recorder: FrameRecorder<'_>,
    ) -> Result<bool, RenderError> {
        let device = self
            .wgpu_device
            .clone()
            .ok_or(RenderError::NotInitialized)?;
        let gc = self
            .graphics_context_shared
            .clone()
            .ok_or(RenderError::NotInitialized)?;

        // --- 1. Acquire Frame from Swap Chain ---
        let output_surface_texture = {
            let gc_guard = gc
                .lock()
                .map_err(|e| RenderError::Internal(format!("context mutex poisoned: {e}")))?;
            if gc_guard.surface.is_none() {
                return Err(RenderError::SurfaceAcquisitionFailed(
                    "headless render system has no surface".to_string(),
                ));
            }
            match gc_guard.get_current_texture() {
                Ok(texture) => texture,
                Err(e @ wgpu::SurfaceError::Lost) | Err(e @ wgpu::SurfaceError::Outdated) => {
                    log::warn!(
                        "WgpuRenderSystem: Swapchain surface lost or outdated ({:?}). Reconfiguring with {}x{}.",
                        e,
                        self.current_width,
                        self.current_height
                    );
                    gc_guard.reconfigure();
                    return Ok(false);
                }
                Err(e @ wgpu::SurfaceError::Timeout) => {
                    log::warn!("WgpuRenderSystem: Swapchain Timeout acquiring frame. ({e:?})");
                    return Ok(false);
                }
                Err(e) => {
                    log::error!("WgpuRenderSystem: Unexpected SurfaceError: {e:?}");
                    return Err(RenderError::SurfaceAcquisitionFailed(format!("{e:?}")));
                }
            }
        };

        // --- 2. Create a managed, abstract view for the swap chain texture ---
        if let Some(old_id) = self.current_frame_view_id.take() {
            device.destroy_texture_view(old_id)?;
        }
        let target_view_id = device.create_texture_view_for_surface(
            &output_surface_texture.texture,
            Some("Primary Swap Chain View"),
        )?;
        self.current_frame_view_id = Some(target_view_id);

        // --- 3. Let the frame pipeline record its passes ---
        let mut command_encoder = device.create_command_encoder(Some("Tessera Frame Encoder"));
        let render_ctx = RenderContext::new(
            &target_view_id,
            clear_color,
            (self.current_width, self.current_height),
        );
        recorder(command_encoder.as_mut(), &render_ctx)?;

        // --- 4. Submit and present ---
        let command_buffer = command_encoder.finish();
        device.submit_command_buffer(command_buffer);
        output_surface_texture.present();

        self.frame_count += 1;
        log::trace!("WgpuRenderSystem: presented frame {}", self.frame_count);
        Ok(true)
    }

    fn graphics_device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.wgpu_device
            .clone()
            .map(|device| device as Arc<dyn GraphicsDevice>)
    }

    fn shutdown(&mut self) {
        log::info!("WgpuRenderSystem shutting down...");
        if let (Some(old_id), Some(device)) =
            (self.current_frame_view_id.take(), self.wgpu_device.as_ref())
        {
            let _ = device.destroy_texture_view(old_id);
        }
        if let Some(device) = self.wgpu_device.as_ref() {
            device.poll_device_blocking();
        }
        self.wgpu_device = None;
        self.graphics_context_shared = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_system_reports_not_initialized() {
        let mut system = WgpuRenderSystem::new();
        assert!(system.graphics_device().is_none());
        assert_eq!(system.surface_size(), (0, 0));
        let result = system.render_with_encoder(LinearRgba::BLACK, Box::new(|_, _| Ok(())));
        assert!(matches!(result, Err(RenderError::NotInitialized)));
    }

    #[test]
    fn test_zero_resize_is_ignored() {
        let mut system = WgpuRenderSystem::new();
        system.resize(0, 600);
        assert_eq!(system.surface_size(), (0, 0));
        system.resize(800, 600);
        assert_eq!(system.surface_size(), (800, 600));
    }
}
