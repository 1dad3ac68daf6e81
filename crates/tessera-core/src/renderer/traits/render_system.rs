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

use std::sync::Arc;

use crate::math::LinearRgba;
use crate::platform::window::TesseraWindow;
use crate::renderer::api::RenderContext;
use crate::renderer::error::RenderError;
use crate::renderer::traits::{CommandEncoder, GraphicsDevice};

/// A callback that records one frame's passes into the encoder.
pub type FrameRecorder<'a> =
    Box<dyn FnOnce(&mut dyn CommandEncoder, &RenderContext) -> Result<(), RenderError> + 'a>;

/// Owns the presentation surface and drives frame acquisition, submission and present.
pub trait RenderSystem: std::fmt::Debug {
    /// Creates the device and the surface for `window`.
    fn init(&mut self, window: &dyn TesseraWindow) -> Result<(), RenderError>;

    /// Reconfigures the surface for a new size. Zero sizes are ignored.
    fn resize(&mut self, new_width: u32, new_height: u32);

    /// Current surface size in pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Acquires the next image, lets `recorder` encode the frame into it,
    /// submits and presents.
    ///
    /// Returns `Ok(false)` when the frame was skipped because the surface had to be
    /// reconfigured.
    fn render_with_encoder(
        &mut self,
        clear_color: LinearRgba,
        recorder: FrameRecorder<'_>,
    ) -> Result<bool, RenderError>;

    /// Returns the graphics device, once initialized.
    fn graphics_device(&self) -> Option<Arc<dyn GraphicsDevice>>;

    /// Releases the surface and the device.
    fn shutdown(&mut self);
}
