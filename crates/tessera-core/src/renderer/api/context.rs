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

//! Per-frame rendering context handed to the frame pipeline.

use crate::math::LinearRgba;
use crate::renderer::api::texture::TextureViewId;

/// The presentation target of the frame being recorded.
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// The texture view to render into (typically the swapchain image).
    pub color_target: &'a TextureViewId,
    /// The color to clear the framebuffer with.
    pub clear_color: LinearRgba,
    /// Size in pixels of the color target.
    pub surface_size: (u32, u32),
}

impl<'a> RenderContext<'a> {
    /// Creates a new `RenderContext`.
    pub fn new(
        color_target: &'a TextureViewId,
        clear_color: LinearRgba,
        surface_size: (u32, u32),
    ) -> Self {
        Self {
            color_target,
            clear_color,
            surface_size,
        }
    }
}
