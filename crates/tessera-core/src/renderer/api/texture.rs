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

//! Defines data structures related to GPU texture and sampler resources.

use crate::renderer::api::util::TextureFormat;
use crate::tessera_bitflags;
use std::borrow::Cow;

/// The size of a texture or of a copy region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth, or number of array layers.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// A single-layer 2D extent.
    pub const fn d2(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }
}

/// The dimensionality of a texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A view of a 2D texture.
    D2,
    /// A view of a 2D texture array.
    D2Array,
    /// A view of a cubemap texture.
    Cube,
}

/// Defines which aspects of a texture are accessed by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageAspect {
    /// Access all aspects.
    All,
    /// Access only the depth component of a depth/stencil texture.
    DepthOnly,
}

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around.
    Repeat,
    /// Coordinates are clamped to the edge.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling.
    Nearest,
    /// Linear interpolation.
    Linear,
}

tessera_bitflags! {
    /// A set of flags describing the allowed usages of a [`TextureId`].
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound in a shader for sampling or loading.
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be used as a render attachment (color or depth).
        const RENDER_ATTACHMENT = 1 << 3;
    }
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions of the texture.
    pub size: Extent3D,
    /// The number of mipmap levels for the texture.
    pub mip_level_count: u32,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// A bitmask of [`TextureUsage`] flags describing how the texture will be used.
    pub usage: TextureUsage,
}

/// A descriptor used to create a [`TextureViewId`].
#[derive(Debug, Clone)]
pub struct TextureViewDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The format of the view, or the texture's own format when `None`.
    pub format: Option<TextureFormat>,
    /// The dimensionality of the view, or inferred from the texture when `None`.
    pub dimension: Option<TextureViewDimension>,
    /// The aspects of the texture to be accessed.
    pub aspect: ImageAspect,
}

impl Default for TextureViewDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            format: None,
            dimension: None,
            aspect: ImageAspect::All,
        }
    }
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The address mode for the U texture coordinate.
    pub address_mode_u: AddressMode,
    /// The address mode for the V texture coordinate.
    pub address_mode_v: AddressMode,
    /// The filter mode for magnification.
    pub mag_filter: FilterMode,
    /// The filter mode for minification.
    pub min_filter: FilterMode,
}

/// An RGBA8 image decoded on the CPU, ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Tightly packed RGBA8 pixels, row-major, top row first.
    pub pixels: Vec<u8>,
    /// The size of the image.
    pub size: Extent3D,
    /// The format of the pixel data.
    pub format: TextureFormat,
}

impl CpuTexture {
    /// A 1x1 texture of a single color, used when a material texture is missing.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            pixels: rgba.to_vec(),
            size: Extent3D::d2(1, 1),
            format: TextureFormat::Rgba8Unorm,
        }
    }

    /// Creates a texture descriptor matching this image.
    pub fn to_descriptor<'a>(&self, label: Option<Cow<'a, str>>) -> TextureDescriptor<'a> {
        TextureDescriptor {
            label,
            size: self.size,
            mip_level_count: 1,
            format: self.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        }
    }

    /// Bytes per row of the pixel data.
    pub fn row_size(&self) -> u32 {
        self.size.width * self.format.bytes_per_pixel()
    }
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU texture view resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_texture_is_one_pixel() {
        let tex = CpuTexture::solid([255, 0, 0, 255]);
        assert_eq!(tex.pixels.len(), 4);
        assert_eq!(tex.row_size(), 4);
        let desc = tex.to_descriptor(None);
        assert!(desc.usage.contains(TextureUsage::COPY_DST));
        assert_eq!(desc.size, Extent3D::d2(1, 1));
    }
}
