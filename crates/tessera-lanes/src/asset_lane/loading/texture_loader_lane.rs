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

//! Texture decoding.

use std::path::Path;

use anyhow::Context;
use tessera_core::renderer::{CpuTexture, Extent3D, TextureFormat};

use crate::asset_lane::{AssetError, AssetLoaderLane};

/// A lane dedicated to decoding image files into RGBA8 textures on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLoaderLane {
    /// Whether the pixels hold sRGB-encoded color (base color) or linear data
    /// (specular masks, normal maps).
    pub srgb: bool,
}

impl Default for TextureLoaderLane {
    fn default() -> Self {
        Self { srgb: true }
    }
}

impl TextureLoaderLane {
    /// A loader for color textures.
    pub const fn srgb() -> Self {
        Self { srgb: true }
    }

    /// A loader for data textures.
    pub const fn linear() -> Self {
        Self { srgb: false }
    }

    /// Reads and decodes `path`.
    pub fn load_file(&self, path: &Path) -> Result<CpuTexture, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode(&bytes).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<CpuTexture, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(CpuTexture {
            pixels: rgba.into_raw(),
            size: Extent3D::d2(width, height),
            format: if self.srgb {
                TextureFormat::Rgba8UnormSrgb
            } else {
                TextureFormat::Rgba8Unorm
            },
        })
    }
}

impl AssetLoaderLane<CpuTexture> for TextureLoaderLane {
    fn load(
        &self,
        bytes: &[u8],
    ) -> Result<CpuTexture, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(self
            .decode(bytes)
            .context("Failed to decode image from memory")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([x as u8 * 10, y as u8 * 10, 200])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decodes_to_rgba8() {
        let texture = TextureLoaderLane::srgb().load(&png(3, 2)).unwrap();

        assert_eq!(texture.size, Extent3D::d2(3, 2));
        assert_eq!(texture.format, TextureFormat::Rgba8UnormSrgb);
        assert_eq!(texture.pixels.len(), 3 * 2 * 4);
        assert_eq!(&texture.pixels[4..8], &[10, 0, 200, 255]);
        assert_eq!(texture.row_size(), 12);
    }

    #[test]
    fn test_linear_loader_keeps_unorm_format() {
        let texture = TextureLoaderLane::linear().load(&png(1, 1)).unwrap();
        assert_eq!(texture.format, TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(TextureLoaderLane::default().load(b"not an image").is_err());
    }

    #[test]
    fn test_load_file_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextureLoaderLane::default()
            .load_file(&dir.path().join("missing.png"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_load_file_reports_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG but not really").unwrap();

        let err = TextureLoaderLane::default().load_file(&path).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }
}
