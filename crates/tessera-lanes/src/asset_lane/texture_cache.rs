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

//! GPU textures shared between meshes, keyed by resolved path.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tessera_core::renderer::{
    CpuTexture, GraphicsDevice, ResourceError, TextureId, TextureViewDescriptor, TextureViewId,
};
use tessera_core::scene::{MeshTexture, TextureKind};

use super::TextureLoaderLane;

/// A texture uploaded to the GPU together with its default view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuTexture {
    /// The texture resource.
    pub texture: TextureId,
    /// A view over the whole texture.
    pub view: TextureViewId,
}

/// Uploads each texture file once and hands out shared handles.
///
/// A file that cannot be decoded is logged once and served by the 1x1 fallback
/// of its [`TextureKind`], so a broken material degrades instead of failing.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<PathBuf, GpuTexture>,
    failed: HashSet<PathBuf>,
    fallbacks: HashMap<TextureKind, GpuTexture>,
}

impl TextureCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pixel a missing texture of `kind` is replaced with.
    pub fn fallback_pixel(kind: TextureKind) -> [u8; 4] {
        match kind {
            TextureKind::Diffuse => [255, 255, 255, 255],
            TextureKind::Specular | TextureKind::Height => [0, 0, 0, 255],
            // +Z in tangent space.
            TextureKind::Normal => [128, 128, 255, 255],
        }
    }

    /// Returns the texture for `source`, decoding and uploading it on first use.
    pub fn get_or_load(
        &mut self,
        device: &dyn GraphicsDevice,
        source: &MeshTexture,
    ) -> Result<GpuTexture, ResourceError> {
        if let Some(texture) = self.entries.get(&source.path) {
            return Ok(*texture);
        }
        if self.failed.contains(&source.path) {
            return self.fallback(device, source.kind);
        }

        let loader = match source.kind {
            TextureKind::Diffuse => TextureLoaderLane::srgb(),
            _ => TextureLoaderLane::linear(),
        };
        match loader.load_file(&source.path) {
            Ok(cpu) => {
                let texture = upload(device, &cpu, &source.path.to_string_lossy())?;
                log::debug!(
                    "TextureCache: Uploaded '{}' ({}x{})",
                    source.path.display(),
                    cpu.size.width,
                    cpu.size.height
                );
                self.entries.insert(source.path.clone(), texture);
                Ok(texture)
            }
            Err(e) => {
                log::warn!("TextureCache: {e}; using {:?} fallback", source.kind);
                self.failed.insert(source.path.clone());
                self.fallback(device, source.kind)
            }
        }
    }

    /// The shared 1x1 texture standing in for a missing texture of `kind`.
    pub fn fallback(
        &mut self,
        device: &dyn GraphicsDevice,
        kind: TextureKind,
    ) -> Result<GpuTexture, ResourceError> {
        if let Some(texture) = self.fallbacks.get(&kind) {
            return Ok(*texture);
        }
        let cpu = CpuTexture::solid(Self::fallback_pixel(kind));
        let texture = upload(device, &cpu, &format!("fallback_{}", kind.uniform_prefix()))?;
        self.fallbacks.insert(kind, texture);
        Ok(texture)
    }

    /// Whether `path` has been uploaded.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of uploaded files, fallbacks excluded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no file has been uploaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every texture, fallbacks included.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        for texture in self.entries.into_values().chain(self.fallbacks.into_values()) {
            let _ = device.destroy_texture_view(texture.view);
            if let Err(e) = device.destroy_texture(texture.texture) {
                log::warn!("TextureCache: Failed to destroy texture: {e}");
            }
        }
    }
}

fn upload(
    device: &dyn GraphicsDevice,
    cpu: &CpuTexture,
    label: &str,
) -> Result<GpuTexture, ResourceError> {
    let texture = device.create_texture(&cpu.to_descriptor(Some(Cow::Borrowed(label))))?;
    device.write_texture(texture, &cpu.pixels, Some(cpu.row_size()), cpu.size)?;
    let view = device.create_texture_view(texture, &TextureViewDescriptor::default())?;
    Ok(GpuTexture { texture, view })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDevice;

    fn write_png(path: &Path) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_same_path_is_uploaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.png");
        write_png(&path);

        let device = MockDevice::default();
        let mut cache = TextureCache::new();
        let source = MeshTexture {
            kind: TextureKind::Diffuse,
            path: path.clone(),
        };
        let first = cache.get_or_load(&device, &source).unwrap();
        let second = cache.get_or_load(&device, &source).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));
        assert_eq!(device.textures_created(), 1);
    }

    #[test]
    fn test_missing_texture_uses_fallback_of_its_kind() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockDevice::default();
        let mut cache = TextureCache::new();

        let normal = MeshTexture {
            kind: TextureKind::Normal,
            path: dir.path().join("missing_normal.png"),
        };
        let resolved = cache.get_or_load(&device, &normal).unwrap();
        assert_eq!(resolved, cache.fallback(&device, TextureKind::Normal).unwrap());
        assert!(cache.is_empty());

        // Asking again neither retries the file nor creates another fallback.
        cache.get_or_load(&device, &normal).unwrap();
        assert_eq!(device.textures_created(), 1);
    }

    #[test]
    fn test_fallback_pixels() {
        assert_eq!(TextureCache::fallback_pixel(TextureKind::Diffuse), [255; 4]);
        assert_eq!(
            TextureCache::fallback_pixel(TextureKind::Normal),
            [128, 128, 255, 255]
        );
        assert_eq!(TextureCache::fallback_pixel(TextureKind::Specular)[..3], [0, 0, 0]);
    }
}
