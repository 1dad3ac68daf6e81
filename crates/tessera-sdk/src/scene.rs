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

//! The drawable scene and the textures it references.

use anyhow::{Context, Result};
use tessera_core::math::{Mat4, Vec2, Vec3};
use tessera_core::renderer::{GraphicsDevice, ResourceError};
use tessera_core::scene::{MeshData, Vertex};
use tessera_lanes::{ObjLoaderLane, SceneGeometry, TextureCache};

use crate::config::RendererConfig;

/// Half extent of the ground plane shown when no model is configured.
pub const GROUND_HALF_EXTENT: f32 = 150.0;

/// GPU geometry plus the texture cache that owns its textures.
#[derive(Debug)]
pub struct SceneAssets {
    geometry: SceneGeometry,
    textures: TextureCache,
}

impl SceneAssets {
    /// Loads the model named by `config`, or a ground plane without one.
    ///
    /// A missing or unreadable model is an error: there is nothing to render.
    pub fn load(device: &dyn GraphicsDevice, config: &RendererConfig) -> Result<Self> {
        let Some(path) = config.model_path.as_deref() else {
            log::info!("SceneAssets: No model configured, using a ground plane");
            return Self::ground_plane(device, GROUND_HALF_EXTENT)
                .context("Failed to upload the ground plane");
        };

        let imported = ObjLoaderLane::load_file(path)
            .with_context(|| format!("Failed to import model {}", path.display()))?;
        let mut textures = TextureCache::new();
        let model = Mat4::from_scale(Vec3::splat(config.model_scale));
        let geometry = SceneGeometry::from_scene(device, &imported, &mut textures, model)
            .with_context(|| format!("Failed to upload model {}", path.display()))?;
        Ok(Self { geometry, textures })
    }

    /// A single square at `y = 0` spanning `±half_extent`.
    pub fn ground_plane(
        device: &dyn GraphicsDevice,
        half_extent: f32,
    ) -> Result<Self, ResourceError> {
        let mut textures = TextureCache::new();
        let geometry = SceneGeometry::from_meshes(
            device,
            [&ground_mesh(half_extent)],
            &mut textures,
            Mat4::IDENTITY,
        )?;
        Ok(Self { geometry, textures })
    }

    /// The uploaded batches.
    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    /// Mutable access, used to build material bind groups.
    pub fn geometry_mut(&mut self) -> &mut SceneGeometry {
        &mut self.geometry
    }

    /// Releases geometry and textures.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        self.geometry.destroy(device);
        self.textures.destroy(device);
    }
}

fn ground_mesh(half_extent: f32) -> MeshData {
    let s = half_extent;
    // Tiles the texture once every 10 units.
    let uv = s / 10.0;
    let corner = |x: f32, z: f32, u: f32, v: f32| {
        Vertex::new(Vec3::new(x, 0.0, z), Vec3::Y, Vec2::new(u, v))
    };
    let mut mesh = MeshData {
        name: "ground".to_string(),
        vertices: vec![
            corner(-s, -s, 0.0, 0.0),
            corner(-s, s, 0.0, uv),
            corner(s, s, uv, uv),
            corner(s, -s, uv, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        textures: Vec::new(),
    };
    mesh.compute_tangents();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_mesh_faces_up() {
        let mesh = ground_mesh(5.0);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::Y));
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 0.0, 5.0));
    }
}
