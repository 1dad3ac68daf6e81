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

//! GPU-resident meshes and the scene they form.

use std::borrow::Cow;

use tessera_core::math::Mat4;
use tessera_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutId, BufferDescriptor,
    BufferId, BufferUsage, GraphicsDevice, IndexFormat, RenderPass, ResourceError, SamplerId,
};
use tessera_core::scene::{MeshData, TextureKind};

use crate::asset_lane::{GpuTexture, ImportedScene, TextureCache};

/// The textures the shading pass samples, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MaterialTextures {
    diffuse: GpuTexture,
    specular: GpuTexture,
    normal: GpuTexture,
}

/// One mesh on the GPU: vertex and index buffers plus its material textures.
#[derive(Debug)]
pub struct GeometryBatch {
    name: String,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,
    textures: MaterialTextures,
    material_group: Option<BindGroupId>,
}

impl GeometryBatch {
    /// Uploads `mesh`, resolving its textures through `cache`.
    ///
    /// A texture kind the mesh does not reference is served by the cache's
    /// fallback for that kind.
    pub fn upload(
        device: &dyn GraphicsDevice,
        mesh: &MeshData,
        cache: &mut TextureCache,
    ) -> Result<Self, ResourceError> {
        let mut texture = |kind: TextureKind| match mesh.texture(kind) {
            Some(source) => cache.get_or_load(device, source),
            None => cache.fallback(device, kind),
        };
        let textures = MaterialTextures {
            diffuse: texture(TextureKind::Diffuse)?,
            specular: texture(TextureKind::Specular)?,
            normal: texture(TextureKind::Normal)?,
        };

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let vertex_buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Owned(format!("{}_vertices", mesh.name))),
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            vertex_bytes,
        )?;

        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
        let index_buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Owned(format!("{}_indices", mesh.name))),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            index_bytes,
        );
        let index_buffer = match index_buffer {
            Ok(id) => id,
            Err(e) => {
                let _ = device.destroy_buffer(vertex_buffer);
                return Err(e);
            }
        };

        Ok(Self {
            name: mesh.name.clone(),
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            textures,
            material_group: None,
        })
    }

    /// Builds the material bind group: diffuse, specular and normal textures at
    /// bindings 0 to 2, the sampler at 3.
    pub fn bind_material(
        &mut self,
        device: &dyn GraphicsDevice,
        layout: BindGroupLayoutId,
        sampler: SamplerId,
    ) -> Result<(), ResourceError> {
        if let Some(old) = self.material_group.take() {
            let _ = device.destroy_bind_group(old);
        }
        let group = device.create_bind_group(&BindGroupDescriptor {
            label: Some(&format!("{}_material", self.name)),
            layout,
            entries: &[
                BindGroupEntry::texture_view(0, self.textures.diffuse.view),
                BindGroupEntry::texture_view(1, self.textures.specular.view),
                BindGroupEntry::texture_view(2, self.textures.normal.view),
                BindGroupEntry::sampler(3, sampler),
            ],
        })?;
        self.material_group = Some(group);
        Ok(())
    }

    /// Records the draw. With `material_group` set, the material bind group is
    /// bound at that index first; a batch without one is skipped.
    pub fn draw<'p>(&'p self, pass: &mut (dyn RenderPass<'p> + 'p), material_group: Option<u32>) {
        if let Some(index) = material_group {
            let Some(group) = self.material_group.as_ref() else {
                log::warn!("GeometryBatch: '{}' has no material bound, skipping", self.name);
                return;
            };
            pass.set_bind_group(index, group, &[]);
        }
        pass.set_vertex_buffer(0, &self.vertex_buffer, 0);
        pass.set_index_buffer(&self.index_buffer, 0, IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// The mesh name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of indices drawn.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Releases the buffers and the material bind group. Textures belong to the cache.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Some(group) = self.material_group {
            let _ = device.destroy_bind_group(group);
        }
        let _ = device.destroy_buffer(self.vertex_buffer);
        let _ = device.destroy_buffer(self.index_buffer);
    }
}

/// Every batch of a scene, drawn with one model matrix.
#[derive(Debug)]
pub struct SceneGeometry {
    batches: Vec<GeometryBatch>,
    model: Mat4,
}

impl Default for SceneGeometry {
    fn default() -> Self {
        Self {
            batches: Vec::new(),
            model: Mat4::IDENTITY,
        }
    }
}

impl SceneGeometry {
    /// Uploads the meshes reachable from the scene root, in traversal order.
    pub fn from_scene(
        device: &dyn GraphicsDevice,
        scene: &ImportedScene,
        cache: &mut TextureCache,
        model: Mat4,
    ) -> Result<Self, ResourceError> {
        Self::from_meshes(device, scene.flattened_meshes(), cache, model)
    }

    /// Uploads `meshes` in order. Meshes without triangles are skipped.
    pub fn from_meshes<'m>(
        device: &dyn GraphicsDevice,
        meshes: impl IntoIterator<Item = &'m MeshData>,
        cache: &mut TextureCache,
        model: Mat4,
    ) -> Result<Self, ResourceError> {
        let mut geometry = Self {
            batches: Vec::new(),
            model,
        };
        for mesh in meshes {
            if mesh.indices.is_empty() || mesh.vertices.is_empty() {
                log::warn!("SceneGeometry: Mesh '{}' is empty, skipping", mesh.name);
                continue;
            }
            match GeometryBatch::upload(device, mesh, cache) {
                Ok(batch) => geometry.batches.push(batch),
                Err(e) => {
                    geometry.destroy(device);
                    return Err(e);
                }
            }
        }
        log::info!(
            "SceneGeometry: {} batches, {} triangles, {} textures",
            geometry.batches.len(),
            geometry.triangle_count(),
            cache.len()
        );
        Ok(geometry)
    }

    /// Builds every batch's material bind group.
    pub fn bind_materials(
        &mut self,
        device: &dyn GraphicsDevice,
        layout: BindGroupLayoutId,
        sampler: SamplerId,
    ) -> Result<(), ResourceError> {
        self.batches
            .iter_mut()
            .try_for_each(|batch| batch.bind_material(device, layout, sampler))
    }

    /// Records every batch into `pass`.
    pub fn draw_all<'p>(&'p self, pass: &mut (dyn RenderPass<'p> + 'p), material_group: Option<u32>) {
        for batch in &self.batches {
            batch.draw(pass, material_group);
        }
    }

    /// The batches, in draw order.
    pub fn batches(&self) -> &[GeometryBatch] {
        &self.batches
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total triangles over all batches.
    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(|b| b.index_count as usize / 3).sum()
    }

    /// The object-to-world transform of the scene.
    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// Releases every batch.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        for batch in self.batches {
            batch.destroy(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDevice, Recorded};
    use tessera_core::math::{Vec2, Vec3};
    use tessera_core::renderer::{BindingResource, CommandEncoder, RenderPassDescriptor};
    use tessera_core::scene::{SceneGraph, Vertex};

    fn triangle(name: &str) -> MeshData {
        MeshData {
            name: name.into(),
            vertices: vec![
                Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
                Vertex::new(Vec3::X, Vec3::Z, Vec2::new(1.0, 0.0)),
                Vertex::new(Vec3::Y, Vec3::Z, Vec2::new(0.0, 1.0)),
            ],
            indices: vec![0, 1, 2],
            textures: Vec::new(),
        }
    }

    fn scene() -> ImportedScene {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("root", vec![]);
        let a = graph.add_node("a", vec![1]);
        let b = graph.add_node("b", vec![0, 2]);
        graph.add_child(root, a);
        graph.add_child(a, b);
        ImportedScene {
            graph,
            root,
            meshes: vec![triangle("zero"), triangle("one"), MeshData::default()],
            base_dir: Default::default(),
        }
    }

    #[test]
    fn test_scene_is_flattened_in_graph_order() {
        let device = MockDevice::default();
        let mut cache = TextureCache::new();
        let geometry =
            SceneGeometry::from_scene(&device, &scene(), &mut cache, Mat4::IDENTITY).unwrap();

        let names: Vec<_> = geometry.batches().iter().map(GeometryBatch::name).collect();
        assert_eq!(names, vec!["one", "zero"]);
        assert_eq!(geometry.triangle_count(), 2);
        // Untextured meshes share the three fallbacks.
        assert_eq!(device.textures_created(), 3);
    }

    #[test]
    fn test_material_group_binds_textures_then_sampler() {
        let device = MockDevice::default();
        let mut cache = TextureCache::new();
        let mut batch = GeometryBatch::upload(&device, &triangle("t"), &mut cache).unwrap();
        batch
            .bind_material(&device, BindGroupLayoutId(99), SamplerId(7))
            .unwrap();

        let group = batch.material_group.unwrap();
        let entries = device.bind_group_entries(group);
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0].1, BindingResource::TextureView(_)));
        assert!(matches!(entries[3], (3, BindingResource::Sampler(SamplerId(7)))));
    }

    #[test]
    fn test_draw_binds_material_and_issues_indexed_draw() {
        let device = MockDevice::default();
        let mut cache = TextureCache::new();
        let mut batch = GeometryBatch::upload(&device, &triangle("t"), &mut cache).unwrap();
        batch
            .bind_material(&device, BindGroupLayoutId(1), SamplerId(2))
            .unwrap();

        let mut encoder = device.create_command_encoder(None);
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor::default());
            batch.draw(pass.as_mut(), Some(1));
        }
        let commands = device.commands();
        assert!(matches!(commands[1], Recorded::SetBindGroup(1, _)));
        assert_eq!(commands.last(), Some(&Recorded::DrawIndexed(0..3)));
    }
}
