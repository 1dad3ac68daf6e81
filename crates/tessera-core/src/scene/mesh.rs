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

//! Defines data structures for mesh representation.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::math::{Aabb, Vec2, Vec3, EPSILON};
use crate::renderer::api::{
    VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat, VertexStepMode,
};

/// The interleaved vertex consumed by the depth prepass and the shading pass.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position (`@location(0)`).
    pub position: Vec3,
    /// Object-space normal (`@location(1)`).
    pub normal: Vec3,
    /// Texture coordinates (`@location(2)`).
    pub uv: Vec2,
    /// Tangent along +U (`@location(3)`).
    pub tangent: Vec3,
    /// Bitangent along +V (`@location(4)`).
    pub bitangent: Vec3,
}

const VERTEX_ATTRIBUTES: [VertexAttributeDescriptor; 5] = [
    VertexAttributeDescriptor {
        shader_location: 0,
        format: VertexFormat::Float32x3,
        offset: 0,
    },
    VertexAttributeDescriptor {
        shader_location: 1,
        format: VertexFormat::Float32x3,
        offset: 12,
    },
    VertexAttributeDescriptor {
        shader_location: 2,
        format: VertexFormat::Float32x2,
        offset: 24,
    },
    VertexAttributeDescriptor {
        shader_location: 3,
        format: VertexFormat::Float32x3,
        offset: 32,
    },
    VertexAttributeDescriptor {
        shader_location: 4,
        format: VertexFormat::Float32x3,
        offset: 44,
    },
];

impl Vertex {
    /// Creates a vertex with zeroed tangent frame.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Default::default()
        }
    }

    /// The full vertex buffer layout, used by the shading pipeline.
    pub fn layout() -> VertexBufferLayoutDescriptor<'static> {
        VertexBufferLayoutDescriptor {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Borrowed(&VERTEX_ATTRIBUTES),
        }
    }

    /// A layout exposing only the position, used by the depth prepass.
    pub fn position_only_layout() -> VertexBufferLayoutDescriptor<'static> {
        VertexBufferLayoutDescriptor {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Borrowed(&VERTEX_ATTRIBUTES[..1]),
        }
    }
}

/// The role a material texture plays during shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Base color.
    Diffuse,
    /// Specular intensity mask.
    Specular,
    /// Tangent-space normal map.
    Normal,
    /// Height/bump map.
    Height,
}

impl TextureKind {
    /// The sampler-name prefix the shading lane uses for this kind.
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

/// A texture reference attached to a mesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshTexture {
    /// What the texture is used for.
    pub kind: TextureKind,
    /// The resolved path on disk.
    pub path: PathBuf,
}

/// Imported, CPU-side geometry of one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Name from the source file.
    pub name: String,
    /// Interleaved vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u32>,
    /// Material textures, in material order.
    pub textures: Vec<MeshTexture>,
}

impl MeshData {
    /// Number of triangles described by `indices`.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The axis-aligned bounds of all vertices, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let first = self.vertices.first()?.position;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), v| {
                (min.min(v.position), max.max(v.position))
            });
        Some(Aabb::from_min_max(min, max))
    }

    /// The first texture of the given kind, if any.
    pub fn texture(&self, kind: TextureKind) -> Option<&MeshTexture> {
        self.textures.iter().find(|t| t.kind == kind)
    }

    fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let len = self.vertices.len();
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .filter(move |t| t.iter().all(|&i| i < len))
    }

    /// Replaces every normal with the area-weighted average of adjacent face normals.
    pub fn generate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for [a, b, c] in self.triangles() {
            let p0 = self.vertices[a].position;
            let face = (self.vertices[b].position - p0).cross(self.vertices[c].position - p0);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalize();
        }
    }

    /// Computes per-vertex tangents and bitangents from positions and UVs.
    ///
    /// Each triangle contributes its UV-aligned edge basis to its three vertices;
    /// the sums are normalized. Triangles with degenerate UVs contribute nothing.
    pub fn compute_tangents(&mut self) {
        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];

        for [a, b, c] in self.triangles() {
            let (v0, v1, v2) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let edge1 = v1.position - v0.position;
            let edge2 = v2.position - v0.position;
            let duv1 = v1.uv - v0.uv;
            let duv2 = v2.uv - v0.uv;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() < EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
            let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

            for i in [a, b, c] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        for ((vertex, t), b) in self.vertices.iter_mut().zip(tangents).zip(bitangents) {
            vertex.tangent = t.normalize();
            vertex.bitangent = b.normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> MeshData {
        let n = Vec3::ZERO;
        MeshData {
            name: "quad".into(),
            vertices: vec![
                Vertex::new(Vec3::new(0.0, 0.0, 0.0), n, Vec2::new(0.0, 0.0)),
                Vertex::new(Vec3::new(1.0, 0.0, 0.0), n, Vec2::new(1.0, 0.0)),
                Vertex::new(Vec3::new(1.0, 1.0, 0.0), n, Vec2::new(1.0, 1.0)),
                Vertex::new(Vec3::new(0.0, 1.0, 0.0), n, Vec2::new(0.0, 1.0)),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            textures: Vec::new(),
        }
    }

    #[test]
    fn test_vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 56);
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 56);
        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset + last.format.size(), 56);
        assert_eq!(Vertex::position_only_layout().attributes.len(), 1);
    }

    #[test]
    fn test_generated_normals_face_plus_z() {
        let mut mesh = quad();
        mesh.generate_normals();
        for v in &mesh.vertices {
            assert_relative_eq!(v.normal.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_tangent_frame_follows_uv_axes() {
        let mut mesh = quad();
        mesh.compute_tangents();
        for v in &mesh.vertices {
            assert_relative_eq!(v.tangent.x, 1.0, epsilon = 1e-6);
            assert_relative_eq!(v.bitangent.y, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bounds_and_texture_lookup() {
        let mut mesh = quad();
        mesh.textures.push(MeshTexture {
            kind: TextureKind::Normal,
            path: PathBuf::from("brick_normal.png"),
        });
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.texture(TextureKind::Diffuse).is_none());
        assert!(mesh.texture(TextureKind::Normal).is_some());
        assert!(MeshData::default().bounds().is_none());
    }
}
