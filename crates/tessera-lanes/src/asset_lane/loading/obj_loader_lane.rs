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

//! Wavefront OBJ import.

use std::error::Error;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tessera_core::math::{Vec2, Vec3};
use tessera_core::scene::{MeshData, MeshTexture, NodeId, SceneGraph, TextureKind, Vertex};

use crate::asset_lane::{AssetError, AssetLoaderLane};

/// A model imported from disk: a scene-graph arena over a mesh table.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    /// Node hierarchy; nodes refer to `meshes` by index.
    pub graph: SceneGraph,
    /// The node the scene is drawn from.
    pub root: NodeId,
    /// Every mesh of the file.
    pub meshes: Vec<MeshData>,
    /// Directory that texture paths were resolved against.
    pub base_dir: PathBuf,
}

impl ImportedScene {
    /// The meshes reachable from the root, in draw order.
    pub fn flattened_meshes(&self) -> impl Iterator<Item = &MeshData> + '_ {
        self.graph
            .flatten(self.root)
            .into_iter()
            .filter_map(|index| self.meshes.get(index))
    }

    /// Total triangle count over the reachable meshes.
    pub fn triangle_count(&self) -> usize {
        self.flattened_meshes().map(MeshData::triangle_count).sum()
    }
}

/// Lane for loading OBJ models with their MTL materials.
#[derive(Debug, Clone, Default)]
pub struct ObjLoaderLane {
    base_dir: PathBuf,
    require_materials: bool,
}

impl ObjLoaderLane {
    /// A loader that resolves material libraries and textures against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            require_materials: false,
        }
    }

    /// Turns a missing or broken material library into an error instead of
    /// importing untextured meshes.
    pub fn with_required_materials(mut self) -> Self {
        self.require_materials = true;
        self
    }

    /// Loads `path`, resolving materials next to it.
    pub fn load_file(path: &Path) -> Result<ImportedScene, AssetError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension != "obj" {
            return Err(AssetError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            });
        }

        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::info!("ObjLoaderLane: Loading '{}'", path.display());
        Self::new(base_dir).import(&bytes, path)
    }

    /// Parses OBJ text. `origin` only names the source in errors and in the root node.
    pub fn import(&self, bytes: &[u8], origin: &Path) -> Result<ImportedScene, AssetError> {
        let (models, materials) = tobj::load_obj_buf(
            &mut Cursor::new(bytes),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |mtl| tobj::load_mtl(self.base_dir.join(mtl)),
        )
        .map_err(|source| AssetError::Obj {
            path: origin.to_path_buf(),
            source,
        })?;

        if models.is_empty() {
            return Err(AssetError::Empty {
                path: origin.to_path_buf(),
            });
        }

        let materials = match materials {
            Ok(materials) => materials,
            Err(e) if self.require_materials => {
                return Err(AssetError::MissingMaterial {
                    path: origin.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                log::warn!(
                    "ObjLoaderLane: Materials of '{}' unavailable ({e}), importing untextured",
                    origin.display()
                );
                Vec::new()
            }
        };

        let mut graph = SceneGraph::new();
        let root_name = origin
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root = graph.add_node(root_name, Vec::new());

        let mut meshes = Vec::with_capacity(models.len());
        for model in &models {
            let material = model.mesh.material_id.and_then(|id| materials.get(id));
            let mesh = self.convert(model, material);
            log::debug!(
                "ObjLoaderLane: Mesh '{}' with {} vertices, {} triangles, {} textures",
                mesh.name,
                mesh.vertices.len(),
                mesh.triangle_count(),
                mesh.textures.len()
            );
            let node = graph.add_node(model.name.clone(), vec![meshes.len()]);
            graph.add_child(root, node);
            meshes.push(mesh);
        }

        Ok(ImportedScene {
            graph,
            root,
            meshes,
            base_dir: self.base_dir.clone(),
        })
    }

    fn convert(&self, model: &tobj::Model, material: Option<&tobj::Material>) -> MeshData {
        let mesh = &model.mesh;
        let has_normals = mesh.normals.len() == mesh.positions.len();
        let vertex_count = mesh.positions.len() / 3;

        let vertices = (0..vertex_count)
            .map(|i| {
                let p = &mesh.positions[3 * i..3 * i + 3];
                let normal = if has_normals {
                    let n = &mesh.normals[3 * i..3 * i + 3];
                    Vec3::new(n[0], n[1], n[2])
                } else {
                    Vec3::ZERO
                };
                // Image rows start at the top, OBJ texture space at the bottom.
                let uv = match mesh.texcoords.get(2 * i..2 * i + 2) {
                    Some(t) => Vec2::new(t[0], 1.0 - t[1]),
                    None => Vec2::ZERO,
                };
                Vertex::new(Vec3::new(p[0], p[1], p[2]), normal, uv)
            })
            .collect();

        let mut data = MeshData {
            name: model.name.clone(),
            vertices,
            indices: mesh.indices.clone(),
            textures: material.map(|m| self.textures_of(m)).unwrap_or_default(),
        };
        if !has_normals {
            data.generate_normals();
        }
        data.compute_tangents();
        data
    }

    fn textures_of(&self, material: &tobj::Material) -> Vec<MeshTexture> {
        [
            (TextureKind::Diffuse, &material.diffuse_texture),
            (TextureKind::Specular, &material.specular_texture),
            (TextureKind::Normal, &material.normal_texture),
            (TextureKind::Height, &material.ambient_texture),
        ]
        .into_iter()
        .filter_map(|(kind, name)| {
            let name = name.as_deref()?.trim();
            (!name.is_empty()).then(|| MeshTexture {
                kind,
                path: self.base_dir.join(name),
            })
        })
        .collect()
    }
}

impl AssetLoaderLane<ImportedScene> for ObjLoaderLane {
    fn load(&self, bytes: &[u8]) -> Result<ImportedScene, Box<dyn Error + Send + Sync>> {
        Ok(self.import(bytes, Path::new("memory.obj"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl brick
f 1/1 2/2 3/3 4/4
o tri
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    const QUAD_MTL: &str = "\
newmtl brick
map_Kd brick_diffuse.png
map_Ks brick_specular.png
map_Bump brick_normal.png
map_Ka brick_height.png
";

    fn write_model(dir: &Path, with_mtl: bool) -> PathBuf {
        let path = dir.join("quad.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();
        if with_mtl {
            std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();
        }
        path
    }

    #[test]
    fn test_loads_meshes_into_graph() {
        let dir = tempfile::tempdir().unwrap();
        let scene = ObjLoaderLane::load_file(&write_model(dir.path(), true)).unwrap();

        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.graph.len(), 3);
        assert_eq!(scene.graph.node(scene.root).unwrap().name, "quad");
        assert_eq!(scene.graph.flatten(scene.root), vec![0, 1]);
        // The quad is triangulated.
        assert_eq!(scene.meshes[0].triangle_count(), 2);
        assert_eq!(scene.triangle_count(), 3);
    }

    #[test]
    fn test_uvs_are_flipped_and_tangents_computed() {
        let dir = tempfile::tempdir().unwrap();
        let scene = ObjLoaderLane::load_file(&write_model(dir.path(), true)).unwrap();
        let quad = &scene.meshes[0];

        let origin = quad
            .vertices
            .iter()
            .find(|v| v.position == Vec3::ZERO)
            .unwrap();
        assert_relative_eq!(origin.uv.y, 1.0);
        // Generated normal of a CCW quad in the XY plane.
        assert_relative_eq!(origin.normal.z, 1.0, epsilon = 1e-5);
        // U runs along +X; flipped V runs along -Y.
        assert_relative_eq!(origin.tangent.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(origin.bitangent.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_material_textures_are_typed_and_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let scene = ObjLoaderLane::load_file(&write_model(dir.path(), true)).unwrap();
        let quad = &scene.meshes[0];

        let kinds: Vec<_> = quad.textures.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TextureKind::Diffuse,
                TextureKind::Specular,
                TextureKind::Normal,
                TextureKind::Height
            ]
        );
        assert_eq!(
            quad.texture(TextureKind::Normal).unwrap().path,
            dir.path().join("brick_normal.png")
        );
        // The second object has no material.
        assert!(scene.meshes[1].textures.is_empty());
    }

    #[test]
    fn test_missing_mtl_degrades_or_fails_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), false);

        let scene = ObjLoaderLane::load_file(&path).unwrap();
        assert!(scene.meshes.iter().all(|m| m.textures.is_empty()));

        let bytes = std::fs::read(&path).unwrap();
        let err = ObjLoaderLane::new(dir.path())
            .with_required_materials()
            .import(&bytes, &path)
            .unwrap_err();
        assert!(matches!(err, AssetError::MissingMaterial { .. }));
    }

    #[test]
    fn test_missing_file_and_wrong_extension_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ObjLoaderLane::load_file(&dir.path().join("absent.obj")),
            Err(AssetError::Io { .. })
        ));

        let fbx = dir.path().join("scene.fbx");
        std::fs::write(&fbx, b"").unwrap();
        assert!(matches!(
            ObjLoaderLane::load_file(&fbx),
            Err(AssetError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_file_without_geometry_is_empty_error() {
        let err = ObjLoaderLane::default()
            .import(b"# nothing here\n", Path::new("empty.obj"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Empty { .. }));
    }

    #[test]
    fn test_loader_lane_trait_parses_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();
        let scene = ObjLoaderLane::new(dir.path())
            .load(QUAD_OBJ.as_bytes())
            .unwrap();
        assert_eq!(scene.meshes.len(), 2);
    }
}
