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

//! CPU reference of the per-tile light-culling kernel.
//!
//! The WGSL compute shader performs exactly these steps with one workgroup per
//! tile; this module exists so the geometry can be tested without a GPU and so
//! readbacks can be decoded. Depth follows the `[0, 1]` convention with `1.0`
//! as the cleared (far) value, and pixel rows are counted from the top.

use super::forward_plus::{TileGrid, VisibleIndex, MAX_LIGHTS_PER_TILE};
use super::light::PointLight;
use crate::math::{Mat4, Plane, Vec3};

/// A borrowed depth image, row-major, top row first.
#[derive(Debug, Clone, Copy)]
pub struct DepthImage<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height` depth values in `[0, 1]`.
    pub texels: &'a [f32],
}

impl DepthImage<'_> {
    #[inline]
    fn texel(&self, x: u32, y: u32) -> f32 {
        self.texels[(y * self.width + x) as usize]
    }
}

/// The depth range covered by the geometry of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBounds {
    /// Smallest depth in the tile (closest to the camera).
    pub min: f32,
    /// Largest depth in the tile.
    pub max: f32,
}

impl DepthBounds {
    /// Min/max reduction over the pixels of tile `(tile_x, tile_y)` that lie inside
    /// the image. A tile with no pixel inside gets the far plane for both bounds.
    pub fn of_tile(depth: &DepthImage, tile_size: u32, tile_x: u32, tile_y: u32) -> Self {
        let x0 = tile_x * tile_size;
        let y0 = tile_y * tile_size;
        let x1 = (x0 + tile_size).min(depth.width);
        let y1 = (y0 + tile_size).min(depth.height);

        let mut bounds = Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let d = depth.texel(x, y);
                bounds.min = bounds.min.min(d);
                bounds.max = bounds.max.max(d);
            }
        }
        if bounds.min > bounds.max {
            return Self { min: 1.0, max: 1.0 };
        }
        bounds
    }
}

/// Returns `true` unless the sphere lies entirely behind `plane`.
///
/// The boundary case, signed distance exactly `-radius`, is visible.
#[inline]
pub fn sphere_visible(plane: &Plane, center: Vec3, radius: f32) -> bool {
    plane.intersects_sphere(center, radius)
}

/// The view-space frustum of one tile: left, right, top, bottom, near, far.
///
/// Every plane's normal points into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileFrustum {
    /// The six bounding planes.
    pub planes: [Plane; 6],
}

impl TileFrustum {
    /// Builds the frustum of tile `tile` on a `screen`-sized viewport.
    ///
    /// Side planes pass through the eye and two unprojected tile corners. The near
    /// and far planes sit at the view depths of `depth.min` and `depth.max`.
    pub fn new(
        tile: (u32, u32),
        tile_size: u32,
        screen: (u32, u32),
        inverse_projection: &Mat4,
        depth: DepthBounds,
    ) -> Self {
        let (w, h) = (screen.0.max(1) as f32, screen.1.max(1) as f32);
        let x0 = (tile.0 * tile_size) as f32;
        let y0 = (tile.1 * tile_size) as f32;
        let x1 = x0 + tile_size as f32;
        let y1 = y0 + tile_size as f32;
        let (cx, cy) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);

        let to_view = |px: f32, py: f32, d: f32| -> Vec3 {
            let ndc = Vec3::new(2.0 * px / w - 1.0, 1.0 - 2.0 * py / h, d);
            inverse_projection.project_point3(ndc)
        };

        let top_left = to_view(x0, y0, 1.0);
        let top_right = to_view(x1, y0, 1.0);
        let bottom_left = to_view(x0, y1, 1.0);
        let bottom_right = to_view(x1, y1, 1.0);
        let center = to_view(cx, cy, 1.0);

        let side = |a: Vec3, b: Vec3| {
            let plane = Plane::through_origin(a, b);
            if plane.signed_distance(center) < 0.0 {
                plane.flipped()
            } else {
                plane
            }
        };

        let z_near = to_view(cx, cy, depth.min).z;
        let z_far = to_view(cx, cy, depth.max).z;

        Self {
            planes: [
                side(bottom_left, top_left),
                side(top_right, bottom_right),
                side(top_left, top_right),
                side(bottom_right, bottom_left),
                // View space looks down -Z: "inside" means farther than z_near...
                Plane::new(-Vec3::Z, -z_near),
                // ...and closer than z_far.
                Plane::new(Vec3::Z, z_far),
            ],
        }
    }

    /// A sphere is visible if it is not entirely behind any of the six planes.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| sphere_visible(plane, center, radius))
    }
}

/// Classifies `lights` against one tile and writes the visible indices into `slice`.
///
/// Indices are appended from slot 0. When fewer than the slice capacity are
/// visible, the slot after the last one receives the sentinel; when more are
/// visible, the excess is dropped and no sentinel is written. Nothing is written
/// outside `slice`. Returns the number of lights that passed, which may exceed
/// the capacity.
pub fn cull_tile(
    frustum: &TileFrustum,
    view: &Mat4,
    lights: &[PointLight],
    slice: &mut [VisibleIndex],
) -> u32 {
    let capacity = slice.len().min(MAX_LIGHTS_PER_TILE as usize);
    let mut count = 0usize;
    for (index, light) in lights.iter().enumerate() {
        let center = view.transform_point3(light.position);
        if frustum.intersects_sphere(center, light.radius) {
            if count < capacity {
                slice[count] = VisibleIndex {
                    index: index as i32,
                };
            }
            count += 1;
        }
    }
    if count < capacity {
        slice[count] = VisibleIndex::SENTINEL;
    }
    count as u32
}

/// Runs the whole culling pass on the CPU and returns the visible-index buffer.
pub fn cull_lights(
    grid: &TileGrid,
    depth: &DepthImage,
    view: &Mat4,
    inverse_projection: &Mat4,
    lights: &[PointLight],
) -> Vec<VisibleIndex> {
    let mut buffer = vec![VisibleIndex { index: 0 }; grid.visible_index_capacity() as usize];
    for (x, y) in grid.tiles() {
        let Some(offset) = grid.tile_slice_offset(x, y) else {
            continue;
        };
        let bounds = DepthBounds::of_tile(depth, grid.tile_size(), x, y);
        let frustum = TileFrustum::new(
            (x, y),
            grid.tile_size(),
            grid.viewport(),
            inverse_projection,
            bounds,
        );
        let start = offset as usize;
        let end = start + MAX_LIGHTS_PER_TILE as usize;
        cull_tile(&frustum, view, lights, &mut buffer[start..end]);
    }
    buffer
}

/// Returns the valid prefix of tile `(x, y)`'s list: every entry before the
/// sentinel, or the whole slice when it is full.
///
/// Returns `None` when the tile is outside the grid or the buffer is too short.
pub fn tile_light_list<'a>(
    buffer: &'a [VisibleIndex],
    grid: &TileGrid,
    x: u32,
    y: u32,
) -> Option<&'a [VisibleIndex]> {
    let start = grid.tile_slice_offset(x, y)? as usize;
    let slice = buffer.get(start..start + MAX_LIGHTS_PER_TILE as usize)?;
    let len = slice
        .iter()
        .position(VisibleIndex::is_sentinel)
        .unwrap_or(slice.len());
    Some(&slice[..len])
}

/// Reinterprets raw readback bytes as visible-index entries.
pub fn visible_indices_from_bytes(bytes: &[u8]) -> Vec<VisibleIndex> {
    let whole = bytes.len() - bytes.len() % std::mem::size_of::<VisibleIndex>();
    bytemuck::pod_collect_to_vec(&bytes[..whole])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::forward_plus::{TILE_SIZE, VISIBLE_INDEX_SENTINEL};

    fn projection(aspect: f32) -> Mat4 {
        Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, aspect, 0.1, 10.0)
    }

    fn flat_depth(proj: &Mat4, view_z: f32, w: u32, h: u32) -> Vec<f32> {
        let d = proj.project_point3(Vec3::new(0.0, 0.0, view_z)).z;
        vec![d; (w * h) as usize]
    }

    #[test]
    fn test_sphere_plane_boundary_is_inclusive() {
        let plane = Plane::new(Vec3::X, 0.0);
        let radius = 2.0;
        for d in [-3.0f32, -2.0, -1.5, 0.0, 4.0] {
            let center = Vec3::new(d, 1.0, -7.0);
            assert_eq!(sphere_visible(&plane, center, radius), d >= -radius, "d = {d}");
        }
    }

    #[test]
    fn test_single_tile_lists_light_then_sentinel() {
        let proj = projection(1.0);
        let inv = proj.inverse().unwrap();
        let grid = TileGrid::for_viewport(16, 16);
        let texels = flat_depth(&proj, -5.0, 16, 16);
        let depth = DepthImage {
            width: 16,
            height: 16,
            texels: &texels,
        };
        let lights = [PointLight::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 1.0)];

        let buffer = cull_lights(&grid, &depth, &Mat4::IDENTITY, &inv, &lights);
        assert_eq!(buffer[0].index, 0);
        assert_eq!(buffer[1].index, VISIBLE_INDEX_SENTINEL);
        assert_eq!(
            tile_light_list(&buffer, &grid, 0, 0).unwrap(),
            &[VisibleIndex { index: 0 }]
        );
    }

    #[test]
    fn test_light_at_eye_is_in_front_of_tight_depth_bounds() {
        // With the quad at z = -5 the tile's depth range is a single slice, and a
        // unit sphere around the eye never reaches it.
        // The near plane sits at the tile's min depth, not the camera's, so a light
        // at the eye is culled even though it lies inside the view frustum.
        let proj = projection(1.0);
        let inv = proj.inverse().unwrap();
        let grid = TileGrid::for_viewport(16, 16);
        let texels = flat_depth(&proj, -5.0, 16, 16);
        let depth = DepthImage {
            width: 16,
            height: 16,
            texels: &texels,
        };
        let lights = [PointLight::new(Vec3::ZERO, Vec3::ONE, 1.0)];

        let buffer = cull_lights(&grid, &depth, &Mat4::IDENTITY, &inv, &lights);
        assert!(buffer[0].is_sentinel());
        assert!(tile_light_list(&buffer, &grid, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_lights_are_assigned_to_their_tiles_only() {
        let proj = projection(2.0);
        let inv = proj.inverse().unwrap();
        let grid = TileGrid::for_viewport(32, 16);
        let texels = flat_depth(&proj, -5.0, 32, 16);
        let depth = DepthImage {
            width: 32,
            height: 16,
            texels: &texels,
        };
        let lights = [
            PointLight::new(Vec3::new(-2.0, 0.0, -5.0), Vec3::ONE, 0.5),
            PointLight::new(Vec3::new(2.0, 0.0, -5.0), Vec3::ONE, 0.5),
            PointLight::new(Vec3::new(100.0, 0.0, -5.0), Vec3::ONE, 0.5),
            PointLight::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 0.5),
        ];

        let buffer = cull_lights(&grid, &depth, &Mat4::IDENTITY, &inv, &lights);
        let left: Vec<i32> = tile_light_list(&buffer, &grid, 0, 0)
            .unwrap()
            .iter()
            .map(|v| v.index)
            .collect();
        let right: Vec<i32> = tile_light_list(&buffer, &grid, 1, 0)
            .unwrap()
            .iter()
            .map(|v| v.index)
            .collect();
        assert_eq!(left, vec![0, 3]);
        assert_eq!(right, vec![1, 3]);
    }

    #[test]
    fn test_sentinel_follows_every_partial_list() {
        let proj = projection(1.0);
        let inv = proj.inverse().unwrap();
        let frustum = TileFrustum::new(
            (0, 0),
            TILE_SIZE,
            (16, 16),
            &inv,
            DepthBounds { min: 0.0, max: 1.0 },
        );
        for k in [0usize, 1, 7, 1023] {
            let lights = vec![PointLight::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 1.0); k];
            let mut slice = vec![VisibleIndex { index: 4242 }; MAX_LIGHTS_PER_TILE as usize];
            let count = cull_tile(&frustum, &Mat4::IDENTITY, &lights, &mut slice);
            assert_eq!(count as usize, k);
            assert!(slice[k].is_sentinel());
            let mut seen: Vec<i32> = slice[..k].iter().map(|v| v.index).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..k as i32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_overflow_truncates_without_sentinel() {
        let proj = projection(1.0);
        let inv = proj.inverse().unwrap();
        let frustum = TileFrustum::new(
            (0, 0),
            TILE_SIZE,
            (16, 16),
            &inv,
            DepthBounds { min: 0.0, max: 1.0 },
        );
        let cap = MAX_LIGHTS_PER_TILE as usize;
        let lights = vec![PointLight::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE, 1.0); cap + 76];
        let marker = VisibleIndex { index: 7777 };
        let mut buffer = vec![marker; cap * 2];

        let count = cull_tile(&frustum, &Mat4::IDENTITY, &lights, &mut buffer[..cap]);
        assert_eq!(count as usize, cap + 76);
        assert!(buffer[..cap].iter().all(|v| v.index >= 0 && (v.index as usize) < cap));
        assert!(!buffer[..cap].iter().any(VisibleIndex::is_sentinel));
        assert!(buffer[cap..].iter().all(|v| *v == marker));

        let grid = TileGrid::for_viewport(32, 16);
        let list = tile_light_list(&buffer, &grid, 0, 0).unwrap();
        assert_eq!(list.len(), cap);
    }

    #[test]
    fn test_depth_bounds_reduce_inside_viewport_only() {
        let mut texels = vec![0.5f32; 20 * 20];
        texels[3 * 20 + 4] = 0.2;
        texels[19 * 20 + 19] = 0.9;
        let depth = DepthImage {
            width: 20,
            height: 20,
            texels: &texels,
        };
        let first = DepthBounds::of_tile(&depth, 16, 0, 0);
        assert_eq!(first, DepthBounds { min: 0.2, max: 0.5 });
        let corner = DepthBounds::of_tile(&depth, 16, 1, 1);
        assert_eq!(corner, DepthBounds { min: 0.5, max: 0.9 });
        let outside = DepthBounds::of_tile(&depth, 16, 5, 5);
        assert_eq!(outside, DepthBounds { min: 1.0, max: 1.0 });
    }

    #[test]
    fn test_readback_bytes_decode() {
        let raw: Vec<u8> = [3i32, -1, 9]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .chain([0u8, 1])
            .collect();
        let decoded = visible_indices_from_bytes(&raw);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].index, 3);
        assert!(decoded[1].is_sentinel());
    }
}
