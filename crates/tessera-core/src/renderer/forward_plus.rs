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

//! Tiling constants, the tile grid, and the GPU data layouts shared by the
//! light-culling compute pass and the final shading pass.
//!
//! The screen is split into `TILE_SIZE`-pixel square tiles. Each tile owns a
//! fixed slice of `MAX_LIGHTS_PER_TILE` entries in the visible-light-index
//! buffer, starting at `(y * work_groups_x + x) * MAX_LIGHTS_PER_TILE`. The
//! culling pass fills a slice with light indices and terminates it with
//! [`VISIBLE_INDEX_SENTINEL`] unless the slice is full.

use bytemuck::{Pod, Zeroable};

use super::light::PointLight;

/// Edge length of a screen tile in pixels. Also the compute workgroup edge.
pub const TILE_SIZE: u32 = 16;

/// Capacity of one tile's slice of the visible-light-index buffer.
pub const MAX_LIGHTS_PER_TILE: u32 = 1024;

/// Binding point of the light storage buffer, in both the culling and shading programs.
pub const LIGHT_BUFFER_BINDING: u32 = 0;

/// Binding point of the visible-light-index buffer, in both programs.
pub const VISIBLE_INDEX_BINDING: u32 = 1;

/// Binding point of the per-pass uniform block.
pub const UNIFORMS_BINDING: u32 = 2;

/// Binding point of the prepass depth texture in the culling program.
pub const DEPTH_TEXTURE_BINDING: u32 = 3;

/// Marks the end of a tile's light list when fewer than `MAX_LIGHTS_PER_TILE` lights are visible.
pub const VISIBLE_INDEX_SENTINEL: i32 = -1;

/// Number of tiles needed to cover `extent` pixels, rounded up.
#[inline]
pub const fn tiles_for(extent: u32, tile_size: u32) -> u32 {
    extent.div_ceil(tile_size)
}

/// The tile grid derived from a viewport size.
///
/// The grid must be recomputed whenever the viewport changes; the culling dispatch
/// size and the visible-index buffer capacity both come from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    tile_size: u32,
    viewport: (u32, u32),
    work_groups_x: u32,
    work_groups_y: u32,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(TILE_SIZE)
    }
}

impl TileGrid {
    /// An empty grid (zero tiles) for the given tile size.
    pub const fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            viewport: (0, 0),
            work_groups_x: 0,
            work_groups_y: 0,
        }
    }

    /// Builds a grid covering a `width` × `height` viewport with the default tile size.
    pub fn for_viewport(width: u32, height: u32) -> Self {
        let mut grid = Self::new(TILE_SIZE);
        grid.recompute(width, height, TILE_SIZE);
        grid
    }

    /// Recomputes the grid for a viewport and returns `(work_groups_x, work_groups_y)`.
    ///
    /// # Panics
    /// Panics if `tile_size` is zero.
    pub fn recompute(&mut self, width: u32, height: u32, tile_size: u32) -> (u32, u32) {
        assert!(tile_size > 0, "tile size must be non-zero");
        self.tile_size = tile_size;
        self.viewport = (width, height);
        self.work_groups_x = tiles_for(width, tile_size);
        self.work_groups_y = tiles_for(height, tile_size);
        (self.work_groups_x, self.work_groups_y)
    }

    /// The dispatch dimensions of the culling pass.
    #[inline]
    pub fn work_groups(&self) -> (u32, u32) {
        (self.work_groups_x, self.work_groups_y)
    }

    /// The number of tiles along X, which the shading pass needs to find a pixel's tile.
    #[inline]
    pub fn tiles_x(&self) -> u32 {
        self.work_groups_x
    }

    /// The viewport this grid was computed for.
    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// The tile edge length in pixels.
    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// `work_groups_x * work_groups_y`.
    #[inline]
    pub fn tile_count(&self) -> u32 {
        self.work_groups_x * self.work_groups_y
    }

    /// Entries the visible-light-index buffer must hold for this grid.
    #[inline]
    pub fn visible_index_capacity(&self) -> u64 {
        self.tile_count() as u64 * MAX_LIGHTS_PER_TILE as u64
    }

    /// Bytes the visible-light-index buffer must hold for this grid.
    #[inline]
    pub fn visible_index_buffer_size(&self) -> u64 {
        self.visible_index_capacity() * std::mem::size_of::<VisibleIndex>() as u64
    }

    /// First entry of the slice owned by tile `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn tile_slice_offset(&self, x: u32, y: u32) -> Option<u64> {
        if x >= self.work_groups_x || y >= self.work_groups_y {
            return None;
        }
        Some((y as u64 * self.work_groups_x as u64 + x as u64) * MAX_LIGHTS_PER_TILE as u64)
    }

    /// The tile containing pixel `(px, py)`.
    #[inline]
    pub fn tile_of_pixel(&self, px: u32, py: u32) -> (u32, u32) {
        (px / self.tile_size, py / self.tile_size)
    }

    /// Iterates over every tile coordinate, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> {
        let (wx, wy) = (self.work_groups_x, self.work_groups_y);
        (0..wy).flat_map(move |y| (0..wx).map(move |x| (x, y)))
    }
}

/// One entry of the visible-light-index buffer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct VisibleIndex {
    /// A light index, or [`VISIBLE_INDEX_SENTINEL`].
    pub index: i32,
}

impl VisibleIndex {
    /// The end-of-list marker.
    pub const SENTINEL: Self = Self {
        index: VISIBLE_INDEX_SENTINEL,
    };

    /// Returns `true` if this entry terminates a list.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.index == VISIBLE_INDEX_SENTINEL
    }
}

/// GPU layout of a point light: three `vec4<f32>`, 48 bytes.
///
/// `color.w` and `position.w` are unused; the radius lives in `padding_and_radius.w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// Linear RGB color, `w` unused.
    pub color: [f32; 4],
    /// World-space position, `w = 1`.
    pub position: [f32; 4],
    /// `w` holds the radius of influence.
    pub padding_and_radius: [f32; 4],
}

impl From<&PointLight> for GpuPointLight {
    fn from(light: &PointLight) -> Self {
        Self {
            color: [light.color.x, light.color.y, light.color.z, 1.0],
            position: [light.position.x, light.position.y, light.position.z, 1.0],
            padding_and_radius: [0.0, 0.0, 0.0, light.radius],
        }
    }
}

/// Uniforms of the light-culling compute pass. 144 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CullingUniforms {
    /// World to view space.
    pub view: [[f32; 4]; 4],
    /// Clip to view space, used to unproject tile corners and depth bounds.
    pub inverse_projection: [[f32; 4]; 4],
    /// Viewport size in pixels.
    pub screen_size: [u32; 2],
    /// Number of lights in the light buffer.
    pub light_count: u32,
    /// Tiles along X; the row stride of the visible-index buffer in tiles.
    pub tiles_x: u32,
}

/// Uniforms of the final shading pass. 224 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadingUniforms {
    /// Object to world space.
    pub model: [[f32; 4]; 4],
    /// World to view space.
    pub view: [[f32; 4]; 4],
    /// View to clip space.
    pub projection: [[f32; 4]; 4],
    /// Camera position in world space, `w` unused.
    pub view_position: [f32; 4],
    /// Tiles along X, so each fragment can recover its tile index.
    pub tiles_x: u32,
    /// Number of lights in the light buffer.
    pub light_count: u32,
    /// Padding to a 16-byte multiple.
    pub _padding: [u32; 2],
}

/// Uniforms of the depth prepass: one model-view-projection matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthUniforms {
    /// Object to clip space.
    pub model_view_projection: [[f32; 4]; 4],
}

/// Uniforms of the depth debug view.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthDebugUniforms {
    /// Near plane distance.
    pub z_near: f32,
    /// Far plane distance.
    pub z_far: f32,
    /// Padding to 16 bytes.
    pub _padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_grid_covers_viewport_minimally() {
        let sizes = [
            (1, 1),
            (15, 17),
            (16, 16),
            (17, 31),
            (1080, 720),
            (1920, 1080),
            (2560, 1441),
        ];
        for tile in [8, 16, 32] {
            for &(w, h) in &sizes {
                let mut grid = TileGrid::new(tile);
                let (wx, wy) = grid.recompute(w, h, tile);
                assert!(wx * tile >= w && (wx - 1) * tile < w, "{w}x{h} tile {tile}");
                assert!(wy * tile >= h && (wy - 1) * tile < h, "{w}x{h} tile {tile}");
            }
        }
    }

    #[test]
    fn test_zero_viewport_has_no_tiles() {
        let grid = TileGrid::for_viewport(0, 720);
        assert_eq!(grid.tile_count(), 0);
        assert_eq!(grid.visible_index_capacity(), 0);
    }

    #[test]
    fn test_tile_slices_are_disjoint() {
        let grid = TileGrid::for_viewport(100, 50);
        let mut offsets = HashSet::new();
        for (x, y) in grid.tiles() {
            let offset = grid.tile_slice_offset(x, y).unwrap();
            assert_eq!(offset % MAX_LIGHTS_PER_TILE as u64, 0);
            assert!(offset + MAX_LIGHTS_PER_TILE as u64 <= grid.visible_index_capacity());
            assert!(offsets.insert(offset));
        }
        assert_eq!(offsets.len() as u32, grid.tile_count());
        assert_eq!(grid.tile_slice_offset(grid.tiles_x(), 0), None);
    }

    #[test]
    fn test_baseline_window_grid() {
        let grid = TileGrid::for_viewport(1080, 720);
        assert_eq!(grid.work_groups(), (68, 45));
        assert_eq!(grid.visible_index_buffer_size(), 68 * 45 * 1024 * 4);
        assert_eq!(grid.tile_of_pixel(1079, 719), (67, 44));
    }

    #[test]
    fn test_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 48);
        assert_eq!(std::mem::size_of::<VisibleIndex>(), 4);
        assert_eq!(std::mem::size_of::<CullingUniforms>(), 144);
        assert_eq!(std::mem::size_of::<ShadingUniforms>(), 224);
        assert_eq!(std::mem::size_of::<DepthDebugUniforms>() % 16, 0);
    }

    #[test]
    fn test_gpu_light_stores_radius_in_w() {
        let light = PointLight::new(
            crate::math::Vec3::new(1.0, 2.0, 3.0),
            crate::math::Vec3::ONE,
            30.0,
        );
        let gpu = GpuPointLight::from(&light);
        assert_eq!(gpu.padding_and_radius[3], 30.0);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0, 1.0]);
    }
}
