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

//! Decoding of a visible-index buffer read back from the GPU.

use tessera_core::renderer::culling::tile_light_list;
use tessera_core::renderer::{TileGrid, VisibleIndex, MAX_LIGHTS_PER_TILE};

/// Per-tile statistics of one culling dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CullingReport {
    /// Visible-light count of every tile, row-major.
    pub per_tile: Vec<u32>,
    /// Tiles with at least one light.
    pub lit_tiles: u32,
    /// Tiles whose list filled the whole slice.
    pub full_tiles: u32,
    /// Largest list length.
    pub max_per_tile: u32,
    /// Sum of all list lengths.
    pub total_references: u64,
    /// Entries naming a light outside `[0, light_count)`.
    pub invalid_entries: u32,
}

impl CullingReport {
    /// Walks every tile's sentinel-terminated list in `entries`.
    pub fn from_entries(entries: &[VisibleIndex], grid: &TileGrid, light_count: u32) -> Self {
        let mut report = Self::default();
        for (x, y) in grid.tiles() {
            let list = tile_light_list(entries, grid, x, y).unwrap_or(&[]);
            let count = list.len() as u32;
            report.invalid_entries += list
                .iter()
                .filter(|entry| entry.index < 0 || entry.index as u32 >= light_count)
                .count() as u32;
            if count > 0 {
                report.lit_tiles += 1;
                log::debug!("CullingReport: Tile ({x}, {y}): {count} lights");
            }
            if count == MAX_LIGHTS_PER_TILE {
                report.full_tiles += 1;
            }
            report.max_per_tile = report.max_per_tile.max(count);
            report.total_references += u64::from(count);
            report.per_tile.push(count);
        }
        report
    }

    /// Mean list length over all tiles.
    pub fn mean_per_tile(&self) -> f32 {
        if self.per_tile.is_empty() {
            0.0
        } else {
            self.total_references as f32 / self.per_tile.len() as f32
        }
    }

    /// Logs the summary line.
    pub fn log_summary(&self) {
        log::info!(
            "CullingReport: {} tiles, {} lit, {} full, max {} / mean {:.1} lights per tile",
            self.per_tile.len(),
            self.lit_tiles,
            self.full_tiles,
            self.max_per_tile,
            self.mean_per_tile()
        );
        if self.invalid_entries > 0 {
            log::error!(
                "CullingReport: {} entries reference lights out of range",
                self.invalid_entries
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(grid: &TileGrid, lists: &[&[i32]]) -> Vec<VisibleIndex> {
        let mut entries = vec![VisibleIndex { index: 0 }; grid.visible_index_capacity() as usize];
        for (tile, list) in lists.iter().enumerate() {
            let start = tile * MAX_LIGHTS_PER_TILE as usize;
            for (slot, &index) in list.iter().enumerate() {
                entries[start + slot] = VisibleIndex { index };
            }
            if list.len() < MAX_LIGHTS_PER_TILE as usize {
                entries[start + list.len()] = VisibleIndex::SENTINEL;
            }
        }
        entries
    }

    #[test]
    fn test_counts_each_tile() {
        let grid = TileGrid::for_viewport(32, 16);
        let entries = buffer(&grid, &[&[2, 0], &[]]);
        let report = CullingReport::from_entries(&entries, &grid, 3);
        assert_eq!(report.per_tile, vec![2, 0]);
        assert_eq!(report.lit_tiles, 1);
        assert_eq!(report.max_per_tile, 2);
        assert_eq!(report.total_references, 2);
        assert_eq!(report.invalid_entries, 0);
        assert_eq!(report.mean_per_tile(), 1.0);
    }

    #[test]
    fn test_full_tile_has_no_sentinel() {
        let grid = TileGrid::for_viewport(16, 16);
        let full: Vec<i32> = (0..MAX_LIGHTS_PER_TILE as i32).collect();
        let entries = buffer(&grid, &[&full]);
        let report = CullingReport::from_entries(&entries, &grid, MAX_LIGHTS_PER_TILE + 5);
        assert_eq!(report.full_tiles, 1);
        assert_eq!(report.per_tile, vec![MAX_LIGHTS_PER_TILE]);
    }

    #[test]
    fn test_flags_out_of_range_indices() {
        let grid = TileGrid::for_viewport(16, 16);
        let entries = buffer(&grid, &[&[0, 7]]);
        let report = CullingReport::from_entries(&entries, &grid, 2);
        assert_eq!(report.invalid_entries, 1);
    }
}
