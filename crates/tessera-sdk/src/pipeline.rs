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

//! The per-frame state machine: depth prepass, light culling, final shading,
//! present.
//!
//! [`FramePipeline`] owns every resource whose size follows the viewport: the
//! depth texture, the visible-index buffer and the bind groups that reference
//! them. The light pool buffer and the visible-index buffer are bound at the
//! same slots in the culling and shading programs.
//!
//! All passes of a frame go into one command encoder, in order. The culling
//! pass writes the visible-index buffer as read-write storage and the shading
//! pass reads it as read-only storage; the backend inserts the barrier between
//! the two passes, so shading never sees a partially written list.

use std::borrow::Cow;
use std::sync::Arc;

use tessera_core::renderer::culling::visible_indices_from_bytes;
use tessera_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, CommandEncoder, Extent3D, GraphicsDevice,
    RenderContext, RenderError, ResourceError, TextureDescriptor, TextureFormat, TextureId,
    TextureUsage, TextureViewDescriptor, TextureViewId, TileGrid, TILE_SIZE,
};
use tessera_lanes::{DepthDebugLane, DepthPrepassLane, FinalShadingLane, LightCullingLane};

use crate::config::DebugView;
use crate::readback::CullingReport;
use crate::scene::SceneAssets;
use crate::state::RendererState;

/// The stages of a frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// Scene depth is rendered.
    DepthPrepass,
    /// Per-tile light lists are built.
    LightCulling,
    /// The scene is shaded, or the depth debug view drawn.
    FinalShading,
    /// The frame is submitted and presented. Also the resting state between
    /// frames.
    Present,
}

impl FrameStage {
    /// The stage that must follow this one.
    pub fn next(self) -> Self {
        match self {
            Self::DepthPrepass => Self::LightCulling,
            Self::LightCulling => Self::FinalShading,
            Self::FinalShading => Self::Present,
            Self::Present => Self::DepthPrepass,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DepthTarget {
    texture: TextureId,
    view: TextureViewId,
}

impl DepthTarget {
    fn create(
        device: &dyn GraphicsDevice,
        (width, height): (u32, u32),
    ) -> Result<Self, ResourceError> {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed("frame_depth")),
            size: Extent3D {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            format: DepthPrepassLane::DEPTH_FORMAT,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
        })?;
        let view = device.create_texture_view(texture, &TextureViewDescriptor::default())?;
        log::debug!("FramePipeline: Depth texture {width}x{height} created");
        Ok(Self { texture, view })
    }

    fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_texture_view(self.view) {
            log::warn!("FramePipeline: Failed to destroy depth view: {e}");
        }
        if let Err(e) = device.destroy_texture(self.texture) {
            log::warn!("FramePipeline: Failed to destroy depth texture: {e}");
        }
    }
}

fn destroy_visible_index_buffer(device: &dyn GraphicsDevice, buffer: BufferId) {
    if let Err(e) = device.destroy_buffer(buffer) {
        log::warn!("FramePipeline: Failed to destroy visible-index buffer: {e}");
    }
}

fn create_visible_index_buffer(
    device: &dyn GraphicsDevice,
    grid: &TileGrid,
) -> Result<BufferId, ResourceError> {
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some(Cow::Borrowed("visible_light_indices")),
        size: grid.visible_index_buffer_size(),
        usage: BufferUsage::STORAGE | BufferUsage::COPY_SRC,
        mapped_at_creation: false,
    })?;
    log::debug!(
        "FramePipeline: Visible-index buffer for {} tiles ({} bytes)",
        grid.tile_count(),
        grid.visible_index_buffer_size()
    );
    Ok(buffer)
}

/// Records the three passes of a forward+ frame and keeps their resources in
/// step with the viewport.
pub struct FramePipeline {
    device: Arc<dyn GraphicsDevice>,
    grid: TileGrid,
    depth: DepthTarget,
    visible_indices: BufferId,
    lights: BufferId,
    prepass: DepthPrepassLane,
    culling: LightCullingLane,
    shading: FinalShadingLane,
    depth_debug: DepthDebugLane,
    scene: SceneAssets,
    stage: FrameStage,
    frames: u64,
}

impl std::fmt::Debug for FramePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("grid", &self.grid)
            .field("stage", &self.stage)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl FramePipeline {
    /// Creates the lanes and the viewport-sized resources, and binds `lights`.
    ///
    /// A zero viewport dimension is raised to one pixel.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        color_format: TextureFormat,
        viewport: (u32, u32),
        mut scene: SceneAssets,
        lights: BufferId,
    ) -> Result<Self, RenderError> {
        log::info!("FramePipeline: Initializing GPU resources...");
        let viewport = (viewport.0.max(1), viewport.1.max(1));
        let dev = device.as_ref();

        let prepass = DepthPrepassLane::new(dev)?;
        let culling = LightCullingLane::new(dev)?;
        let shading = FinalShadingLane::new(dev, color_format)?;
        let depth_debug = DepthDebugLane::new(dev, color_format)?;
        scene
            .geometry_mut()
            .bind_materials(dev, shading.material_layout(), shading.sampler())?;

        let grid = TileGrid::for_viewport(viewport.0, viewport.1);
        let depth = DepthTarget::create(dev, viewport)?;
        let visible_indices = create_visible_index_buffer(dev, &grid)?;

        let mut pipeline = Self {
            device,
            grid,
            depth,
            visible_indices,
            lights,
            prepass,
            culling,
            shading,
            depth_debug,
            scene,
            stage: FrameStage::Present,
            frames: 0,
        };
        pipeline.rebind()?;
        log::info!(
            "FramePipeline: Ready at {}x{}, {}x{} tiles",
            viewport.0,
            viewport.1,
            pipeline.grid.work_groups().0,
            pipeline.grid.work_groups().1
        );
        Ok(pipeline)
    }

    fn rebind(&mut self) -> Result<(), ResourceError> {
        let device = self.device.as_ref();
        self.culling
            .bind(device, self.lights, self.visible_indices, self.depth.view)?;
        self.shading.bind(device, self.lights, self.visible_indices)?;
        self.depth_debug.bind(device, self.depth.view)?;
        Ok(())
    }

    /// Points both passes at a new light buffer.
    pub fn set_light_buffer(&mut self, lights: BufferId) -> Result<(), ResourceError> {
        self.lights = lights;
        self.rebind()
    }

    /// Follows a viewport change: recomputes the tile grid, recreates the depth
    /// texture, reallocates the visible-index buffer when the tile count
    /// changed, and rebinds everything that refers to them.
    ///
    /// Zero sizes and unchanged sizes are ignored. Returns whether anything was
    /// rebuilt. On an allocation failure the previous grid and resources stay in
    /// place, so the next frame retries.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, ResourceError> {
        if width == 0 || height == 0 || (width, height) == self.grid.viewport() {
            return Ok(false);
        }
        let device = self.device.as_ref();
        let mut grid = self.grid;
        let (groups_x, groups_y) = grid.recompute(width, height, TILE_SIZE);

        let depth = DepthTarget::create(device, (width, height))?;
        let buffer = if grid.tile_count() != self.grid.tile_count() {
            match create_visible_index_buffer(device, &grid) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    depth.destroy(device);
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.grid = grid;
        std::mem::replace(&mut self.depth, depth).destroy(device);
        if let Some(buffer) = buffer {
            let old = std::mem::replace(&mut self.visible_indices, buffer);
            destroy_visible_index_buffer(device, old);
        }
        self.rebind()?;
        log::info!("FramePipeline: Resized to {width}x{height}, {groups_x}x{groups_y} tiles");
        Ok(true)
    }

    fn enter(&mut self, stage: FrameStage) -> Result<(), RenderError> {
        if self.stage.next() != stage {
            let from = self.stage;
            self.stage = FrameStage::Present;
            return Err(RenderError::Internal(format!(
                "frame stage {stage:?} cannot follow {from:?}"
            )));
        }
        log::trace!("FramePipeline: Entering {stage:?}");
        self.stage = stage;
        Ok(())
    }

    /// Records the frame's passes into `encoder`, targeting `ctx`.
    ///
    /// Must be followed by [`finish_frame`](Self::finish_frame) once the
    /// encoder has been submitted.
    pub fn encode_frame(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        ctx: &RenderContext,
        state: &RendererState,
    ) -> Result<(), RenderError> {
        let (width, height) = ctx.surface_size;
        if (width, height) != self.grid.viewport() {
            self.resize(width, height)?;
        } else if !self.culling.is_bound() {
            self.rebind()?;
        }

        let frame = state.frame_transform_for(self.grid.viewport());
        let model = self.scene.geometry().model();
        let light_count = state.lights.len();

        self.enter(FrameStage::DepthPrepass)?;
        let device = self.device.as_ref();
        self.prepass.set_matrices(device, &frame, &model)?;
        self.prepass
            .record(encoder, &self.depth.view, self.scene.geometry());

        self.enter(FrameStage::LightCulling)?;
        let device = self.device.as_ref();
        self.culling
            .set_uniforms(device, &frame, &self.grid, light_count)?;
        self.culling.record(encoder, &self.grid);

        self.enter(FrameStage::FinalShading)?;
        let device = self.device.as_ref();
        match state.debug_view {
            DebugView::Shaded => {
                self.shading.set_uniforms(
                    device,
                    &model,
                    &frame,
                    self.grid.tiles_x(),
                    light_count,
                )?;
                self.shading
                    .record(encoder, ctx, &self.depth.view, self.scene.geometry());
            }
            DebugView::Depth => {
                self.depth_debug.set_planes(device, frame.near, frame.far)?;
                self.depth_debug.record(encoder, ctx);
            }
        }
        Ok(())
    }

    /// Closes the frame after submission and, when requested, reads the
    /// visible-index buffer back.
    pub fn finish_frame(
        &mut self,
        state: &mut RendererState,
    ) -> Result<Option<CullingReport>, RenderError> {
        if self.stage != FrameStage::FinalShading {
            log::warn!("FramePipeline: Frame closed from {:?}", self.stage);
        }
        self.stage = FrameStage::Present;
        self.frames += 1;

        if !state.culling_check_pending {
            return Ok(None);
        }
        state.culling_check_pending = false;
        let report = self.check_culling(state.lights.len())?;
        report.log_summary();
        Ok(Some(report))
    }

    /// Returns to [`FrameStage::Present`] after a frame whose recording or
    /// submission failed.
    pub fn abandon_frame(&mut self) {
        if self.stage != FrameStage::Present {
            log::warn!("FramePipeline: Abandoning frame during {:?}", self.stage);
            self.stage = FrameStage::Present;
        }
    }

    /// Reads the visible-index buffer of the last submitted frame and decodes
    /// every tile's list.
    pub fn check_culling(&self, light_count: u32) -> Result<CullingReport, RenderError> {
        let bytes = self.device.read_buffer(
            self.visible_indices,
            0,
            self.grid.visible_index_buffer_size(),
        )?;
        let entries = visible_indices_from_bytes(&bytes);
        Ok(CullingReport::from_entries(&entries, &self.grid, light_count))
    }

    /// The current tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// The stage last entered.
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Frames closed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The visible-index buffer currently bound.
    pub fn visible_index_buffer(&self) -> BufferId {
        self.visible_indices
    }

    /// The depth texture view currently bound.
    pub fn depth_view(&self) -> TextureViewId {
        self.depth.view
    }

    /// Releases every resource the pipeline owns. The light buffer is not
    /// owned and stays alive.
    pub fn destroy(self) {
        log::info!("FramePipeline: Releasing GPU resources after {} frames", self.frames);
        let device = self.device.as_ref();
        self.prepass.destroy(device);
        self.culling.destroy(device);
        self.shading.destroy(device);
        self.depth_debug.destroy(device);
        self.scene.destroy(device);
        self.depth.destroy(device);
        destroy_visible_index_buffer(device, self.visible_indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_cycle_in_order() {
        let mut stage = FrameStage::Present;
        let mut seen = Vec::new();
        for _ in 0..4 {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                FrameStage::DepthPrepass,
                FrameStage::LightCulling,
                FrameStage::FinalShading,
                FrameStage::Present
            ]
        );
    }
}
