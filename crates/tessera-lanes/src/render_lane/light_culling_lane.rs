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

//! Per-tile light culling.
//!
//! Dispatches one `16x16` workgroup per screen tile. Each workgroup reduces the
//! tile's prepass depth to a min/max range, builds the tile frustum, tests every
//! light sphere against it and writes the passing indices into the tile's slice
//! of the visible-index buffer, sentinel-terminated.
//!
//! The bindings are fixed and shared with the shading program:
//!
//! | binding | resource |
//! |---|---|
//! | 0 | light pool, `array<PointLight>` |
//! | 1 | visible-index buffer, `array<i32>` (read-write here) |
//! | 2 | [`CullingUniforms`] |
//! | 3 | prepass depth, `texture_depth_2d` |

use std::borrow::Cow;

use tessera_core::renderer::forward_plus::{
    CullingUniforms, DEPTH_TEXTURE_BINDING, LIGHT_BUFFER_BINDING, UNIFORMS_BINDING,
    VISIBLE_INDEX_BINDING,
};
use tessera_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindGroupLayoutId, BufferBindingType, BufferId, CommandEncoder,
    ComputePassDescriptor, ComputePipelineDescriptor, ComputePipelineId, FrameTransform,
    GraphicsDevice, PipelineLayoutDescriptor, RenderError, ResourceError,
    ShaderProgramDescriptor, ShaderStage, ShaderStageFlags, TextureSampleType, TextureViewId,
    TileGrid,
};

use super::shaders::{COMPUTE_ENTRY, LIGHT_CULLING_WGSL};
use super::{builtin_stage, ShaderProgram, UniformBlock};

/// Records the light-culling compute pass.
#[derive(Debug)]
pub struct LightCullingLane {
    program: ShaderProgram,
    layout: BindGroupLayoutId,
    pipeline: ComputePipelineId,
    uniforms: UniformBlock<CullingUniforms>,
    bind_group: Option<BindGroupId>,
}

impl LightCullingLane {
    /// The layout of bind group 0.
    pub fn layout_entries() -> [BindGroupLayoutEntry; 4] {
        [
            BindGroupLayoutEntry::buffer(
                LIGHT_BUFFER_BINDING,
                ShaderStageFlags::COMPUTE,
                BufferBindingType::Storage { read_only: true },
                false,
                None,
            ),
            BindGroupLayoutEntry::buffer(
                VISIBLE_INDEX_BINDING,
                ShaderStageFlags::COMPUTE,
                BufferBindingType::Storage { read_only: false },
                false,
                None,
            ),
            BindGroupLayoutEntry::buffer(
                UNIFORMS_BINDING,
                ShaderStageFlags::COMPUTE,
                BufferBindingType::Uniform,
                false,
                None,
            ),
            BindGroupLayoutEntry::texture(
                DEPTH_TEXTURE_BINDING,
                ShaderStageFlags::COMPUTE,
                TextureSampleType::Depth,
            ),
        ]
    }

    /// Compiles the culling kernel and creates its pipeline.
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self, RenderError> {
        log::info!("LightCullingLane: Initializing GPU resources...");

        let program = ShaderProgram::compile(
            device,
            &ShaderProgramDescriptor {
                label: "light_culling",
                stages: &[builtin_stage(
                    ShaderStage::Compute,
                    LIGHT_CULLING_WGSL,
                    COMPUTE_ENTRY,
                )],
            },
        )?;

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("light_culling_layout"),
            entries: &Self::layout_entries(),
        })?;
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(Cow::Borrowed("light_culling_pipeline_layout")),
            bind_group_layouts: &[layout],
        })?;

        let (module, entry_point) = program.require(ShaderStage::Compute)?;
        let pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some(Cow::Borrowed("light_culling_pipeline")),
            layout: Some(pipeline_layout),
            shader_module: module,
            entry_point,
        })?;

        let uniforms = UniformBlock::new(
            device,
            "light_culling_uniforms",
            &bytemuck::Zeroable::zeroed(),
        )?;

        Ok(Self {
            program,
            layout,
            pipeline,
            uniforms,
            bind_group: None,
        })
    }

    /// Points the lane at the light pool, the visible-index buffer and the depth
    /// texture. Must be called again whenever one of them is reallocated.
    pub fn bind(
        &mut self,
        device: &dyn GraphicsDevice,
        lights: BufferId,
        visible_indices: BufferId,
        depth_view: TextureViewId,
    ) -> Result<(), ResourceError> {
        if let Some(old) = self.bind_group.take() {
            let _ = device.destroy_bind_group(old);
        }
        let group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("light_culling_bind_group"),
            layout: self.layout,
            entries: &[
                BindGroupEntry::buffer(LIGHT_BUFFER_BINDING, lights, 0, None),
                BindGroupEntry::buffer(VISIBLE_INDEX_BINDING, visible_indices, 0, None),
                BindGroupEntry::buffer(UNIFORMS_BINDING, self.uniforms.buffer(), 0, None),
                BindGroupEntry::texture_view(DEPTH_TEXTURE_BINDING, depth_view),
            ],
        })?;
        log::debug!("LightCullingLane: Bind group rebuilt");
        self.bind_group = Some(group);
        Ok(())
    }

    /// Uploads this frame's camera, viewport and light count.
    pub fn set_uniforms(
        &self,
        device: &dyn GraphicsDevice,
        frame: &FrameTransform,
        grid: &TileGrid,
        light_count: u32,
    ) -> Result<(), ResourceError> {
        let (width, height) = grid.viewport();
        self.uniforms.set(
            device,
            &CullingUniforms {
                view: frame.view.to_cols_array_2d(),
                inverse_projection: frame.inverse_projection().to_cols_array_2d(),
                screen_size: [width, height],
                light_count,
                tiles_x: grid.tiles_x(),
            },
        )
    }

    /// Dispatches one workgroup per tile of `grid`.
    ///
    /// Returns `false`, recording nothing, when the grid has no tile or the lane
    /// has not been bound yet.
    pub fn record(&self, encoder: &mut dyn CommandEncoder, grid: &TileGrid) -> bool {
        let (groups_x, groups_y) = grid.work_groups();
        if groups_x == 0 || groups_y == 0 {
            log::trace!("LightCullingLane: Empty tile grid, nothing to dispatch");
            return false;
        }
        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("LightCullingLane: Not bound, skipping dispatch");
            return false;
        };

        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("light_culling"),
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
        true
    }

    /// Whether [`bind`](Self::bind) has succeeded at least once.
    pub fn is_bound(&self) -> bool {
        self.bind_group.is_some()
    }

    /// Releases the lane's GPU resources.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Some(group) = self.bind_group {
            let _ = device.destroy_bind_group(group);
        }
        let _ = device.destroy_compute_pipeline(self.pipeline);
        self.uniforms.destroy(device);
        self.program.destroy(device);
    }
}
