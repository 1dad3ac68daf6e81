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

//! Final shading pass.
//!
//! Shades every fragment with the lights listed for its screen tile. Group 0
//! carries the per-frame data shared with the culling pass, group 1 the batch
//! material.

use std::borrow::Cow;

use bytemuck::Zeroable;
use tessera_core::math::Mat4;
use tessera_core::renderer::forward_plus::{
    ShadingUniforms, LIGHT_BUFFER_BINDING, UNIFORMS_BINDING, VISIBLE_INDEX_BINDING,
};
use tessera_core::renderer::{
    AddressMode, BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindGroupLayoutId, BufferBindingType, BufferId,
    ColorTargetStateDescriptor, CommandEncoder, CompareFunction, DepthStencilStateDescriptor,
    FilterMode, FrameTransform, GraphicsDevice, LoadOp, Operations, PipelineLayoutDescriptor,
    PrimitiveStateDescriptor, RenderContext, RenderError, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, SamplerBindingType, SamplerDescriptor, SamplerId,
    ShaderProgramDescriptor, ShaderStage, ShaderStageFlags, StoreOp, TextureFormat,
    TextureSampleType, TextureViewId,
};
use tessera_core::scene::Vertex;

use super::shaders::{FINAL_SHADING_WGSL, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::{builtin_stage, DepthPrepassLane, SceneGeometry, ShaderProgram, UniformBlock};

/// Bind group index of the per-batch material.
const MATERIAL_GROUP: u32 = 1;

/// Records the lit scene into the color target.
#[derive(Debug)]
pub struct FinalShadingLane {
    program: ShaderProgram,
    frame_layout: BindGroupLayoutId,
    material_layout: BindGroupLayoutId,
    pipeline: RenderPipelineId,
    sampler: SamplerId,
    uniforms: UniformBlock<ShadingUniforms>,
    frame_group: Option<BindGroupId>,
}

impl FinalShadingLane {
    /// Compiles the shading program for targets of `color_format`.
    pub fn new(
        device: &dyn GraphicsDevice,
        color_format: TextureFormat,
    ) -> Result<Self, RenderError> {
        log::info!("FinalShadingLane: Initializing GPU resources...");

        let program = ShaderProgram::compile(
            device,
            &ShaderProgramDescriptor {
                label: "final_shading",
                stages: &[
                    builtin_stage(ShaderStage::Vertex, FINAL_SHADING_WGSL, VERTEX_ENTRY),
                    builtin_stage(ShaderStage::Fragment, FINAL_SHADING_WGSL, FRAGMENT_ENTRY),
                ],
            },
        )?;

        let frame_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("final_shading_frame_layout"),
            entries: &[
                BindGroupLayoutEntry::buffer(
                    LIGHT_BUFFER_BINDING,
                    ShaderStageFlags::FRAGMENT,
                    BufferBindingType::Storage { read_only: true },
                    false,
                    None,
                ),
                BindGroupLayoutEntry::buffer(
                    VISIBLE_INDEX_BINDING,
                    ShaderStageFlags::FRAGMENT,
                    BufferBindingType::Storage { read_only: true },
                    false,
                    None,
                ),
                BindGroupLayoutEntry::buffer(
                    UNIFORMS_BINDING,
                    ShaderStageFlags::VERTEX_FRAGMENT,
                    BufferBindingType::Uniform,
                    false,
                    None,
                ),
            ],
        })?;

        let color = TextureSampleType::Float { filterable: true };
        let material_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("final_shading_material_layout"),
            entries: &[
                BindGroupLayoutEntry::texture(0, ShaderStageFlags::FRAGMENT, color),
                BindGroupLayoutEntry::texture(1, ShaderStageFlags::FRAGMENT, color),
                BindGroupLayoutEntry::texture(2, ShaderStageFlags::FRAGMENT, color),
                BindGroupLayoutEntry::sampler(
                    3,
                    ShaderStageFlags::FRAGMENT,
                    SamplerBindingType::Filtering,
                ),
            ],
        })?;

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(Cow::Borrowed("final_shading_pipeline_layout")),
            bind_group_layouts: &[frame_layout, material_layout],
        })?;

        let (vertex_module, vertex_entry) = program.require(ShaderStage::Vertex)?;
        let (fragment_module, fragment_entry) = program.require(ShaderStage::Fragment)?;
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("final_shading_pipeline")),
            vertex_shader_module: vertex_module,
            vertex_entry_point: vertex_entry,
            fragment_shader_module: Some(fragment_module),
            fragment_entry_point: Some(fragment_entry),
            vertex_buffers_layout: Cow::Owned(vec![Vertex::layout()]),
            layout: Some(pipeline_layout),
            primitive_state: PrimitiveStateDescriptor {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil_state: Some(DepthStencilStateDescriptor {
                format: DepthPrepassLane::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::LessEqual,
            }),
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format: color_format,
                alpha_blending: false,
            }]),
        })?;

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(Cow::Borrowed("material_sampler")),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
        })?;

        let uniforms =
            UniformBlock::new(device, "final_shading_uniforms", &ShadingUniforms::zeroed())?;

        Ok(Self {
            program,
            frame_layout,
            material_layout,
            pipeline,
            sampler,
            uniforms,
            frame_group: None,
        })
    }

    /// Layout the material bind groups of [`SceneGeometry`] must follow.
    pub fn material_layout(&self) -> BindGroupLayoutId {
        self.material_layout
    }

    /// The sampler shared by every material.
    pub fn sampler(&self) -> SamplerId {
        self.sampler
    }

    /// Points group 0 at the light pool and the visible-index buffer.
    pub fn bind(
        &mut self,
        device: &dyn GraphicsDevice,
        lights: BufferId,
        visible_indices: BufferId,
    ) -> Result<(), ResourceError> {
        if let Some(old) = self.frame_group.take() {
            let _ = device.destroy_bind_group(old);
        }
        let group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("final_shading_frame_group"),
            layout: self.frame_layout,
            entries: &[
                BindGroupEntry::buffer(LIGHT_BUFFER_BINDING, lights, 0, None),
                BindGroupEntry::buffer(VISIBLE_INDEX_BINDING, visible_indices, 0, None),
                BindGroupEntry::buffer(UNIFORMS_BINDING, self.uniforms.buffer(), 0, None),
            ],
        })?;
        self.frame_group = Some(group);
        Ok(())
    }

    /// Uploads this frame's matrices, camera position and tile row width.
    pub fn set_uniforms(
        &self,
        device: &dyn GraphicsDevice,
        model: &Mat4,
        frame: &FrameTransform,
        tiles_x: u32,
        light_count: u32,
    ) -> Result<(), ResourceError> {
        let eye = frame.view_position;
        self.uniforms.set(
            device,
            &ShadingUniforms {
                model: model.to_cols_array_2d(),
                view: frame.view.to_cols_array_2d(),
                projection: frame.projection.to_cols_array_2d(),
                view_position: [eye.x, eye.y, eye.z, 1.0],
                tiles_x,
                light_count,
                _padding: [0; 2],
            },
        )
    }

    /// Clears the color target and shades `geometry` over the prepass depth.
    ///
    /// The depth attachment is cleared too; with `LessEqual` the scene redraws
    /// to the same values the prepass produced.
    pub fn record(
        &self,
        encoder: &mut dyn CommandEncoder,
        ctx: &RenderContext,
        depth_view: &TextureViewId,
        geometry: &SceneGeometry,
    ) -> bool {
        let Some(frame_group) = self.frame_group.as_ref() else {
            log::warn!("FinalShadingLane: Not bound, skipping shading");
            return false;
        };

        let color_attachments = [RenderPassColorAttachment {
            view: ctx.color_target,
            resolve_target: None,
            ops: Operations {
                load: LoadOp::Clear(ctx.clear_color),
                store: StoreOp::Store,
            },
        }];
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("final_shading"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
            }),
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame_group, &[]);
        geometry.draw_all(pass.as_mut(), Some(MATERIAL_GROUP));
        true
    }

    /// Releases the lane's GPU resources.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Some(group) = self.frame_group {
            let _ = device.destroy_bind_group(group);
        }
        let _ = device.destroy_sampler(self.sampler);
        let _ = device.destroy_render_pipeline(self.pipeline);
        self.uniforms.destroy(device);
        self.program.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDevice, Recorded};
    use tessera_core::math::{LinearRgba, Vec3};
    use tessera_core::renderer::BindingResource;

    fn lane(device: &MockDevice) -> FinalShadingLane {
        FinalShadingLane::new(device, TextureFormat::Bgra8UnormSrgb).unwrap()
    }

    #[test]
    fn test_vertex_and_fragment_share_one_module() {
        let device = MockDevice::default();
        let lane = lane(&device);
        assert_eq!(device.shader_modules_created(), 1);
        assert_eq!(
            lane.program.stage_module(ShaderStage::Vertex),
            lane.program.stage_module(ShaderStage::Fragment)
        );
    }

    #[test]
    fn test_bind_uses_shared_binding_slots() {
        let device = MockDevice::default();
        let mut lane = lane(&device);
        lane.bind(&device, BufferId(700), BufferId(701)).unwrap();

        let entries = device.bind_group_entries(lane.frame_group.unwrap());
        let slots: Vec<(u32, BufferId)> = entries
            .iter()
            .filter_map(|(binding, resource)| match resource {
                BindingResource::Buffer(b) => Some((*binding, b.buffer)),
                _ => None,
            })
            .collect();
        assert_eq!(
            slots,
            vec![
                (0, BufferId(700)),
                (1, BufferId(701)),
                (2, lane.uniforms.buffer())
            ]
        );
    }

    #[test]
    fn test_record_requires_binding() {
        let device = MockDevice::default();
        let mut lane = lane(&device);
        let target = TextureViewId(900);
        let depth = TextureViewId(901);
        let ctx = RenderContext::new(&target, LinearRgba::BLACK, (32, 32));
        let mut encoder = device.create_command_encoder(None);

        assert!(!lane.record(encoder.as_mut(), &ctx, &depth, &SceneGeometry::default()));
        assert!(device.commands().is_empty());

        lane.bind(&device, BufferId(1), BufferId(2)).unwrap();
        assert!(lane.record(encoder.as_mut(), &ctx, &depth, &SceneGeometry::default()));
        assert_eq!(
            device.commands()[0],
            Recorded::RenderPass {
                label: Some("final_shading".into()),
                colors: 1,
                depth_cleared: true,
            }
        );
    }

    #[test]
    fn test_uniforms_carry_eye_and_tiles() {
        let device = MockDevice::default();
        let lane = lane(&device);
        let frame = FrameTransform::perspective(
            Mat4::IDENTITY,
            Vec3::new(1.0, 2.0, 3.0),
            1.0,
            (64, 48),
            0.1,
            100.0,
        );
        lane.set_uniforms(&device, &Mat4::IDENTITY, &frame, 4, 9)
            .unwrap();

        let bytes = &device.buffer_writes(lane.uniforms.buffer())[0].1;
        let uniforms: ShadingUniforms = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(uniforms.view_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniforms.tiles_x, 4);
        assert_eq!(uniforms.light_count, 9);
    }
}
