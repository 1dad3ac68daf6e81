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

//! Depth-only prepass.
//!
//! Draws every batch with a position-only vertex layout into the frame's depth
//! texture. The light-culling lane reads that texture to bound each tile's
//! frustum in depth.

use std::borrow::Cow;

use bytemuck::Zeroable;
use tessera_core::math::Mat4;
use tessera_core::renderer::forward_plus::DepthUniforms;
use tessera_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindGroupLayoutId, BufferBindingType, CommandEncoder, CompareFunction,
    DepthStencilStateDescriptor, FrameTransform, GraphicsDevice, LoadOp, Operations,
    PipelineLayoutDescriptor, PrimitiveStateDescriptor, RenderError, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderPipelineDescriptor, RenderPipelineId, ResourceError,
    ShaderProgramDescriptor, ShaderStage, ShaderStageFlags, StoreOp, TextureFormat, TextureViewId,
};
use tessera_core::scene::Vertex;

use super::shaders::{DEPTH_WGSL, VERTEX_ENTRY};
use super::{builtin_stage, SceneGeometry, ShaderProgram, UniformBlock};

/// Records the depth prepass.
#[derive(Debug)]
pub struct DepthPrepassLane {
    program: ShaderProgram,
    layout: BindGroupLayoutId,
    pipeline: RenderPipelineId,
    uniforms: UniformBlock<DepthUniforms>,
    bind_group: BindGroupId,
}

impl DepthPrepassLane {
    /// Format of the depth texture the lane renders into.
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

    /// Compiles the depth program and creates the pipeline and its uniforms.
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self, RenderError> {
        log::info!("DepthPrepassLane: Initializing GPU resources...");

        let program = ShaderProgram::compile(
            device,
            &ShaderProgramDescriptor {
                label: "depth_prepass",
                stages: &[builtin_stage(ShaderStage::Vertex, DEPTH_WGSL, VERTEX_ENTRY)],
            },
        )?;

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("depth_prepass_layout"),
            entries: &[BindGroupLayoutEntry::buffer(
                0,
                ShaderStageFlags::VERTEX,
                BufferBindingType::Uniform,
                false,
                None,
            )],
        })?;
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(Cow::Borrowed("depth_prepass_pipeline_layout")),
            bind_group_layouts: &[layout],
        })?;

        let (module, entry_point) = program.require(ShaderStage::Vertex)?;
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("depth_prepass_pipeline")),
            vertex_shader_module: module,
            vertex_entry_point: entry_point,
            fragment_shader_module: None,
            fragment_entry_point: None,
            vertex_buffers_layout: Cow::Owned(vec![Vertex::position_only_layout()]),
            layout: Some(pipeline_layout),
            primitive_state: PrimitiveStateDescriptor {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil_state: Some(DepthStencilStateDescriptor {
                format: Self::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_target_states: Cow::Borrowed(&[]),
        })?;

        let uniforms =
            UniformBlock::new(device, "depth_prepass_uniforms", &DepthUniforms::zeroed())?;
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("depth_prepass_bind_group"),
            layout,
            entries: &[BindGroupEntry::buffer(0, uniforms.buffer(), 0, None)],
        })?;

        Ok(Self {
            program,
            layout,
            pipeline,
            uniforms,
            bind_group,
        })
    }

    /// Uploads `projection * view * model` for this frame.
    pub fn set_matrices(
        &self,
        device: &dyn GraphicsDevice,
        frame: &FrameTransform,
        model: &Mat4,
    ) -> Result<(), ResourceError> {
        let mvp = frame.projection * frame.view * *model;
        self.uniforms.set(
            device,
            &DepthUniforms {
                model_view_projection: mvp.to_cols_array_2d(),
            },
        )
    }

    /// Clears `depth_view` to the far plane and draws `geometry` into it.
    pub fn record(
        &self,
        encoder: &mut dyn CommandEncoder,
        depth_view: &TextureViewId,
        geometry: &SceneGeometry,
    ) {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("depth_prepass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
            }),
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        geometry.draw_all(pass.as_mut(), None);
    }

    /// The layout of bind group 0.
    pub fn layout(&self) -> BindGroupLayoutId {
        self.layout
    }

    /// Releases the lane's GPU resources.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        let _ = device.destroy_bind_group(self.bind_group);
        let _ = device.destroy_render_pipeline(self.pipeline);
        self.uniforms.destroy(device);
        self.program.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDevice, Recorded};
    use tessera_core::math::Vec3;

    #[test]
    fn test_record_clears_depth_without_color() {
        let device = MockDevice::default();
        let lane = DepthPrepassLane::new(&device).unwrap();
        let depth = TextureViewId(1000);

        let mut encoder = device.create_command_encoder(None);
        lane.record(encoder.as_mut(), &depth, &SceneGeometry::default());

        let commands = device.commands();
        assert_eq!(
            commands[0],
            Recorded::RenderPass {
                label: Some("depth_prepass".into()),
                colors: 0,
                depth_cleared: true,
            }
        );
        assert!(matches!(commands[1], Recorded::SetRenderPipeline(_)));
        assert!(matches!(commands[2], Recorded::SetBindGroup(0, _)));
    }

    #[test]
    fn test_set_matrices_uploads_mvp() {
        let device = MockDevice::default();
        let lane = DepthPrepassLane::new(&device).unwrap();
        let frame = FrameTransform::perspective(
            Mat4::IDENTITY,
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_2,
            (16, 16),
            0.1,
            10.0,
        );
        let model = Mat4::from_scale(Vec3::new(0.5, 0.5, 0.5));
        lane.set_matrices(&device, &frame, &model).unwrap();

        let writes = device.buffer_writes(lane.uniforms.buffer());
        let expected = (frame.projection * model).to_cols_array_2d();
        assert_eq!(writes[0].1, bytemuck::bytes_of(&expected).to_vec());
    }
}
