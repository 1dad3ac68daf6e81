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

//! Full-screen visualization of the prepass depth.
//!
//! Replaces the shading pass when depth debugging is on: each pixel shows its
//! linearized depth as a grey level, black at the near plane and white at the
//! far plane.

use std::borrow::Cow;

use tessera_core::renderer::forward_plus::DepthDebugUniforms;
use tessera_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindGroupLayoutId, BufferBindingType, ColorTargetStateDescriptor,
    CommandEncoder, GraphicsDevice, LoadOp, Operations, PipelineLayoutDescriptor,
    PrimitiveStateDescriptor, RenderContext, RenderError, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipelineDescriptor, RenderPipelineId, ResourceError,
    ShaderProgramDescriptor, ShaderStage, ShaderStageFlags, StoreOp, TextureFormat,
    TextureSampleType, TextureViewId,
};

use super::shaders::{DEPTH_DEBUG_WGSL, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::{builtin_stage, ShaderProgram, UniformBlock};

/// Records the depth visualization.
#[derive(Debug)]
pub struct DepthDebugLane {
    program: ShaderProgram,
    layout: BindGroupLayoutId,
    pipeline: RenderPipelineId,
    uniforms: UniformBlock<DepthDebugUniforms>,
    bind_group: Option<BindGroupId>,
}

impl DepthDebugLane {
    /// Creates the lane for targets of `color_format`.
    pub fn new(
        device: &dyn GraphicsDevice,
        color_format: TextureFormat,
    ) -> Result<Self, RenderError> {
        log::info!("DepthDebugLane: Initializing GPU resources...");

        let program = ShaderProgram::compile(
            device,
            &ShaderProgramDescriptor {
                label: "depth_debug",
                stages: &[
                    builtin_stage(ShaderStage::Vertex, DEPTH_DEBUG_WGSL, VERTEX_ENTRY),
                    builtin_stage(ShaderStage::Fragment, DEPTH_DEBUG_WGSL, FRAGMENT_ENTRY),
                ],
            },
        )?;

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("depth_debug_layout"),
            entries: &[
                BindGroupLayoutEntry::texture(
                    0,
                    ShaderStageFlags::FRAGMENT,
                    TextureSampleType::Depth,
                ),
                BindGroupLayoutEntry::buffer(
                    1,
                    ShaderStageFlags::FRAGMENT,
                    BufferBindingType::Uniform,
                    false,
                    None,
                ),
            ],
        })?;
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(Cow::Borrowed("depth_debug_pipeline_layout")),
            bind_group_layouts: &[layout],
        })?;

        let (vertex_module, vertex_entry) = program.require(ShaderStage::Vertex)?;
        let (fragment_module, fragment_entry) = program.require(ShaderStage::Fragment)?;
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("depth_debug_pipeline")),
            vertex_shader_module: vertex_module,
            vertex_entry_point: vertex_entry,
            fragment_shader_module: Some(fragment_module),
            fragment_entry_point: Some(fragment_entry),
            vertex_buffers_layout: Cow::Borrowed(&[]),
            layout: Some(pipeline_layout),
            primitive_state: PrimitiveStateDescriptor {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil_state: None,
            color_target_states: Cow::Owned(vec![ColorTargetStateDescriptor {
                format: color_format,
                alpha_blending: false,
            }]),
        })?;

        let uniforms = UniformBlock::new(
            device,
            "depth_debug_uniforms",
            &DepthDebugUniforms {
                z_near: 0.1,
                z_far: 300.0,
                _padding: [0.0; 2],
            },
        )?;

        Ok(Self {
            program,
            layout,
            pipeline,
            uniforms,
            bind_group: None,
        })
    }

    /// Points the lane at the depth texture to visualize.
    pub fn bind(
        &mut self,
        device: &dyn GraphicsDevice,
        depth_view: TextureViewId,
    ) -> Result<(), ResourceError> {
        if let Some(old) = self.bind_group.take() {
            let _ = device.destroy_bind_group(old);
        }
        self.bind_group = Some(device.create_bind_group(&BindGroupDescriptor {
            label: Some("depth_debug_bind_group"),
            layout: self.layout,
            entries: &[
                BindGroupEntry::texture_view(0, depth_view),
                BindGroupEntry::buffer(1, self.uniforms.buffer(), 0, None),
            ],
        })?);
        Ok(())
    }

    /// Sets the clip planes used to linearize depth.
    pub fn set_planes(
        &self,
        device: &dyn GraphicsDevice,
        z_near: f32,
        z_far: f32,
    ) -> Result<(), ResourceError> {
        self.uniforms.set(
            device,
            &DepthDebugUniforms {
                z_near,
                z_far,
                _padding: [0.0; 2],
            },
        )
    }

    /// Draws the full-screen triangle into the color target.
    pub fn record(&self, encoder: &mut dyn CommandEncoder, ctx: &RenderContext) -> bool {
        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("DepthDebugLane: Not bound, skipping");
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
            label: Some("depth_debug"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
        true
    }

    /// Releases the lane's GPU resources.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Some(group) = self.bind_group {
            let _ = device.destroy_bind_group(group);
        }
        let _ = device.destroy_render_pipeline(self.pipeline);
        self.uniforms.destroy(device);
        self.program.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDevice, Recorded};
    use tessera_core::math::LinearRgba;

    #[test]
    fn test_draws_full_screen_triangle_without_depth() {
        let device = MockDevice::default();
        let mut lane = DepthDebugLane::new(&device, TextureFormat::Bgra8UnormSrgb).unwrap();
        lane.bind(&device, TextureViewId(42)).unwrap();

        let target = TextureViewId(43);
        let ctx = RenderContext::new(&target, LinearRgba::BLACK, (8, 8));
        let mut encoder = device.create_command_encoder(None);
        assert!(lane.record(encoder.as_mut(), &ctx));

        let commands = device.commands();
        assert_eq!(
            commands[0],
            Recorded::RenderPass {
                label: Some("depth_debug".into()),
                colors: 1,
                depth_cleared: false,
            }
        );
        assert_eq!(commands.last(), Some(&Recorded::Draw(0..3)));
    }

    #[test]
    fn test_set_planes_writes_uniforms() {
        let device = MockDevice::default();
        let lane = DepthDebugLane::new(&device, TextureFormat::Bgra8UnormSrgb).unwrap();
        lane.set_planes(&device, 0.5, 50.0).unwrap();

        let writes = device.buffer_writes(lane.uniforms.buffer());
        let last: DepthDebugUniforms = bytemuck::pod_read_unaligned(&writes.last().unwrap().1);
        assert_eq!((last.z_near, last.z_far), (0.5, 50.0));
    }
}
