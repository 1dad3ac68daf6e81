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

use std::ops::Range;

use tessera_core::renderer::api::{
    BindGroupId, BufferId, CommandBufferId, ComputePassDescriptor, ComputePipelineId, IndexFormat,
    RenderPassDescriptor, RenderPipelineId,
};
use tessera_core::renderer::traits::{CommandEncoder, ComputePass, RenderPass};

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

/// Returned by [`WgpuCommandEncoder::finish`] when there is nothing to submit.
const INVALID_COMMAND_BUFFER: CommandBufferId = CommandBufferId(u64::MAX);

/// A render pass recording into a wgpu encoder.
///
/// `pass` is `None` when the encoder could not be created; every call is then dropped.
pub struct WgpuRenderPass<'a> {
    pub(crate) pass: Option<wgpu::RenderPass<'a>>,
    pub(crate) device: &'a WgpuDevice,
}

impl<'pass> RenderPass<'pass> for WgpuRenderPass<'pass> {
    fn set_pipeline(&mut self, pipeline_id: &'pass RenderPipelineId) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(pipeline) = self.device.get_wgpu_render_pipeline(*pipeline_id) {
            pass.set_pipeline(&pipeline);
        } else {
            log::warn!(
                "WgpuRenderPass: RenderPipelineId {:?} not found.",
                pipeline_id
            );
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: &'pass BindGroupId, offsets: &[u32]) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(bind_group) = self.device.get_wgpu_bind_group(*bind_group_id) {
            pass.set_bind_group(index, bind_group.as_ref(), offsets);
        } else {
            log::warn!("WgpuRenderPass: BindGroupId {:?} not found.", bind_group_id);
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer_id: &'pass BufferId, offset: u64) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(buffer) = self.device.get_wgpu_buffer(*buffer_id) {
            pass.set_vertex_buffer(slot, buffer.slice(offset..));
        } else {
            log::warn!("WgpuRenderPass: Vertex BufferId {:?} not found.", buffer_id);
        }
    }

    fn set_index_buffer(
        &mut self,
        buffer_id: &'pass BufferId,
        offset: u64,
        index_format: IndexFormat,
    ) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(buffer) = self.device.get_wgpu_buffer(*buffer_id) {
            pass.set_index_buffer(buffer.slice(offset..), index_format.into_wgpu());
        } else {
            log::warn!("WgpuRenderPass: Index BufferId {:?} not found.", buffer_id);
        }
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        if let Some(pass) = self.pass.as_mut() {
            pass.draw(vertices, instances);
        }
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        if let Some(pass) = self.pass.as_mut() {
            pass.draw_indexed(indices, base_vertex, instances);
        }
    }
}

/// A compute pass recording into a wgpu encoder.
pub struct WgpuComputePass<'a> {
    pub(crate) pass: Option<wgpu::ComputePass<'a>>,
    pub(crate) device: &'a WgpuDevice,
}

impl<'pass> ComputePass<'pass> for WgpuComputePass<'pass> {
    fn set_pipeline(&mut self, pipeline_id: &'pass ComputePipelineId) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(pipeline) = self.device.get_wgpu_compute_pipeline(*pipeline_id) {
            pass.set_pipeline(&pipeline);
        } else {
            log::warn!(
                "WgpuComputePass: ComputePipelineId {:?} not found.",
                pipeline_id
            );
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: &'pass BindGroupId, offsets: &[u32]) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        if let Some(bind_group) = self.device.get_wgpu_bind_group(*bind_group_id) {
            pass.set_bind_group(index, bind_group.as_ref(), offsets);
        } else {
            log::warn!(
                "WgpuComputePass: BindGroupId {:?} not found.",
                bind_group_id
            );
        }
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        if let Some(pass) = self.pass.as_mut() {
            pass.dispatch_workgroups(x, y, z);
        }
    }
}

/// Records passes into a `wgpu::CommandEncoder` and hands the finished buffer
/// back to the [`WgpuDevice`] for submission.
pub struct WgpuCommandEncoder {
    pub(crate) encoder: Option<wgpu::CommandEncoder>,
    pub(crate) device: WgpuDevice,
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        // Resolve every view first; the wgpu descriptor borrows them.
        let mut views: Vec<wgpu::TextureView> = Vec::new();
        let mut resolve_targets: Vec<Option<wgpu::TextureView>> = Vec::new();
        let mut ops = Vec::new();
        for att in descriptor.color_attachments.iter() {
            let Some(view) = self.device.get_wgpu_texture_view(att.view) else {
                log::warn!(
                    "WgpuCommandEncoder: color attachment view {:?} not found, skipping.",
                    att.view
                );
                continue;
            };
            views.push((*view).clone());
            resolve_targets.push(
                att.resolve_target
                    .and_then(|id| self.device.get_wgpu_texture_view(id))
                    .map(|view| (*view).clone()),
            );
            ops.push(wgpu::Operations {
                load: att.ops.load.clone().into_wgpu(),
                store: att.ops.store.clone().into_wgpu(),
            });
        }

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
            .iter()
            .zip(resolve_targets.iter())
            .zip(ops)
            .map(|((view, resolve_target), ops)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: resolve_target.as_ref(),
                    ops,
                    depth_slice: None,
                })
            })
            .collect();

        let depth_view: Option<wgpu::TextureView> =
            descriptor.depth_stencil_attachment.as_ref().and_then(|ds| {
                self.device
                    .get_wgpu_texture_view(ds.view)
                    .map(|arc_view| (*arc_view).clone())
            });

        let depth_stencil_attachment = match (&descriptor.depth_stencil_attachment, &depth_view) {
            (Some(ds), Some(view)) => Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: ds.depth_ops.as_ref().map(|ops| wgpu::Operations {
                    load: ops.load.clone().into_wgpu(),
                    store: ops.store.clone().into_wgpu(),
                }),
                stencil_ops: None,
            }),
            _ => None,
        };

        let wgpu_descriptor = wgpu::RenderPassDescriptor {
            label: descriptor.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        };

        let pass = match self.encoder.as_mut() {
            Some(encoder) => Some(encoder.begin_render_pass(&wgpu_descriptor)),
            None => {
                log::error!("WgpuCommandEncoder: render pass requested on a finished encoder.");
                None
            }
        };

        Box::new(WgpuRenderPass {
            pass,
            device: &self.device,
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputePass<'encoder> + 'encoder> {
        let pass = match self.encoder.as_mut() {
            Some(encoder) => Some(encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: descriptor.label,
                timestamp_writes: None,
            })),
            None => {
                log::error!("WgpuCommandEncoder: compute pass requested on a finished encoder.");
                None
            }
        };

        Box::new(WgpuComputePass {
            pass,
            device: &self.device,
        })
    }

    fn copy_buffer_to_buffer(
        &mut self,
        source: &BufferId,
        source_offset: u64,
        destination: &BufferId,
        destination_offset: u64,
        size: u64,
    ) {
        let Some(encoder) = self.encoder.as_mut() else {
            log::error!("WgpuCommandEncoder: copy requested on a finished encoder.");
            return;
        };
        match (
            self.device.get_wgpu_buffer(*source),
            self.device.get_wgpu_buffer(*destination),
        ) {
            (Some(source_buffer), Some(destination_buffer)) => encoder.copy_buffer_to_buffer(
                &source_buffer,
                source_offset,
                &destination_buffer,
                destination_offset,
                size,
            ),
            _ => log::warn!(
                "WgpuCommandEncoder: copy between {:?} and {:?} skipped, buffer not found.",
                source,
                destination
            ),
        }
    }

    fn finish(mut self: Box<Self>) -> CommandBufferId {
        match self.encoder.take() {
            Some(encoder) => self.device.register_command_buffer(encoder.finish()),
            None => {
                log::error!("WgpuCommandEncoder: finish called without an encoder.");
                INVALID_COMMAND_BUFFER
            }
        }
    }
}
