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

//! A recording [`GraphicsDevice`] for unit tests.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tessera_core::renderer::api::*;
use tessera_core::renderer::{
    CommandEncoder, ComputePass, GraphicsDevice, RenderPass, ResourceError, ShaderError,
};

/// A command recorded by [`MockEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    RenderPass {
        label: Option<String>,
        colors: usize,
        depth_cleared: bool,
    },
    ComputePass,
    SetRenderPipeline(RenderPipelineId),
    SetComputePipeline(ComputePipelineId),
    SetBindGroup(u32, BindGroupId),
    SetVertexBuffer(BufferId),
    SetIndexBuffer(BufferId),
    Draw(Range<u32>),
    DrawIndexed(Range<u32>),
    Dispatch(u32, u32, u32),
}

#[derive(Debug, Default)]
struct Log {
    shader_modules_created: usize,
    shader_modules_destroyed: usize,
    buffers: HashMap<usize, u64>,
    writes: Vec<(BufferId, u64, Vec<u8>)>,
    bind_groups: HashMap<usize, Vec<(u32, BindingResource)>>,
    textures_created: usize,
    commands: Vec<Recorded>,
}

#[derive(Debug, Default)]
pub struct MockDevice {
    next_id: AtomicUsize,
    log: Arc<Mutex<Log>>,
}

impl MockDevice {
    /// Source text the mock refuses to compile.
    pub const BROKEN_SOURCE: &'static str = "@broken";

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn shader_modules_created(&self) -> usize {
        self.log.lock().unwrap().shader_modules_created
    }

    pub fn shader_modules_destroyed(&self) -> usize {
        self.log.lock().unwrap().shader_modules_destroyed
    }

    pub fn textures_created(&self) -> usize {
        self.log.lock().unwrap().textures_created
    }

    pub fn buffer_size(&self, id: BufferId) -> Option<u64> {
        self.log.lock().unwrap().buffers.get(&id.0).copied()
    }

    pub fn buffer_writes(&self, id: BufferId) -> Vec<(u64, Vec<u8>)> {
        self.log
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(buffer, _, _)| *buffer == id)
            .map(|(_, offset, data)| (*offset, data.clone()))
            .collect()
    }

    pub fn bind_group_entries(&self, id: BindGroupId) -> Vec<(u32, BindingResource)> {
        self.log
            .lock()
            .unwrap()
            .bind_groups
            .get(&id.0)
            .cloned()
            .unwrap_or_default()
    }

    pub fn commands(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().commands.clone()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let ShaderSourceData::Wgsl(text) = &descriptor.source;
        if text.as_ref() == Self::BROKEN_SOURCE {
            return Err(ShaderError::CompilationError {
                label: descriptor.label.unwrap_or_default().to_string(),
                details: "unexpected token".to_string(),
            }
            .into());
        }
        self.log.lock().unwrap().shader_modules_created += 1;
        Ok(ShaderModuleId(self.next()))
    }

    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ResourceError> {
        self.log.lock().unwrap().shader_modules_destroyed += 1;
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        Ok(PipelineLayoutId(self.next()))
    }

    fn create_render_pipeline(
        &self,
        _descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        Ok(RenderPipelineId(self.next()))
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_compute_pipeline(
        &self,
        _descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        Ok(ComputePipelineId(self.next() as u64))
    }

    fn destroy_compute_pipeline(&self, _id: ComputePipelineId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.next()))
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let id = self.next();
        let entries = descriptor
            .entries
            .iter()
            .map(|e| (e.binding, e.resource))
            .collect();
        self.log.lock().unwrap().bind_groups.insert(id, entries);
        Ok(BindGroupId(id))
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        self.log.lock().unwrap().bind_groups.remove(&id.0);
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = self.next();
        self.log.lock().unwrap().buffers.insert(id, descriptor.size);
        Ok(BufferId(id))
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        _data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.create_buffer(descriptor)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.log.lock().unwrap().buffers.remove(&id.0);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut log = self.log.lock().unwrap();
        let size = *log.buffers.get(&id.0).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > size {
            return Err(ResourceError::OutOfBounds);
        }
        log.writes.push((id, offset, data.to_vec()));
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, _offset: u64, size: u64) -> Result<Vec<u8>, ResourceError> {
        if !self.log.lock().unwrap().buffers.contains_key(&id.0) {
            return Err(ResourceError::NotFound);
        }
        Ok(vec![0; size as usize])
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.log.lock().unwrap().textures_created += 1;
        Ok(TextureId(self.next()))
    }

    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn write_texture(
        &self,
        _texture_id: TextureId,
        _data: &[u8],
        _bytes_per_row: Option<u32>,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_texture_view(
        &self,
        _texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        Ok(TextureViewId(self.next()))
    }

    fn destroy_texture_view(&self, _id: TextureViewId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockEncoder {
            log: Arc::clone(&self.log),
        })
    }

    fn submit_command_buffer(&self, _command_buffer: CommandBufferId) {}

    fn get_surface_format(&self) -> Option<TextureFormat> {
        Some(TextureFormat::Bgra8UnormSrgb)
    }
}

struct MockEncoder {
    log: Arc<Mutex<Log>>,
}

struct MockPass {
    log: Arc<Mutex<Log>>,
}

impl MockPass {
    fn push(&self, command: Recorded) {
        self.log.lock().unwrap().commands.push(command);
    }
}

impl RenderPass<'_> for MockPass {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        self.push(Recorded::SetRenderPipeline(*pipeline));
    }
    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId, _offsets: &[u32]) {
        self.push(Recorded::SetBindGroup(index, *bind_group));
    }
    fn set_vertex_buffer(&mut self, _slot: u32, buffer: &BufferId, _offset: u64) {
        self.push(Recorded::SetVertexBuffer(*buffer));
    }
    fn set_index_buffer(&mut self, buffer: &BufferId, _offset: u64, _index_format: IndexFormat) {
        self.push(Recorded::SetIndexBuffer(*buffer));
    }
    fn draw(&mut self, vertices: Range<u32>, _instances: Range<u32>) {
        self.push(Recorded::Draw(vertices));
    }
    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.push(Recorded::DrawIndexed(indices));
    }
}

impl ComputePass<'_> for MockPass {
    fn set_pipeline(&mut self, pipeline: &ComputePipelineId) {
        self.push(Recorded::SetComputePipeline(*pipeline));
    }
    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId, _offsets: &[u32]) {
        self.push(Recorded::SetBindGroup(index, *bind_group));
    }
    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.push(Recorded::Dispatch(x, y, z));
    }
}

impl CommandEncoder for MockEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        let depth_cleared = descriptor
            .depth_stencil_attachment
            .as_ref()
            .and_then(|d| d.depth_ops.as_ref())
            .is_some_and(|ops| matches!(ops.load, LoadOp::Clear(_)));
        let pass = MockPass {
            log: Arc::clone(&self.log),
        };
        pass.push(Recorded::RenderPass {
            label: descriptor.label.map(str::to_string),
            colors: descriptor.color_attachments.len(),
            depth_cleared,
        });
        Box::new(pass)
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        _descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputePass<'encoder> + 'encoder> {
        let pass = MockPass {
            log: Arc::clone(&self.log),
        };
        pass.push(Recorded::ComputePass);
        Box::new(pass)
    }

    fn copy_buffer_to_buffer(
        &mut self,
        _source: &BufferId,
        _source_offset: u64,
        _destination: &BufferId,
        _destination_offset: u64,
        _size: u64,
    ) {
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(0)
    }
}
