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

//! A [`GraphicsDevice`] that keeps buffer contents in memory and records the
//! passes encoded against it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tessera_core::renderer::api::*;
use tessera_core::renderer::{CommandEncoder, ComputePass, GraphicsDevice, RenderPass, ResourceError};

/// One recorded pass and what was issued inside it.
#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    Render {
        label: Option<String>,
        color_targets: usize,
        depth: Option<TextureViewId>,
        bind_groups: Vec<(u32, BindGroupId)>,
        draws: usize,
    },
    Compute {
        label: Option<String>,
        bind_groups: Vec<(u32, BindGroupId)>,
        dispatches: Vec<(u32, u32, u32)>,
    },
}

impl Pass {
    pub fn label(&self) -> Option<&str> {
        match self {
            Pass::Render { label, .. } | Pass::Compute { label, .. } => label.as_deref(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    buffers: HashMap<BufferId, Vec<u8>>,
    destroyed_buffers: HashSet<BufferId>,
    textures: HashMap<TextureId, Extent3D>,
    views: HashMap<TextureViewId, TextureId>,
    bind_groups: HashMap<BindGroupId, Vec<(u32, BindingResource)>>,
    passes: Vec<Pass>,
    submissions: usize,
    failing_buffer_creations: usize,
}

#[derive(Debug, Default, Clone)]
pub struct RecordingDevice {
    next_id: Arc<AtomicUsize>,
    state: Arc<Mutex<State>>,
}

impl RecordingDevice {
    fn id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn passes(&self) -> Vec<Pass> {
        self.state.lock().unwrap().passes.clone()
    }

    pub fn clear_passes(&self) {
        self.state.lock().unwrap().passes.clear();
    }

    pub fn buffer_len(&self, id: BufferId) -> Option<usize> {
        self.state.lock().unwrap().buffers.get(&id).map(Vec::len)
    }

    pub fn buffer_bytes(&self, id: BufferId) -> Vec<u8> {
        self.state.lock().unwrap().buffers.get(&id).cloned().unwrap_or_default()
    }

    pub fn is_destroyed(&self, id: BufferId) -> bool {
        self.state.lock().unwrap().destroyed_buffers.contains(&id)
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().unwrap().textures.len()
    }

    pub fn texture_size_of_view(&self, view: TextureViewId) -> Option<(u32, u32)> {
        let state = self.state.lock().unwrap();
        let texture = state.views.get(&view)?;
        state.textures.get(texture).map(|e| (e.width, e.height))
    }

    /// Buffer bound at `binding` in `group`, if any.
    pub fn bound_buffer(&self, group: BindGroupId, binding: u32) -> Option<BufferId> {
        let state = self.state.lock().unwrap();
        state.bind_groups.get(&group)?.iter().find_map(|(b, resource)| match resource {
            BindingResource::Buffer(buffer) if *b == binding => Some(buffer.buffer),
            _ => None,
        })
    }

    /// Texture view bound at `binding` in `group`, if any.
    pub fn bound_view(&self, group: BindGroupId, binding: u32) -> Option<TextureViewId> {
        let state = self.state.lock().unwrap();
        state.bind_groups.get(&group)?.iter().find_map(|(b, resource)| match resource {
            BindingResource::TextureView(view) if *b == binding => Some(*view),
            _ => None,
        })
    }

    /// Makes the next `count` buffer creations fail.
    pub fn fail_buffer_creations(&self, count: usize) {
        self.state.lock().unwrap().failing_buffer_creations = count;
    }

    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        _descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        Ok(ShaderModuleId(self.id()))
    }

    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        Ok(PipelineLayoutId(self.id()))
    }

    fn create_render_pipeline(
        &self,
        _descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        Ok(RenderPipelineId(self.id()))
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_compute_pipeline(
        &self,
        _descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        Ok(ComputePipelineId(self.id() as u64))
    }

    fn destroy_compute_pipeline(&self, _id: ComputePipelineId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.id()))
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let id = BindGroupId(self.id());
        let entries = descriptor
            .entries
            .iter()
            .map(|entry| (entry.binding, entry.resource))
            .collect();
        self.state.lock().unwrap().bind_groups.insert(id, entries);
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        self.state.lock().unwrap().bind_groups.remove(&id);
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_buffer_creations > 0 {
            state.failing_buffer_creations -= 1;
            return Err(ResourceError::BackendError("out of memory".to_string()));
        }
        let id = BufferId(self.id());
        state.buffers.insert(id, vec![0; descriptor.size as usize]);
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = self.create_buffer(descriptor)?;
        self.write_buffer(id, 0, data)?;
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        state.buffers.remove(&id).ok_or(ResourceError::NotFound)?;
        state.destroyed_buffers.insert(id);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        let bytes = state.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(ResourceError::OutOfBounds);
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, offset: u64, size: u64) -> Result<Vec<u8>, ResourceError> {
        let state = self.state.lock().unwrap();
        let bytes = state.buffers.get(&id).ok_or(ResourceError::NotFound)?;
        bytes
            .get(offset as usize..(offset + size) as usize)
            .map(<[u8]>::to_vec)
            .ok_or(ResourceError::OutOfBounds)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.id());
        self.state.lock().unwrap().textures.insert(id, descriptor.size);
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.state.lock().unwrap().textures.remove(&id);
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
        texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let id = TextureViewId(self.id());
        self.state.lock().unwrap().views.insert(id, texture_id);
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.state.lock().unwrap().views.remove(&id);
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.id()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(RecordingEncoder {
            state: Arc::clone(&self.state),
        })
    }

    fn submit_command_buffer(&self, _command_buffer: CommandBufferId) {
        self.state.lock().unwrap().submissions += 1;
    }

    fn get_surface_format(&self) -> Option<TextureFormat> {
        Some(TextureFormat::Bgra8UnormSrgb)
    }
}

struct RecordingEncoder {
    state: Arc<Mutex<State>>,
}

/// Appends to the last pass of the log.
struct RecordingPass {
    state: Arc<Mutex<State>>,
}

impl RecordingPass {
    fn with_last(&self, f: impl FnOnce(&mut Pass)) {
        if let Some(pass) = self.state.lock().unwrap().passes.last_mut() {
            f(pass);
        }
    }
}

impl RenderPass<'_> for RecordingPass {
    fn set_pipeline(&mut self, _pipeline: &RenderPipelineId) {}

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId, _offsets: &[u32]) {
        let group = *bind_group;
        self.with_last(|pass| {
            if let Pass::Render { bind_groups, .. } = pass {
                bind_groups.push((index, group));
            }
        });
    }

    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: &BufferId, _offset: u64) {}

    fn set_index_buffer(&mut self, _buffer: &BufferId, _offset: u64, _format: IndexFormat) {}

    fn draw(&mut self, _vertices: std::ops::Range<u32>, _instances: std::ops::Range<u32>) {
        self.with_last(|pass| {
            if let Pass::Render { draws, .. } = pass {
                *draws += 1;
            }
        });
    }

    fn draw_indexed(
        &mut self,
        _indices: std::ops::Range<u32>,
        _base_vertex: i32,
        _instances: std::ops::Range<u32>,
    ) {
        self.with_last(|pass| {
            if let Pass::Render { draws, .. } = pass {
                *draws += 1;
            }
        });
    }
}

impl ComputePass<'_> for RecordingPass {
    fn set_pipeline(&mut self, _pipeline: &ComputePipelineId) {}

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId, _offsets: &[u32]) {
        let group = *bind_group;
        self.with_last(|pass| {
            if let Pass::Compute { bind_groups, .. } = pass {
                bind_groups.push((index, group));
            }
        });
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.with_last(|pass| {
            if let Pass::Compute { dispatches, .. } = pass {
                dispatches.push((x, y, z));
            }
        });
    }
}

impl CommandEncoder for RecordingEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        self.state.lock().unwrap().passes.push(Pass::Render {
            label: descriptor.label.map(str::to_string),
            color_targets: descriptor.color_attachments.len(),
            depth: descriptor.depth_stencil_attachment.as_ref().map(|d| *d.view),
            bind_groups: Vec::new(),
            draws: 0,
        });
        Box::new(RecordingPass {
            state: Arc::clone(&self.state),
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputePass<'encoder> + 'encoder> {
        self.state.lock().unwrap().passes.push(Pass::Compute {
            label: descriptor.label.map(str::to_string),
            bind_groups: Vec::new(),
            dispatches: Vec::new(),
        });
        Box::new(RecordingPass {
            state: Arc::clone(&self.state),
        })
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
