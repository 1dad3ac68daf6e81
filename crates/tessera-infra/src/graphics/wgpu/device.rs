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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use wgpu::util::DeviceExt;

use tessera_core::renderer::api::*;
use tessera_core::renderer::traits::CommandEncoder;
use tessera_core::renderer::{GraphicsDevice, PipelineError, ResourceError, ShaderError};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{from_wgpu_texture_format, IntoWgpu};

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64, // To track VRAM accurately on destruction
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) size: u64,
}

/// Locks `mutex`, mapping poisoning to a backend error naming `what`.
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

/// The internal, non-clonable state of the WgpuDevice.
/// This struct holds all the GPU resources and state, protected by an Arc.
#[derive(Debug)]
pub(crate) struct WgpuDeviceInternal {
    context: Arc<Mutex<WgpuGraphicsContext>>,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    render_pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    compute_pipelines: Mutex<HashMap<ComputePipelineId, Arc<wgpu::ComputePipeline>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,

    next_id: AtomicUsize,
    next_compute_pipeline_id: AtomicU64,

    vram_allocated_bytes: AtomicU64,
    vram_peak_bytes: AtomicU64,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
    /// A thread-safe counter to generate unique command buffer IDs.
    command_buffer_id_counter: AtomicU64,
}

/// A clonable, thread-safe handle to the WGPU graphics device.
/// It wraps the actual device state (`WgpuDeviceInternal`) in an Arc,
/// allowing it to be shared across threads and with command encoders.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    /// Wraps a graphics context.
    pub fn new(context: Arc<Mutex<WgpuGraphicsContext>>) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                render_pipelines: Mutex::new(HashMap::new()),
                compute_pipelines: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(0),
                next_compute_pipeline_id: AtomicU64::new(0),
                vram_allocated_bytes: AtomicU64::new(0),
                vram_peak_bytes: AtomicU64::new(0),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicU64::new(0),
            }),
        }
    }

    /// A fresh raw id. Handles of different kinds never compare, so one
    /// counter serves every `usize`-based id type.
    fn generate_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Helper function to execute an operation with the graphics context locked.
    fn with_context<F, R>(&self, operation: F) -> Result<R, ResourceError>
    where
        F: FnOnce(&WgpuGraphicsContext) -> Result<R, ResourceError>,
    {
        let context_guard = lock(&self.internal.context, "context")?;
        operation(&context_guard)
    }

    fn track_allocation(&self, bytes: u64) {
        let current = self
            .internal
            .vram_allocated_bytes
            .fetch_add(bytes, Ordering::Relaxed)
            + bytes;
        self.internal
            .vram_peak_bytes
            .fetch_max(current, Ordering::Relaxed);
    }

    fn track_release(&self, bytes: u64) {
        self.internal
            .vram_allocated_bytes
            .fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Bytes currently held by buffers and textures created through this device.
    pub fn vram_usage_bytes(&self) -> u64 {
        self.internal.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// The highest value [`Self::vram_usage_bytes`] has reached.
    pub fn vram_peak_bytes(&self) -> u64 {
        self.internal.vram_peak_bytes.load(Ordering::Relaxed)
    }

    /// Runs `create` inside a validation error scope and returns its result
    /// together with the first validation error raised, if any.
    fn with_validation_scope<R>(
        device: &wgpu::Device,
        create: impl FnOnce() -> R,
    ) -> (R, Option<wgpu::Error>) {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create();
        let error = pollster::block_on(device.pop_error_scope());
        (value, error)
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        self.internal.render_pipelines.lock().ok()?.get(&id).cloned()
    }

    pub(crate) fn get_wgpu_compute_pipeline(
        &self,
        id: ComputePipelineId,
    ) -> Option<Arc<wgpu::ComputePipeline>> {
        self.internal.compute_pipelines.lock().ok()?.get(&id).cloned()
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        self.internal.bind_groups.lock().ok()?.get(&id).cloned()
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        self.internal
            .buffers
            .lock()
            .ok()?
            .get(&id)
            .map(|entry| Arc::clone(&entry.wgpu_buffer))
    }

    pub(crate) fn get_wgpu_texture_view(
        &self,
        id: &TextureViewId,
    ) -> Option<Arc<wgpu::TextureView>> {
        self.internal.texture_views.lock().ok()?.get(id).cloned()
    }

    /// Polls the underlying wgpu::Device until all submitted work is complete.
    pub fn poll_device_blocking(&self) {
        if let Ok(context_guard) = self.internal.context.lock() {
            if let Err(e) = context_guard.device.poll(wgpu::PollType::Wait) {
                log::warn!("Failed to poll device: {:?}", e);
            }
        } else {
            log::error!("WgpuDevice context mutex was poisoned during a blocking poll.");
        }
    }

    /// Creates a texture view for a raw wgpu::Texture (e.g., from the swap chain)
    /// and registers it with the device, returning an abstract ID.
    pub fn create_texture_view_for_surface(
        &self,
        texture: &wgpu::Texture,
        label: Option<&str>,
    ) -> Result<TextureViewId, ResourceError> {
        let wgpu_view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor {
            label,
            ..Default::default()
        }));
        let id = TextureViewId(self.generate_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, wgpu_view);
        Ok(id)
    }

    /// Registers a finished wgpu::CommandBuffer, storing it in a map and
    /// returning an abstract ID for it.
    pub(crate) fn register_command_buffer(&self, buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .command_buffer_id_counter
                .fetch_add(1, Ordering::SeqCst),
        );
        match self.internal.pending_command_buffers.lock() {
            Ok(mut guard) => {
                guard.insert(id, buffer);
            }
            Err(e) => log::error!("Dropping command buffer {id:?}, mutex poisoned: {e}"),
        }
        id
    }
}

/// A GPU resource resolved from an abstract binding, kept alive while the
/// wgpu bind group descriptor borrows it.
enum ResolvedResource {
    Buffer(Arc<wgpu::Buffer>, u64, Option<std::num::NonZeroU64>),
    TextureView(Arc<wgpu::TextureView>),
    Sampler(Arc<wgpu::Sampler>),
}

impl GraphicsDevice for WgpuDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let ShaderSourceData::Wgsl(source) = &descriptor.source;
        let label = descriptor.label;

        let module = self.with_context(|context| {
            log::debug!("WgpuDevice: Creating wgpu::ShaderModule with label: {label:?}");
            let (module, error) = Self::with_validation_scope(&context.device, || {
                context
                    .device
                    .create_shader_module(wgpu::ShaderModuleDescriptor {
                        label,
                        source: wgpu::ShaderSource::Wgsl(source.clone()),
                    })
            });
            match error {
                Some(e) => Err(ShaderError::CompilationError {
                    label: label.unwrap_or_default().to_string(),
                    details: e.to_string(),
                }
                .into()),
                None => Ok(Arc::new(module)),
            }
        })?;

        let id = ShaderModuleId(self.generate_id());
        lock(&self.internal.shader_modules, "shader_modules")?.insert(id, module);
        log::info!(
            "WgpuDevice: Created shader module '{}' with ID: {:?}",
            label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        if lock(&self.internal.shader_modules, "shader_modules")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}");
            Ok(())
        } else {
            Err(ShaderError::NotFound { id }.into())
        }
    }

    // --- Pipeline Operations ---

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let bind_group_layouts = {
            let layouts = lock(&self.internal.bind_group_layouts, "bind_group_layouts")?;
            descriptor
                .bind_group_layouts
                .iter()
                .map(|id| layouts.get(id).cloned().ok_or(ResourceError::InvalidHandle))
                .collect::<Result<Vec<_>, _>>()?
        };
        let refs: Vec<&wgpu::BindGroupLayout> =
            bind_group_layouts.iter().map(|l| l.as_ref()).collect();

        let layout = self.with_context(|context| {
            Ok(context
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: descriptor.label.as_deref(),
                    bind_group_layouts: &refs,
                    push_constant_ranges: &[],
                }))
        })?;

        let id = PipelineLayoutId(self.generate_id());
        lock(&self.internal.pipeline_layouts, "pipeline_layouts")?.insert(id, Arc::new(layout));
        log::debug!(
            "WgpuDevice: Created pipeline layout '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let pipeline_label = descriptor.label.as_deref().map(String::from);
        log::debug!("WgpuDevice: Creating render pipeline with label: {pipeline_label:?}");

        // 1. Resolve the shader modules and layout
        let (vs_module, fs_module) = {
            let modules = lock(&self.internal.shader_modules, "shader_modules")?;
            let fetch = |id: ShaderModuleId| {
                modules.get(&id).cloned().ok_or_else(|| {
                    ResourceError::Pipeline(PipelineError::InvalidShaderModuleForPipeline {
                        id,
                        pipeline_label: pipeline_label.clone(),
                    })
                })
            };
            let vs = fetch(descriptor.vertex_shader_module)?;
            let fs = descriptor.fragment_shader_module.map(fetch).transpose()?;
            (vs, fs)
        };
        let layout = match descriptor.layout {
            Some(id) => Some(
                lock(&self.internal.pipeline_layouts, "pipeline_layouts")?
                    .get(&id)
                    .cloned()
                    .ok_or(ResourceError::InvalidHandle)?,
            ),
            None => None,
        };

        // 2. Convert vertex buffers layout
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers_layout
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: attr.format.into_wgpu(),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers_layout
            .iter()
            .zip(attributes.iter())
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: layout.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        // 3. Fixed-function state
        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: descriptor.primitive_state.front_face.into_wgpu(),
            cull_mode: descriptor.primitive_state.cull_mode.map(IntoWgpu::into_wgpu),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        };
        let depth_stencil = descriptor
            .depth_stencil_state
            .as_ref()
            .map(|ds| wgpu::DepthStencilState {
                format: ds.format.into_wgpu(),
                depth_write_enabled: ds.depth_write_enabled,
                depth_compare: ds.depth_compare.into_wgpu(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            });
        let targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_target_states
            .iter()
            .map(|cts| {
                Some(wgpu::ColorTargetState {
                    format: cts.format.into_wgpu(),
                    blend: Some(if cts.alpha_blending {
                        wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        wgpu::BlendState::REPLACE
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let fragment_entry = descriptor.fragment_entry_point.as_deref();
        if fs_module.is_some() && fragment_entry.is_none() {
            return Err(PipelineError::CompilationFailed {
                label: pipeline_label,
                details: "fragment module given without an entry point".to_string(),
            }
            .into());
        }

        // 4. Create the pipeline inside a validation scope
        let pipeline = self.with_context(|context| {
            let (pipeline, error) = Self::with_validation_scope(&context.device, || {
                context
                    .device
                    .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: descriptor.label.as_deref(),
                        layout: layout.as_deref(),
                        vertex: wgpu::VertexState {
                            module: &vs_module,
                            entry_point: Some(descriptor.vertex_entry_point.as_ref()),
                            buffers: &vertex_buffers,
                            compilation_options: Default::default(),
                        },
                        fragment: fs_module.as_ref().map(|module| wgpu::FragmentState {
                            module,
                            entry_point: fragment_entry,
                            targets: &targets,
                            compilation_options: Default::default(),
                        }),
                        primitive,
                        depth_stencil: depth_stencil.clone(),
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    })
            });
            match error {
                Some(e) => Err(PipelineError::CompilationFailed {
                    label: pipeline_label.clone(),
                    details: e.to_string(),
                }
                .into()),
                None => Ok(Arc::new(pipeline)),
            }
        })?;

        let id = RenderPipelineId(self.generate_id());
        lock(&self.internal.render_pipelines, "render_pipelines")?.insert(id, pipeline);
        log::info!(
            "WgpuDevice: Created render pipeline '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        lock(&self.internal.render_pipelines, "render_pipelines")?
            .remove(&id)
            .map(|_| log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        let pipeline_label = descriptor.label.as_deref().map(String::from);
        let module = lock(&self.internal.shader_modules, "shader_modules")?
            .get(&descriptor.shader_module)
            .cloned()
            .ok_or_else(|| {
                ResourceError::Pipeline(PipelineError::InvalidShaderModuleForPipeline {
                    id: descriptor.shader_module,
                    pipeline_label: pipeline_label.clone(),
                })
            })?;
        let layout = match descriptor.layout {
            Some(id) => Some(
                lock(&self.internal.pipeline_layouts, "pipeline_layouts")?
                    .get(&id)
                    .cloned()
                    .ok_or(ResourceError::InvalidHandle)?,
            ),
            None => None,
        };

        let pipeline = self.with_context(|context| {
            let (pipeline, error) = Self::with_validation_scope(&context.device, || {
                context
                    .device
                    .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                        label: descriptor.label.as_deref(),
                        layout: layout.as_deref(),
                        module: &module,
                        entry_point: Some(descriptor.entry_point.as_ref()),
                        compilation_options: Default::default(),
                        cache: None,
                    })
            });
            match error {
                Some(e) => Err(PipelineError::CompilationFailed {
                    label: pipeline_label.clone(),
                    details: e.to_string(),
                }
                .into()),
                None => Ok(Arc::new(pipeline)),
            }
        })?;

        let id = ComputePipelineId(
            self.internal
                .next_compute_pipeline_id
                .fetch_add(1, Ordering::Relaxed),
        );
        lock(&self.internal.compute_pipelines, "compute_pipelines")?.insert(id, pipeline);
        log::info!(
            "WgpuDevice: Created compute pipeline '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), ResourceError> {
        lock(&self.internal.compute_pipelines, "compute_pipelines")?
            .remove(&id)
            .map(|_| log::debug!("WgpuDevice: Destroyed compute pipeline with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    // --- Bind Group Operations ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: match &entry.ty {
                    BindingType::Buffer {
                        ty,
                        has_dynamic_offset,
                        min_binding_size,
                    } => wgpu::BindingType::Buffer {
                        ty: ty.into_wgpu(),
                        has_dynamic_offset: *has_dynamic_offset,
                        min_binding_size: *min_binding_size,
                    },
                    BindingType::Texture {
                        sample_type,
                        view_dimension,
                        multisampled,
                    } => wgpu::BindingType::Texture {
                        sample_type: sample_type.into_wgpu(),
                        view_dimension: view_dimension.into_wgpu(),
                        multisampled: *multisampled,
                    },
                    BindingType::Sampler(ty) => wgpu::BindingType::Sampler(ty.into_wgpu()),
                },
                count: None,
            })
            .collect();

        let layout = self.with_context(|context| {
            Ok(context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: descriptor.label,
                    entries: &entries,
                }))
        })?;

        let id = BindGroupLayoutId(self.generate_id());
        lock(&self.internal.bind_group_layouts, "bind_group_layouts")?
            .insert(id, Arc::new(layout));
        log::debug!(
            "WgpuDevice: Created bind group layout '{}' with ID: {:?}",
            descriptor.label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let layout = lock(&self.internal.bind_group_layouts, "bind_group_layouts")?
            .get(&descriptor.layout)
            .cloned()
            .ok_or(ResourceError::InvalidHandle)?;

        let resolved = descriptor
            .entries
            .iter()
            .map(|entry| {
                let resource = match entry.resource {
                    BindingResource::Buffer(binding) => ResolvedResource::Buffer(
                        self.get_wgpu_buffer(binding.buffer)
                            .ok_or(ResourceError::InvalidHandle)?,
                        binding.offset,
                        binding.size,
                    ),
                    BindingResource::TextureView(view) => ResolvedResource::TextureView(
                        self.get_wgpu_texture_view(&view)
                            .ok_or(ResourceError::InvalidHandle)?,
                    ),
                    BindingResource::Sampler(sampler) => ResolvedResource::Sampler(
                        lock(&self.internal.samplers, "samplers")?
                            .get(&sampler)
                            .cloned()
                            .ok_or(ResourceError::InvalidHandle)?,
                    ),
                };
                Ok((entry.binding, resource))
            })
            .collect::<Result<Vec<_>, ResourceError>>()?;

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    ResolvedResource::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: *offset,
                            size: *size,
                        })
                    }
                    ResolvedResource::TextureView(view) => wgpu::BindingResource::TextureView(view),
                    ResolvedResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                },
            })
            .collect();

        let bind_group = self.with_context(|context| {
            Ok(context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: descriptor.label,
                layout: &layout,
                entries: &entries,
            }))
        })?;

        let id = BindGroupId(self.generate_id());
        lock(&self.internal.bind_groups, "bind_groups")?.insert(id, Arc::new(bind_group));
        log::debug!(
            "WgpuDevice: Created bind group '{}' with ID: {:?}",
            descriptor.label.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        lock(&self.internal.bind_groups, "bind_groups")?
            .remove(&id)
            .map(|_| log::debug!("WgpuDevice: Destroyed bind group with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let wgpu_buffer = self.with_context(|context| {
            Ok(context.device.create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: descriptor.mapped_at_creation,
            }))
        })?;

        let id = BufferId(self.generate_id());
        self.track_allocation(descriptor.size);
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size: descriptor.size,
            },
        );

        log::debug!(
            "WgpuDevice: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let wgpu_buffer = self.with_context(|context| {
            Ok(context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: descriptor.label.as_deref(),
                    contents: data,
                    usage: descriptor.usage.into_wgpu(),
                }))
        })?;

        let id = BufferId(self.generate_id());
        let buffer_size = wgpu_buffer.size();
        self.track_allocation(buffer_size);
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size: buffer_size,
            },
        );

        log::debug!(
            "WgpuDevice: Created buffer '{}' with initial data. ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            buffer_size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.buffers, "buffers")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.track_release(entry.size);
        log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffer = self.get_wgpu_buffer(id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > buffer.size() {
            return Err(ResourceError::OutOfBounds);
        }
        self.with_context(|context| {
            context.queue.write_buffer(&buffer, offset, data);
            Ok(())
        })?;
        log::trace!(
            "WgpuDevice: Wrote {} bytes to buffer ID: {:?} at offset {}",
            data.len(),
            id,
            offset
        );
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, offset: u64, size: u64) -> Result<Vec<u8>, ResourceError> {
        let source = self.get_wgpu_buffer(id).ok_or(ResourceError::NotFound)?;
        let copy_size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || offset + copy_size > source.size() {
            return Err(ResourceError::OutOfBounds);
        }

        self.with_context(|context| {
            let staging = context.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Readback Staging Buffer"),
                size: copy_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let mut encoder =
                context
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Readback Encoder"),
                    });
            encoder.copy_buffer_to_buffer(&source, offset, &staging, 0, copy_size);
            context.queue.submit(std::iter::once(encoder.finish()));

            let slice = staging.slice(..);
            let (sender, receiver) = std::sync::mpsc::channel();
            slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
            context
                .device
                .poll(wgpu::PollType::Wait)
                .map_err(|e| ResourceError::BackendError(format!("Device poll failed: {e}")))?;
            receiver
                .recv()
                .map_err(|e| ResourceError::BackendError(format!("Map callback lost: {e}")))?
                .map_err(|e| ResourceError::BackendError(format!("Buffer map failed: {e}")))?;

            let bytes = {
                let mapped = slice.get_mapped_range();
                mapped[..size as usize].to_vec()
            };
            staging.unmap();
            Ok(bytes)
        })
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let wgpu_texture = self.with_context(|context| {
            Ok(context.device.create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            }))
        })?;

        let id = TextureId(self.generate_id());
        let size_in_bytes = descriptor.size.width as u64
            * descriptor.size.height as u64
            * descriptor.size.depth_or_array_layers as u64
            * descriptor.format.bytes_per_pixel() as u64;
        self.track_allocation(size_in_bytes);
        lock(&self.internal.textures, "textures")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(wgpu_texture),
                size: size_in_bytes,
            },
        );

        log::debug!(
            "WgpuDevice: Created texture '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size_in_bytes
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.textures, "textures")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.track_release(entry.size);
        log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;

        self.with_context(|context| {
            context.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row,
                    rows_per_image: None,
                },
                size.into_wgpu(),
            );
            Ok(())
        })?;
        log::trace!(
            "WgpuDevice: Wrote {} bytes to texture ID: {:?}",
            data.len(),
            texture_id
        );
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;

        let wgpu_view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            format: descriptor.format.map(IntoWgpu::into_wgpu),
            dimension: descriptor.dimension.map(IntoWgpu::into_wgpu),
            aspect: descriptor.aspect.into_wgpu(),
            ..Default::default()
        }));
        let id = TextureViewId(self.generate_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, wgpu_view);
        log::debug!(
            "WgpuDevice: Created texture view '{}' for texture ID: {:?} with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            texture_id,
            id
        );
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        lock(&self.internal.texture_views, "texture_views")?
            .remove(&id)
            .map(|_| log::trace!("WgpuDevice: Destroyed texture view with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let wgpu_sampler = self.with_context(|context| {
            Ok(context.device.create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                ..Default::default()
            }))
        })?;
        let id = SamplerId(self.generate_id());
        lock(&self.internal.samplers, "samplers")?.insert(id, Arc::new(wgpu_sampler));
        log::debug!(
            "WgpuDevice: Created sampler '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        lock(&self.internal.samplers, "samplers")?
            .remove(&id)
            .map(|_| log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}"))
            .ok_or(ResourceError::NotFound)
    }

    // --- Command Submission ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = match self.internal.context.lock() {
            Ok(context_guard) => Some(
                context_guard
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor { label }),
            ),
            Err(e) => {
                log::error!("WgpuDevice: cannot create command encoder, mutex poisoned: {e}");
                None
            }
        };

        Box::new(WgpuCommandEncoder {
            encoder,
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let buffer = match self.internal.pending_command_buffers.lock() {
            Ok(mut guard) => guard.remove(&command_buffer),
            Err(e) => {
                log::error!("WgpuDevice: pending command buffers mutex poisoned: {e}");
                return;
            }
        };

        match (buffer, self.internal.context.lock()) {
            (Some(buffer), Ok(context_guard)) => {
                context_guard.queue.submit(std::iter::once(buffer));
            }
            (None, _) => log::error!(
                "Attempted to submit a CommandBufferId ({:?}) that does not exist.",
                command_buffer
            ),
            (Some(_), Err(e)) => log::error!("WgpuDevice: context mutex poisoned: {e}"),
        }
    }

    fn get_surface_format(&self) -> Option<TextureFormat> {
        let context_guard = self.internal.context.lock().ok()?;
        from_wgpu_texture_format(context_guard.surface_config.format)
    }
}
