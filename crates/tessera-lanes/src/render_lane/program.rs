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

//! Linked shader programs and typed uniform blocks.
//!
//! A [`ShaderProgram`] is the result of compiling every stage of a
//! [`ShaderProgramDescriptor`] on a [`GraphicsDevice`]. Stages that share the same
//! WGSL text share one module.

use std::borrow::Cow;
use std::marker::PhantomData;

use bytemuck::Pod;
use tessera_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, ProgramKind, ResourceError,
    ShaderError, ShaderModuleDescriptor, ShaderModuleId, ShaderProgramDescriptor,
    ShaderSourceData, ShaderStage,
};

#[derive(Debug, Clone)]
struct CompiledStage {
    stage: ShaderStage,
    module: ShaderModuleId,
    entry_point: String,
}

/// A set of compiled stages that can be linked into one pipeline.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    kind: ProgramKind,
    modules: Vec<ShaderModuleId>,
    stages: Vec<CompiledStage>,
}

impl ShaderProgram {
    /// Validates and compiles every stage of `descriptor`.
    ///
    /// On failure every module created so far is destroyed and the backend's
    /// diagnostics are returned.
    pub fn compile(
        device: &dyn GraphicsDevice,
        descriptor: &ShaderProgramDescriptor,
    ) -> Result<Self, ShaderError> {
        let kind = descriptor.validate()?;
        log::debug!(
            "ShaderProgram: Compiling '{}' ({} stages)",
            descriptor.label,
            descriptor.stages.len()
        );

        let mut compiled: Vec<(&str, ShaderModuleId)> = Vec::new();
        let mut stages = Vec::with_capacity(descriptor.stages.len());

        for source in descriptor.stages {
            match source.stage {
                ShaderStage::Vertex | ShaderStage::Fragment | ShaderStage::Compute => {}
                ShaderStage::Geometry => {
                    release(device, compiled.iter().map(|(_, id)| *id));
                    return Err(ShaderError::UnsupportedStage {
                        label: descriptor.label.to_string(),
                        stage: source.stage,
                    });
                }
            }

            let ShaderSourceData::Wgsl(text) = &source.source;
            let module = match compiled.iter().find(|(seen, _)| *seen == text.as_ref()) {
                Some((_, id)) => *id,
                None => {
                    let module_label = format!("{}_{}", descriptor.label, source.stage);
                    let created = device.create_shader_module(&ShaderModuleDescriptor {
                        label: Some(&module_label),
                        source: ShaderSourceData::Wgsl(Cow::Borrowed(text.as_ref())),
                    });
                    match created {
                        Ok(id) => {
                            compiled.push((text.as_ref(), id));
                            id
                        }
                        Err(err) => {
                            release(device, compiled.iter().map(|(_, id)| *id));
                            return Err(into_shader_error(descriptor.label, err));
                        }
                    }
                }
            };

            stages.push(CompiledStage {
                stage: source.stage,
                module,
                entry_point: source.entry_point.to_string(),
            });
        }

        Ok(Self {
            label: descriptor.label.to_string(),
            kind,
            modules: compiled.into_iter().map(|(_, id)| id).collect(),
            stages,
        })
    }

    /// The program's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this is a render or a compute program.
    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    /// The module holding `stage`, if the program has it.
    pub fn stage_module(&self, stage: ShaderStage) -> Option<ShaderModuleId> {
        self.find(stage).map(|s| s.module)
    }

    /// The entry point of `stage`, if the program has it.
    pub fn entry_point(&self, stage: ShaderStage) -> Option<&str> {
        self.find(stage).map(|s| s.entry_point.as_str())
    }

    /// Module and entry point of a stage the caller knows is present.
    pub(crate) fn require(
        &self,
        stage: ShaderStage,
    ) -> Result<(ShaderModuleId, Cow<'_, str>), ShaderError> {
        self.find(stage)
            .map(|s| (s.module, Cow::Borrowed(s.entry_point.as_str())))
            .ok_or_else(|| ShaderError::MissingStage {
                label: self.label.clone(),
                stage,
            })
    }

    /// Destroys the program's modules.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        release(device, self.modules.into_iter());
    }

    fn find(&self, stage: ShaderStage) -> Option<&CompiledStage> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

fn release(device: &dyn GraphicsDevice, modules: impl Iterator<Item = ShaderModuleId>) {
    for id in modules {
        if let Err(e) = device.destroy_shader_module(id) {
            log::warn!("ShaderProgram: Failed to destroy module {id:?}: {e}");
        }
    }
}

fn into_shader_error(label: &str, err: ResourceError) -> ShaderError {
    match err {
        ResourceError::Shader(e) => e,
        other => ShaderError::CompilationError {
            label: label.to_string(),
            details: other.to_string(),
        },
    }
}

/// A uniform buffer holding exactly one `T`.
#[derive(Debug)]
pub struct UniformBlock<T: Pod> {
    buffer: BufferId,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBlock<T> {
    /// Creates the buffer, initialized with `initial`.
    pub fn new(device: &dyn GraphicsDevice, label: &str, initial: &T) -> Result<Self, ResourceError> {
        let buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Borrowed(label)),
                size: std::mem::size_of::<T>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            bytemuck::bytes_of(initial),
        )?;
        Ok(Self {
            buffer,
            _marker: PhantomData,
        })
    }

    /// Queues a write of `value`, visible to work submitted afterwards.
    pub fn set(&self, device: &dyn GraphicsDevice, value: &T) -> Result<(), ResourceError> {
        device.write_buffer(self.buffer, 0, bytemuck::bytes_of(value))
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Releases the buffer.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_buffer(self.buffer) {
            log::warn!("UniformBlock: Failed to destroy buffer: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDevice;
    use tessera_core::renderer::ShaderStageSource;

    fn stage(stage: ShaderStage, source: &'static str, entry: &'static str) -> ShaderStageSource<'static> {
        ShaderStageSource {
            stage,
            source: ShaderSourceData::Wgsl(Cow::Borrowed(source)),
            entry_point: Cow::Borrowed(entry),
        }
    }

    #[test]
    fn test_shared_source_compiles_once() {
        let device = MockDevice::default();
        let stages = [
            stage(ShaderStage::Vertex, "shared", "vs_main"),
            stage(ShaderStage::Fragment, "shared", "fs_main"),
        ];
        let program = ShaderProgram::compile(
            &device,
            &ShaderProgramDescriptor {
                label: "shading",
                stages: &stages,
            },
        )
        .unwrap();

        assert_eq!(device.shader_modules_created(), 1);
        assert_eq!(program.kind(), ProgramKind::Render { has_fragment: true });
        assert_eq!(
            program.stage_module(ShaderStage::Vertex),
            program.stage_module(ShaderStage::Fragment)
        );
        assert_eq!(program.entry_point(ShaderStage::Fragment), Some("fs_main"));
        assert_eq!(program.entry_point(ShaderStage::Compute), None);
    }

    #[test]
    fn test_geometry_stage_is_rejected() {
        let device = MockDevice::default();
        let stages = [
            stage(ShaderStage::Vertex, "a", "vs_main"),
            stage(ShaderStage::Geometry, "b", "gs_main"),
        ];
        let err = ShaderProgram::compile(
            &device,
            &ShaderProgramDescriptor {
                label: "legacy",
                stages: &stages,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::UnsupportedStage {
                stage: ShaderStage::Geometry,
                ..
            }
        ));
        assert_eq!(device.shader_modules_created(), 0);
    }

    #[test]
    fn test_compile_failure_releases_earlier_modules() {
        let device = MockDevice::default();
        let stages = [
            stage(ShaderStage::Vertex, "fine", "vs_main"),
            stage(ShaderStage::Fragment, MockDevice::BROKEN_SOURCE, "fs_main"),
        ];
        let err = ShaderProgram::compile(
            &device,
            &ShaderProgramDescriptor {
                label: "broken",
                stages: &stages,
            },
        )
        .unwrap_err();

        assert!(matches!(err, ShaderError::CompilationError { .. }));
        assert_eq!(device.shader_modules_created(), 1);
        assert_eq!(device.shader_modules_destroyed(), 1);
    }

    #[test]
    fn test_uniform_block_writes_whole_value() {
        let device = MockDevice::default();
        let block = UniformBlock::new(&device, "test_uniforms", &[0u32; 4]).unwrap();
        block.set(&device, &[1u32, 2, 3, 4]).unwrap();

        let writes = device.buffer_writes(block.buffer());
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, 0);
        assert_eq!(writes[0].1, bytemuck::bytes_of(&[1u32, 2, 3, 4]).to_vec());
    }
}
