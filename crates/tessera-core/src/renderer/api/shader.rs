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

//! Shader sources, modules and multi-stage program descriptions.

use crate::renderer::api::util::ShaderStage;
use crate::renderer::error::ShaderError;
use std::borrow::Cow;

/// Represents the source data for a shader module.
#[derive(Debug, Clone)]
pub enum ShaderSourceData<'a> {
    /// WGSL source text.
    Wgsl(Cow<'a, str>),
}

/// Describes a shader module to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The shader source.
    pub source: ShaderSourceData<'a>,
}

/// An opaque handle representing a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderModuleId(pub usize);

/// One stage of a program: its tag, its source and the entry point to call.
#[derive(Debug, Clone)]
pub struct ShaderStageSource<'a> {
    /// The stage this source is compiled for.
    pub stage: ShaderStage,
    /// The stage's source code.
    pub source: ShaderSourceData<'a>,
    /// The entry point function name.
    pub entry_point: Cow<'a, str>,
}

/// A set of stage sources that are compiled together into one program.
#[derive(Debug, Clone)]
pub struct ShaderProgramDescriptor<'a> {
    /// A label used in diagnostics.
    pub label: &'a str,
    /// The stages of the program.
    pub stages: &'a [ShaderStageSource<'a>],
}

/// The pipeline kind a valid set of stages can be linked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// A vertex stage, optionally followed by a fragment stage.
    Render {
        /// Whether a fragment stage is present.
        has_fragment: bool,
    },
    /// A single compute stage.
    Compute,
}

impl ShaderProgramDescriptor<'_> {
    /// Checks that the stages form a linkable program.
    ///
    /// Accepted shapes are `{Compute}` and `{Vertex}` or `{Vertex, Fragment}`, each
    /// stage at most once. A `Geometry` stage is reported as unsupported.
    pub fn validate(&self) -> Result<ProgramKind, ShaderError> {
        let mut seen = [false; 4];
        for source in self.stages {
            if source.stage == ShaderStage::Geometry {
                return Err(ShaderError::UnsupportedStage {
                    label: self.label.to_string(),
                    stage: source.stage,
                });
            }
            if source.entry_point.is_empty() {
                return Err(ShaderError::InvalidEntryPoint {
                    label: self.label.to_string(),
                    entry_point: String::new(),
                });
            }
            let slot = &mut seen[source.stage as usize];
            if *slot {
                return Err(ShaderError::CompilationError {
                    label: self.label.to_string(),
                    details: format!("duplicate {} stage", source.stage),
                });
            }
            *slot = true;
        }

        let has = |stage: ShaderStage| seen[stage as usize];
        match (
            has(ShaderStage::Vertex),
            has(ShaderStage::Fragment),
            has(ShaderStage::Compute),
        ) {
            (false, false, true) => Ok(ProgramKind::Compute),
            (true, has_fragment, false) => Ok(ProgramKind::Render { has_fragment }),
            (false, _, false) => Err(ShaderError::MissingStage {
                label: self.label.to_string(),
                stage: ShaderStage::Vertex,
            }),
            _ => Err(ShaderError::CompilationError {
                label: self.label.to_string(),
                details: "compute cannot be linked with graphics stages".to_string(),
            }),
        }
    }

    /// Returns the source of the given stage, if present.
    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageSource<'_>> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}
