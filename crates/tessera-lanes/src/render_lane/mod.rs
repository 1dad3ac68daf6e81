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

//! The render lanes of a forward+ frame.
//!
//! Each lane owns its pipeline and bind groups and records exactly one pass:
//!
//! 1. [`DepthPrepassLane`] writes scene depth.
//! 2. [`LightCullingLane`] builds the per-tile visible-light lists from that depth.
//! 3. [`FinalShadingLane`] shades the scene with the lists, or
//!    [`DepthDebugLane`] shows the depth instead.

mod depth_debug_lane;
mod depth_prepass_lane;
mod final_shading_lane;
mod geometry;
mod light_culling_lane;
mod program;
pub mod shaders;

pub use depth_debug_lane::DepthDebugLane;
pub use depth_prepass_lane::DepthPrepassLane;
pub use final_shading_lane::FinalShadingLane;
pub use geometry::{GeometryBatch, SceneGeometry};
pub use light_culling_lane::LightCullingLane;
pub use program::{ShaderProgram, UniformBlock};

use std::borrow::Cow;
use tessera_core::renderer::{ShaderSourceData, ShaderStage, ShaderStageSource};

/// A stage source borrowing one of the built-in shaders.
fn builtin_stage(
    stage: ShaderStage,
    source: &'static str,
    entry_point: &'static str,
) -> ShaderStageSource<'static> {
    ShaderStageSource {
        stage,
        source: ShaderSourceData::Wgsl(Cow::Borrowed(source)),
        entry_point: Cow::Borrowed(entry_point),
    }
}
