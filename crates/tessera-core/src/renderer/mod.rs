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

//! Backend-agnostic rendering contracts for tessera.
//!
//! This module holds the "common language" of the renderer: the abstract
//! [`traits`] a GPU backend implements, the descriptors and handles in [`api`],
//! the error types, and the forward+ data layouts shared between the CPU and the
//! shaders. The concrete wgpu backend lives in `tessera-infra`; the render lanes
//! in `tessera-lanes` only ever talk to the traits defined here.

pub mod api;
pub mod culling;
pub mod error;
pub mod forward_plus;
pub mod frame;
pub mod light;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::forward_plus::{
    GpuPointLight, TileGrid, VisibleIndex, MAX_LIGHTS_PER_TILE, TILE_SIZE,
};
pub use self::frame::FrameTransform;
pub use self::light::PointLight;
pub use self::traits::{
    CommandEncoder, ComputePass, FrameRecorder, GraphicsDevice, RenderPass, RenderSystem,
};
