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

//! Built-in WGSL sources for the forward+ passes.
//!
//! # Available Shaders
//!
//! - [`DEPTH_WGSL`] - Position-only depth prepass
//! - [`LIGHT_CULLING_WGSL`] - Per-tile light culling compute kernel
//! - [`FINAL_SHADING_WGSL`] - Tiled Blinn-Phong shading with normal mapping
//! - [`DEPTH_DEBUG_WGSL`] - Linearized depth visualization
//!
//! # Usage
//!
//! ```ignore
//! use tessera_lanes::render_lane::shaders::LIGHT_CULLING_WGSL;
//! use tessera_core::renderer::{ShaderModuleDescriptor, ShaderSourceData};
//! use std::borrow::Cow;
//!
//! let descriptor = ShaderModuleDescriptor {
//!     label: Some("light_culling"),
//!     source: ShaderSourceData::Wgsl(Cow::Borrowed(LIGHT_CULLING_WGSL)),
//! };
//! ```

/// Depth-only vertex shader. Entry point `vs_main`, reads `@location(0)` only.
pub const DEPTH_WGSL: &str = include_str!("depth.wgsl");

/// Light-culling compute shader, one `16x16` workgroup per tile.
///
/// Entry point `cs_main`. Bindings follow
/// [`tessera_core::renderer::forward_plus`].
pub const LIGHT_CULLING_WGSL: &str = include_str!("light_culling.wgsl");

/// Final shading. Entry points `vs_main` and `fs_main`.
pub const FINAL_SHADING_WGSL: &str = include_str!("final_shading.wgsl");

/// Full-screen depth visualization. Entry points `vs_main` and `fs_main`.
pub const DEPTH_DEBUG_WGSL: &str = include_str!("depth_debug.wgsl");

/// Entry point of every vertex stage.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point of every fragment stage.
pub const FRAGMENT_ENTRY: &str = "fs_main";
/// Entry point of the culling kernel.
pub const COMPUTE_ENTRY: &str = "cs_main";
