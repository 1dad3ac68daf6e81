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

//! # Tessera Lanes
//!
//! The hot-path passes of the tiled forward renderer and the loaders that feed
//! them. Lanes talk to the GPU only through the traits of `tessera-core`; the
//! orchestration that strings them into a frame lives in `tessera-sdk`.

#![warn(missing_docs)]

pub mod asset_lane;
pub mod render_lane;

#[cfg(test)]
pub(crate) mod test_support;

pub use asset_lane::{
    AssetError, AssetLoaderLane, ImportedScene, ObjLoaderLane, TextureCache, TextureLoaderLane,
};
pub use render_lane::{
    DepthDebugLane, DepthPrepassLane, FinalShadingLane, GeometryBatch, LightCullingLane,
    SceneGeometry, ShaderProgram, UniformBlock,
};
