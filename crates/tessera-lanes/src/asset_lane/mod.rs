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

//! CPU-side loading of scenes and textures.
//!
//! Loaders decode raw bytes into the CPU types of `tessera-core`; the
//! [`TextureCache`] then turns textures into GPU resources, once per path.

mod error;
mod loader;
mod loading;
mod texture_cache;

pub use error::AssetError;
pub use loader::AssetLoaderLane;
pub use loading::*;
pub use texture_cache::{GpuTexture, TextureCache};
