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

//! # Tessera SDK
//!
//! Strings the lanes of `tessera-lanes` into a forward+ frame and runs it in a
//! window.
//!
//! A frame is a fixed sequence of [`FrameStage`]s:
//!
//! 1. **DepthPrepass** renders scene depth.
//! 2. **LightCulling** dispatches one workgroup per 16x16 tile to build the
//!    tile's list of visible lights.
//! 3. **FinalShading** shades each pixel with its tile's lights, or shows the
//!    depth buffer when [`DebugView::Depth`] is selected.
//! 4. **Present** submits and presents.
//!
//! [`Renderer::run`] owns the event loop. Tests and tools can drive a
//! [`FramePipeline`] directly against any [`GraphicsDevice`].
//!
//! [`GraphicsDevice`]: tessera_core::renderer::GraphicsDevice

#![warn(missing_docs)]

pub mod animation;
pub mod camera;
pub mod config;
pub mod light_pool;
pub mod pipeline;
pub mod readback;
pub mod runner;
pub mod scene;
pub mod state;

pub use animation::LightAnimator;
pub use camera::Camera;
pub use config::{DebugView, RendererConfig};
pub use light_pool::LightPool;
pub use pipeline::{FramePipeline, FrameStage};
pub use readback::CullingReport;
pub use runner::Renderer;
pub use scene::SceneAssets;
pub use state::{RendererState, StateCommand};
