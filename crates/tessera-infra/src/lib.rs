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

//! # Tessera Infra
//!
//! Concrete implementations of the contracts defined in `tessera-core`: a `wgpu`
//! graphics device and render system, and a `winit` window with input
//! translation. Nothing above this crate names `wgpu` or `winit` directly.

#![warn(missing_docs)]

#[cfg(feature = "graphics")]
pub mod graphics;
#[cfg(feature = "platform")]
pub mod platform;

#[cfg(feature = "graphics")]
pub use graphics::wgpu::{WgpuDevice, WgpuGraphicsContext, WgpuRenderSystem};
#[cfg(feature = "platform")]
pub use platform::input::{translate_device_event, translate_winit_input};
#[cfg(feature = "platform")]
pub use platform::window::{WinitWindow, WinitWindowBuilder};
