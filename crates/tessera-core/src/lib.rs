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

//! # Tessera Core
//!
//! Foundational crate containing the traits, core types, and interface contracts
//! of the tiled forward renderer: math, the backend-agnostic GPU API, the tile
//! grid and light layouts shared with the shaders, and the scene description.

#![warn(missing_docs)]

pub mod math;
pub mod platform;
pub mod renderer;
pub mod scene;
pub mod utils;
