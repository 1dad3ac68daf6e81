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

//! Command buffers and the descriptors of render and compute passes.

use crate::math::LinearRgba;
use crate::renderer::api::texture::TextureViewId;

/// An opaque handle to a recorded command buffer that is ready for submission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// Describes the operation to perform on an attachment at the start of a render pass.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOp<V> {
    /// The existing contents of the attachment are loaded.
    Load,
    /// The attachment is cleared to the given value.
    Clear(V),
}

/// Describes the operation to perform on an attachment at the end of a render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// The results are stored.
    Store,
    /// The results are discarded.
    Discard,
}

/// Defines the load and store operations for a single attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Operations<V> {
    /// The operation to perform at the beginning of the pass.
    pub load: LoadOp<V>,
    /// The operation to perform at the end of the pass.
    pub store: StoreOp,
}

/// A color attachment of a render pass.
#[derive(Debug)]
pub struct RenderPassColorAttachment<'a> {
    /// The view that will be rendered to.
    pub view: &'a TextureViewId,
    /// The multisample resolve target, if any.
    pub resolve_target: Option<&'a TextureViewId>,
    /// The load and store operations for this attachment.
    pub ops: Operations<LinearRgba>,
}

/// The depth attachment of a render pass.
#[derive(Debug)]
pub struct RenderPassDepthStencilAttachment<'a> {
    /// The view of the depth texture.
    pub view: &'a TextureViewId,
    /// The load and store operations for the depth aspect.
    pub depth_ops: Option<Operations<f32>>,
}

/// A descriptor for a render pass.
#[derive(Debug, Default)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label for the render pass.
    pub label: Option<&'a str>,
    /// The color attachments of the pass. Empty for depth-only passes.
    pub color_attachments: &'a [RenderPassColorAttachment<'a>],
    /// An optional depth attachment for this pass.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment<'a>>,
}

/// A descriptor for a compute pass.
#[derive(Debug, Default)]
pub struct ComputePassDescriptor<'a> {
    /// An optional debug label for the compute pass.
    pub label: Option<&'a str>,
}
