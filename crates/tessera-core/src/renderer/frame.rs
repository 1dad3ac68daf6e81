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

//! Per-frame camera transforms.

use crate::math::{Mat4, Vec3};

/// The camera state of one frame, recomputed every frame and read by every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// World to view space.
    pub view: Mat4,
    /// View to clip space.
    pub projection: Mat4,
    /// Camera position in world space.
    pub view_position: Vec3,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
}

impl FrameTransform {
    /// Builds the transform for a perspective camera.
    pub fn perspective(
        view: Mat4,
        view_position: Vec3,
        fov_y_radians: f32,
        viewport: (u32, u32),
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = viewport.0.max(1) as f32 / viewport.1.max(1) as f32;
        Self {
            view,
            projection: Mat4::perspective_rh_zo(fov_y_radians, aspect, near, far),
            view_position,
            viewport_width: viewport.0,
            viewport_height: viewport.1,
            near,
            far,
        }
    }

    /// Clip to view space. Falls back to identity for a degenerate projection.
    pub fn inverse_projection(&self) -> Mat4 {
        self.projection.inverse().unwrap_or_else(|| {
            log::warn!("FrameTransform: projection is not invertible, using identity");
            Mat4::IDENTITY
        })
    }

    /// Converts a `[0, 1]` depth-buffer value to a positive view distance.
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        self.near * self.far / (self.far - depth * (self.far - self.near))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linearize_depth_hits_planes() {
        let frame = FrameTransform::perspective(
            Mat4::IDENTITY,
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_4,
            (1080, 720),
            0.1,
            300.0,
        );
        assert_relative_eq!(frame.linearize_depth(0.0), 0.1, epsilon = 1e-5);
        assert_relative_eq!(frame.linearize_depth(1.0), 300.0, epsilon = 1e-2);

        let ndc = frame.projection.project_point3(Vec3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(frame.linearize_depth(ndc.z), 10.0, epsilon = 1e-2);
    }
}
