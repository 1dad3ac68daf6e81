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

//! Mutable per-session state threaded through each frame.

use tessera_core::math::Aabb;
use tessera_core::platform::input::{InputEvent, KeyCode};
use tessera_core::renderer::{FrameTransform, GraphicsDevice, ResourceError};

use crate::animation::LightAnimator;
use crate::camera::Camera;
use crate::config::{DebugView, RendererConfig};
use crate::light_pool::LightPool;

/// What a key press asked the application to do beyond camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    /// Nothing to do.
    None,
    /// Leave the event loop.
    Exit,
}

/// Camera, lights and view toggles of a running renderer.
///
/// The frame pipeline reads it every frame; only input handling and
/// [`advance`](Self::advance) mutate it, always between frames.
#[derive(Debug)]
pub struct RendererState {
    /// The viewer.
    pub camera: Camera,
    /// The point lights.
    pub lights: LightPool,
    /// Optional light motion.
    pub animator: LightAnimator,
    /// Box the lights live in.
    pub light_bounds: Aabb,
    /// What the final pass shows.
    pub debug_view: DebugView,
    /// Whether the next frame should be read back and checked.
    pub culling_check_pending: bool,
    /// Current viewport in pixels.
    pub viewport: (u32, u32),
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl RendererState {
    /// Builds the initial state from `config`. Lights are not allocated yet.
    pub fn from_config(config: &RendererConfig, viewport: (u32, u32)) -> Self {
        Self {
            camera: Camera::new(
                config.camera_position,
                config.camera_yaw,
                config.camera_pitch,
                config.camera_speed,
                config.mouse_sensitivity,
            ),
            lights: LightPool::new(),
            animator: LightAnimator::new(config.animation_speed, config.animate_lights),
            light_bounds: config.light_bounds,
            debug_view: config.debug_view,
            culling_check_pending: config.culling_check,
            viewport,
            fov_y_degrees: config.fov_y_degrees,
            near: config.near,
            far: config.far,
        }
    }

    /// The camera matrices for the current viewport.
    pub fn frame_transform(&self) -> FrameTransform {
        self.frame_transform_for(self.viewport)
    }

    /// The camera matrices for an explicit viewport.
    pub fn frame_transform_for(&self, viewport: (u32, u32)) -> FrameTransform {
        FrameTransform::perspective(
            self.camera.view_matrix(),
            self.camera.position,
            self.fov_y_degrees.to_radians(),
            viewport,
            self.near,
            self.far,
        )
    }

    /// Routes an input event to the camera or to a view toggle.
    pub fn handle_input(&mut self, event: &InputEvent) -> StateCommand {
        if let InputEvent::KeyPressed { key_code } = event {
            match key_code {
                KeyCode::Escape => return StateCommand::Exit,
                KeyCode::KeyV => {
                    self.debug_view = self.debug_view.toggled();
                    log::info!("RendererState: Debug view is now {:?}", self.debug_view);
                    return StateCommand::None;
                }
                KeyCode::KeyL => {
                    self.animator.enabled = !self.animator.enabled;
                    log::info!(
                        "RendererState: Light animation {}",
                        if self.animator.enabled { "on" } else { "off" }
                    );
                    return StateCommand::None;
                }
                KeyCode::KeyC => {
                    self.culling_check_pending = true;
                    return StateCommand::None;
                }
                _ => {}
            }
        }
        self.camera.handle_input(event);
        StateCommand::None
    }

    /// Moves the camera and the lights by `dt` seconds and uploads moved lights.
    pub fn advance(&mut self, device: &dyn GraphicsDevice, dt: f32) -> Result<(), ResourceError> {
        self.camera.update(dt);
        if self
            .animator
            .step(self.lights.lights_mut(), &self.light_bounds, dt)
        {
            self.lights.upload(device)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RendererState {
        RendererState::from_config(&RendererConfig::default(), (1080, 720))
    }

    #[test]
    fn test_frame_transform_uses_config_planes() {
        let frame = state().frame_transform();
        assert_eq!((frame.viewport_width, frame.viewport_height), (1080, 720));
        assert_eq!((frame.near, frame.far), (0.1, 300.0));
    }

    #[test]
    fn test_escape_requests_exit() {
        let mut s = state();
        let command = s.handle_input(&InputEvent::KeyPressed {
            key_code: KeyCode::Escape,
        });
        assert_eq!(command, StateCommand::Exit);
    }

    #[test]
    fn test_toggles() {
        let mut s = state();
        for key_code in [KeyCode::KeyV, KeyCode::KeyL, KeyCode::KeyC] {
            s.handle_input(&InputEvent::KeyPressed { key_code });
        }
        assert_eq!(s.debug_view, DebugView::Depth);
        assert!(s.animator.enabled);
        assert!(s.culling_check_pending);
    }
}
