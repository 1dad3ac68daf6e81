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

//! First-person fly camera.

use std::collections::HashSet;

use tessera_core::math::{Mat4, Vec3};
use tessera_core::platform::input::{InputEvent, KeyCode};

/// Pitch limit in degrees, short of the poles where `look_at` degenerates.
pub const PITCH_LIMIT: f32 = 89.0;

/// A yaw/pitch camera driven by WASD and mouse motion.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Heading in degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Elevation in degrees, clamped to ±[`PITCH_LIMIT`].
    pub pitch: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per unit of mouse motion.
    pub sensitivity: f32,
    held: HashSet<KeyCode>,
}

impl Camera {
    /// Creates a camera at `position` facing `yaw`/`pitch`.
    pub fn new(position: Vec3, yaw: f32, pitch: f32, speed: f32, sensitivity: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            speed,
            sensitivity,
            held: HashSet::new(),
        }
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Unit vector to the camera's right, parallel to the ground.
    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y).unwrap_or_else(
            || {
                log::warn!("Camera: Degenerate orientation, using identity view");
                Mat4::IDENTITY
            },
        )
    }

    /// Feeds one input event. Returns whether the camera consumed it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::KeyPressed { key_code } if is_movement(*key_code) => {
                self.held.insert(*key_code);
                true
            }
            InputEvent::KeyReleased { key_code } if is_movement(*key_code) => {
                self.held.remove(key_code);
                true
            }
            InputEvent::MouseMotion { delta_x, delta_y } => {
                self.rotate(*delta_x, *delta_y);
                true
            }
            _ => false,
        }
    }

    /// Applies mouse motion. Moving the mouse up looks up.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves along the held directions for `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let mut direction = Vec3::ZERO;
        let (front, right) = (self.front(), self.right());
        for key in &self.held {
            direction += match key {
                KeyCode::KeyW => front,
                KeyCode::KeyS => -front,
                KeyCode::KeyD => right,
                KeyCode::KeyA => -right,
                KeyCode::Space | KeyCode::KeyE => Vec3::Y,
                KeyCode::ShiftLeft | KeyCode::KeyQ => -Vec3::Y,
                _ => Vec3::ZERO,
            };
        }
        self.position += direction.normalize() * (self.speed * dt);
    }
}

fn is_movement(key: KeyCode) -> bool {
    matches!(
        key,
        KeyCode::KeyW
            | KeyCode::KeyA
            | KeyCode::KeyS
            | KeyCode::KeyD
            | KeyCode::KeyQ
            | KeyCode::KeyE
            | KeyCode::Space
            | KeyCode::ShiftLeft
    )
}
