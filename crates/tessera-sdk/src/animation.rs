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

//! Optional per-frame light motion.

use tessera_core::math::Aabb;
use tessera_core::renderer::PointLight;

/// Moves every light vertically at a constant speed, wrapping around the
/// light bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightAnimator {
    /// World units per second along `y`. Negative moves down.
    pub speed: f32,
    /// Whether [`step`](Self::step) does anything.
    pub enabled: bool,
}

impl LightAnimator {
    /// Creates an animator.
    pub fn new(speed: f32, enabled: bool) -> Self {
        Self { speed, enabled }
    }

    /// Advances `lights` by `dt` seconds. Returns whether anything moved.
    ///
    /// A light leaving the bottom of `bounds` re-enters at the top, and the
    /// other way round.
    pub fn step(&self, lights: &mut [PointLight], bounds: &Aabb, dt: f32) -> bool {
        if !self.enabled || self.speed == 0.0 || dt <= 0.0 || lights.is_empty() {
            return false;
        }
        let delta = self.speed * dt;
        for light in lights.iter_mut() {
            let y = light.position.y + delta;
            light.position.y = if y < bounds.min.y {
                bounds.max.y
            } else if y > bounds.max.y {
                bounds.min.y
            } else {
                y
            };
        }
        true
    }
}

impl Default for LightAnimator {
    fn default() -> Self {
        Self::new(-0.6, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessera_core::math::Vec3;

    fn bounds() -> Aabb {
        Aabb::from_min_max(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 10.0, 1.0))
    }

    fn light_at(y: f32) -> PointLight {
        PointLight::new(Vec3::new(0.0, y, 0.0), Vec3::ONE, 1.0)
    }

    #[test]
    fn test_disabled_animator_is_inert() {
        let mut lights = [light_at(5.0)];
        assert!(!LightAnimator::new(-1.0, false).step(&mut lights, &bounds(), 1.0));
        assert_eq!(lights[0].position.y, 5.0);
    }

    #[test]
    fn test_moves_by_speed_times_dt() {
        let mut lights = [light_at(5.0), light_at(2.0)];
        assert!(LightAnimator::new(-2.0, true).step(&mut lights, &bounds(), 0.5));
        assert_relative_eq!(lights[0].position.y, 4.0);
        assert_relative_eq!(lights[1].position.y, 1.0);
    }

    #[test]
    fn test_wraps_below_min_to_max() {
        let mut lights = [light_at(0.2)];
        LightAnimator::new(-1.0, true).step(&mut lights, &bounds(), 1.0);
        assert_eq!(lights[0].position.y, 10.0);
    }

    #[test]
    fn test_wraps_above_max_to_min() {
        let mut lights = [light_at(9.5)];
        LightAnimator::new(1.0, true).step(&mut lights, &bounds(), 1.0);
        assert_eq!(lights[0].position.y, 0.0);
    }
}
