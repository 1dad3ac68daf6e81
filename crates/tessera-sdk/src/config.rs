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

//! Renderer configuration, read from a RON file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tessera_core::math::{Aabb, LinearRgba, Vec3};

/// What the last pass of a frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebugView {
    /// The lit scene.
    #[default]
    Shaded,
    /// The prepass depth, linearized to grey.
    Depth,
}

impl DebugView {
    /// The other view.
    pub fn toggled(self) -> Self {
        match self {
            Self::Shaded => Self::Depth,
            Self::Depth => Self::Shaded,
        }
    }
}

/// Every tunable of a renderer session.
///
/// Missing fields take their default, so a file only lists what it changes:
///
/// ```text
/// (
///     light_count: 4096,
///     model_path: Some("assets/sponza/sponza.obj"),
///     debug_view: Depth,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Initial window width in pixels.
    pub window_width: u32,
    /// Initial window height in pixels.
    pub window_height: u32,
    /// Window title.
    pub title: String,
    /// Number of point lights, fixed for the session.
    pub light_count: u32,
    /// Box the lights are scattered in.
    pub light_bounds: Aabb,
    /// Radius shared by every light.
    pub light_radius: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Vertical field of view.
    pub fov_y_degrees: f32,
    /// Camera start position.
    pub camera_position: Vec3,
    /// Camera start yaw in degrees; -90 looks down -Z.
    pub camera_yaw: f32,
    /// Camera start pitch in degrees.
    pub camera_pitch: f32,
    /// Camera movement speed in world units per second.
    pub camera_speed: f32,
    /// Degrees of rotation per unit of mouse motion.
    pub mouse_sensitivity: f32,
    /// OBJ file to render. Without one a ground plane is shown.
    pub model_path: Option<PathBuf>,
    /// Uniform scale applied to the model.
    pub model_scale: f32,
    /// Whether lights drift vertically.
    pub animate_lights: bool,
    /// Vertical drift in world units per second.
    pub animation_speed: f32,
    /// Initial debug view.
    pub debug_view: DebugView,
    /// Read the visible-index buffer back after the first frame and log it.
    pub culling_check: bool,
    /// Seed for light placement; random when absent.
    pub rng_seed: Option<u64>,
    /// Color the target is cleared to.
    pub clear_color: LinearRgba,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_width: 1080,
            window_height: 720,
            title: "Tessera - Forward+".to_string(),
            light_count: 1024,
            light_bounds: Aabb::from_min_max(
                Vec3::new(-135.0, -20.0, -60.0),
                Vec3::new(135.0, 170.0, 60.0),
            ),
            light_radius: 30.0,
            near: 0.1,
            far: 300.0,
            fov_y_degrees: 45.0,
            camera_position: Vec3::new(-40.0, 10.0, 0.0),
            camera_yaw: -90.0,
            camera_pitch: 0.0,
            camera_speed: 50.0,
            mouse_sensitivity: 0.25,
            model_path: None,
            model_scale: 0.1,
            animate_lights: false,
            animation_speed: -0.6,
            debug_view: DebugView::Shaded,
            culling_check: false,
            rng_seed: None,
            clear_color: LinearRgba::BLACK,
        }
    }
}

impl RendererConfig {
    /// Parses a RON document and validates it.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).context("Invalid renderer configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the RON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_ron_str(&source)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        log::info!("RendererConfig: Loaded {}", path.display());
        Ok(config)
    }

    /// Rejects values no frame can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.window_width == 0 || self.window_height == 0 {
            bail!(
                "window size must be non-zero, got {}x{}",
                self.window_width,
                self.window_height
            );
        }
        if !(self.near > 0.0 && self.far > self.near) {
            bail!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near,
                self.far
            );
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            bail!("fov_y_degrees must be in (0, 180), got {}", self.fov_y_degrees);
        }
        if self.light_radius < 0.0 {
            bail!("light_radius must not be negative, got {}", self.light_radius);
        }
        if self.model_scale <= 0.0 {
            bail!("model_scale must be positive, got {}", self.model_scale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = RendererConfig::from_ron_str("()").unwrap();
        assert_eq!(config, RendererConfig::default());
        assert_eq!((config.window_width, config.window_height), (1080, 720));
        assert_eq!(config.light_count, 1024);
        assert_eq!(config.light_bounds.min, Vec3::new(-135.0, -20.0, -60.0));
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config = RendererConfig::from_ron_str(
            r#"(
                light_count: 16,
                light_bounds: (min: (x: -1.0, y: -1.0, z: -1.0), max: (x: 1.0, y: 1.0, z: 1.0)),
                model_path: Some("scene/room.obj"),
                debug_view: Depth,
                rng_seed: Some(7),
            )"#,
        )
        .unwrap();
        assert_eq!(config.light_count, 16);
        assert_eq!(config.light_bounds.max, Vec3::ONE);
        assert_eq!(config.model_path, Some(PathBuf::from("scene/room.obj")));
        assert_eq!(config.debug_view, DebugView::Depth);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.far, 300.0);
    }

    #[test]
    fn test_invalid_planes_are_rejected() {
        let err = RendererConfig::from_ron_str("(near: 5.0, far: 1.0)").unwrap_err();
        assert!(format!("{err:#}").contains("near < far"));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(RendererConfig::from_ron_str("(light_count: \"many\")").is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RendererConfig::load(dir.path().join("absent.ron")).unwrap_err();
        assert!(err.to_string().contains("absent.ron"));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(light_count: 3, animate_lights: true)").unwrap();
        let config = RendererConfig::load(file.path()).unwrap();
        assert_eq!(config.light_count, 3);
        assert!(config.animate_lights);
    }

    #[test]
    fn test_debug_view_toggles() {
        assert_eq!(DebugView::Shaded.toggled(), DebugView::Depth);
        assert_eq!(DebugView::Depth.toggled(), DebugView::Shaded);
    }
}
