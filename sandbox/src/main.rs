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

//! Tessera sandbox: flies a camera through a scene lit by a thousand point
//! lights, culled per screen tile.
//!
//! Controls: WASD / Q / E / Space / Shift move, the mouse looks around, `V`
//! toggles the depth view, `L` toggles light animation, `C` reads the tile
//! lists back once and logs a summary, `Escape` quits.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tessera_sdk::{DebugView, Renderer, RendererConfig};

#[derive(Parser, Debug)]
#[command(name = "sandbox")]
#[command(about = "Tiled forward+ light culling demo")]
struct Cli {
    /// RON configuration file; defaults apply to every field it omits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ model to render instead of the configured one
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Number of point lights
    #[arg(short, long)]
    lights: Option<u32>,

    /// Seed for light placement
    #[arg(long)]
    seed: Option<u64>,

    /// Start in the depth view
    #[arg(long)]
    depth_view: bool,

    /// Animate the lights from the first frame
    #[arg(long)]
    animate: bool,

    /// Read the first frame's tile lists back and log a summary
    #[arg(long)]
    culling_check: bool,
}

impl Cli {
    fn into_config(self) -> Result<RendererConfig> {
        let mut config = match &self.config {
            Some(path) => RendererConfig::load(path)?,
            None => RendererConfig::default(),
        };
        if let Some(model) = self.model {
            config.model_path = Some(model);
        }
        if let Some(lights) = self.lights {
            config.light_count = lights;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        if self.depth_view {
            config.debug_view = DebugView::Depth;
        }
        config.animate_lights |= self.animate;
        config.culling_check |= self.culling_check;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("naga", log::LevelFilter::Warn)
        .init();

    let config = Cli::parse().into_config()?;
    log::info!(
        "Sandbox: {} lights, model {}",
        config.light_count,
        config
            .model_path
            .as_deref()
            .map_or_else(|| "<ground plane>".to_string(), |p| p.display().to_string())
    );
    Renderer::run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "sandbox",
            "--lights",
            "64",
            "--seed",
            "3",
            "--depth-view",
            "--culling-check",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.light_count, 64);
        assert_eq!(config.rng_seed, Some(3));
        assert_eq!(config.debug_view, DebugView::Depth);
        assert!(config.culling_check);
        assert!(!config.animate_lights);
    }

    #[test]
    fn test_config_file_is_loaded_before_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(light_count: 10, animate_lights: true)").unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::parse_from(["sandbox", "--config", path, "--lights", "12"]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.light_count, 12);
        assert!(config.animate_lights);
    }

    #[test]
    fn test_bundled_config_parses() {
        let source = include_str!("../config/sponza.ron");
        let config = RendererConfig::from_ron_str(source).unwrap();
        assert_eq!(config.light_count, 1024);
        assert!(config.model_path.is_some());
    }
}
