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

//! Graphics adapter selection with fallback support.
//!
//! The first attempt asks for a high-performance adapter compatible with the
//! target surface; when none is found, a software fallback adapter is requested
//! so the renderer can still start on machines without a usable GPU driver.

use anyhow::{anyhow, Result};
use std::time::Instant;
use wgpu::{Adapter, Backend, Instance, RequestAdapterOptions};

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        Backend::Noop => "No-op",
    }
}

/// Requests an adapter, preferring hardware and falling back to software.
///
/// `compatible_surface` is `None` for headless use.
pub async fn request_adapter(
    instance: &Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<Adapter> {
    let start_time = Instant::now();
    log::info!("Starting WGPU adapter selection...");

    for force_fallback_adapter in [false, true] {
        match instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter,
            })
            .await
        {
            Ok(adapter) => {
                let info = adapter.get_info();
                log::info!(
                    "Selected adapter \"{}\" on {} ({:?}) in {} ms.",
                    info.name,
                    backend_name(info.backend),
                    info.device_type,
                    start_time.elapsed().as_millis()
                );
                return Ok(adapter);
            }
            Err(e) => {
                log::warn!(
                    "No adapter found (force_fallback_adapter = {force_fallback_adapter}): {e}"
                );
            }
        }
    }

    Err(anyhow!("No suitable graphics adapter found."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_function() {
        assert_eq!(backend_name(Backend::Vulkan), "Vulkan");
        assert_eq!(backend_name(Backend::Metal), "Metal");
        assert_eq!(backend_name(Backend::Dx12), "DirectX 12");
        assert_eq!(backend_name(Backend::Gl), "OpenGL");
    }
}
