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

//! The session's point lights and their GPU storage buffer.

use std::borrow::Cow;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_core::math::{Aabb, Vec3};
use tessera_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GpuPointLight, GraphicsDevice, PointLight,
    ResourceError,
};

/// Byte size of one light in the storage buffer.
pub const GPU_LIGHT_SIZE: u64 = std::mem::size_of::<GpuPointLight>() as u64;

/// A fixed-capacity pool of point lights with a CPU mirror.
///
/// The culling and shading passes read the buffer at binding 0. Writes go
/// through the device queue, so they land before the next submitted frame and
/// never race a frame already in flight.
#[derive(Debug, Default)]
pub struct LightPool {
    lights: Vec<PointLight>,
    capacity: u32,
    buffer: Option<BufferId>,
}

impl LightPool {
    /// An empty pool with no GPU storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage for `capacity` lights, replacing any previous buffer.
    ///
    /// A zero capacity still allocates one slot, since empty storage buffers
    /// cannot be bound.
    pub fn allocate(
        &mut self,
        device: &dyn GraphicsDevice,
        capacity: u32,
    ) -> Result<BufferId, ResourceError> {
        if let Some(old) = self.buffer.take() {
            if let Err(e) = device.destroy_buffer(old) {
                log::warn!("LightPool: Failed to destroy previous buffer: {e}");
            }
        }
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("light_pool")),
            size: u64::from(capacity.max(1)) * GPU_LIGHT_SIZE,
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        log::debug!("LightPool: Allocated storage for {capacity} lights");
        self.capacity = capacity;
        self.lights.truncate(capacity as usize);
        self.buffer = Some(buffer);
        Ok(buffer)
    }

    /// Scatters `count` lights in `bounds`, seeded from `seed` or from entropy.
    ///
    /// See [`initialize_with_rng`](Self::initialize_with_rng).
    pub fn initialize(
        &mut self,
        device: &dyn GraphicsDevice,
        count: u32,
        bounds: &Aabb,
        radius: f32,
        seed: Option<u64>,
    ) -> Result<u32, ResourceError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.initialize_with_rng(device, count, bounds, radius, &mut rng)
    }

    /// Replaces the pool with `count` lights drawn uniformly inside `bounds`,
    /// each channel of their color in `[1, 2)`, all with `radius`, and uploads
    /// them.
    ///
    /// Without storage this is a no-op returning 0. A count above the capacity
    /// is clamped. Returns the number of lights written.
    pub fn initialize_with_rng<R: Rng>(
        &mut self,
        device: &dyn GraphicsDevice,
        count: u32,
        bounds: &Aabb,
        radius: f32,
        rng: &mut R,
    ) -> Result<u32, ResourceError> {
        if self.buffer.is_none() {
            log::warn!("LightPool: initialize called before allocate, ignoring");
            return Ok(0);
        }
        let count = if count > self.capacity {
            log::warn!(
                "LightPool: {count} lights requested, capacity is {}; clamping",
                self.capacity
            );
            self.capacity
        } else {
            count
        };

        self.lights = (0..count)
            .map(|_| random_light(rng, bounds, radius))
            .collect();
        self.upload(device)?;
        log::info!("LightPool: Initialized {count} lights (radius {radius})");
        Ok(count)
    }

    /// Writes the CPU mirror into the storage buffer. A no-op without storage.
    pub fn upload(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        let Some(buffer) = self.buffer else {
            return Ok(());
        };
        if self.lights.is_empty() {
            return Ok(());
        }
        let gpu: Vec<GpuPointLight> = self.lights.iter().map(GpuPointLight::from).collect();
        device.write_buffer(buffer, 0, bytemuck::cast_slice(&gpu))
    }

    /// The lights, in index order.
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Mutable access for animation. Call [`upload`](Self::upload) afterwards.
    pub fn lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.lights
    }

    /// Number of live lights, as passed to the culling pass.
    pub fn len(&self) -> u32 {
        self.lights.len() as u32
    }

    /// Whether the pool holds no light.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Lights the storage can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The storage buffer, once allocated.
    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    /// Releases the storage buffer.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if let Some(buffer) = self.buffer.take() {
            if let Err(e) = device.destroy_buffer(buffer) {
                log::warn!("LightPool: Failed to destroy buffer: {e}");
            }
        }
        self.capacity = 0;
        self.lights.clear();
    }
}

fn sample<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if lo < hi {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

fn random_light<R: Rng>(rng: &mut R, bounds: &Aabb, radius: f32) -> PointLight {
    let position = Vec3::new(
        sample(rng, bounds.min.x, bounds.max.x),
        sample(rng, bounds.min.y, bounds.max.y),
        sample(rng, bounds.min.z, bounds.max.z),
    );
    let color = Vec3::new(
        rng.gen_range(1.0..2.0),
        rng.gen_range(1.0..2.0),
        rng.gen_range(1.0..2.0),
    );
    PointLight::new(position, color, radius)
}
