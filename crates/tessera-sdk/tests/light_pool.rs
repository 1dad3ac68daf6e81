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

mod common;

use common::RecordingDevice;
use tessera_core::math::{Aabb, Vec3};
use tessera_core::renderer::GraphicsDevice;
use tessera_sdk::light_pool::GPU_LIGHT_SIZE;
use tessera_sdk::LightPool;

fn bounds() -> Aabb {
    Aabb::from_min_max(Vec3::new(-10.0, 0.0, -10.0), Vec3::new(10.0, 5.0, 10.0))
}

#[test]
fn test_allocate_sizes_storage_for_capacity() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let buffer = pool.allocate(&device, 1024).unwrap();

    assert_eq!(pool.buffer(), Some(buffer));
    assert_eq!(pool.capacity(), 1024);
    assert_eq!(
        device.buffer_len(buffer),
        Some(1024 * GPU_LIGHT_SIZE as usize)
    );
}

#[test]
fn test_zero_capacity_still_allocates_a_slot() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let buffer = pool.allocate(&device, 0).unwrap();
    assert_eq!(device.buffer_len(buffer), Some(GPU_LIGHT_SIZE as usize));
}

#[test]
fn test_reallocate_releases_previous_buffer() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let first = pool.allocate(&device, 8).unwrap();
    let second = pool.allocate(&device, 16).unwrap();
    assert_ne!(first, second);
    assert!(device.is_destroyed(first));
}

#[test]
fn test_initialize_without_storage_is_a_no_op() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let written = pool
        .initialize(&device, 32, &bounds(), 30.0, Some(1))
        .unwrap();
    assert_eq!(written, 0);
    assert!(pool.is_empty());
}

#[test]
fn test_initialize_uploads_every_light() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let buffer = pool.allocate(&device, 64).unwrap();
    let written = pool
        .initialize(&device, 10, &bounds(), 30.0, Some(42))
        .unwrap();
    assert_eq!(written, 10);
    assert_eq!(pool.len(), 10);

    let bytes = device.buffer_bytes(buffer);
    let uploaded = &bytes[..10 * GPU_LIGHT_SIZE as usize];
    assert!(uploaded.iter().any(|b| *b != 0));
    assert!(bytes[10 * GPU_LIGHT_SIZE as usize..].iter().all(|b| *b == 0));

    for light in pool.lights() {
        assert!(bounds().contains_point(light.position));
        assert_eq!(light.radius, 30.0);
    }
}

#[test]
fn test_same_seed_gives_same_lights() {
    let device = RecordingDevice::default();
    let mut a = LightPool::new();
    let mut b = LightPool::new();
    a.allocate(&device, 8).unwrap();
    b.allocate(&device, 8).unwrap();
    a.initialize(&device, 8, &bounds(), 5.0, Some(9)).unwrap();
    b.initialize(&device, 8, &bounds(), 5.0, Some(9)).unwrap();
    assert_eq!(a.lights(), b.lights());
}

#[test]
fn test_count_above_capacity_is_clamped() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    pool.allocate(&device, 4).unwrap();
    let written = pool
        .initialize(&device, 100, &bounds(), 30.0, Some(3))
        .unwrap();
    assert_eq!(written, 4);
    assert_eq!(pool.len(), 4);
}

#[test]
fn test_upload_after_edit_rewrites_buffer() {
    let device = RecordingDevice::default();
    let mut pool = LightPool::new();
    let buffer = pool.allocate(&device, 2).unwrap();
    pool.initialize(&device, 2, &bounds(), 30.0, Some(5)).unwrap();
    let before = device.buffer_bytes(buffer);

    pool.lights_mut()[1].position = Vec3::new(1.0, 2.0, 3.0);
    pool.upload(&device).unwrap();
    let after = device.buffer_bytes(buffer);
    assert_eq!(before[..GPU_LIGHT_SIZE as usize], after[..GPU_LIGHT_SIZE as usize]);
    assert_ne!(before[GPU_LIGHT_SIZE as usize..], after[GPU_LIGHT_SIZE as usize..]);
}
