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

//! Geometric primitives used by light placement and tile culling.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// An axis-aligned box, used to bound the region lights are scattered in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from two corner points, in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns the size of the box along each axis.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns `true` when `p` lies inside the box or on its faces.
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

/// A plane in Hessian normal form: every point `p` on it satisfies `normal · p = distance`.
///
/// The signed distance of a point is positive on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// The unit normal of the plane.
    pub normal: Vec3,
    /// The plane offset along `normal`.
    pub distance: f32,
}

impl Plane {
    /// Builds a plane from a normal (normalized here) and an offset.
    #[inline]
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Builds the plane through `a`, `b` and the origin, with the normal `a × b`.
    #[inline]
    pub fn through_origin(a: Vec3, b: Vec3) -> Self {
        Self::new(a.cross(b), 0.0)
    }

    /// Returns the same plane with its orientation reversed.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Signed distance from `p` to the plane.
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.distance
    }

    /// Returns `true` unless a sphere lies entirely on the negative side.
    ///
    /// Tangency counts as intersecting.
    #[inline]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.signed_distance(center) >= -radius
    }
}
