// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::ops::{Add, Mul, Sub};

use glam::{DVec3, Vec3};

/// Vector abstraction for the 3D AABBs stored in a hierarchy.
///
/// Ordinary vector arithmetic (addition, negation, magnitude) is provided by the
/// vector type itself. This trait only exposes the handful of operations the
/// hierarchy needs, plus an associated widened accumulator type for volume and
/// insertion cost (f32→f64, f64→f64).
pub trait Vector3: Copy + PartialEq + Debug {
    /// Widened accumulator type suitable for volume/cost computations.
    type Acc: Copy
        + PartialOrd
        + Add<Output = Self::Acc>
        + Sub<Output = Self::Acc>
        + Mul<Output = Self::Acc>
        + Debug;

    /// Component-wise minimum.
    fn component_min(self, other: Self) -> Self;

    /// Component-wise maximum.
    fn component_max(self, other: Self) -> Self;

    /// Whether every component of `self` is `<=` the matching component of `other`.
    ///
    /// Any NaN component makes this false.
    fn all_le(self, other: Self) -> bool;

    /// Per-axis difference `self - other`, widened to the accumulator type.
    fn widened_delta(self, other: Self) -> [Self::Acc; 3];

    /// Zero value for the accumulator type.
    fn acc_zero() -> Self::Acc;
}

impl Vector3 for Vec3 {
    type Acc = f64;

    #[inline]
    fn component_min(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    fn component_max(self, other: Self) -> Self {
        self.max(other)
    }

    #[inline]
    fn all_le(self, other: Self) -> bool {
        self.cmple(other).all()
    }

    #[inline]
    fn widened_delta(self, other: Self) -> [Self::Acc; 3] {
        let d = self - other;
        [f64::from(d.x), f64::from(d.y), f64::from(d.z)]
    }

    #[inline]
    fn acc_zero() -> Self::Acc {
        0.0
    }
}

impl Vector3 for DVec3 {
    type Acc = f64;

    #[inline]
    fn component_min(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    fn component_max(self, other: Self) -> Self {
        self.max(other)
    }

    #[inline]
    fn all_le(self, other: Self) -> bool {
        self.cmple(other).all()
    }

    #[inline]
    fn widened_delta(self, other: Self) -> [Self::Acc; 3] {
        let d = self - other;
        [d.x, d.y, d.z]
    }

    #[inline]
    fn acc_zero() -> Self::Acc {
        0.0
    }
}

/// Helper alias for the widened accumulator type associated with a vector `V`.
pub type VectorAcc<V> = <V as Vector3>::Acc;

/// Axis-aligned bounding box in 3D.
///
/// Boxes are expected to be well formed (`min <= max` on every axis). This is not
/// validated: an inverted box reports a negative volume and surface area, which only
/// degrades placement quality inside a [`Bvh`](crate::Bvh).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3D<V> {
    /// Minimum corner.
    pub min: V,
    /// Maximum corner.
    pub max: V,
}

impl<V> Aabb3D<V> {
    /// Create a new AABB from min/max corners, stored as given.
    pub const fn new(min: V, max: V) -> Self {
        Self { min, max }
    }
}

impl<V: Vector3> Aabb3D<V> {
    /// Create the AABB spanned by two opposite corners given in any order.
    pub fn from_corners(a: V, b: V) -> Self {
        Self {
            min: a.component_min(b),
            max: a.component_max(b),
        }
    }

    /// The smallest AABB containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.component_min(other.min),
            max: self.max.component_max(other.max),
        }
    }

    /// Whether the two boxes overlap.
    ///
    /// On every axis, each box's minimum must not exceed the other's maximum, so boxes
    /// that only touch on a face, edge or corner overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.all_le(other.max) && other.min.all_le(self.max)
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Self) -> bool {
        self.min.all_le(other.min) && other.max.all_le(self.max)
    }

    /// Return true if the box is inverted on some axis. Assumes no NaN.
    pub fn is_inverted(&self) -> bool {
        !self.min.all_le(self.max)
    }

    /// Volume `dx * dy * dz` in the widened accumulator type.
    #[inline]
    pub fn volume(&self) -> VectorAcc<V> {
        let [dx, dy, dz] = self.max.widened_delta(self.min);
        dx * dy * dz
    }

    /// Surface area `2 * (dx * dy + dy * dz + dz * dx)` in the widened accumulator type.
    #[inline]
    pub fn surface_area(&self) -> VectorAcc<V> {
        let [dx, dy, dz] = self.max.widened_delta(self.min);
        let half = dx * dy + dy * dz + dz * dx;
        half + half
    }
}

impl<V: Vector3 + Add<Output = V> + Sub<Output = V>> Aabb3D<V> {
    /// Create an AABB from its center and half extents.
    pub fn from_center_half_extents(center: V, half: V) -> Self {
        Self::new(center - half, center + half)
    }
}

/// `a <= b`, false if the two are unordered (NaN).
pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

/// AABB with f32 coordinates and f64 metrics.
pub type Aabb3F32 = Aabb3D<Vec3>;

/// AABB with f64 coordinates and f64 metrics.
pub type Aabb3F64 = Aabb3D<DVec3>;
