// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_bvh --heading-base-level=0

//! Understory BVH: a dynamic 3D bounding volume hierarchy.
//!
//! Understory BVH is a broad-phase building block: it answers "which objects overlap
//! this region" ahead of exact collision or ray tests, and it is maintained
//! incrementally instead of being rebuilt after every change.
//!
//! - Create leaves with a volume and a payload, then insert and remove them at will.
//! - Query every member leaf overlapping an axis-aligned box.
//! - Internal nodes always bound exactly the union of their two children.
//!
//! Vectors come from [`glam`]: [`BvhF32`] stores `Vec3` boxes and [`BvhF64`] stores
//! `DVec3` boxes. Volumes and insertion costs are accumulated in `f64`.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use understory_bvh::{Aabb3D, BvhF32};
//!
//! let mut bvh: BvhF32<&str> = BvhF32::new();
//! let crate_box = bvh.create_leaf(Aabb3D::new(Vec3::ZERO, Vec3::ONE), "crate");
//! let barrel = bvh.create_leaf(Aabb3D::new(Vec3::splat(5.0), Vec3::splat(6.0)), "barrel");
//! bvh.insert(crate_box);
//! bvh.insert(barrel);
//!
//! let query = Aabb3D::new(Vec3::splat(0.5), Vec3::splat(2.0));
//! let hits: Vec<_> = bvh.intersect(query).map(|(_, name)| *name).collect();
//! assert_eq!(hits, ["crate"]);
//!
//! // Moving an object means removing it and inserting a fresh leaf.
//! bvh.release(crate_box);
//! let moved = bvh.create_leaf(Aabb3D::new(Vec3::splat(1.5), Vec3::splat(2.5)), "crate");
//! bvh.insert(moved);
//! assert_eq!(bvh.len(), 2);
//! ```
//!
//! ## Insertion
//!
//! A new leaf is paired with the existing node `N` that minimizes
//! `vol(N ∪ leaf)` plus the volume every ancestor of `N` gains by admitting the leaf.
//! The candidate is found by a branch-and-bound walk from the root that skips the
//! children of any node already costlier than the best so far; on equal cost the
//! node visited last (usually the deeper one) wins. The new internal node takes the
//! sibling's place, and the ancestors are refit on the way up.
//! The hierarchy makes no height guarantee.
//!
//! ## Membership
//!
//! Inserting a current member and removing a non-member are no-ops that return
//! `false`. [`Bvh::validate`] checks every structural invariant and is meant for
//! tests and debugging.
//!
//! ### Float semantics
//!
//! Boxes are not validated: an inverted box has a negative volume and only makes
//! placement worse. NaN coordinates never overlap anything.

#![no_std]

extern crate alloc;

pub mod error;
mod node;
mod search;
pub mod tree;
pub mod types;

pub use error::Violation;
pub use node::LeafId;
pub use tree::{Bvh, BvhF32, BvhF64, Overlaps};
pub use types::{Aabb3D, Aabb3F32, Aabb3F64, Vector3};
