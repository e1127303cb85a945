// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad phase with moving bodies.
//!
//! Each frame, bodies that moved are taken out of the hierarchy and reinserted with
//! a fresh leaf, then candidate pairs are collected by querying each body's box.
//!
//! Run:
//! - `cargo run -p understory_bvh_demos --example bvh_broad_phase`

use glam::Vec3;
use understory_bvh::{Aabb3D, Aabb3F32, BvhF32, LeafId};

struct Body {
    position: Vec3,
    velocity: Vec3,
    half: Vec3,
    leaf: LeafId,
}

impl Body {
    fn bounds(&self) -> Aabb3F32 {
        Aabb3D::from_center_half_extents(self.position, self.half)
    }
}

fn main() {
    env_logger::init();

    let mut bvh: BvhF32<usize> = BvhF32::with_capacity(8);
    let mut bodies: Vec<Body> = (0..8_usize)
        .map(|i| {
            let t = i as f32;
            let position = Vec3::new(t * 3.0, (t * 0.7).sin() * 2.0, 0.0);
            let velocity = Vec3::new(if i % 2 == 0 { 0.5 } else { -0.5 }, 0.0, 0.1 * t);
            let half = Vec3::splat(0.75);
            let leaf = bvh.create_leaf(Aabb3D::from_center_half_extents(position, half), i);
            bvh.insert(leaf);
            Body {
                position,
                velocity,
                half,
                leaf,
            }
        })
        .collect();

    for frame in 0..5 {
        for (i, body) in bodies.iter_mut().enumerate() {
            body.position += body.velocity;
            bvh.release(body.leaf);
            body.leaf = bvh.create_leaf(body.bounds(), i);
            bvh.insert(body.leaf);
        }

        let mut pairs = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            for (_, &other) in bvh.intersect(body.bounds()) {
                if other > i {
                    pairs.push((i, other));
                }
            }
        }
        pairs.sort_unstable();
        println!(
            "frame {frame}: {} bodies, height {}, candidate pairs {:?}",
            bvh.len(),
            bvh.height(),
            pairs
        );
    }
}
