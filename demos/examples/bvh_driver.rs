// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! BVH driver.
//!
//! Insert five boxes, dumping the tree after each, remove four of them in a
//! pseudo-random order, then query what is left.
//!
//! Run:
//! - `cargo run -p understory_bvh_demos --example bvh_driver`
//! - `RUST_LOG=trace cargo run -p understory_bvh_demos --example bvh_driver` to see every splice

use glam::Vec3;
use log::info;
use understory_bvh::{Aabb3D, BvhF32};

/// Seeded xorshift so runs are reproducible.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn main() {
    env_logger::init();

    let corners = [
        (Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0)),
        (Vec3::new(-2.0, -2.0, -2.0), Vec3::new(-1.0, -1.0, -1.0)),
        (Vec3::new(0.0, 2.0, -2.0), Vec3::new(1.0, 7.0, -1.0)),
        (Vec3::new(2.0, 1.0, 4.0), Vec3::new(3.0, 2.0, 4.0)),
        (Vec3::new(7.0, 2.0, -2.0), Vec3::new(11.0, 4.0, 0.0)),
    ];

    let mut bvh: BvhF32<usize> = BvhF32::new();
    let mut live = Vec::new();
    for (i, (min, max)) in corners.into_iter().enumerate() {
        let id = bvh.create_leaf(Aabb3D::new(min, max), i);
        bvh.insert(id);
        live.push(id);
        println!("{bvh}");
    }
    info!("built {bvh:?}, height {}", bvh.height());

    println!("----- Remove -----\n");
    let mut rng = Rng(0x5EED_0F_B0C5_u64);
    for _ in 0..4 {
        let pick = (rng.next_u64() % live.len() as u64) as usize;
        let id = live.swap_remove(pick);
        println!("removing box {}", bvh.payload(id).copied().unwrap_or_default());
        bvh.remove(id);
        println!("{bvh}");
    }
    if let Err(violation) = bvh.validate() {
        panic!("tree is broken: {violation}");
    }

    let query = Aabb3D::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 2.0));
    for (id, payload) in bvh.intersect(query) {
        let volume = bvh.volume(id).expect("hits are live leaves");
        println!("hit box {payload}: min {} max {}", volume.min, volume.max);
    }
}
