// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_bvh::{Aabb3D, Aabb3F32, BvhF32};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_grid_boxes(n: usize, cell: f32) -> Vec<Aabb3F32> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Vec3::new(x as f32, y as f32, z as f32) * cell;
                out.push(Aabb3D::new(min, min + Vec3::splat(cell)));
            }
        }
    }
    out
}

fn to_rstar_boxes(v: &[Aabb3F32]) -> Vec<Rectangle<[f32; 3]>> {
    v.iter()
        .map(|b| Rectangle::from_corners(b.min.to_array(), b.max.to_array()))
        .collect()
}

fn bench_rtree_external_compare_f32(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_f32");
    for &n in &[12usize, 16] {
        let boxes = gen_grid_boxes(n, 10.0);
        let query = Aabb3D::new(Vec3::splat(30.0), Vec3::splat(90.0));
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_function(format!("understory_bvh_build_query_n{}", n), |b| {
            b.iter_batched(
                || BvhF32::<u32>::with_capacity(boxes.len()),
                |mut bvh| {
                    for (i, r) in boxes.iter().copied().enumerate() {
                        let id = bvh.create_leaf(r, i as u32);
                        bvh.insert(id);
                    }
                    let hits: usize = bvh.intersect(query).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_boxes(&boxes),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(query.min.to_array(), query.max.to_array());
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rtree_external_compare_f32);
criterion_main!(benches);
