// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_bvh::{Aabb3D, Aabb3F32, BvhF32, LeafId};

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

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
    fn next_vec3(&mut self) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32())
    }
}

fn gen_random_boxes(count: usize, world: f32, size: f32) -> Vec<Aabb3F32> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let min = rng.next_vec3() * (world - size).max(1.0);
            Aabb3D::new(min, min + Vec3::splat(size))
        })
        .collect()
}

fn gen_clustered_boxes(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<Aabb3F32> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let centers: Vec<Vec3> = (0..n_clusters).map(|_| rng.next_vec3() * 2000.0).collect();
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for c in centers {
        for _ in 0..per_cluster {
            let d = (rng.next_vec3() - Vec3::splat(0.5)) * spread;
            out.push(Aabb3D::from_center_half_extents(c + d, Vec3::splat(6.0)));
        }
    }
    out
}

fn build(boxes: &[Aabb3F32]) -> (BvhF32<u32>, Vec<LeafId>) {
    let mut bvh = BvhF32::with_capacity(boxes.len());
    let ids = boxes
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let id = bvh.create_leaf(*b, i as u32);
            bvh.insert(id);
            id
        })
        .collect();
    (bvh, ids)
}

fn bench_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_build_query");
    let query = Aabb3D::new(Vec3::splat(100.0), Vec3::splat(300.0));
    for &n in &[8usize, 12, 16] {
        let boxes = gen_grid_boxes(n, 25.0);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter_batched(
                || boxes.clone(),
                |boxes| {
                    let (bvh, _) = build(&boxes);
                    black_box(bvh.intersect(query).count());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let boxes = gen_random_boxes(2048, 2000.0, 12.0);
    group.bench_function("random_2048", |b| {
        b.iter(|| {
            let (bvh, _) = build(&boxes);
            black_box(bvh.intersect(query).count());
        })
    });
    let boxes = gen_clustered_boxes(16, 128, 80.0);
    group.bench_function("clustered_16x128", |b| {
        b.iter(|| {
            let (bvh, _) = build(&boxes);
            black_box(bvh.intersect(query).count());
        })
    });
    group.finish();
}

fn bench_query_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_query");
    let boxes = gen_random_boxes(4096, 2000.0, 12.0);
    let (bvh, _) = build(&boxes);
    let queries: Vec<_> = gen_random_boxes(64, 2000.0, 150.0);
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("random_4096_tree", |b| {
        b.iter(|| {
            let hits: usize = queries.iter().map(|q| bvh.intersect(*q).count()).sum();
            black_box(hits);
        })
    });
    group.bench_function("random_4096_linear_scan", |b| {
        b.iter(|| {
            let hits: usize = queries
                .iter()
                .map(|q| boxes.iter().filter(|b| b.overlaps(q)).count())
                .sum();
            black_box(hits);
        })
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_churn");
    let boxes = gen_random_boxes(2048, 2000.0, 12.0);
    group.throughput(Throughput::Elements((boxes.len() / 2) as u64));
    group.bench_function("remove_reinsert_half", |b| {
        b.iter_batched(
            || build(&boxes),
            |(mut bvh, ids)| {
                for id in ids.iter().step_by(2) {
                    bvh.remove(*id);
                }
                for id in ids.iter().step_by(2) {
                    bvh.insert(*id);
                }
                black_box(bvh.len());
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_build_query, bench_query_only, bench_churn);
criterion_main!(benches);
