//! Benchmarks for frame rendering.
//!
//! Run with: cargo bench -p mesh-turntable

#![allow(missing_docs, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mesh_turntable::{render_orbit, render_turntable, OrbitConfig, TurntableConfig};
use mesh_types::{IndexedMesh, Vertex, VertexColor};

/// Coloured wavy sheet over an `n x n` grid.
fn create_sheet(n: u32) -> IndexedMesh {
    let mut mesh = IndexedMesh::new();
    for j in 0..n {
        for i in 0..n {
            let (x, y) = (f64::from(i) / f64::from(n), f64::from(j) / f64::from(n));
            let z = 0.1 * (x * 12.0).sin() * (y * 9.0).cos();
            let color = VertexColor::new((x * 255.0) as u8, (y * 255.0) as u8, 128);
            mesh.vertices.push(Vertex::from_coords(x, y, z).with_color(color));
        }
    }
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let a = j * n + i;
            mesh.faces.push([a, a + 1, a + n + 1]);
            mesh.faces.push([a, a + n + 1, a + n]);
        }
    }
    mesh
}

fn bench_turntable(c: &mut Criterion) {
    let mut group = c.benchmark_group("turntable");
    let config = TurntableConfig::default().with_frames(8).with_resolution(320, 240);

    for n in [20u32, 80] {
        let mesh = create_sheet(n);
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));
        group.bench_with_input(BenchmarkId::new("8_frames", n), &mesh, |b, mesh| {
            b.iter(|| render_turntable(black_box(mesh), &config));
        });
    }
    group.finish();
}

fn bench_orbit(c: &mut Criterion) {
    let mesh = create_sheet(50);
    let config = OrbitConfig::default().with_frames(8).with_resolution(320, 240);
    c.bench_function("orbit_8_frames", |b| {
        b.iter(|| render_orbit(black_box(&mesh), &config));
    });
}

criterion_group!(benches, bench_turntable, bench_orbit);
criterion_main!(benches);
