//! Benchmarks for the plane-stress solver

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fea2d::prelude::*;

fn grid_node(nx: usize, i: usize, j: usize) -> usize {
    j * (nx + 1) + i + 1
}

fn create_clamped_grid_model(nx: usize, ny: usize, scheme: QuadratureScheme) -> FeModel {
    let mut mesh = Mesh::new();

    for j in 0..=ny {
        for i in 0..=nx {
            mesh.add_node(grid_node(nx, i, j), i as f64, j as f64, 0.0);
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            mesh.add_quad(
                j * nx + i + 1,
                [
                    grid_node(nx, i, j),
                    grid_node(nx, i + 1, j),
                    grid_node(nx, i + 1, j + 1),
                    grid_node(nx, i, j + 1),
                ],
            );
        }
    }
    let left: Vec<usize> = (0..=ny).map(|j| grid_node(nx, 0, j)).collect();
    mesh.add_group("clamped_edge", left);
    mesh.add_group("load_tip", vec![grid_node(nx, nx, ny)]);

    let mut model = FeModel::new(mesh, Material::steel(), 1.0, scheme).unwrap();
    model
        .add_condition(BoundaryCondition::fixed("clamped_edge"))
        .unwrap();
    model
        .add_condition(BoundaryCondition::point_load(
            "load_tip",
            DofComponent::V,
            -1000.0,
        ))
        .unwrap();
    model
}

fn benchmark_assembly(c: &mut Criterion) {
    let model = create_clamped_grid_model(20, 20, QuadratureScheme::FourPoint);
    c.bench_function("assemble_20x20_four_point", |b| {
        b.iter(|| {
            let system = model.assemble().unwrap();
            black_box(&system);
        })
    });

    let model = create_clamped_grid_model(20, 20, QuadratureScheme::NinePoint);
    c.bench_function("assemble_20x20_nine_point", |b| {
        b.iter(|| {
            let system = model.assemble().unwrap();
            black_box(&system);
        })
    });
}

fn benchmark_small_grid(c: &mut Criterion) {
    c.bench_function("solve_10x10_static", |b| {
        b.iter(|| {
            let mut model = create_clamped_grid_model(10, 10, QuadratureScheme::FourPoint);
            model.analyze_default().unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_medium_grid(c: &mut Criterion) {
    c.bench_function("solve_30x30_static", |b| {
        b.iter(|| {
            let mut model = create_clamped_grid_model(30, 30, QuadratureScheme::FourPoint);
            model.analyze_default().unwrap();
            black_box(&model);
        })
    });
}

criterion_group!(
    benches,
    benchmark_assembly,
    benchmark_small_grid,
    benchmark_medium_grid,
);

criterion_main!(benches);
