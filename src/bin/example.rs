//! fea2d example - Cantilevered Plate Strip

use fea2d::prelude::*;

fn main() {
    println!("=== fea2d example: Cantilevered Strip ===\n");

    // A 4x1 strip of unit quads, clamped on the left edge and pulled
    // down at the free corner:
    //
    //   N6----N7----N8----N9----N10  <- load at N10
    //   |  1  |  2  |  3  |  4  |
    //   N1----N2----N3----N4----N5
    //   ^
    // clamped

    let mut mesh = Mesh::new();
    for i in 0..5usize {
        mesh.add_node(i + 1, i as f64, 0.0, 0.0);
        mesh.add_node(i + 6, i as f64, 1.0, 0.0);
    }
    for e in 0..4usize {
        mesh.add_quad(e + 1, [e + 1, e + 2, e + 7, e + 6]);
    }
    mesh.add_group("clamped_edge", vec![1, 6]);
    mesh.add_group("load_tip", vec![10]);

    // Quarter-inch steel plate
    let material = Material::steel();
    println!("Material:\n{material}");

    let mut model = FeModel::new(mesh, material, 0.25, QuadratureScheme::FourPoint)
        .expect("Failed to build model");

    model
        .add_condition(BoundaryCondition::fixed("clamped_edge"))
        .expect("Failed to add support");
    model
        .add_condition(BoundaryCondition::point_load(
            "load_tip",
            DofComponent::V,
            -1000.0,
        ))
        .expect("Failed to add load");

    println!("Running linear analysis...\n");
    model.analyze_default().expect("Analysis failed");

    let field = model.displacements().unwrap();
    println!("Node Displacements:");
    for id in 1..=model.mesh().n_nodes() {
        let (u, v) = field.node(id);
        println!("  N{id}: u={u:.6e}, v={v:.6e}");
    }

    let report = model.report().unwrap();
    println!(
        "\nSolved in {} iterations, residual {:.3e}",
        report.iterations, report.residual
    );
    println!(
        "Max displacement: {:.6e} at node {}",
        field.max_magnitude(),
        field.max_node().unwrap()
    );

    println!("\n=== Analysis Complete ===");
}
