//! Command-line driver: mesh and job file in, displacement files out

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};

use fea2d::mesh::Mesh;
use fea2d::model::JobConfig;
use fea2d::output;

fn usage() -> ! {
    println!("usage: fea2d <mesh_file> <job_json> [--dump-system]");
    println!();
    println!("  mesh_file      text mesh with #Nodes/#Elements/#NamedSelection sections");
    println!("  job_json       material, thickness, quadrature and boundary conditions");
    println!("  --dump-system  also write Mat_K.m / Mat_F.m next to the results");
    process::exit(1)
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut dump_system = false;
    let mut paths = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "--dump-system" => dump_system = true,
            "-h" | "--help" => usage(),
            other => paths.push(other.to_string()),
        }
    }
    if paths.len() != 2 {
        usage();
    }

    let mesh_path = Path::new(&paths[0]);
    let job_path = Path::new(&paths[1]);

    let mesh = Mesh::from_file(mesh_path)
        .with_context(|| format!("failed to read mesh {}", mesh_path.display()))?;
    let job = JobConfig::from_file(job_path)
        .with_context(|| format!("failed to read job {}", job_path.display()))?;

    println!(
        "fea2d: {} nodes, {} elements, {} conditions",
        mesh.n_nodes(),
        mesh.n_elements(),
        job.conditions.len()
    );

    let out_dir: PathBuf = job.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut model = job.build_model(mesh)?;

    if dump_system {
        let system = model.assemble()?;
        output::write_matrix_matlab(&out_dir, "K", &system.dense())?;
        output::write_vector_matlab(&out_dir, "F", &system.load)?;
        println!("wrote Mat_K.m and Mat_F.m to {}", out_dir.display());
    }

    model.analyze(job.options())?;

    let report = model.report()?;
    let field = model.displacements()?;
    let written = output::write_displacement_files(&out_dir, field)?;

    println!(
        "solved in {} iterations, residual {:.3e}",
        report.iterations, report.residual
    );
    if let Some(node) = field.max_node() {
        println!(
            "max displacement {:.6e} at node {}",
            field.max_magnitude(),
            node
        );
    }
    for path in written {
        println!("wrote {}", path.display());
    }

    Ok(())
}
