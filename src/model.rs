//! Plane-stress model container and analysis driver

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::assembly::{Assembler, BoundaryCondition, GlobalSystem};
use crate::error::{FeaError, FeaResult};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::quadrature::{QuadratureRule, QuadratureScheme};
use crate::results::DisplacementField;
use crate::solver::{solve, SolveReport};
use crate::math::{ElementGeometry, ElementStiffness};

/// Iteration control for the linear solve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Convergence tolerance, relative to the load norm
    pub tolerance: f64,
    /// Iteration cap for the conjugate-gradient solve
    pub max_iterations: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 10_000,
        }
    }
}

impl AnalysisOptions {
    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }
}

/// The main 2D plane-stress finite element model
///
/// Bundles a validated mesh with the material, thickness and quadrature
/// choice, collects boundary conditions, and drives the assemble/solve
/// pipeline. Results stay attached to the model after [`FeModel::analyze`].
pub struct FeModel {
    mesh: Mesh,
    material: Material,
    thickness: f64,
    scheme: QuadratureScheme,
    conditions: Vec<BoundaryCondition>,
    displacements: Option<DisplacementField>,
    report: Option<SolveReport>,
}

impl FeModel {
    /// Create a model, validating the mesh and the thickness
    pub fn new(
        mut mesh: Mesh,
        material: Material,
        thickness: f64,
        scheme: QuadratureScheme,
    ) -> FeaResult<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(FeaError::InvalidThickness(thickness));
        }
        mesh.validate()?;
        Ok(Self {
            mesh,
            material,
            thickness,
            scheme,
            conditions: Vec::new(),
            displacements: None,
            report: None,
        })
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Attach a boundary condition
    ///
    /// The condition's node group must exist in the mesh. Any previous
    /// solution is discarded.
    pub fn add_condition(&mut self, condition: BoundaryCondition) -> FeaResult<()> {
        self.mesh.group(condition.group())?;
        self.conditions.push(condition);
        self.displacements = None;
        self.report = None;
        Ok(())
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn scheme(&self) -> QuadratureScheme {
        self.scheme
    }

    pub fn conditions(&self) -> &[BoundaryCondition] {
        &self.conditions
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Integrate every element and build the constrained global system
    ///
    /// Used by [`FeModel::analyze`] and available on its own for dumping or
    /// inspecting the assembled matrix.
    pub fn assemble(&self) -> FeaResult<GlobalSystem> {
        let rule = QuadratureRule::new(self.scheme);
        let mut assembler = Assembler::new(self.mesh.n_nodes());

        let mut total_area = 0.0;
        for element in self.mesh.elements() {
            let coords = self.mesh.element_coords(element)?;
            let geom = ElementGeometry::new(&rule, element.id, &coords)?;
            total_area += geom.area();
            let ke = ElementStiffness::new(
                &geom,
                &element.nodes,
                self.material.constitutive(),
                self.thickness,
            );
            assembler.scatter(&ke)?;
        }
        debug!(
            "integrated {} elements with {}, total area {:.6e}",
            self.mesh.n_elements(),
            rule.scheme(),
            total_area
        );

        for condition in &self.conditions {
            assembler.apply(&self.mesh, condition)?;
        }
        assembler.finalize()
    }

    /// Run the linear static analysis
    ///
    /// Assembles the global system and solves it with conjugate gradients.
    /// A solve that misses the tolerance (or breaks down) is retried once at
    /// a hundred times the tolerance before the analysis is abandoned.
    pub fn analyze(&mut self, options: AnalysisOptions) -> FeaResult<()> {
        info!(
            "analysis start: {} nodes, {} elements, {}",
            self.mesh.n_nodes(),
            self.mesh.n_elements(),
            self.scheme
        );

        let system = self.assemble()?;

        let report = match solve(
            &system.matrix,
            &system.load,
            options.tolerance,
            options.max_iterations,
        ) {
            Ok(report) if report.converged => report,
            Ok(report) => {
                info!(
                    "solve stopped at residual {:.3e} after {} iterations, retrying relaxed",
                    report.residual, report.iterations
                );
                self.retry_solve(&system, options)?
            }
            Err(FeaError::SolverBreakdown) => {
                info!("solver breakdown, retrying relaxed");
                self.retry_solve(&system, options)?
            }
            Err(e) => return Err(e),
        };

        let field = DisplacementField::from_vector(&report.displacements, self.mesh.n_nodes());
        info!(
            "analysis complete: {} iterations, residual {:.3e}, max displacement {:.6e}",
            report.iterations,
            report.residual,
            field.max_magnitude()
        );

        self.displacements = Some(field);
        self.report = Some(report);
        Ok(())
    }

    /// Run the analysis with default options
    pub fn analyze_default(&mut self) -> FeaResult<()> {
        self.analyze(AnalysisOptions::default())
    }

    fn retry_solve(&self, system: &GlobalSystem, options: AnalysisOptions) -> FeaResult<SolveReport> {
        let relaxed = options.tolerance * 100.0;
        let report = solve(&system.matrix, &system.load, relaxed, options.max_iterations)?;
        if report.converged {
            Ok(report)
        } else {
            Err(FeaError::ConvergenceFailed(report.iterations))
        }
    }

    // ========================
    // Result Access
    // ========================

    /// Solved displacement field
    pub fn displacements(&self) -> FeaResult<&DisplacementField> {
        self.displacements.as_ref().ok_or(FeaError::NotAnalyzed)
    }

    /// Diagnostics of the last solve
    pub fn report(&self) -> FeaResult<&SolveReport> {
        self.report.as_ref().ok_or(FeaError::NotAnalyzed)
    }
}

/// Material parameters of a job file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Young's modulus
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
}

/// Analysis job description loaded from JSON
///
/// ```json
/// {
///   "material": { "e": 3.0e7, "nu": 0.25 },
///   "thickness": 1.0,
///   "quadrature": "four_point",
///   "conditions": [
///     { "kind": "fixed", "group": "left_edge" },
///     { "kind": "point_load", "group": "load_tip", "component": "v", "value": -1000.0 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub material: MaterialConfig,
    pub thickness: f64,
    #[serde(default)]
    pub quadrature: QuadratureScheme,
    #[serde(default)]
    pub conditions: Vec<BoundaryCondition>,
    /// Convergence tolerance override
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Iteration cap override
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// Directory for result files
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl JobConfig {
    /// Read a job description from a JSON file
    pub fn from_file(path: &Path) -> FeaResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Analysis options with the file's overrides applied
    pub fn options(&self) -> AnalysisOptions {
        let mut options = AnalysisOptions::default();
        if let Some(tol) = self.tolerance {
            options = options.with_tolerance(tol);
        }
        if let Some(cap) = self.max_iterations {
            options = options.with_max_iter(cap);
        }
        options
    }

    /// Build a ready-to-analyze model around a mesh
    pub fn build_model(&self, mesh: Mesh) -> FeaResult<FeModel> {
        let material = Material::new(self.material.e, self.material.nu)?;
        let mut model = FeModel::new(mesh, material, self.thickness, self.quadrature)?;
        for condition in &self.conditions {
            model.add_condition(condition.clone())?;
        }
        Ok(model)
    }
}
