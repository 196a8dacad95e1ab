//! fea2d - A native Rust plane-stress finite element solver
//!
//! This library solves 2D linear-elastic plane-stress problems on meshes of
//! 4-node quadrilaterals:
//! - Isoparametric Quad4 elements with bilinear geometric mapping
//! - 2x2 or 3x3 Gauss integration
//! - Named node groups carrying fixed supports and point loads
//! - Jacobi-preconditioned conjugate-gradient solve of the global system
//!
//! ## Example
//! ```rust
//! use fea2d::prelude::*;
//!
//! // Build a one-element square plate
//! let mut mesh = Mesh::new();
//! mesh.add_node(1, 0.0, 0.0, 0.0);
//! mesh.add_node(2, 1.0, 0.0, 0.0);
//! mesh.add_node(3, 1.0, 1.0, 0.0);
//! mesh.add_node(4, 0.0, 1.0, 0.0);
//! mesh.add_quad(1, [1, 2, 3, 4]);
//! mesh.add_group("base", vec![1, 2]);
//! mesh.add_group("tip", vec![3]);
//!
//! // Steel plate, 0.5 thick, clamped at the base, pulled down at the tip
//! let material = Material::new(30.0e6, 0.25).unwrap();
//! let mut model = FeModel::new(mesh, material, 0.5, QuadratureScheme::FourPoint).unwrap();
//! model.add_condition(BoundaryCondition::fixed("base")).unwrap();
//! model
//!     .add_condition(BoundaryCondition::point_load("tip", DofComponent::V, -1000.0))
//!     .unwrap();
//!
//! // Analyze
//! model.analyze_default().unwrap();
//!
//! // Get results
//! let field = model.displacements().unwrap();
//! assert_eq!(field.node(1), (0.0, 0.0));
//! assert!(field.node(3).1 < 0.0);
//! ```

pub mod assembly;
pub mod error;
pub mod material;
pub mod math;
pub mod mesh;
pub mod model;
pub mod output;
pub mod quadrature;
pub mod results;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::assembly::{Assembler, BoundaryCondition, DofComponent, GlobalSystem};
    pub use crate::error::{FeaError, FeaResult};
    pub use crate::material::Material;
    pub use crate::mesh::{Element, Mesh, Node, NodeGroup};
    pub use crate::model::{AnalysisOptions, FeModel, JobConfig};
    pub use crate::quadrature::{QuadratureRule, QuadratureScheme};
    pub use crate::results::DisplacementField;
    pub use crate::solver::SolveReport;
}
