//! Error types for the plane-stress solver

use thiserror::Error;

/// Main error type for solver operations
#[derive(Error, Debug)]
pub enum FeaError {
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Invalid thickness {0}: must be positive")]
    InvalidThickness(f64),

    #[error("Unknown quadrature scheme '{0}'")]
    UnknownScheme(String),

    #[error("Element {element}: singular geometric mapping (degenerate node ordering or coincident nodes)")]
    SingularMapping { element: usize },

    #[error("Element {element}: invalid jacobian {det:.6e} at quadrature point {point}")]
    InvalidJacobian {
        element: usize,
        point: usize,
        det: f64,
    },

    #[error("Node group '{0}' not found in mesh")]
    GroupNotFound(String),

    #[error("Node {0} not found in mesh")]
    NodeNotFound(usize),

    #[error("Mesh has no elements to assemble")]
    EmptyMesh,

    #[error("Stiffness scattered after boundary conditions were applied")]
    AssemblyOrder,

    #[error("Malformed mesh input at line {line}: {message}")]
    MeshFormat { line: usize, message: String },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Model not analyzed - run analyze() first")]
    NotAnalyzed,

    #[error("Solver breakdown: search direction with zero curvature")]
    SolverBreakdown,

    #[error("Convergence failed after {0} iterations")]
    ConvergenceFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for solver operations
pub type FeaResult<T> = Result<T, FeaError>;
