//! Mathematical kernels for element integration and the sparse solve

pub mod geometry;
pub mod sparse;
pub mod stiffness;

use nalgebra::{Matrix3, SMatrix, SVector};

// Re-export the pieces the rest of the crate consumes
pub use geometry::{ElementGeometry, MappingCoefficients, JACOBIAN_SANITY_BOUND};
pub use sparse::{solve_pcg, sparse_matvec, PcgSolution, SparseMatrixBuilder};
pub use stiffness::{b_matrix, element_stiffness, equation_numbers, ElementStiffness};

pub type Mat3 = Matrix3<f64>;

/// 8x8 local stiffness for a 4-node quad (two DOFs per node)
pub type Mat8 = SMatrix<f64, 8, 8>;
/// 8-element vector of local displacements/forces
pub type Vec8 = SVector<f64, 8>;
/// 3x8 strain-displacement matrix
pub type BMat = SMatrix<f64, 3, 8>;
