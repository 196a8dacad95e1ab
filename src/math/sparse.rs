//! Sparse matrix utilities for the global solve
//!
//! Assembled plane-stress stiffness matrices are overwhelmingly sparse (each
//! DOF couples only to the DOFs of nodes sharing an element), so the global
//! system is built in COO form and solved in CSR form.

use nalgebra::{DMatrix, DVector, SMatrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::error::{FeaError, FeaResult};

/// Sparse matrix builder using COO format
///
/// Incremental scatter-add assembly pushes triplets; duplicates are summed
/// when converting to CSR.
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // Pre-allocate for typical quad-mesh connectivity:
        // 2 DOFs per node, up to 4 elements sharing a node -> ~18 coupled DOFs
        let estimated_nnz = size * 18;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Matrix dimension (the matrix is square)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    /// Add values from a small fixed-size matrix
    pub fn add_element_matrix<const N: usize>(
        &mut self,
        dofs: &[usize; N],
        k_elem: &SMatrix<f64, N, N>,
    ) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k_elem[(i, j)]);
            }
        }
    }

    /// Push an explicit zero on every diagonal entry
    ///
    /// Guarantees each row has a structural diagonal even for DOFs no element
    /// touches, so a later elimination always finds the entry it must set.
    pub fn seed_diagonal(&mut self) {
        for i in 0..self.size {
            self.entries.push((i, i, 0.0));
        }
    }

    /// Zero every flagged row and column and set flagged diagonals to 1
    ///
    /// Symmetric elimination: the operator stays symmetric, and with a zeroed
    /// right-hand-side entry the flagged unknown solves to exactly zero.
    /// Applying it twice is a no-op.
    pub fn eliminate_rows_cols(&mut self, flags: &[bool]) {
        assert_eq!(flags.len(), self.size);
        self.entries
            .retain(|&(row, col, _)| !flags[row] && !flags[col]);
        for (i, &flagged) in flags.iter().enumerate() {
            if flagged {
                self.entries.push((i, i, 1.0));
            }
        }
    }

    /// Convert to CSR format for efficient solves
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix (for comparison/debugging)
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);

        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }

        mat
    }

    /// Get estimated non-zero count
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Get sparsity ratio
    pub fn sparsity(&self) -> f64 {
        let total = self.size * self.size;
        1.0 - (self.entries.len() as f64 / total as f64)
    }
}

/// Outcome of a preconditioned conjugate-gradient solve
#[derive(Debug, Clone)]
pub struct PcgSolution {
    /// Solution vector (best iterate if not converged)
    pub x: DVector<f64>,
    /// Iterations performed
    pub iterations: usize,
    /// Final residual norm ||b - A*x||
    pub residual: f64,
    /// Whether the residual target was reached
    pub converged: bool,
}

/// Solve a sparse SPD system with Jacobi-preconditioned conjugate gradient
///
/// # Arguments
/// * `csr` - Symmetric positive-definite matrix
/// * `b` - Right-hand side
/// * `target` - Absolute residual norm to reach
/// * `max_iter` - Iteration cap
///
/// # Errors
/// `SolverBreakdown` when a search direction has zero curvature, which for an
/// SPD operator only happens on numerically degenerate input.
pub fn solve_pcg(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    target: f64,
    max_iter: usize,
) -> FeaResult<PcgSolution> {
    let n = csr.nrows();

    // Jacobi preconditioner from the diagonal
    let mut diag = DVector::zeros(n);
    for (row, col, &val) in csr.triplet_iter() {
        if row == col {
            diag[row] = val;
        }
    }
    for i in 0..n {
        if diag[i].abs() < 1e-15 {
            diag[i] = 1.0;
        }
    }

    let mut x = DVector::zeros(n);
    let mut r = b.clone();

    if r.norm() <= target {
        return Ok(PcgSolution {
            x,
            iterations: 0,
            residual: r.norm(),
            converged: true,
        });
    }

    let mut z = r.component_div(&diag);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);

    for iter in 0..max_iter {
        let ap = sparse_matvec(csr, &p);
        let p_dot_ap = p.dot(&ap);

        if p_dot_ap.abs() < 1e-15 {
            return Err(FeaError::SolverBreakdown);
        }

        let alpha = r_dot_z / p_dot_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let r_norm = r.norm();
        if r_norm <= target {
            return Ok(PcgSolution {
                x,
                iterations: iter + 1,
                residual: r_norm,
                converged: true,
            });
        }

        z = r.component_div(&diag);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;

        p = &z + beta * &p;
    }

    let residual = r.norm();
    Ok(PcgSolution {
        x,
        iterations: max_iter,
        residual,
        converged: false,
    })
}

/// Sparse matrix-vector multiplication
#[inline]
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let start = row_offsets[row];
        let end = row_offsets[row + 1];

        let mut sum = 0.0;
        for idx in start..end {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}
