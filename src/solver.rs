//! Linear solve driver with relative convergence control

use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::error::FeaResult;
use crate::math::{solve_pcg, PcgSolution};

/// Outcome of a linear solve
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Nodal displacements, u/v interleaved per node
    pub displacements: DVector<f64>,
    pub iterations: usize,
    /// Final residual norm `||f - K u||`
    pub residual: f64,
    pub converged: bool,
}

/// Solve `K u = f` with Jacobi-preconditioned conjugate gradients
///
/// `tolerance` is relative to the load norm: iteration stops once
/// `||f - K u|| <= tolerance * ||f||`. A zero load short-circuits to zero
/// displacements without touching the matrix.
pub fn solve(
    matrix: &CsrMatrix<f64>,
    load: &DVector<f64>,
    tolerance: f64,
    max_iterations: usize,
) -> FeaResult<SolveReport> {
    let load_norm = load.norm();
    if load_norm == 0.0 {
        debug!("zero load vector, returning zero displacements");
        return Ok(SolveReport {
            displacements: DVector::zeros(load.len()),
            iterations: 0,
            residual: 0.0,
            converged: true,
        });
    }

    let target = tolerance * load_norm;
    debug!(
        "pcg solve: {} dofs, residual target {:.3e} ({:.1e} relative)",
        load.len(),
        target,
        tolerance
    );

    let PcgSolution {
        x,
        iterations,
        residual,
        converged,
    } = solve_pcg(matrix, load, target, max_iterations)?;

    if converged {
        debug!("pcg converged in {iterations} iterations, residual {residual:.3e}");
    } else {
        debug!("pcg hit the iteration cap at {iterations}, residual {residual:.3e}");
    }

    Ok(SolveReport {
        displacements: x,
        iterations,
        residual,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{sparse_matvec, SparseMatrixBuilder};
    use approx::assert_relative_eq;

    fn spd_system() -> (CsrMatrix<f64>, DVector<f64>) {
        let mut builder = SparseMatrixBuilder::new(3);
        builder.add(0, 0, 4.0);
        builder.add(1, 1, 5.0);
        builder.add(2, 2, 6.0);
        builder.add(0, 1, 1.0);
        builder.add(1, 0, 1.0);
        builder.add(1, 2, 2.0);
        builder.add(2, 1, 2.0);
        let f = DVector::from_vec(vec![1.0, -3.0, 2.0]);
        (builder.to_csr(), f)
    }

    #[test]
    fn residual_target_is_relative_to_load() {
        let (matrix, load) = spd_system();
        let report = solve(&matrix, &load, 1e-10, 100).unwrap();
        assert!(report.converged);
        assert!(report.residual <= 1e-10 * load.norm());

        let check = sparse_matvec(&matrix, &report.displacements);
        for i in 0..3 {
            assert_relative_eq!(check[i], load[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn zero_load_short_circuits() {
        let (matrix, _) = spd_system();
        let load = DVector::zeros(3);
        let report = solve(&matrix, &load, 1e-12, 100).unwrap();
        assert!(report.converged);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.displacements, DVector::zeros(3));
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let (matrix, load) = spd_system();
        let report = solve(&matrix, &load, 1e-30, 1).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        assert!(report.residual > 0.0);
    }
}
