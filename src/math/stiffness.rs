//! Local stiffness integration and DOF numbering for 4-node quads

use super::{BMat, Mat3, Mat8};
use crate::math::geometry::ElementGeometry;

/// Local 8x8 stiffness plus the scatter map into the global system
#[derive(Debug, Clone)]
pub struct ElementStiffness {
    /// Element id, carried for diagnostics
    pub element: usize,
    /// Local stiffness matrix, u/v interleaved per node
    pub k: Mat8,
    /// Global DOF index of each local row/column
    pub dofs: [usize; 8],
}

impl ElementStiffness {
    /// Integrate the stiffness of one element
    ///
    /// # Arguments
    /// * `geom` - Evaluated element geometry
    /// * `connectivity` - Global node ids (1-based) in local order
    /// * `c` - Plane-stress constitutive matrix
    /// * `thickness` - Element thickness (validated upstream)
    pub fn new(
        geom: &ElementGeometry,
        connectivity: &[usize; 4],
        c: &Mat3,
        thickness: f64,
    ) -> Self {
        Self {
            element: geom.element(),
            k: element_stiffness(geom, c, thickness),
            dofs: equation_numbers(connectivity),
        }
    }
}

/// Strain-displacement matrix at quadrature point `q`
///
/// Rows are (eps_x, eps_y, gamma_xy); columns interleave u, v per node:
/// `B[0][2k] = dNk/dx`, `B[1][2k+1] = dNk/dy`, `B[2][2k] = dNk/dy`,
/// `B[2][2k+1] = dNk/dx`.
pub fn b_matrix(geom: &ElementGeometry, q: usize) -> BMat {
    let gx = geom.dn_dx(q);
    let gy = geom.dn_dy(q);
    let mut b = BMat::zeros();
    for k in 0..4 {
        b[(0, 2 * k)] = gx[k];
        b[(1, 2 * k + 1)] = gy[k];
        b[(2, 2 * k)] = gy[k];
        b[(2, 2 * k + 1)] = gx[k];
    }
    b
}

/// `K = sum_q w_q * J_q * t * B_q^T * C * B_q`
///
/// The accumulator is zeroed once before the first point; every quadrature
/// point adds into it.
pub fn element_stiffness(geom: &ElementGeometry, c: &Mat3, thickness: f64) -> Mat8 {
    debug_assert!(thickness > 0.0);
    let mut k = Mat8::zeros();
    for q in 0..geom.n_points() {
        let b = b_matrix(geom, q);
        let scale = geom.weight(q) * geom.det_j(q) * thickness;
        k += (b.transpose() * c * b) * scale;
    }
    k
}

/// Global DOF indices for a connectivity list
///
/// Local node `i` with global id `g` owns `P[2i] = (g-1)*2` (u) and
/// `P[2i+1] = (g-1)*2 + 1` (v), interleaved in node-traversal order.
pub fn equation_numbers(connectivity: &[usize; 4]) -> [usize; 8] {
    let mut p = [0usize; 8];
    for (i, &g) in connectivity.iter().enumerate() {
        p[2 * i] = (g - 1) * 2;
        p[2 * i + 1] = (g - 1) * 2 + 1;
    }
    p
}
