//! Isoparametric geometry of a single 4-node quadrilateral
//!
//! For one element this evaluates, at every point of a shared quadrature
//! rule: the bilinear mapping fit, physical coordinate derivatives, the
//! mapping Jacobian, inverse-mapping derivatives, and physical
//! shape-function gradients. The computation order inside the constructor
//! matters: mapping coefficients feed the physical derivatives, those feed
//! the Jacobian, and the Jacobian feeds the inverse derivatives.

use nalgebra::Matrix4x2;

use crate::error::{FeaError, FeaResult};
use crate::quadrature::QuadratureRule;

/// Upper sanity bound on the mapping Jacobian
///
/// Inverse-mapping derivatives divide by J; a determinant this large means
/// the node coordinates or the mapping fit are garbage, and continuing would
/// feed junk gradients into the stiffness integration.
pub const JACOBIAN_SANITY_BOUND: f64 = 1.0e12;

/// Bilinear mapping coefficients: `x = a0 + a1*xi + a2*eta + a3*xi*eta`
/// (and the same form for y with `beta`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingCoefficients {
    pub alpha: [f64; 4],
    pub beta: [f64; 4],
}

/// Geometric state of one element at every quadrature point
///
/// All arrays have the rule's point count; consumers read them through
/// accessors and never mutate them.
#[derive(Debug)]
pub struct ElementGeometry<'r> {
    rule: &'r QuadratureRule,
    element: usize,
    coeffs: MappingCoefficients,
    dx_dxi: Vec<f64>,
    dx_deta: Vec<f64>,
    dy_dxi: Vec<f64>,
    dy_deta: Vec<f64>,
    det_j: Vec<f64>,
    dxi_dx: Vec<f64>,
    dxi_dy: Vec<f64>,
    deta_dx: Vec<f64>,
    deta_dy: Vec<f64>,
    dn_dx: Vec<[f64; 4]>,
    dn_dy: Vec<[f64; 4]>,
}

impl<'r> ElementGeometry<'r> {
    /// Evaluate the geometry of one element
    ///
    /// # Arguments
    /// * `rule` - Shared quadrature rule
    /// * `element` - Element id, used in error diagnostics
    /// * `coords` - Physical (x, y) of the four corner nodes, counter-clockwise,
    ///   in the same order as the reference corners
    ///
    /// # Errors
    /// `SingularMapping` if the mapping fit cannot be solved, `InvalidJacobian`
    /// if any point has `J <= 0` (inverted or degenerate element) or `J` above
    /// the sanity bound.
    pub fn new(
        rule: &'r QuadratureRule,
        element: usize,
        coords: &[[f64; 2]; 4],
    ) -> FeaResult<Self> {
        let coeffs = fit_mapping(rule, element, coords)?;
        let a = coeffs.alpha;
        let b = coeffs.beta;

        let n = rule.len();
        let mut geom = Self {
            rule,
            element,
            coeffs,
            dx_dxi: Vec::with_capacity(n),
            dx_deta: Vec::with_capacity(n),
            dy_dxi: Vec::with_capacity(n),
            dy_deta: Vec::with_capacity(n),
            det_j: Vec::with_capacity(n),
            dxi_dx: Vec::with_capacity(n),
            dxi_dy: Vec::with_capacity(n),
            deta_dx: Vec::with_capacity(n),
            deta_dy: Vec::with_capacity(n),
            dn_dx: Vec::with_capacity(n),
            dn_dy: Vec::with_capacity(n),
        };

        for q in 0..n {
            let p = rule.point(q);

            let dx_dxi = a[1] + a[3] * p.eta;
            let dx_deta = a[2] + a[3] * p.xi;
            let dy_dxi = b[1] + b[3] * p.eta;
            let dy_deta = b[2] + b[3] * p.xi;

            let det = dx_dxi * dy_deta - dy_dxi * dx_deta;
            if !(det > 0.0) || det > JACOBIAN_SANITY_BOUND {
                return Err(FeaError::InvalidJacobian {
                    element,
                    point: q,
                    det,
                });
            }

            let dxi_dx = dy_deta / det;
            let dxi_dy = -dx_deta / det;
            let deta_dx = -dy_dxi / det;
            let deta_dy = dx_dxi / det;

            let dn_dxi = rule.dshape_dxi(q);
            let dn_deta = rule.dshape_deta(q);
            let mut gx = [0.0; 4];
            let mut gy = [0.0; 4];
            for k in 0..4 {
                gx[k] = dn_dxi[k] * dxi_dx + dn_deta[k] * deta_dx;
                gy[k] = dn_dxi[k] * dxi_dy + dn_deta[k] * deta_dy;
            }

            geom.dx_dxi.push(dx_dxi);
            geom.dx_deta.push(dx_deta);
            geom.dy_dxi.push(dy_dxi);
            geom.dy_deta.push(dy_deta);
            geom.det_j.push(det);
            geom.dxi_dx.push(dxi_dx);
            geom.dxi_dy.push(dxi_dy);
            geom.deta_dx.push(deta_dx);
            geom.deta_dy.push(deta_dy);
            geom.dn_dx.push(gx);
            geom.dn_dy.push(gy);
        }

        Ok(geom)
    }

    /// Element id this geometry belongs to
    pub fn element(&self) -> usize {
        self.element
    }

    /// Quadrature rule the geometry was evaluated on
    pub fn rule(&self) -> &QuadratureRule {
        self.rule
    }

    /// Number of quadrature points
    pub fn n_points(&self) -> usize {
        self.det_j.len()
    }

    /// Fitted bilinear mapping coefficients
    pub fn coefficients(&self) -> &MappingCoefficients {
        &self.coeffs
    }

    /// Jacobian determinant at point `q`
    pub fn det_j(&self, q: usize) -> f64 {
        self.det_j[q]
    }

    /// Integration weight at point `q`
    pub fn weight(&self, q: usize) -> f64 {
        self.rule.point(q).weight
    }

    /// Shape-function values at point `q`
    pub fn shape(&self, q: usize) -> &[f64; 4] {
        self.rule.shape(q)
    }

    /// Physical x-gradients of the shape functions at point `q`
    pub fn dn_dx(&self, q: usize) -> &[f64; 4] {
        &self.dn_dx[q]
    }

    /// Physical y-gradients of the shape functions at point `q`
    pub fn dn_dy(&self, q: usize) -> &[f64; 4] {
        &self.dn_dy[q]
    }

    /// Physical derivatives (dx/dxi, dx/deta, dy/dxi, dy/deta) at point `q`
    pub fn physical_derivatives(&self, q: usize) -> (f64, f64, f64, f64) {
        (self.dx_dxi[q], self.dx_deta[q], self.dy_dxi[q], self.dy_deta[q])
    }

    /// Inverse-mapping derivatives (dxi/dx, dxi/dy, deta/dx, deta/dy) at point `q`
    pub fn inverse_derivatives(&self, q: usize) -> (f64, f64, f64, f64) {
        (self.dxi_dx[q], self.dxi_dy[q], self.deta_dx[q], self.deta_dy[q])
    }

    /// Map a reference point to physical coordinates
    pub fn map(&self, xi: f64, eta: f64) -> (f64, f64) {
        let a = &self.coeffs.alpha;
        let b = &self.coeffs.beta;
        (
            a[0] + a[1] * xi + a[2] * eta + a[3] * xi * eta,
            b[0] + b[1] * xi + b[2] * eta + b[3] * xi * eta,
        )
    }

    /// Element area by integrating the Jacobian
    pub fn area(&self) -> f64 {
        (0..self.n_points())
            .map(|q| self.weight(q) * self.det_j[q])
            .sum()
    }
}

/// Solve `M * [alpha | beta] = [x_nodes | y_nodes]` for the mapping coefficients
///
/// Both right-hand sides share one LU factorization of the rule's corner
/// matrix.
fn fit_mapping(
    rule: &QuadratureRule,
    element: usize,
    coords: &[[f64; 2]; 4],
) -> FeaResult<MappingCoefficients> {
    #[rustfmt::skip]
    let rhs = Matrix4x2::new(
        coords[0][0], coords[0][1],
        coords[1][0], coords[1][1],
        coords[2][0], coords[2][1],
        coords[3][0], coords[3][1],
    );

    let lu = rule.corner_matrix().lu();
    let solution = lu
        .solve(&rhs)
        .ok_or(FeaError::SingularMapping { element })?;

    Ok(MappingCoefficients {
        alpha: [
            solution[(0, 0)],
            solution[(1, 0)],
            solution[(2, 0)],
            solution[(3, 0)],
        ],
        beta: [
            solution[(0, 1)],
            solution[(1, 1)],
            solution[(2, 1)],
            solution[(3, 1)],
        ],
    })
}
