//! Gauss quadrature rules for the reference quadrilateral
//!
//! Rules are defined on the [-1,1]x[-1,1] reference square. Each rule also
//! carries the 4x4 corner-basis matrix used to fit the bilinear geometric
//! mapping of an element, and the shape-function values/derivatives at its
//! points (these depend only on the rule, never on element geometry).

use std::fmt;
use std::str::FromStr;

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::error::{FeaError, FeaResult};

/// Reference corners of the quadrilateral, counter-clockwise from (-1,-1)
pub const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Integration scheme for 4-node quadrilaterals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureScheme {
    /// 2x2 Gauss grid (4 points), exact for the bilinear stiffness integrand
    FourPoint,
    /// 3x3 Gauss grid (9 points)
    NinePoint,
}

impl QuadratureScheme {
    /// Number of integration points of the scheme
    pub fn n_points(&self) -> usize {
        match self {
            Self::FourPoint => 4,
            Self::NinePoint => 9,
        }
    }
}

impl Default for QuadratureScheme {
    fn default() -> Self {
        Self::FourPoint
    }
}

impl FromStr for QuadratureScheme {
    type Err = FeaError;

    fn from_str(s: &str) -> FeaResult<Self> {
        match s {
            "four_point" => Ok(Self::FourPoint),
            "nine_point" => Ok(Self::NinePoint),
            other => Err(FeaError::UnknownScheme(other.to_string())),
        }
    }
}

impl fmt::Display for QuadratureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FourPoint => write!(f, "4-point Gauss"),
            Self::NinePoint => write!(f, "9-point Gauss"),
        }
    }
}

/// A single integration point in reference coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussPoint {
    pub xi: f64,
    pub eta: f64,
    pub weight: f64,
}

/// Immutable quadrature rule shared read-only by every element using it
#[derive(Debug, Clone)]
pub struct QuadratureRule {
    scheme: QuadratureScheme,
    points: Vec<GaussPoint>,
    corner_matrix: Matrix4<f64>,
    shape: Vec<[f64; 4]>,
    dshape_dxi: Vec<[f64; 4]>,
    dshape_deta: Vec<[f64; 4]>,
}

impl QuadratureRule {
    /// Build the rule for a scheme
    ///
    /// # Arguments
    /// * `scheme` - Integration scheme (construction cannot fail for the
    ///   closed scheme set; unknown scheme names are rejected when parsing
    ///   configuration, before any element processing)
    pub fn new(scheme: QuadratureScheme) -> Self {
        let points = match scheme {
            QuadratureScheme::FourPoint => {
                // One point per quadrant, ordered like the reference corners
                let g = (1.0_f64 / 3.0).sqrt();
                CORNERS
                    .iter()
                    .map(|&(cx, cy)| GaussPoint {
                        xi: cx * g,
                        eta: cy * g,
                        weight: 1.0,
                    })
                    .collect()
            }
            QuadratureScheme::NinePoint => {
                // Row-major tensor grid over {-sqrt(3/5), 0, sqrt(3/5)}
                let h = (3.0_f64 / 5.0).sqrt();
                let coords = [-h, 0.0, h];
                let weights = [5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0];
                let mut pts = Vec::with_capacity(9);
                for j in 0..3 {
                    for i in 0..3 {
                        pts.push(GaussPoint {
                            xi: coords[i],
                            eta: coords[j],
                            weight: weights[i] * weights[j],
                        });
                    }
                }
                pts
            }
        };

        let shape = points.iter().map(|p| shape_functions(p.xi, p.eta)).collect();
        let (dshape_dxi, dshape_deta) = points
            .iter()
            .map(|p| shape_derivatives(p.xi, p.eta))
            .unzip();

        Self {
            scheme,
            points,
            corner_matrix: corner_basis_matrix(),
            shape,
            dshape_dxi,
            dshape_deta,
        }
    }

    /// Scheme this rule was built for
    pub fn scheme(&self) -> QuadratureScheme {
        self.scheme
    }

    /// Number of integration points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All integration points
    pub fn points(&self) -> &[GaussPoint] {
        &self.points
    }

    /// Integration point `q`
    pub fn point(&self, q: usize) -> GaussPoint {
        self.points[q]
    }

    /// Bilinear corner-basis matrix used to fit the geometric mapping
    pub fn corner_matrix(&self) -> &Matrix4<f64> {
        &self.corner_matrix
    }

    /// Shape-function values at point `q`
    pub fn shape(&self, q: usize) -> &[f64; 4] {
        &self.shape[q]
    }

    /// Shape-function xi-derivatives at point `q`
    pub fn dshape_dxi(&self, q: usize) -> &[f64; 4] {
        &self.dshape_dxi[q]
    }

    /// Shape-function eta-derivatives at point `q`
    pub fn dshape_deta(&self, q: usize) -> &[f64; 4] {
        &self.dshape_deta[q]
    }
}

/// Bilinear shape functions N1..N4 at a reference point
pub fn shape_functions(xi: f64, eta: f64) -> [f64; 4] {
    [
        0.25 * (1.0 - xi) * (1.0 - eta),
        0.25 * (1.0 + xi) * (1.0 - eta),
        0.25 * (1.0 + xi) * (1.0 + eta),
        0.25 * (1.0 - xi) * (1.0 + eta),
    ]
}

/// Parametric shape-function derivatives (dN/dxi, dN/deta) at a reference point
pub fn shape_derivatives(xi: f64, eta: f64) -> ([f64; 4], [f64; 4]) {
    let dxi = [
        -0.25 * (1.0 - eta),
        0.25 * (1.0 - eta),
        0.25 * (1.0 + eta),
        -0.25 * (1.0 + eta),
    ];
    let deta = [
        -0.25 * (1.0 - xi),
        -0.25 * (1.0 + xi),
        0.25 * (1.0 + xi),
        0.25 * (1.0 - xi),
    ];
    (dxi, deta)
}

/// Matrix with row a = [1, xi_a, eta_a, xi_a*eta_a] for each reference corner
///
/// Solving `M * [alpha | beta] = [x_nodes | y_nodes]` recovers the bilinear
/// mapping coefficients of an element from its corner coordinates.
fn corner_basis_matrix() -> Matrix4<f64> {
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0, -1.0, -1.0,  1.0,
        1.0,  1.0, -1.0, -1.0,
        1.0,  1.0,  1.0,  1.0,
        1.0, -1.0,  1.0, -1.0,
    );
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weights_sum_to_reference_area() {
        for scheme in [QuadratureScheme::FourPoint, QuadratureScheme::NinePoint] {
            let rule = QuadratureRule::new(scheme);
            assert_eq!(rule.len(), scheme.n_points());
            let total: f64 = rule.points().iter().map(|p| p.weight).sum();
            assert_relative_eq!(total, 4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn shape_functions_partition_of_unity() {
        for scheme in [QuadratureScheme::FourPoint, QuadratureScheme::NinePoint] {
            let rule = QuadratureRule::new(scheme);
            for q in 0..rule.len() {
                let n = rule.shape(q);
                let sum: f64 = n.iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
                for &ni in n {
                    assert!((0.0..=1.0).contains(&ni), "N = {ni} outside [0,1]");
                }
            }
        }
    }

    #[test]
    fn shape_derivatives_sum_to_zero() {
        // Constant fields have zero gradient, so derivative rows must cancel
        let rule = QuadratureRule::new(QuadratureScheme::NinePoint);
        for q in 0..rule.len() {
            let sx: f64 = rule.dshape_dxi(q).iter().sum();
            let se: f64 = rule.dshape_deta(q).iter().sum();
            assert_relative_eq!(sx, 0.0, epsilon = 1e-12);
            assert_relative_eq!(se, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn shape_functions_interpolate_corners() {
        for (a, &(cx, cy)) in CORNERS.iter().enumerate() {
            let n = shape_functions(cx, cy);
            for (k, &nk) in n.iter().enumerate() {
                let expected = if k == a { 1.0 } else { 0.0 };
                assert_relative_eq!(nk, expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn four_point_rule_matches_corner_quadrants() {
        let rule = QuadratureRule::new(QuadratureScheme::FourPoint);
        let g = (1.0_f64 / 3.0).sqrt();
        for (q, &(cx, cy)) in CORNERS.iter().enumerate() {
            let p = rule.point(q);
            assert_relative_eq!(p.xi, cx * g);
            assert_relative_eq!(p.eta, cy * g);
            assert_relative_eq!(p.weight, 1.0);
        }
    }

    #[test]
    fn corner_matrix_reproduces_basis() {
        let rule = QuadratureRule::new(QuadratureScheme::FourPoint);
        let m = rule.corner_matrix();
        for (a, &(cx, cy)) in CORNERS.iter().enumerate() {
            assert_relative_eq!(m[(a, 0)], 1.0);
            assert_relative_eq!(m[(a, 1)], cx);
            assert_relative_eq!(m[(a, 2)], cy);
            assert_relative_eq!(m[(a, 3)], cx * cy);
        }
    }

    #[test]
    fn scheme_parsing() {
        assert_eq!(
            "four_point".parse::<QuadratureScheme>().unwrap(),
            QuadratureScheme::FourPoint
        );
        assert_eq!(
            "nine_point".parse::<QuadratureScheme>().unwrap(),
            QuadratureScheme::NinePoint
        );
        assert!(matches!(
            "gauss_16".parse::<QuadratureScheme>(),
            Err(FeaError::UnknownScheme(_))
        ));
    }
}
