//! Material properties and the plane-stress constitutive law

use std::fmt;

use crate::error::{FeaError, FeaResult};
use crate::math::Mat3;

/// Isotropic material for plane-stress analysis
///
/// The 3x3 constitutive matrix is computed eagerly at construction and kept
/// in sync by [`Material::set_properties`], so element integration never pays
/// for it per point.
#[derive(Debug, Clone)]
pub struct Material {
    e: f64,
    nu: f64,
    c: Mat3,
}

impl Material {
    /// Create a material from Young's modulus and Poisson's ratio
    ///
    /// # Arguments
    /// * `e` - Young's modulus (non-zero)
    /// * `nu` - Poisson's ratio (non-zero, |nu| < 1)
    pub fn new(e: f64, nu: f64) -> FeaResult<Self> {
        validate(e, nu)?;
        Ok(Self {
            e,
            nu,
            c: plane_stress_matrix(e, nu),
        })
    }

    /// Replace both properties and recompute the constitutive matrix
    pub fn set_properties(&mut self, e: f64, nu: f64) -> FeaResult<()> {
        validate(e, nu)?;
        self.e = e;
        self.nu = nu;
        self.c = plane_stress_matrix(e, nu);
        Ok(())
    }

    /// Young's modulus
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Poisson's ratio
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Plane-stress constitutive matrix
    pub fn constitutive(&self) -> &Mat3 {
        &self.c
    }

    /// Structural steel (imperial units: psi)
    pub fn steel() -> Self {
        Self {
            e: 30.0e6,
            nu: 0.25,
            c: plane_stress_matrix(30.0e6, 0.25),
        }
    }

    /// Aluminum 6061 (imperial units: psi)
    pub fn aluminum() -> Self {
        Self {
            e: 10.6e6,
            nu: 0.33,
            c: plane_stress_matrix(10.6e6, 0.33),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "E = {:.4e}, nu = {:.3}", self.e, self.nu)?;
        for i in 0..3 {
            writeln!(
                f,
                "[ {:12.4e} {:12.4e} {:12.4e} ]",
                self.c[(i, 0)],
                self.c[(i, 1)],
                self.c[(i, 2)]
            )?;
        }
        Ok(())
    }
}

fn validate(e: f64, nu: f64) -> FeaResult<()> {
    if !e.is_finite() || e == 0.0 {
        return Err(FeaError::InvalidMaterial(format!(
            "young's modulus must be finite and non-zero, got {e}"
        )));
    }
    if !nu.is_finite() || nu == 0.0 {
        return Err(FeaError::InvalidMaterial(format!(
            "poisson's ratio must be finite and non-zero, got {nu}"
        )));
    }
    if nu.abs() >= 1.0 {
        return Err(FeaError::InvalidMaterial(format!(
            "poisson's ratio must satisfy |nu| < 1, got {nu}"
        )));
    }
    Ok(())
}

/// C = E/(1-nu^2) * [[1, nu, 0], [nu, 1, 0], [0, 0, (1-nu)/2]]
fn plane_stress_matrix(e: f64, nu: f64) -> Mat3 {
    let f = e / (1.0 - nu * nu);
    #[rustfmt::skip]
    let c = Mat3::new(
        f,      f * nu, 0.0,
        f * nu, f,      0.0,
        0.0,    0.0,    f * (1.0 - nu) / 2.0,
    );
    c
}
