//! Result types for a completed analysis

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Nodal displacement field over the whole mesh
///
/// Components are stored per node in mesh node order, so `u[i]` and `v[i]`
/// belong to node id `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplacementField {
    /// Displacement in X direction per node
    pub u: Vec<f64>,
    /// Displacement in Y direction per node
    pub v: Vec<f64>,
}

impl DisplacementField {
    /// Split an interleaved solution vector into nodal components
    ///
    /// The vector layout is the DOF numbering of the solve: `x[2i]` is u and
    /// `x[2i+1]` is v of node `i + 1`.
    pub fn from_vector(x: &DVector<f64>, n_nodes: usize) -> Self {
        let mut u = Vec::with_capacity(n_nodes);
        let mut v = Vec::with_capacity(n_nodes);
        for i in 0..n_nodes {
            u.push(x[2 * i]);
            v.push(x[2 * i + 1]);
        }
        Self { u, v }
    }

    pub fn n_nodes(&self) -> usize {
        self.u.len()
    }

    /// Displacement components of a node by 1-based id
    pub fn node(&self, id: usize) -> (f64, f64) {
        (self.u[id - 1], self.v[id - 1])
    }

    /// Translation magnitude of a node by 1-based id
    pub fn magnitude(&self, id: usize) -> f64 {
        let (u, v) = self.node(id);
        (u.powi(2) + v.powi(2)).sqrt()
    }

    /// Largest translation magnitude over all nodes
    pub fn max_magnitude(&self) -> f64 {
        (1..=self.n_nodes())
            .map(|id| self.magnitude(id))
            .fold(0.0, f64::max)
    }

    /// Node id with the largest translation magnitude
    pub fn max_node(&self) -> Option<usize> {
        (1..=self.n_nodes()).fold(None, |best, id| match best {
            Some(b) if self.magnitude(b) >= self.magnitude(id) => Some(b),
            _ => Some(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn splits_interleaved_vector() {
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let field = DisplacementField::from_vector(&x, 3);
        assert_eq!(field.u, vec![1.0, 3.0, 5.0]);
        assert_eq!(field.v, vec![2.0, 4.0, 6.0]);
        assert_eq!(field.node(2), (3.0, 4.0));
    }

    #[test]
    fn magnitude_and_max() {
        let x = DVector::from_vec(vec![3.0, 4.0, 0.0, 1.0]);
        let field = DisplacementField::from_vector(&x, 2);
        assert_relative_eq!(field.magnitude(1), 5.0);
        assert_relative_eq!(field.max_magnitude(), 5.0);
        assert_eq!(field.max_node(), Some(1));
    }

    #[test]
    fn empty_field_has_no_max_node() {
        let field = DisplacementField { u: vec![], v: vec![] };
        assert_eq!(field.max_node(), None);
        assert_relative_eq!(field.max_magnitude(), 0.0);
    }
}
