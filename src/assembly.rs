//! Global system assembly and boundary conditions
//!
//! The assembler owns the only shared mutable state of the pipeline: the
//! global stiffness builder and the load vector. Element stiffnesses are
//! scattered additively, then boundary conditions are recorded, then
//! [`Assembler::finalize`] eliminates pinned DOFs and freezes the matrix in
//! CSR form. Scattering after a condition has been applied is rejected, so
//! no stiffness contribution can ever land in an eliminated row.

use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{FeaError, FeaResult};
use crate::math::{ElementStiffness, SparseMatrixBuilder};
use crate::mesh::Mesh;

/// Displacement component of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DofComponent {
    U,
    V,
}

impl DofComponent {
    /// Offset of the component within a node's DOF pair
    pub fn offset(&self) -> usize {
        match self {
            Self::U => 0,
            Self::V => 1,
        }
    }
}

/// Boundary condition bound to a named node group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Pin both DOFs of every node in the group to zero displacement
    Fixed { group: String },
    /// Add a force to one DOF component of the group's first listed node
    ///
    /// Multiple load conditions targeting the same DOF accumulate.
    PointLoad {
        group: String,
        component: DofComponent,
        value: f64,
    },
}

impl BoundaryCondition {
    pub fn fixed(group: impl Into<String>) -> Self {
        Self::Fixed {
            group: group.into(),
        }
    }

    pub fn point_load(group: impl Into<String>, component: DofComponent, value: f64) -> Self {
        Self::PointLoad {
            group: group.into(),
            component,
            value,
        }
    }

    /// Name of the node group the condition binds to
    pub fn group(&self) -> &str {
        match self {
            Self::Fixed { group } => group,
            Self::PointLoad { group, .. } => group,
        }
    }
}

/// Finalized global system ready for the solver
pub struct GlobalSystem {
    pub matrix: CsrMatrix<f64>,
    pub load: DVector<f64>,
}

impl GlobalSystem {
    pub fn n_dofs(&self) -> usize {
        self.load.len()
    }

    /// Dense copy of the matrix (for comparison, debugging, and dumps)
    pub fn dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.matrix.nrows(), self.matrix.ncols());
        for (row, col, &val) in self.matrix.triplet_iter() {
            m[(row, col)] = val;
        }
        m
    }
}

/// Incremental scatter-add assembler for the `2N x 2N` global system
pub struct Assembler {
    builder: SparseMatrixBuilder,
    load: DVector<f64>,
    pinned: Vec<bool>,
    scattered: usize,
    constrained: bool,
}

impl Assembler {
    /// Allocate a zeroed system for `n_nodes` nodes (two DOFs each)
    ///
    /// Every diagonal gets a structural entry up front so fixed-DOF
    /// elimination can always set it, even for a DOF no element touches.
    pub fn new(n_nodes: usize) -> Self {
        let n_dofs = 2 * n_nodes;
        let mut builder = SparseMatrixBuilder::new(n_dofs);
        builder.seed_diagonal();
        Self {
            builder,
            load: DVector::zeros(n_dofs),
            pinned: vec![false; n_dofs],
            scattered: 0,
            constrained: false,
        }
    }

    pub fn n_dofs(&self) -> usize {
        self.load.len()
    }

    /// Number of element stiffnesses scattered so far
    pub fn n_scattered(&self) -> usize {
        self.scattered
    }

    /// Scatter-add one element stiffness into the global matrix
    ///
    /// Contributions are strictly additive: elements sharing a node
    /// accumulate into the same rows and columns.
    pub fn scatter(&mut self, ke: &ElementStiffness) -> FeaResult<()> {
        if self.constrained {
            return Err(FeaError::AssemblyOrder);
        }
        self.builder.add_element_matrix(&ke.dofs, &ke.k);
        self.scattered += 1;
        Ok(())
    }

    /// Resolve a boundary condition against the mesh and record it
    ///
    /// Fixed groups mark their DOFs for elimination at finalize; point loads
    /// add into the load vector immediately. After the first condition no
    /// further scattering is accepted.
    pub fn apply(&mut self, mesh: &Mesh, condition: &BoundaryCondition) -> FeaResult<()> {
        match condition {
            BoundaryCondition::Fixed { group } => {
                let group = mesh.group(group)?;
                for &id in &group.nodes {
                    let node = mesh.node(id)?;
                    let dof = (node.id - 1) * 2;
                    if dof + 1 >= self.pinned.len() {
                        return Err(FeaError::NodeNotFound(id));
                    }
                    self.pinned[dof] = true;
                    self.pinned[dof + 1] = true;
                }
            }
            BoundaryCondition::PointLoad {
                group,
                component,
                value,
            } => {
                let group = mesh.group(group)?;
                let first = group.nodes.first().copied().ok_or_else(|| {
                    FeaError::InvalidMesh(format!("group '{}' has no nodes", group.name))
                })?;
                let node = mesh.node(first)?;
                let dof = (node.id - 1) * 2 + component.offset();
                if dof >= self.load.len() {
                    return Err(FeaError::NodeNotFound(first));
                }
                self.load[dof] += value;
            }
        }
        self.constrained = true;
        Ok(())
    }

    /// Eliminate pinned DOFs and freeze the system
    ///
    /// Pinned rows and columns are zeroed with a unit diagonal and a zero
    /// load entry, pinning those solutions to exactly zero while keeping the
    /// operator symmetric for the conjugate-gradient solve. No structural
    /// change happens after this point.
    pub fn finalize(mut self) -> FeaResult<GlobalSystem> {
        if self.scattered == 0 {
            return Err(FeaError::EmptyMesh);
        }

        self.builder.eliminate_rows_cols(&self.pinned);
        for (dof, &pin) in self.pinned.iter().enumerate() {
            if pin {
                self.load[dof] = 0.0;
            }
        }

        debug!(
            "global system: {} dofs, {} pinned, {} triplets, sparsity {:.2}%",
            self.n_dofs(),
            self.pinned.iter().filter(|&&p| p).count(),
            self.builder.nnz(),
            100.0 * self.builder.sparsity()
        );

        Ok(GlobalSystem {
            matrix: self.builder.to_csr(),
            load: self.load,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::math::ElementGeometry;
    use crate::quadrature::{QuadratureRule, QuadratureScheme};
    use approx::assert_relative_eq;

    // Two unit squares sharing the edge 2-3
    fn two_quad_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        let coords = [
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (2.0, 0.0),
            (2.0, 1.0),
        ];
        for (i, (x, y)) in coords.iter().enumerate() {
            mesh.add_node(i + 1, *x, *y, 0.0);
        }
        mesh.add_quad(1, [1, 2, 3, 4]);
        mesh.add_quad(2, [2, 5, 6, 3]);
        mesh.add_group("left", vec![1, 4]);
        mesh.add_group("tip", vec![5, 6]);
        mesh.validate().unwrap();
        mesh
    }

    fn element_stiffnesses(mesh: &Mesh) -> Vec<ElementStiffness> {
        let rule = QuadratureRule::new(QuadratureScheme::FourPoint);
        let mat = Material::steel();
        mesh.elements()
            .iter()
            .map(|el| {
                let coords = mesh.element_coords(el).unwrap();
                let geom = ElementGeometry::new(&rule, el.id, &coords).unwrap();
                ElementStiffness::new(&geom, &el.nodes, mat.constitutive(), 1.0)
            })
            .collect()
    }

    #[test]
    fn scatter_accumulates_shared_dofs() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        for ke in &stiffnesses {
            assembler.scatter(ke).unwrap();
        }
        let system = assembler.finalize().unwrap();
        let dense = system.dense();

        // The assembled matrix must equal the manual sum of both local
        // matrices scattered by their DOF maps
        let mut expected = DMatrix::zeros(12, 12);
        for ke in &stiffnesses {
            for i in 0..8 {
                for j in 0..8 {
                    expected[(ke.dofs[i], ke.dofs[j])] += ke.k[(i, j)];
                }
            }
        }
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(dense[(i, j)], expected[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn point_loads_accumulate() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        for ke in &stiffnesses {
            assembler.scatter(ke).unwrap();
        }
        let down = BoundaryCondition::point_load("tip", DofComponent::V, -500.0);
        let sideways = BoundaryCondition::point_load("tip", DofComponent::U, 200.0);
        assembler.apply(&mesh, &down).unwrap();
        assembler.apply(&mesh, &down).unwrap();
        assembler.apply(&mesh, &sideways).unwrap();

        let system = assembler.finalize().unwrap();
        // First node of "tip" is node 5: DOFs 8 (u) and 9 (v)
        assert_relative_eq!(system.load[9], -1000.0);
        assert_relative_eq!(system.load[8], 200.0);
        assert_relative_eq!(system.load[0], 0.0);
    }

    #[test]
    fn fixed_group_pins_rows_and_columns() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        for ke in &stiffnesses {
            assembler.scatter(ke).unwrap();
        }
        // A load on a node that also gets pinned must end up zeroed
        assembler
            .apply(
                &mesh,
                &BoundaryCondition::point_load("left", DofComponent::U, 7.0),
            )
            .unwrap();
        assembler
            .apply(&mesh, &BoundaryCondition::fixed("left"))
            .unwrap();

        let system = assembler.finalize().unwrap();
        let dense = system.dense();

        // Nodes 1 and 4 -> DOFs 0, 1, 6, 7
        for &dof in &[0usize, 1, 6, 7] {
            for j in 0..12 {
                let expected = if j == dof { 1.0 } else { 0.0 };
                assert_relative_eq!(dense[(dof, j)], expected);
                assert_relative_eq!(dense[(j, dof)], expected);
            }
            assert_relative_eq!(system.load[dof], 0.0);
        }
        // Unpinned stiffness stays
        assert!(dense[(2, 2)] > 0.0);
    }

    #[test]
    fn fixed_application_is_idempotent() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let build = |repeat: usize| {
            let mut assembler = Assembler::new(mesh.n_nodes());
            for ke in &stiffnesses {
                assembler.scatter(ke).unwrap();
            }
            for _ in 0..repeat {
                assembler
                    .apply(&mesh, &BoundaryCondition::fixed("left"))
                    .unwrap();
            }
            assembler.finalize().unwrap().dense()
        };

        assert_eq!(build(1), build(2));
    }

    #[test]
    fn scatter_after_condition_is_rejected() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        assembler.scatter(&stiffnesses[0]).unwrap();
        assembler
            .apply(&mesh, &BoundaryCondition::fixed("left"))
            .unwrap();
        assert!(matches!(
            assembler.scatter(&stiffnesses[1]),
            Err(FeaError::AssemblyOrder)
        ));
    }

    #[test]
    fn finalize_without_elements_is_rejected() {
        let assembler = Assembler::new(4);
        assert!(matches!(assembler.finalize(), Err(FeaError::EmptyMesh)));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        assembler.scatter(&stiffnesses[0]).unwrap();
        assert!(matches!(
            assembler.apply(&mesh, &BoundaryCondition::fixed("bottom")),
            Err(FeaError::GroupNotFound(_))
        ));
    }

    #[test]
    fn assembled_diagonal_is_positive() {
        let mesh = two_quad_mesh();
        let stiffnesses = element_stiffnesses(&mesh);

        let mut assembler = Assembler::new(mesh.n_nodes());
        for ke in &stiffnesses {
            assembler.scatter(ke).unwrap();
        }
        let system = assembler.finalize().unwrap();
        let dense = system.dense();
        for d in 0..system.n_dofs() {
            assert!(dense[(d, d)] > 0.0, "diagonal {d} not positive");
        }
    }

    #[test]
    fn condition_serde_round_trip() {
        let json = r#"{"kind":"point_load","group":"tip","component":"v","value":-250.0}"#;
        let bc: BoundaryCondition = serde_json::from_str(json).unwrap();
        assert_eq!(
            bc,
            BoundaryCondition::point_load("tip", DofComponent::V, -250.0)
        );

        let fixed: BoundaryCondition =
            serde_json::from_str(r#"{"kind":"fixed","group":"left"}"#).unwrap();
        assert_eq!(fixed.group(), "left");
    }
}
