//! Nearest-grid-point density assignment
//!
//! Each particle deposits its full mass into the single cell nearest its
//! position (rounded, then wrapped onto the mesh). The chosen cells are
//! returned alongside the density so force interpolation can read forces back
//! from exactly the cells the mass went into.

use crate::grid::{FieldData, Mesh};
use crate::particles::Vec2;
use rayon::prelude::*;

/// Per-particle cell chosen by density assignment
///
/// Produced by [`assign_density`] and consumed by
/// [`interpolate_forces`](super::force::interpolate_forces). The two must come
/// from the same positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIndices {
    cells: Vec<(usize, usize)>,
    mesh_size: usize,
}

impl CellIndices {
    /// Cell `(x, y)` of every particle, in particle order
    #[must_use]
    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    /// Cell of particle `i`
    #[must_use]
    pub fn get(&self, i: usize) -> Option<(usize, usize)> {
        self.cells.get(i).copied()
    }

    /// Number of particles the mapping covers
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no particle was assigned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Side of the mesh the indices refer to
    #[must_use]
    pub fn mesh_size(&self) -> usize {
        self.mesh_size
    }
}

/// Bin particle masses onto the mesh
///
/// Returns the mass-per-cell field and the cell index of every particle. The
/// field sums to the total mass up to round-off. Calling this twice on the same
/// positions yields identical results; nothing is carried between calls.
///
/// # Arguments
///
/// * `positions` - Particle positions in cell units
/// * `masses` - Particle masses, in the same order as `positions`
/// * `mesh` - Working mesh the positions are rounded and wrapped onto
///
/// # Returns
///
/// Tuple of (density field, cell index of every particle)
///
/// # Panics
///
/// Panics if `positions` and `masses` differ in length
#[must_use]
pub fn assign_density(positions: &[Vec2], masses: &[f64], mesh: Mesh) -> (FieldData, CellIndices) {
    assert_eq!(
        positions.len(),
        masses.len(),
        "Positions and masses differ in length"
    );

    let cells: Vec<(usize, usize)> = positions
        .par_iter()
        .map(|p| (mesh.nearest_cell(p.x), mesh.nearest_cell(p.y)))
        .collect();

    // Sequential histogram keeps the summation order deterministic
    let mut density = FieldData::square(mesh.size());
    for (&(x, y), &mass) in cells.iter().zip(masses) {
        density.add(x, y, mass);
    }

    (
        density,
        CellIndices {
            cells,
            mesh_size: mesh.size(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_is_conserved() {
        let mesh = Mesh::new(32);
        let positions: Vec<Vec2> = (0..500_i32)
            .map(|i| {
                let t = f64::from(i);
                Vec2::new((t * 7.31).sin() * 40.0, (t * 3.17).cos() * 50.0 + 16.0)
            })
            .collect();
        let masses: Vec<f64> = (0..500_i32).map(|i| 0.1 + f64::from(i % 7) * 0.37).collect();

        let (density, _) = assign_density(&positions, &masses, mesh);
        let total: f64 = masses.iter().sum();
        assert!(((density.sum() - total) / total).abs() < 1e-10);
    }

    #[test]
    fn test_particles_in_same_cell_accumulate() {
        let mesh = Mesh::new(8);
        let positions = vec![Vec2::new(2.2, 3.1), Vec2::new(1.6, 2.9), Vec2::new(10.0, 3.0)];
        let masses = vec![1.0, 2.0, 4.0];

        let (density, indices) = assign_density(&positions, &masses, mesh);
        assert_eq!(density.get(2, 3), 7.0);
        assert_eq!(indices.cells(), &[(2, 3), (2, 3), (2, 3)]);
        assert_eq!(indices.mesh_size(), 8);
    }

    #[test]
    fn test_rounding_wraps_upper_edge() {
        let mesh = Mesh::new(8);
        let (density, indices) = assign_density(&[Vec2::new(7.8, 0.2)], &[3.0], mesh);
        assert_eq!(indices.get(0), Some((0, 0)));
        assert_eq!(density.get(0, 0), 3.0);
    }

    #[test]
    fn test_reassignment_is_idempotent() {
        let mesh = Mesh::new(16);
        let positions = vec![Vec2::new(4.4, 9.9), Vec2::new(12.5, 0.1), Vec2::new(4.4, 9.9)];
        let masses = vec![1.5, 2.5, 0.5];

        let first = assign_density(&positions, &masses, mesh);
        let second = assign_density(&positions, &masses, mesh);
        assert_eq!(first, second);
    }
}
