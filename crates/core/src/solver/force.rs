//! Force mesh and nearest-grid-point force interpolation
//!
//! Forces are central differences of the potential with cyclic neighbours,
//! weighted by the local density and `-G`:
//!
//! ```text
//! F_x[x, y] = -G · ρ[x, y] · ½ (Φ[x-1, y] - Φ[x+1, y])
//! ```
//!
//! Cells without mass carry no force. Each particle then reads the force of
//! the cell its mass was deposited into.

use super::density::CellIndices;
use crate::grid::{FieldData, Mesh};
use crate::particles::Vec2;
use rayon::prelude::*;

/// Two-component force field on the working grid
#[derive(Debug, Clone, PartialEq)]
pub struct ForceMesh {
    /// x component
    pub fx: FieldData,
    /// y component
    pub fy: FieldData,
}

impl ForceMesh {
    /// Force vector at cell `(x, y)`
    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(self.fx.get(x, y), self.fy.get(x, y))
    }
}

/// Differentiate the potential into a density-weighted force mesh
///
/// # Arguments
///
/// * `potential` - Centred potential on the working grid
/// * `density` - Mass per cell the potential was solved from
/// * `gravitational_constant` - G
/// * `mesh` - Working mesh supplying the cyclic neighbours
///
/// # Returns
///
/// Force components per cell; zero wherever the density is zero
///
/// # Panics
///
/// Panics if `potential` or `density` does not match `mesh`
#[must_use]
pub fn compute_force_mesh(
    potential: &FieldData,
    density: &FieldData,
    gravitational_constant: f64,
    mesh: Mesh,
) -> ForceMesh {
    let n = mesh.size();
    assert!(
        potential.width == n && potential.height == n,
        "Potential does not match mesh"
    );
    assert!(
        density.width == n && density.height == n,
        "Density does not match mesh"
    );

    let mut fx = FieldData::square(n);
    let mut fy = FieldData::square(n);
    let phi = potential.as_slice();
    let rho = density.as_slice();

    fx.as_mut_slice()
        .par_chunks_mut(n)
        .zip(fy.as_mut_slice().par_chunks_mut(n))
        .enumerate()
        .for_each(|(y, (row_x, row_y))| {
            let (below, above) = mesh.neighbours(y);
            for x in 0..n {
                let idx = y * n + x;
                let weight = -gravitational_constant * rho[idx];
                if weight == 0.0 {
                    continue;
                }
                let (left, right) = mesh.neighbours(x);
                row_x[x] = weight * 0.5 * (phi[y * n + left] - phi[y * n + right]);
                row_y[x] = weight * 0.5 * (phi[below * n + x] - phi[above * n + x]);
            }
        });

    ForceMesh { fx, fy }
}

/// Read each particle's force from the cell recorded by density assignment
///
/// # Panics
///
/// Panics if the indices refer to a different mesh size
#[must_use]
pub fn interpolate_forces(forces: &ForceMesh, indices: &CellIndices) -> Vec<Vec2> {
    assert_eq!(
        indices.mesh_size(),
        forces.fx.width,
        "Cell indices were built for a different mesh"
    );
    indices
        .cells()
        .par_iter()
        .map(|&(x, y)| forces.at(x, y))
        .collect()
}
