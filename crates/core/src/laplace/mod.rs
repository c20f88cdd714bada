//! Laplace boundary-value solvers
//!
//! A separate, optional component from the particle-mesh core: solves the
//! discrete Laplace equation on a square grid where a boolean mask marks cells
//! held at fixed (Dirichlet) values. The grid edges are always masked.
//!
//! Three solvers share the same operator:
//! - [`relax`]: Jacobi relaxation
//! - [`conjugate_gradient`]: conjugate gradient on the masked Laplacian
//! - [`multi_resolution_cg`]: conjugate gradient seeded from coarser grids
//!
//! # Operator
//!
//! ```text
//! (A·V)[i] = 4·V[i] − Σ V[neighbours]      (interior, mask cells treated as 0)
//! b[i]     = Σ bc[neighbours]              (interior), 0 on the mask
//! ```

mod conjugate_gradient;
mod relaxation;
mod resolution;

pub use conjugate_gradient::conjugate_gradient;
pub use relaxation::relax;
pub use resolution::{downsample_field, downsample_mask, multi_resolution_cg, upsample_field};

use crate::error::{PmError, Result};
use crate::grid::FieldData;

/// Outcome of an iterative solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Iterations performed
    pub iterations: usize,
    /// Final squared residual norm Σ r²
    pub residual: f64,
    /// True if the residual dropped below the threshold
    pub converged: bool,
}

/// Grid with fixed-value cells
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryProblem {
    boundary: FieldData,
    mask: Vec<bool>,
}

impl BoundaryProblem {
    /// Wrap boundary values and a fixed-cell mask
    ///
    /// The outer edge of the mask is forced to `true`.
    ///
    /// # Errors
    ///
    /// Returns [`PmError::Laplace`] if the field is not square, is smaller than
    /// 3×3, or the mask length does not match.
    pub fn new(boundary: FieldData, mut mask: Vec<bool>) -> Result<Self> {
        let n = boundary.width;
        if boundary.height != n || n < 3 {
            return Err(PmError::Laplace(format!(
                "grid must be square and at least 3x3, got {}x{}",
                boundary.width, boundary.height
            )));
        }
        if mask.len() != n * n {
            return Err(PmError::Laplace(format!(
                "mask has {} cells, grid has {}",
                mask.len(),
                n * n
            )));
        }
        for i in 0..n {
            mask[i] = true;
            mask[(n - 1) * n + i] = true;
            mask[i * n] = true;
            mask[i * n + n - 1] = true;
        }
        Ok(Self { boundary, mask })
    }

    /// Conducting cylinder of `radius` held at `potential`, centred in an
    /// `n × n` box whose walls are grounded
    ///
    /// # Errors
    ///
    /// Returns [`PmError::Laplace`] if `n < 3`.
    pub fn cylinder(n: usize, radius: f64, potential: f64) -> Result<Self> {
        let centre = (n / 2) as f64;
        let mut boundary = FieldData::square(n);
        let mut mask = vec![false; n * n];
        for y in 0..n {
            for x in 0..n {
                let dx = x as f64 - centre;
                let dy = y as f64 - centre;
                if dx * dx + dy * dy <= radius * radius {
                    boundary.set(x, y, potential);
                    mask[y * n + x] = true;
                }
            }
        }
        Self::new(boundary, mask)
    }

    /// Grid side
    #[must_use]
    pub fn size(&self) -> usize {
        self.boundary.width
    }

    /// Fixed values (meaningful on masked cells)
    #[must_use]
    pub fn boundary(&self) -> &FieldData {
        &self.boundary
    }

    /// Fixed-cell mask, row-major
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Right-hand side: boundary contributions of each free cell's neighbours
    #[must_use]
    pub fn rhs(&self) -> FieldData {
        let n = self.size();
        let bc = self.boundary.as_slice();
        let mut rhs = FieldData::square(n);
        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let idx = y * n + x;
                if self.mask[idx] {
                    continue;
                }
                let value = bc[idx - 1] + bc[idx + 1] + bc[idx - n] + bc[idx + n];
                rhs.as_mut_slice()[idx] = value;
            }
        }
        rhs
    }

    /// Masked Laplacian `A·V`
    ///
    /// # Panics
    ///
    /// Panics if `field` does not match the grid
    #[must_use]
    pub fn apply_laplacian(&self, field: &FieldData) -> FieldData {
        let n = self.size();
        assert!(
            field.width == n && field.height == n,
            "Field does not match problem grid"
        );
        let v = field.as_slice();
        let free = |idx: usize| if self.mask[idx] { 0.0 } else { v[idx] };

        let mut out = FieldData::square(n);
        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let idx = y * n + x;
                if self.mask[idx] {
                    continue;
                }
                let value =
                    4.0 * v[idx] - free(idx - 1) - free(idx + 1) - free(idx - n) - free(idx + n);
                out.as_mut_slice()[idx] = value;
            }
        }
        out
    }

    /// Residual `b − A·V`
    #[must_use]
    pub fn residual(&self, field: &FieldData) -> FieldData {
        let mut r = self.rhs();
        let av = self.apply_laplacian(field);
        for (ri, ai) in r.as_mut_slice().iter_mut().zip(av.as_slice()) {
            *ri -= ai;
        }
        r
    }

    /// Copy the fixed values onto masked cells of `field`
    pub fn impose(&self, field: &mut FieldData) {
        let bc = self.boundary.as_slice();
        for (idx, value) in field.as_mut_slice().iter_mut().enumerate() {
            if self.mask[idx] {
                *value = bc[idx];
            }
        }
    }

    /// Charge density of a solved potential: the unmasked 5-point Laplacian
    /// `4V − ΣV_neighbours` on the interior `(n−2)×(n−2)` cells
    ///
    /// # Panics
    ///
    /// Panics if `field` does not match the grid
    #[must_use]
    pub fn charge_density(&self, field: &FieldData) -> FieldData {
        let n = self.size();
        assert!(
            field.width == n && field.height == n,
            "Field does not match problem grid"
        );
        let v = field.as_slice();
        let inner = n - 2;
        let mut out = FieldData::square(inner);
        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let idx = y * n + x;
                let value = 4.0 * v[idx] - v[idx - 1] - v[idx + 1] - v[idx - n] - v[idx + n];
                out.set(x - 1, y - 1, value);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder_masks_edges_and_disc() {
        let problem = BoundaryProblem::cylinder(16, 2.0, 1.0).unwrap();
        let n = 16;
        assert!(problem.mask()[0]);
        assert!(problem.mask()[n * n - 1]);
        assert!(problem.mask()[8 * n + 8]);
        assert!(problem.mask()[8 * n + 10]);
        assert!(!problem.mask()[8 * n + 11]);
        assert_eq!(problem.boundary().get(8, 8), 1.0);
        assert_eq!(problem.boundary().get(0, 0), 0.0);
    }

    #[test]
    fn test_rhs_sums_fixed_neighbours() {
        let problem = BoundaryProblem::cylinder(16, 0.0, 2.0).unwrap();
        let rhs = problem.rhs();
        // Only the centre cell is fixed at 2; each of its free neighbours sees it once
        assert_eq!(rhs.get(7, 8), 2.0);
        assert_eq!(rhs.get(9, 8), 2.0);
        assert_eq!(rhs.get(8, 7), 2.0);
        assert_eq!(rhs.get(8, 8), 0.0);
        assert_eq!(rhs.sum(), 8.0);
    }

    #[test]
    fn test_laplacian_ignores_masked_values() {
        let problem = BoundaryProblem::cylinder(8, 0.0, 5.0).unwrap();
        let field = FieldData::with_value(8, 8, 1.0);
        let lap = problem.apply_laplacian(&field);
        // Interior away from the mask: 4 − 4 = 0
        assert_eq!(lap.get(2, 2), 0.0);
        // Next to the wall: one neighbour masked out
        assert_eq!(lap.get(1, 2), 1.0);
        // Masked cells stay zero
        assert_eq!(lap.get(4, 4), 0.0);
    }

    #[test]
    fn test_rejects_mismatched_mask() {
        let err = BoundaryProblem::new(FieldData::square(8), vec![false; 10]).unwrap_err();
        assert!(matches!(err, PmError::Laplace(_)));
    }

    #[test]
    fn test_charge_density_of_point_bump() {
        let problem = BoundaryProblem::cylinder(8, 0.0, 0.0).unwrap();
        let mut field = FieldData::square(8);
        field.set(3, 3, 1.0);
        let rho = problem.charge_density(&field);
        assert_eq!(rho.width, 6);
        assert_eq!(rho.get(2, 2), 4.0);
        assert_eq!(rho.get(1, 2), -1.0);
    }
}
