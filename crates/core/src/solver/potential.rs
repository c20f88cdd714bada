//! Spectral potential solver
//!
//! The potential is the cyclic convolution of the density with the Green's
//! function, computed in frequency space:
//!
//! ```text
//! Φ = IFFT( FFT(ρ) · FFT(g) )
//! ```
//!
//! The raw convolution is offset by half a cell from the particle-centred mass
//! assignment, which makes particles attract themselves and drift. Averaging
//! each axis with its one-cell cyclic shift re-centres it.

use super::fft::{multiply, Fft2d, Spectrum};
use crate::config::BoundaryMode;
use crate::grid::FieldData;
use rayon::prelude::*;

/// Convolution solver with a precomputed Green's function spectrum
#[derive(Debug)]
pub struct PotentialSolver {
    fft: Fft2d,
    green_spectrum: Spectrum,
    boundary: BoundaryMode,
}

impl PotentialSolver {
    /// Precompute the Green's function spectrum
    ///
    /// # Panics
    ///
    /// Panics if `green` is not square
    #[must_use]
    pub fn new(green: &FieldData, boundary: BoundaryMode) -> Self {
        assert_eq!(green.width, green.height, "Green's function must be square");
        let fft = Fft2d::new(green.width);
        let green_spectrum = fft.forward(green);
        Self {
            fft,
            green_spectrum,
            boundary,
        }
    }

    /// Potential of a density field
    ///
    /// # Arguments
    ///
    /// * `density` - Mass per cell on the working grid
    ///
    /// # Returns
    ///
    /// Centred potential on the same grid, with the outermost rows and
    /// columns zeroed in non-periodic mode
    ///
    /// # Panics
    ///
    /// Panics if `density` does not match the working grid
    #[must_use]
    pub fn solve(&self, density: &FieldData) -> FieldData {
        let density_spectrum = self.fft.forward(density);
        let mut potential = self
            .fft
            .inverse_real(multiply(&density_spectrum, &self.green_spectrum));

        centre_half_cell(&mut potential);

        if self.boundary == BoundaryMode::NonPeriodic {
            zero_border(&mut potential);
        }
        potential
    }
}

/// Average each axis with its one-cell cyclic shift, x first then y
///
/// `V[i] ← ½ (V[i] + V[i-1])` with wraparound.
pub fn centre_half_cell(field: &mut FieldData) {
    let (w, h) = (field.width, field.height);
    if w == 0 || h == 0 {
        return;
    }

    // Rows are independent along x; walk right to left so V[x-1] is unmodified
    field.as_mut_slice().par_chunks_mut(w).for_each(|row| {
        let last = row[w - 1];
        for x in (1..w).rev() {
            row[x] = 0.5 * (row[x] + row[x - 1]);
        }
        row[0] = 0.5 * (row[0] + last);
    });

    let shifted = field.as_slice().to_vec();
    field
        .as_mut_slice()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let below = if y == 0 { h - 1 } else { y - 1 };
            let prev = &shifted[below * w..(below + 1) * w];
            for (value, &under) in row.iter_mut().zip(prev) {
                *value = 0.5 * (*value + under);
            }
        });
}

/// Pin the outermost rows and columns to zero
pub fn zero_border(field: &mut FieldData) {
    let (w, h) = (field.width, field.height);
    if w == 0 || h == 0 {
        return;
    }
    let data = field.as_mut_slice();
    data[..w].fill(0.0);
    data[(h - 1) * w..].fill(0.0);
    data.par_chunks_mut(w).for_each(|row| {
        row[0] = 0.0;
        row[w - 1] = 0.0;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Mesh;
    use crate::solver::green::build_green_function;
    use approx::assert_relative_eq;

    #[test]
    fn test_centre_half_cell_averages_neighbours() {
        let mut field = FieldData::square(4);
        field.set(1, 1, 4.0);
        centre_half_cell(&mut field);

        // Mass spreads to (1,1), (2,1), (1,2), (2,2)
        assert_eq!(field.get(1, 1), 1.0);
        assert_eq!(field.get(2, 1), 1.0);
        assert_eq!(field.get(1, 2), 1.0);
        assert_eq!(field.get(2, 2), 1.0);
        assert_eq!(field.sum(), 4.0);
    }

    #[test]
    fn test_centre_half_cell_wraps_both_axes() {
        let mut field = FieldData::new(4, 3);
        field.set(3, 2, 8.0);
        field.set(1, 0, 4.0);
        centre_half_cell(&mut field);

        // Corner mass wraps onto column 0 and row 0
        assert_eq!(field.get(3, 2), 2.0);
        assert_eq!(field.get(0, 2), 2.0);
        assert_eq!(field.get(3, 0), 2.0);
        assert_eq!(field.get(0, 0), 2.0);
        // Interior mass spreads right and up only
        assert_eq!(field.get(1, 0), 1.0);
        assert_eq!(field.get(2, 0), 1.0);
        assert_eq!(field.get(1, 1), 1.0);
        assert_eq!(field.get(2, 1), 1.0);
        assert_eq!(field.sum(), 12.0);
    }

    #[test]
    fn test_zero_border_keeps_interior() {
        let mut field = FieldData::from_vec(5, 4, vec![1.0; 20]);
        zero_border(&mut field);
        for y in 0..4 {
            for x in 0..5 {
                let interior = (1..4).contains(&x) && (1..3).contains(&y);
                assert_eq!(field.get(x, y), if interior { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_point_mass_potential_is_symmetric() {
        let n = 32;
        let mesh = Mesh::new(n);
        let green = build_green_function(mesh, 0.1).unwrap();
        let solver = PotentialSolver::new(&green, BoundaryMode::Periodic);

        let mut density = FieldData::square(n);
        density.set(16, 16, 1.0);
        let potential = solver.solve(&density);

        for k in 1..8 {
            assert_relative_eq!(
                potential.get(16 + k, 16),
                potential.get(16 - k, 16),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                potential.get(16, 16 + k),
                potential.get(16, 16 - k),
                epsilon = 1e-12
            );
        }
        // Peaks at the particle
        assert!(potential.get(16, 16) > potential.get(20, 16));
    }

    #[test]
    fn test_non_periodic_border_is_zero() {
        let n = 32;
        let green = build_green_function(Mesh::new(n), 0.8).unwrap();
        let solver = PotentialSolver::new(&green, BoundaryMode::NonPeriodic);

        let mut density = FieldData::square(n);
        density.set(5, 7, 2.0);
        density.set(12, 3, 1.0);
        let potential = solver.solve(&density);

        for i in 0..n {
            assert_eq!(potential.get(i, 0), 0.0);
            assert_eq!(potential.get(i, n - 1), 0.0);
            assert_eq!(potential.get(0, i), 0.0);
            assert_eq!(potential.get(n - 1, i), 0.0);
        }
        assert!(potential.get(5, 7) > 0.0);
    }
}
