//! Softened Green's function
//!
//! The kernel is the softened inverse-distance response to a unit mass at the
//! mesh origin:
//!
//! ```text
//! g(r) = 1 / (4π · sqrt(max(r², ε²) + ε²))
//! ```
//!
//! It is built once per simulation. To emulate periodic images on a finite
//! grid it is mirrored about the half-grid index, first in x over the lower
//! y-half, then in y over the full x range.

use crate::error::{PmError, Result};
use crate::grid::{FieldData, Mesh};
use std::f64::consts::PI;

/// Softened kernel value for squared distance `r2`
#[inline]
#[must_use]
pub fn softened_kernel(r2: f64, softening: f64) -> f64 {
    let eps2 = softening * softening;
    1.0 / (4.0 * PI * (r2.max(eps2) + eps2).sqrt())
}

/// Build the mirrored Green's function field for `mesh`
///
/// # Arguments
///
/// * `mesh` - Working mesh; its side must be even
/// * `softening` - Softening length ε in cell units
///
/// # Returns
///
/// Kernel field of the mesh size, symmetric under `x → n-1-x` and `y → n-1-y`
///
/// # Errors
///
/// Returns [`PmError::OddGridSize`] if the mesh side is odd, and
/// [`PmError::InvalidParameter`] if the softening is not finite and positive.
pub fn build_green_function(mesh: Mesh, softening: f64) -> Result<FieldData> {
    let n = mesh.size();
    if n % 2 != 0 {
        return Err(PmError::OddGridSize(n));
    }
    if !(softening.is_finite() && softening > 0.0) {
        return Err(PmError::InvalidParameter {
            name: "softening",
            value: softening,
        });
    }

    let mut green = FieldData::square(n);
    for y in 0..n {
        for x in 0..n {
            green.set(x, y, softened_kernel(mesh.squared_radius(x, y), softening));
        }
    }

    let half = mesh.half();

    // Upper x-half mirrors the lower x-half, lower y-half only
    for y in 0..half {
        for x in half..n {
            let mirrored = green.get(n - 1 - x, y);
            green.set(x, y, mirrored);
        }
    }

    // Upper y-half mirrors the lower y-half across all x
    for y in half..n {
        for x in 0..n {
            let mirrored = green.get(x, n - 1 - y);
            green.set(x, y, mirrored);
        }
    }

    Ok(green)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_is_softened_at_origin() {
        let eps = 0.1;
        let expected = 1.0 / (4.0 * PI * (2.0_f64 * eps * eps).sqrt());
        assert_relative_eq!(softened_kernel(0.0, eps), expected);
        // Below the floor every radius gives the same value
        assert_eq!(softened_kernel(0.001, eps), softened_kernel(0.0, eps));
        assert_relative_eq!(softened_kernel(100.0, eps), 1.0 / (4.0 * PI * 100.01_f64.sqrt()));
    }

    #[test]
    fn test_mirror_symmetry_is_exact() {
        for &n in &[8_usize, 16, 64] {
            let green = build_green_function(Mesh::new(n), 0.1).unwrap();
            for y in 0..n {
                for x in 0..n {
                    assert_eq!(green.get(x, y), green.get(n - 1 - x, y));
                    assert_eq!(green.get(x, y), green.get(x, n - 1 - y));
                }
            }
        }
    }

    #[test]
    fn test_lower_quadrant_keeps_radial_values() {
        let mesh = Mesh::new(16);
        let green = build_green_function(mesh, 0.5).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(
                    green.get(x, y),
                    softened_kernel(mesh.squared_radius(x, y), 0.5)
                );
            }
        }
        // Peak sits in the four corners after mirroring
        let peak = green.get(0, 0);
        assert_eq!(green.get(15, 0), peak);
        assert_eq!(green.get(0, 15), peak);
        assert_eq!(green.get(15, 15), peak);
    }

    #[test]
    fn test_odd_size_rejected() {
        assert_eq!(
            build_green_function(Mesh::new(15), 0.1),
            Err(PmError::OddGridSize(15))
        );
    }

    #[test]
    fn test_non_positive_softening_rejected() {
        assert!(matches!(
            build_green_function(Mesh::new(16), -1.0),
            Err(PmError::InvalidParameter { name: "softening", .. })
        ));
    }
}
