//! Jacobi relaxation

use super::{BoundaryProblem, SolveReport};
use crate::error::{PmError, Result};
use crate::grid::FieldData;
use tracing::{debug, warn};

/// Relax `field` in place until `Σ r² < threshold` or `max_iterations`
///
/// Each sweep replaces every free interior cell by the mean of its four
/// neighbours from the previous sweep, then restores the fixed cells.
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if `field` does not match the grid.
pub fn relax(
    problem: &BoundaryProblem,
    field: &mut FieldData,
    max_iterations: usize,
    threshold: f64,
) -> Result<SolveReport> {
    let n = problem.size();
    if field.width != n || field.height != n {
        return Err(PmError::Laplace(format!(
            "field is {}x{}, problem is {n}x{n}",
            field.width, field.height
        )));
    }

    problem.impose(field);
    let mut previous = field.clone();
    let mut residual = squared_norm(&problem.residual(field));
    let mut iterations = 0;

    while iterations < max_iterations && residual >= threshold {
        previous.as_mut_slice().copy_from_slice(field.as_slice());
        let old = previous.as_slice();
        let cells = field.as_mut_slice();
        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let idx = y * n + x;
                cells[idx] = 0.25 * (old[idx - 1] + old[idx + 1] + old[idx - n] + old[idx + n]);
            }
        }
        problem.impose(field);

        residual = squared_norm(&problem.residual(field));
        iterations += 1;
    }

    let converged = residual < threshold;
    if converged {
        debug!(iterations, residual, "Relaxation converged");
    } else {
        warn!(iterations, residual, threshold, "Relaxation did not converge");
    }

    Ok(SolveReport {
        iterations,
        residual,
        converged,
    })
}

pub(super) fn squared_norm(field: &FieldData) -> f64 {
    field.dot(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaxation_converges_on_cylinder() {
        let problem = BoundaryProblem::cylinder(16, 3.0, 1.0).unwrap();
        let mut field = FieldData::square(16);
        let report = relax(&problem, &mut field, 20_000, 1e-10).unwrap();

        assert!(report.converged);
        assert!(report.residual < 1e-10);
        // Maximum principle: free cells lie between the wall and the cylinder
        for &value in field.as_slice() {
            assert!((-1e-9..=1.0 + 1e-9).contains(&value));
        }
        assert_eq!(field.get(8, 8), 1.0);
        assert_eq!(field.get(0, 5), 0.0);
    }

    #[test]
    fn test_relaxation_stops_at_iteration_cap() {
        let problem = BoundaryProblem::cylinder(16, 3.0, 1.0).unwrap();
        let mut field = FieldData::square(16);
        let report = relax(&problem, &mut field, 3, 1e-30).unwrap();
        assert_eq!(report.iterations, 3);
        assert!(!report.converged);
    }

    #[test]
    fn test_relaxation_rejects_wrong_shape() {
        let problem = BoundaryProblem::cylinder(16, 3.0, 1.0).unwrap();
        let mut field = FieldData::square(8);
        assert!(relax(&problem, &mut field, 10, 1e-6).is_err());
    }
}
