//! Conjugate gradient on the masked Laplacian

use super::relaxation::squared_norm;
use super::{BoundaryProblem, SolveReport};
use crate::error::{PmError, Result};
use crate::grid::FieldData;
use tracing::{debug, warn};

/// Solve `A·V = b` by conjugate gradient
///
/// Starts from `initial` when given, otherwise from the boundary values.
/// Stops once `Σ r² < threshold` or after `max_iterations`. The returned
/// field carries the fixed values on masked cells.
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if `initial` does not match the grid.
pub fn conjugate_gradient(
    problem: &BoundaryProblem,
    initial: Option<FieldData>,
    max_iterations: usize,
    threshold: f64,
) -> Result<(FieldData, SolveReport)> {
    let n = problem.size();
    let mut field = match initial {
        Some(field) if field.width == n && field.height == n => field,
        Some(field) => {
            return Err(PmError::Laplace(format!(
                "initial guess is {}x{}, problem is {n}x{n}",
                field.width, field.height
            )));
        }
        None => problem.boundary().clone(),
    };

    let mut r = problem.residual(&field);
    let mut direction = r.clone();
    let mut rtr = squared_norm(&r);
    let mut iterations = 0;

    while iterations < max_iterations && rtr >= threshold {
        let a_dir = problem.apply_laplacian(&direction);
        let curvature = direction.dot(&a_dir);
        if curvature <= 0.0 {
            break;
        }
        let alpha = rtr / curvature;

        for (value, step) in field.as_mut_slice().iter_mut().zip(direction.as_slice()) {
            *value += alpha * step;
        }
        for (ri, ad) in r.as_mut_slice().iter_mut().zip(a_dir.as_slice()) {
            *ri -= alpha * ad;
        }

        let rtr_next = squared_norm(&r);
        iterations += 1;
        if rtr_next < threshold {
            rtr = rtr_next;
            break;
        }

        let beta = rtr_next / rtr;
        for (dir, ri) in direction.as_mut_slice().iter_mut().zip(r.as_slice()) {
            *dir = ri + beta * *dir;
        }
        rtr = rtr_next;
    }

    problem.impose(&mut field);

    let converged = rtr < threshold;
    if converged {
        debug!(iterations, residual = rtr, "Conjugate gradient converged");
    } else {
        warn!(
            iterations,
            residual = rtr,
            threshold,
            "Conjugate gradient did not converge"
        );
    }

    Ok((
        field,
        SolveReport {
            iterations,
            residual: rtr,
            converged,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laplace::relax;

    #[test]
    fn test_cg_matches_relaxation() {
        let problem = BoundaryProblem::cylinder(16, 3.0, 1.0).unwrap();

        let (cg, report) = conjugate_gradient(&problem, None, 1000, 1e-18).unwrap();
        assert!(report.converged);

        let mut jacobi = FieldData::square(16);
        let relax_report = relax(&problem, &mut jacobi, 50_000, 1e-16).unwrap();
        assert!(relax_report.converged);
        assert!(report.iterations < relax_report.iterations);

        for (a, b) in cg.as_slice().iter().zip(jacobi.as_slice()) {
            assert!((a - b).abs() < 1e-4, "cg {a} vs relaxation {b}");
        }
    }

    #[test]
    fn test_cg_solution_is_symmetric() {
        let problem = BoundaryProblem::cylinder(17, 3.0, 2.0).unwrap();
        let (field, report) = conjugate_gradient(&problem, None, 1000, 1e-18).unwrap();
        assert!(report.converged);
        for y in 0..17 {
            for x in 0..17 {
                let v = field.get(x, y);
                assert!((v - field.get(16 - x, y)).abs() < 1e-8);
                assert!((v - field.get(y, x)).abs() < 1e-8);
            }
        }
        assert_eq!(field.get(8, 8), 2.0);
    }

    #[test]
    fn test_cg_from_exact_solution_takes_no_steps() {
        let problem = BoundaryProblem::cylinder(12, 2.0, 1.0).unwrap();
        let (solved, _) = conjugate_gradient(&problem, None, 1000, 1e-22).unwrap();
        let (again, report) = conjugate_gradient(&problem, Some(solved), 1000, 1e-16).unwrap();
        assert_eq!(report.iterations, 0);
        assert!(report.converged);
        assert_eq!(again.get(6, 6), 1.0);
    }

    #[test]
    fn test_cg_rejects_wrong_initial_shape() {
        let problem = BoundaryProblem::cylinder(12, 2.0, 1.0).unwrap();
        let result = conjugate_gradient(&problem, Some(FieldData::square(6)), 10, 1e-6);
        assert!(matches!(result, Err(PmError::Laplace(_))));
    }
}
