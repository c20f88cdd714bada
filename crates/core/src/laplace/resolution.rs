//! Multi-resolution conjugate gradient
//!
//! The boundary problem is coarsened by 2×2 blocks, solved on the coarsest
//! grid, and each solution is interpolated up as the starting guess for the
//! next finer grid.

use super::{conjugate_gradient, BoundaryProblem, SolveReport};
use crate::error::{PmError, Result};
use crate::grid::FieldData;
use tracing::info;

/// Halve a square field, keeping the largest-magnitude value of each 2×2 block
///
/// Ties between `+a` and `−a` keep the positive value.
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if the field is not square with an even side.
pub fn downsample_field(field: &FieldData) -> Result<FieldData> {
    let n = even_side(field.width, field.height)?;
    let m = n / 2;
    let mut out = FieldData::square(m);
    for y in 0..m {
        for x in 0..m {
            let block = [
                field.get(2 * x, 2 * y),
                field.get(2 * x + 1, 2 * y),
                field.get(2 * x, 2 * y + 1),
                field.get(2 * x + 1, 2 * y + 1),
            ];
            let hi = block.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let lo = block.iter().copied().fold(f64::INFINITY, f64::min);
            out.set(x, y, if hi >= lo.abs() { hi } else { lo });
        }
    }
    Ok(out)
}

/// Halve a square mask; a coarse cell is fixed if any of its 2×2 block is
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if `n` is odd or the mask is not `n × n`.
pub fn downsample_mask(mask: &[bool], n: usize) -> Result<Vec<bool>> {
    if mask.len() != n * n {
        return Err(PmError::Laplace(format!(
            "mask has {} cells, expected {}",
            mask.len(),
            n * n
        )));
    }
    let m = even_side(n, n)? / 2;
    let mut out = vec![false; m * m];
    for y in 0..m {
        for x in 0..m {
            let top = 2 * y * n + 2 * x;
            let bottom = top + n;
            out[y * m + x] = mask[top] || mask[top + 1] || mask[bottom] || mask[bottom + 1];
        }
    }
    Ok(out)
}

/// Double a square field by bilinear interpolation
///
/// Fine cell `i` samples the coarse grid at `i·(m−1)/(2m−1)`, so the corner
/// values are kept exactly.
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if the field is not square or is smaller
/// than 2×2.
pub fn upsample_field(field: &FieldData) -> Result<FieldData> {
    let m = field.width;
    if field.height != m || m < 2 {
        return Err(PmError::Laplace(format!(
            "cannot upsample a {}x{} field",
            field.width, field.height
        )));
    }
    let n = 2 * m;
    let scale = (m - 1) as f64 / (n - 1) as f64;
    let sample = |fine: usize| {
        let coord = fine as f64 * scale;
        let base = (coord.floor() as usize).min(m - 2);
        (base, coord - base as f64)
    };

    let mut out = FieldData::square(n);
    for y in 0..n {
        let (y0, ty) = sample(y);
        for x in 0..n {
            let (x0, tx) = sample(x);
            let bottom = field.get(x0, y0) * (1.0 - tx) + field.get(x0 + 1, y0) * tx;
            let top = field.get(x0, y0 + 1) * (1.0 - tx) + field.get(x0 + 1, y0 + 1) * tx;
            out.set(x, y, bottom * (1.0 - ty) + top * ty);
        }
    }
    Ok(out)
}

/// Solve with conjugate gradient over `passes` resolutions
///
/// `passes == 1` is a plain [`conjugate_gradient`] solve. The reported
/// iteration count is summed over all levels; the residual and convergence
/// flag are those of the finest level.
///
/// # Errors
///
/// Returns [`PmError::Laplace`] if `passes` is zero or the grid cannot be
/// halved `passes − 1` times into a grid of at least 3×3.
pub fn multi_resolution_cg(
    problem: &BoundaryProblem,
    passes: usize,
    max_iterations: usize,
    threshold: f64,
) -> Result<(FieldData, SolveReport)> {
    if passes == 0 {
        return Err(PmError::Laplace("at least one pass is required".into()));
    }

    let mut levels = vec![problem.clone()];
    for _ in 1..passes {
        let finer = &levels[levels.len() - 1];
        let boundary = downsample_field(finer.boundary())?;
        let mask = downsample_mask(finer.mask(), finer.size())?;
        levels.push(BoundaryProblem::new(boundary, mask)?);
    }

    let mut guess = None;
    let mut total_iterations = 0;
    let mut last = None;
    for (depth, level) in levels.iter().enumerate().rev() {
        let (solution, report) = conjugate_gradient(level, guess.take(), max_iterations, threshold)?;
        info!(
            depth,
            size = level.size(),
            iterations = report.iterations,
            residual = report.residual,
            "Resolution pass finished"
        );
        total_iterations += report.iterations;
        if depth > 0 {
            guess = Some(upsample_field(&solution)?);
        }
        last = Some((solution, report));
    }

    let (solution, report) = last.ok_or_else(|| PmError::Laplace("no levels solved".into()))?;
    Ok((
        solution,
        SolveReport {
            iterations: total_iterations,
            ..report
        },
    ))
}

fn even_side(width: usize, height: usize) -> Result<usize> {
    if width != height || width % 2 != 0 {
        return Err(PmError::Laplace(format!(
            "cannot halve a {width}x{height} grid"
        )));
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_downsample_keeps_largest_magnitude() {
        let wide = FieldData::new(4, 2);
        assert!(downsample_field(&wide).is_err());

        let field = FieldData::from_vec(2, 2, vec![1.0, -3.0, 0.5, 2.0]);
        assert_eq!(downsample_field(&field).unwrap().get(0, 0), -3.0);

        let tie = FieldData::from_vec(2, 2, vec![-2.0, 2.0, 0.0, 0.0]);
        assert_eq!(downsample_field(&tie).unwrap().get(0, 0), 2.0);
    }

    #[test]
    fn test_downsample_mask_any() {
        let mut mask = vec![false; 16];
        mask[5] = true;
        let coarse = downsample_mask(&mask, 4).unwrap();
        assert_eq!(coarse, vec![true, false, false, false]);
    }

    #[test]
    fn test_upsample_keeps_corners_and_linear_ramps() {
        let coarse = FieldData::from_vec(3, 3, (0..9_i32).map(|i| f64::from(i % 3)).collect());
        let fine = upsample_field(&coarse).unwrap();
        assert_eq!(fine.width, 6);
        assert_relative_eq!(fine.get(0, 0), 0.0);
        assert_relative_eq!(fine.get(5, 5), 2.0, epsilon = 1e-12);
        for x in 0..6 {
            let expected = x as f64 * 2.0 / 5.0;
            assert_relative_eq!(fine.get(x, 3), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_multi_resolution_matches_direct_solve() {
        let problem = BoundaryProblem::cylinder(32, 4.0, 1.0).unwrap();
        let (direct, _) = conjugate_gradient(&problem, None, 2000, 1e-18).unwrap();
        let (multi, report) = multi_resolution_cg(&problem, 3, 2000, 1e-18).unwrap();

        assert!(report.converged);
        for (a, b) in multi.as_slice().iter().zip(direct.as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_multi_resolution_rejects_bad_passes() {
        let problem = BoundaryProblem::cylinder(12, 2.0, 1.0).unwrap();
        assert!(multi_resolution_cg(&problem, 0, 100, 1e-6).is_err());
        // 12 → 6 → 3 → cannot halve again
        assert!(multi_resolution_cg(&problem, 4, 100, 1e-6).is_err());
    }
}
