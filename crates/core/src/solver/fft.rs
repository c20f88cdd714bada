//! 2D discrete Fourier transforms over square fields
//!
//! Transforms are separable: every row is transformed, then every column.
//! Plans are created once and reused for every step.

use crate::grid::FieldData;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Complex spectrum of a square field, row-major like [`FieldData`]
pub type Spectrum = Vec<Complex<f64>>;

/// Forward and inverse 2D transform plans for an `n × n` grid
pub struct Fft2d {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2d").field("n", &self.n).finish_non_exhaustive()
    }
}

impl Fft2d {
    /// Plan transforms for an `n × n` grid
    #[must_use]
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        Self {
            n,
            forward,
            inverse,
        }
    }

    /// Forward transform of a real field
    ///
    /// # Panics
    ///
    /// Panics if the field is not `n × n`
    #[must_use]
    pub fn forward(&self, field: &FieldData) -> Spectrum {
        assert_eq!(
            (field.width, field.height),
            (self.n, self.n),
            "Field does not match transform size"
        );
        let mut spectrum: Spectrum = field
            .as_slice()
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        self.transform(&mut spectrum, &self.forward);
        spectrum
    }

    /// Inverse transform, keeping the (normalised) real part
    ///
    /// # Panics
    ///
    /// Panics if the spectrum length is not `n²`
    #[must_use]
    pub fn inverse_real(&self, mut spectrum: Spectrum) -> FieldData {
        assert_eq!(
            spectrum.len(),
            self.n * self.n,
            "Spectrum does not match transform size"
        );
        self.transform(&mut spectrum, &self.inverse);
        let scale = 1.0 / (self.n * self.n) as f64;
        let data = spectrum.into_iter().map(|c| c.re * scale).collect();
        FieldData::from_vec(self.n, self.n, data)
    }

    fn transform(&self, buffer: &mut [Complex<f64>], plan: &Arc<dyn Fft<f64>>) {
        let n = self.n;

        // Rows
        buffer.par_chunks_mut(n).for_each(|row| plan.process(row));

        // Columns, via transpose so each column is contiguous
        let mut transposed = transpose(buffer, n);
        transposed
            .par_chunks_mut(n)
            .for_each(|column| plan.process(column));
        buffer.copy_from_slice(&transpose(&transposed, n));
    }
}

fn transpose(buffer: &[Complex<f64>], n: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); n * n];
    out.par_chunks_mut(n).enumerate().for_each(|(col, dst)| {
        for (row, value) in dst.iter_mut().enumerate() {
            *value = buffer[row * n + col];
        }
    });
    out
}

/// Point-wise product of two spectra
///
/// # Panics
///
/// Panics if the spectra differ in length
#[must_use]
pub fn multiply(a: &[Complex<f64>], b: &[Complex<f64>]) -> Spectrum {
    assert_eq!(a.len(), b.len(), "Spectra differ in length");
    a.par_iter().zip(b.par_iter()).map(|(x, y)| x * y).collect()
}
