//! Particle-mesh solver stages
//!
//! Each stage is a free function or small struct over
//! [`FieldData`](crate::grid::FieldData) so it can be tested in isolation. One step of the
//! simulation chains them in a fixed order:
//!
//! 1. [`assign_density`] bins masses and returns the [`CellIndices`]
//! 2. [`PotentialSolver::solve`] convolves density with the Green's function
//! 3. [`compute_force_mesh`] differentiates the potential
//! 4. [`interpolate_forces`] samples forces at the recorded cells
//! 5. [`kick_drift`] advances particles
//!
//! The Green's function is built once by [`build_green_function`].

mod density;
mod fft;
mod force;
mod green;
mod integrator;
mod potential;

pub use density::{assign_density, CellIndices};
pub use fft::{multiply, Fft2d, Spectrum};
pub use force::{compute_force_mesh, interpolate_forces, ForceMesh};
pub use green::{build_green_function, softened_kernel};
pub use integrator::kick_drift;
pub use potential::{centre_half_cell, zero_border, PotentialSolver};
