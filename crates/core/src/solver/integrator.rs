//! Kick-drift time integration
//!
//! The adopted scheme is semi-implicit (symplectic) Euler: the velocity is
//! kicked with the force of the current step, then the position drifts with
//! the new velocity. There is no half-step force evaluation, so it is not a
//! synchronised leapfrog; energy behavior is checked empirically.
//!
//! ```text
//! v ← v + F·dt/m
//! x ← (x + v·dt) mod L
//! ```
//!
//! Positions always wrap onto the working grid, in both boundary modes.

use crate::grid::Mesh;
use crate::particles::Vec2;
use rayon::prelude::*;

/// Advance positions and velocities by one step of `dt`
///
/// # Arguments
///
/// * `positions` - Particle positions, wrapped onto `mesh` after the drift
/// * `velocities` - Particle velocities, kicked in place
/// * `masses` - Particle masses
/// * `forces` - Force on each particle for this step
/// * `dt` - Timestep
/// * `mesh` - Working mesh defining the wrap length
///
/// # Panics
///
/// Panics if the slices differ in length
pub fn kick_drift(
    positions: &mut [Vec2],
    velocities: &mut [Vec2],
    masses: &[f64],
    forces: &[Vec2],
    dt: f64,
    mesh: Mesh,
) {
    let n = positions.len();
    assert!(
        velocities.len() == n && masses.len() == n && forces.len() == n,
        "Particle arrays differ in length"
    );

    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .zip(masses.par_iter().zip(forces.par_iter()))
        .for_each(|((p, v), (&m, f))| {
            *v += f * (dt / m);
            let moved = *p + *v * dt;
            p.x = mesh.wrap_coordinate(moved.x);
            p.y = mesh.wrap_coordinate(moved.y);
        });
}
