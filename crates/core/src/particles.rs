//! Particle system storage
//!
//! Particles are kept as parallel arrays (position, velocity, mass) sharing one
//! index. Positions and velocities change every step; masses are fixed for the
//! lifetime of a run.

use crate::error::{PmError, Result};
use nalgebra::Vector2;
use rayon::prelude::*;

/// 2D vector type used for particle positions, velocities and forces
pub type Vec2 = Vector2<f64>;

/// Smallest mass accepted in absolute terms
///
/// The kick divides a cell's force by the particle mass, so masses near the
/// bottom of the `f64` range overflow the velocity within one step.
pub const MIN_MASS: f64 = 1e-150;

/// Smallest accepted ratio of a mass to the heaviest mass in the system
///
/// A particle sharing a cell with the heaviest mass is accelerated by the
/// whole cell's density, so its kick grows with the inverse of this ratio.
pub const MIN_MASS_RATIO: f64 = 1e-24;

/// Ordered set of N point particles
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    masses: Vec<f64>,
}

impl ParticleSystem {
    /// Build a particle system from parallel arrays
    ///
    /// # Errors
    ///
    /// Returns an error if the arrays differ in length, a mass is not a finite
    /// positive number, a mass is below [`MIN_MASS`] or [`MIN_MASS_RATIO`]
    /// times the heaviest mass, or a position or velocity is not finite.
    pub fn new(positions: Vec<Vec2>, velocities: Vec<Vec2>, masses: Vec<f64>) -> Result<Self> {
        if positions.len() != velocities.len() || positions.len() != masses.len() {
            return Err(PmError::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
                masses: masses.len(),
            });
        }

        for (particle, &mass) in masses.iter().enumerate() {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(PmError::NonPositiveMass { particle, mass });
            }
        }

        let heaviest = masses.iter().copied().fold(0.0, f64::max);
        let floor = MIN_MASS.max(heaviest * MIN_MASS_RATIO);
        if let Some((particle, &mass)) = masses.iter().enumerate().find(|&(_, &m)| m < floor) {
            return Err(PmError::NegligibleMass {
                particle,
                mass,
                floor,
            });
        }

        for (particle, (p, v)) in positions.iter().zip(velocities.iter()).enumerate() {
            if !(p.iter().all(|c| c.is_finite()) && v.iter().all(|c| c.is_finite())) {
                return Err(PmError::NonFiniteState { particle });
            }
        }

        Ok(Self {
            positions,
            velocities,
            masses,
        })
    }

    /// Convenience constructor for a single particle
    ///
    /// # Errors
    ///
    /// Same conditions as [`ParticleSystem::new`].
    pub fn single(position: Vec2, velocity: Vec2, mass: f64) -> Result<Self> {
        Self::new(vec![position], vec![velocity], vec![mass])
    }

    /// Check that every particle lies inside `[1, grid_size - 1]` on both axes
    ///
    /// Required for non-periodic runs, where only the first quadrant of the
    /// doubled working grid holds real particles.
    ///
    /// # Errors
    ///
    /// Returns [`PmError::OutOfBounds`] for the first offending coordinate.
    pub fn check_inner_region(&self, grid_size: usize) -> Result<()> {
        let min = 1.0;
        let max = grid_size as f64 - 1.0;
        for (particle, p) in self.positions.iter().enumerate() {
            for axis in 0..2 {
                let value = p[axis];
                if value < min || value > max {
                    return Err(PmError::OutOfBounds {
                        particle,
                        axis,
                        value,
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of particles
    #[must_use]
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// True if the system holds no particles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Particle positions
    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Particle velocities
    #[must_use]
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    /// Particle masses
    #[must_use]
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Mutable positions and velocities together with read-only masses
    pub fn state_mut(&mut self) -> (&mut [Vec2], &mut [Vec2], &[f64]) {
        (
            self.positions.as_mut_slice(),
            self.velocities.as_mut_slice(),
            self.masses.as_slice(),
        )
    }

    /// Index of the first particle whose position or velocity is not finite
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        let finite = |v: &Vec2| v.iter().all(|c| c.is_finite());
        self.positions
            .iter()
            .zip(&self.velocities)
            .position(|(p, v)| !(finite(p) && finite(v)))
    }

    /// Total mass of the system
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// Kinetic energy ½ Σ m |v|²
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self
            .velocities
            .par_iter()
            .zip(self.masses.par_iter())
            .map(|(v, m)| m * v.norm_squared())
            .sum::<f64>()
    }
}
