//! Initial particle systems
//!
//! Builds the particle arrays a simulation starts from: user-pinned particles
//! first, then randomly placed ones. Randomness comes from a seeded `StdRng`
//! so every run is reproducible.
//!
//! Also provides the named [`Scenario`] presets the headless driver runs.

use crate::config::{BoundaryMode, SimulationConfig};
use crate::error::{PmError, Result};
use crate::grid::Mesh;
use crate::particles::{ParticleSystem, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::str::FromStr;

/// Margin kept from the inner-region bounds when sampling non-periodic positions
const NON_PERIODIC_MARGIN: f64 = 1.0001;

/// How random particle velocities are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityInit {
    /// Every particle starts at rest (pinned velocities are ignored)
    Zero,
    /// Pinned velocities first, the rest drawn from N(0, 1)·`max_speed` per axis
    Gaussian {
        /// Scale of the per-axis normal draw
        max_speed: f64,
    },
}

/// How particle masses are chosen
#[derive(Debug, Clone, PartialEq)]
pub enum MassInit {
    /// Every particle has the same mass
    Uniform(f64),
    /// Explicit per-particle masses
    PerParticle(Vec<f64>),
    /// Mass fluctuations ∝ k⁻³ derived from the particle positions
    ///
    /// `k` is the magnitude of the real part of the position Fourier
    /// transform, floored at `softening`.
    Spectrum {
        /// Mass scale before the k⁻³ factor
        base_mass: f64,
        /// Floor applied to `k`
        softening: f64,
    },
}

/// Recipe for an initial particle system
#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditions {
    /// Total particle count (pinned plus random)
    pub count: usize,
    /// Configured grid side
    pub grid_size: usize,
    /// Boundary mode; non-periodic restricts positions to `[1, grid_size - 1]`
    pub boundary: BoundaryMode,
    /// Positions of the first particles
    pub pinned_positions: Vec<Vec2>,
    /// Velocities of the first particles
    pub pinned_velocities: Vec<Vec2>,
    /// Velocity rule
    pub velocities: VelocityInit,
    /// Mass rule
    pub masses: MassInit,
    /// Random seed
    pub seed: u64,
}

impl InitialConditions {
    /// `count` particles of unit mass at rest, placed at random on a periodic grid
    #[must_use]
    pub fn new(count: usize, grid_size: usize) -> Self {
        Self {
            count,
            grid_size,
            boundary: BoundaryMode::Periodic,
            pinned_positions: Vec::new(),
            pinned_velocities: Vec::new(),
            velocities: VelocityInit::Zero,
            masses: MassInit::Uniform(1.0),
            seed: 42,
        }
    }

    /// Set the boundary mode
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Pin the first particles' positions and velocities
    pub fn with_pinned(mut self, positions: Vec<Vec2>, velocities: Vec<Vec2>) -> Self {
        self.pinned_positions = positions;
        self.pinned_velocities = velocities;
        self
    }

    /// Set the velocity rule
    pub fn with_velocities(mut self, velocities: VelocityInit) -> Self {
        self.velocities = velocities;
        self
    }

    /// Set the mass rule
    pub fn with_masses(mut self, masses: MassInit) -> Self {
        self.masses = masses;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the particle system
    ///
    /// # Errors
    ///
    /// Returns an error if more particles are pinned than requested, a pinned
    /// particle lies outside the non-periodic inner region, the per-particle
    /// masses do not match the count, or the resulting system is invalid.
    pub fn build(&self) -> Result<ParticleSystem> {
        if self.pinned_positions.len() > self.count {
            return Err(PmError::InvalidInitialConditions(format!(
                "{} pinned positions exceed particle count {}",
                self.pinned_positions.len(),
                self.count
            )));
        }
        if self.grid_size < 3 {
            return Err(PmError::InvalidGridSize(self.grid_size));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let positions = self.sample_positions(&mut rng)?;
        let velocities = self.sample_velocities(&mut rng)?;
        let masses = self.assign_masses(&positions)?;

        ParticleSystem::new(positions, velocities, masses)
    }

    fn sample_positions(&self, rng: &mut StdRng) -> Result<Vec<Vec2>> {
        let size = self.grid_size as f64;
        let mut positions = Vec::with_capacity(self.count);

        match self.boundary {
            BoundaryMode::Periodic => {
                positions.extend_from_slice(&self.pinned_positions);
                for _ in positions.len()..self.count {
                    positions.push(Vec2::new(
                        rng.random::<f64>() * (size - 1.0),
                        rng.random::<f64>() * (size - 1.0),
                    ));
                }
            }
            BoundaryMode::NonPeriodic => {
                let (min, max) = (1.0, size - 1.0);
                for (particle, p) in self.pinned_positions.iter().enumerate() {
                    for axis in 0..2 {
                        if p[axis] < min || p[axis] > max {
                            return Err(PmError::OutOfBounds {
                                particle,
                                axis,
                                value: p[axis],
                                min,
                                max,
                            });
                        }
                    }
                    positions.push(*p);
                }
                let (lo, hi) = (NON_PERIODIC_MARGIN, size - NON_PERIODIC_MARGIN);
                for _ in positions.len()..self.count {
                    positions.push(Vec2::new(
                        rng.random_range(lo..hi),
                        rng.random_range(lo..hi),
                    ));
                }
            }
        }
        Ok(positions)
    }

    fn sample_velocities(&self, rng: &mut StdRng) -> Result<Vec<Vec2>> {
        match self.velocities {
            VelocityInit::Zero => Ok(vec![Vec2::zeros(); self.count]),
            VelocityInit::Gaussian { max_speed } => {
                if self.pinned_velocities.len() > self.count {
                    return Err(PmError::InvalidInitialConditions(format!(
                        "{} pinned velocities exceed particle count {}",
                        self.pinned_velocities.len(),
                        self.count
                    )));
                }
                let normal = Normal::new(0.0, 1.0)
                    .map_err(|e| PmError::InvalidInitialConditions(e.to_string()))?;
                let mut velocities = self.pinned_velocities.clone();
                for _ in velocities.len()..self.count {
                    velocities.push(Vec2::new(
                        normal.sample(rng) * max_speed,
                        normal.sample(rng) * max_speed,
                    ));
                }
                Ok(velocities)
            }
        }
    }

    fn assign_masses(&self, positions: &[Vec2]) -> Result<Vec<f64>> {
        match &self.masses {
            MassInit::Uniform(mass) => Ok(vec![*mass; self.count]),
            MassInit::PerParticle(masses) => {
                if masses.len() == self.count {
                    Ok(masses.clone())
                } else {
                    Err(PmError::InvalidInitialConditions(format!(
                        "{} masses supplied for {} particles",
                        masses.len(),
                        self.count
                    )))
                }
            }
            MassInit::Spectrum {
                base_mass,
                softening,
            } => Ok(spectrum_masses(
                positions,
                Mesh::new(self.grid_size),
                *base_mass,
                *softening,
            )),
        }
    }
}

/// Masses ∝ k⁻³ from the Fourier transform of the rounded particle positions
#[must_use]
pub fn spectrum_masses(positions: &[Vec2], mesh: Mesh, base_mass: f64, softening: f64) -> Vec<f64> {
    let n = positions.len();
    if n == 0 {
        return Vec::new();
    }

    let fft = FftPlanner::<f64>::new().plan_fft_forward(n);
    let mut kx: Vec<Complex<f64>> = positions
        .iter()
        .map(|p| Complex::new(mesh.nearest_cell(p.x) as f64, 0.0))
        .collect();
    let mut ky: Vec<Complex<f64>> = positions
        .iter()
        .map(|p| Complex::new(mesh.nearest_cell(p.y) as f64, 0.0))
        .collect();
    fft.process(&mut kx);
    fft.process(&mut ky);

    kx.iter()
        .zip(&ky)
        .map(|(x, y)| {
            let k = x.re.hypot(y.re).max(softening);
            base_mass / (k * k * k)
        })
        .collect()
}

/// Named runs with their published parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// One massive particle at rest in the grid centre
    Stationary,
    /// Two equal masses on a circular orbit
    Orbit,
    /// Many particles at rest, periodic boundary
    UniformPeriodic,
    /// Many particles at rest, isolated boundary
    UniformNonPeriodic,
    /// Many particles with k⁻³ mass fluctuations
    Cosmological,
}

impl Scenario {
    /// All presets
    pub const ALL: [Self; 5] = [
        Self::Stationary,
        Self::Orbit,
        Self::UniformPeriodic,
        Self::UniformNonPeriodic,
        Self::Cosmological,
    ];

    /// Grid side shared by every preset
    pub const GRID_SIZE: usize = 512;

    /// Canonical name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stationary => "stationary",
            Self::Orbit => "orbit",
            Self::UniformPeriodic => "periodic",
            Self::UniformNonPeriodic => "non-periodic",
            Self::Cosmological => "cosmological",
        }
    }

    /// Particle count the preset was designed for
    #[must_use]
    pub const fn default_particle_count(self) -> usize {
        match self {
            Self::Stationary => 1,
            Self::Orbit => 2,
            Self::UniformPeriodic | Self::UniformNonPeriodic | Self::Cosmological => 1 << 17,
        }
    }

    /// Steps per recorded frame
    #[must_use]
    pub const fn steps_per_frame(self) -> usize {
        match self {
            Self::Stationary | Self::Orbit => 1,
            Self::UniformPeriodic | Self::UniformNonPeriodic | Self::Cosmological => 10,
        }
    }

    /// Number of recorded frames
    #[must_use]
    pub const fn frames(self) -> usize {
        match self {
            Self::Stationary => 100,
            Self::Orbit => 200,
            Self::UniformPeriodic | Self::UniformNonPeriodic => 300,
            Self::Cosmological => 450,
        }
    }

    /// Simulation parameters
    #[must_use]
    pub fn config(self) -> SimulationConfig {
        let (dt, softening, boundary) = match self {
            Self::Stationary => (1.0, 0.1, BoundaryMode::Periodic),
            Self::Orbit => (5.0, 0.1, BoundaryMode::Periodic),
            Self::UniformPeriodic => (10.0, 0.8, BoundaryMode::Periodic),
            Self::UniformNonPeriodic => (5.0, 0.8, BoundaryMode::NonPeriodic),
            Self::Cosmological => (330.0, 10.0, BoundaryMode::Periodic),
        };
        SimulationConfig::new(Self::GRID_SIZE, dt)
            .with_softening(softening)
            .with_boundary(boundary)
    }

    /// Initial conditions with `count` particles (ignored by the fixed presets)
    #[must_use]
    pub fn initial_conditions(self, count: usize, seed: u64) -> InitialConditions {
        let centre = (Self::GRID_SIZE / 2) as f64;
        let config = self.config();
        let conditions = match self {
            Self::Stationary => InitialConditions::new(1, Self::GRID_SIZE)
                .with_pinned(vec![Vec2::new(centre, centre)], vec![Vec2::zeros()])
                .with_masses(MassInit::Uniform(10.0)),
            Self::Orbit => InitialConditions::new(2, Self::GRID_SIZE)
                .with_pinned(
                    vec![
                        Vec2::new(centre, centre - 10.0),
                        Vec2::new(centre, centre + 10.0),
                    ],
                    vec![Vec2::new(0.1, 0.0), Vec2::new(-0.1, 0.0)],
                )
                .with_velocities(VelocityInit::Gaussian { max_speed: 1.0 })
                .with_masses(MassInit::Uniform(5.0)),
            Self::UniformPeriodic | Self::UniformNonPeriodic => {
                InitialConditions::new(count, Self::GRID_SIZE)
                    .with_boundary(config.boundary)
                    .with_masses(MassInit::Uniform(1.0 / count.max(1) as f64))
            }
            Self::Cosmological => InitialConditions::new(count, Self::GRID_SIZE).with_masses(
                MassInit::Spectrum {
                    base_mass: 40.0,
                    softening: config.softening,
                },
            ),
        };
        conditions.with_seed(seed)
    }
}

impl FromStr for Scenario {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == wanted)
            .ok_or_else(|| PmError::InvalidInitialConditions(format!("unknown scenario '{s}'")))
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
