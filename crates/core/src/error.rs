//! Error type shared by every stage of the particle-mesh pipeline
//!
//! All errors are fatal for the current run: the simulation is deterministic,
//! so the right response to a violated invariant is to stop and report.

/// Errors raised while configuring or running a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum PmError {
    /// Boundary mode string did not name a known mode
    UnknownBoundaryMode(String),
    /// Grid side length is too small to build a mesh
    InvalidGridSize(usize),
    /// Working grid side is odd, so the Green's function mirror is ill-defined
    OddGridSize(usize),
    /// A scalar parameter is outside its legal range
    InvalidParameter {
        /// Parameter name (e.g. `"softening"`, `"dt"`)
        name: &'static str,
        /// Offending value
        value: f64,
    },
    /// Particle arrays do not share a common length
    LengthMismatch {
        /// Number of positions supplied
        positions: usize,
        /// Number of velocities supplied
        velocities: usize,
        /// Number of masses supplied
        masses: usize,
    },
    /// Particle mass is zero, negative, or not finite
    NonPositiveMass {
        /// Particle index
        particle: usize,
        /// Offending mass
        mass: f64,
    },
    /// Particle mass is positive but too small to integrate
    NegligibleMass {
        /// Particle index
        particle: usize,
        /// Offending mass
        mass: f64,
        /// Smallest mass accepted for this system
        floor: f64,
    },
    /// Particle position or velocity is not finite
    NonFiniteState {
        /// Particle index
        particle: usize,
    },
    /// Particle lies outside the legal region for non-periodic mode
    OutOfBounds {
        /// Particle index
        particle: usize,
        /// Axis (0 = x, 1 = y)
        axis: usize,
        /// Offending coordinate
        value: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },
    /// Initial-condition request cannot produce a particle system
    InvalidInitialConditions(String),
    /// `evolve` was called before `initialize`
    NotInitialized,
    /// Positions, velocities or energy stopped being finite during a run
    Diverged {
        /// Step count at which the state was found non-finite
        step: u64,
    },
    /// Diagnostics could not be written
    Io(String),
    /// Laplace boundary-value solver received inconsistent input
    Laplace(String),
}

impl std::fmt::Display for PmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PmError::UnknownBoundaryMode(mode) => {
                write!(
                    f,
                    "Unknown boundary mode '{mode}' (expected 'periodic' or 'non-periodic')"
                )
            }
            PmError::InvalidGridSize(size) => {
                write!(f, "Grid size must be at least 2, got {size}")
            }
            PmError::OddGridSize(size) => {
                write!(f, "Working grid size must be even for kernel mirroring, got {size}")
            }
            PmError::InvalidParameter { name, value } => {
                write!(f, "Parameter {name} must be finite and positive, got {value}")
            }
            PmError::LengthMismatch {
                positions,
                velocities,
                masses,
            } => write!(
                f,
                "Particle arrays differ in length: {positions} positions, \
                 {velocities} velocities, {masses} masses"
            ),
            PmError::NonPositiveMass { particle, mass } => {
                write!(f, "Particle {particle} has invalid mass {mass}")
            }
            PmError::NegligibleMass {
                particle,
                mass,
                floor,
            } => write!(
                f,
                "Particle {particle} mass {mass:e} is below the floor {floor:e}"
            ),
            PmError::NonFiniteState { particle } => {
                write!(f, "Particle {particle} has a non-finite position or velocity")
            }
            PmError::OutOfBounds {
                particle,
                axis,
                value,
                min,
                max,
            } => write!(
                f,
                "Particle {particle} axis {axis} at {value} is outside [{min}, {max}]"
            ),
            PmError::InvalidInitialConditions(msg) => {
                write!(f, "Invalid initial conditions: {msg}")
            }
            PmError::NotInitialized => {
                write!(f, "Simulation must be initialized before evolving")
            }
            PmError::Diverged { step } => {
                write!(f, "Simulation state became non-finite at step {step}")
            }
            PmError::Io(msg) => write!(f, "Failed to write diagnostics: {msg}"),
            PmError::Laplace(msg) => write!(f, "Laplace solver: {msg}"),
        }
    }
}

impl std::error::Error for PmError {}

impl From<std::io::Error> for PmError {
    fn from(err: std::io::Error) -> Self {
        PmError::Io(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PmError>;
