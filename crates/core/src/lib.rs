//! Particle-Mesh Gravity Core Library
//!
//! A 2D particle-mesh (PM) N-body gravity simulator. Particle masses are binned
//! onto a square mesh, the potential is found by FFT convolution with a
//! softened Green's function, and the resulting mesh forces advance the
//! particles with a kick-drift integrator.
//!
//! ## Boundaries
//!
//! - Periodic: the mesh is the simulation box and everything wraps
//! - Non-periodic: the mesh is doubled and the particle box sits in the first
//!   quadrant so that images never interact
//!
//! ## Extras
//!
//! - Preset scenarios and seeded initial conditions ([`initial`])
//! - Energy and position logs ([`diagnostics`])
//! - A standalone Laplace boundary-value solver ([`laplace`])

// Configuration and errors
pub mod config;
pub mod error;

// Mesh and particle state
pub mod grid;
pub mod particles;

// PM stages and the simulation driver
pub mod simulation;
pub mod solver;

// Setup and output helpers
pub mod diagnostics;
pub mod initial;

// Standalone boundary-value solvers
pub mod laplace;

// Re-export core types
pub use config::{BoundaryMode, SimulationConfig};
pub use error::{PmError, Result};
pub use grid::{FieldData, Mesh};
pub use particles::{ParticleSystem, Vec2};

// Re-export simulation types
pub use diagnostics::DiagnosticsSink;
pub use initial::{InitialConditions, MassInit, Scenario, VelocityInit};
pub use simulation::{EnergyReport, Simulation, StepReport};
