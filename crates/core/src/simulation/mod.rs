//! Particle-mesh simulation driver
//!
//! Construction only validates and stores the configuration and particles.
//! [`Simulation::initialize`] then builds the derived mesh state (Green's
//! function, its spectrum, and the initial density), and
//! [`Simulation::evolve`] runs the step loop:
//!
//! ```text
//! density → potential → force mesh → particle forces → kick-drift → density
//! ```
//!
//! The density always reflects the most recently integrated positions before
//! the next force computation.

use crate::config::{BoundaryMode, SimulationConfig};
use crate::diagnostics::DiagnosticsSink;
use crate::error::{PmError, Result};
use crate::grid::{FieldData, Mesh};
use crate::particles::{ParticleSystem, Vec2};
use crate::solver::{
    assign_density, build_green_function, compute_force_mesh, interpolate_forces, kick_drift,
    CellIndices, PotentialSolver,
};
use std::io::Write;
use tracing::{debug, error, info};

/// Energy breakdown of the current state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReport {
    /// ½ Σ m |v|²
    pub kinetic: f64,
    /// −½ Σ Φ·ρ over all cells
    pub potential: f64,
    /// Sum of both terms
    pub total: f64,
}

/// Result of an [`Simulation::evolve`] call
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Total energy after the last step
    pub energy: f64,
    /// Particle positions after the last step
    pub positions: Vec<Vec2>,
}

/// Mesh quantities derived in `initialize`
#[derive(Debug)]
struct MeshState {
    green: FieldData,
    solver: PotentialSolver,
    density: FieldData,
    cells: CellIndices,
}

/// Particle-mesh gravity simulation
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    mesh: Mesh,
    particles: ParticleSystem,
    state: Option<MeshState>,
    steps_taken: u64,
    last_energy: Option<f64>,
}

impl Simulation {
    /// Validate and store a configuration and initial particle system
    ///
    /// No mesh quantity is computed here; call [`Simulation::initialize`]
    /// before evolving.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or, in non-periodic
    /// mode, if a particle lies outside `[1, grid_size - 1]`.
    pub fn new(config: SimulationConfig, particles: ParticleSystem) -> Result<Self> {
        config.validate()?;
        if config.boundary == BoundaryMode::NonPeriodic {
            particles.check_inner_region(config.grid_size)?;
        }

        let mesh = Mesh::new(config.working_size());
        debug!(
            grid_size = config.grid_size,
            working_size = mesh.size(),
            boundary = %config.boundary,
            particles = particles.len(),
            "Simulation configured"
        );

        Ok(Self {
            config,
            mesh,
            particles,
            state: None,
            steps_taken: 0,
            last_energy: None,
        })
    }

    /// Build the Green's function, its spectrum, and the initial density
    ///
    /// Calling this again rebuilds the mesh state from the current positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the Green's function cannot be built for the mesh.
    pub fn initialize(&mut self) -> Result<()> {
        let green = build_green_function(self.mesh, self.config.softening)?;
        let solver = PotentialSolver::new(&green, self.config.boundary);
        let (density, cells) =
            assign_density(self.particles.positions(), self.particles.masses(), self.mesh);

        info!(
            working_size = self.mesh.size(),
            softening = self.config.softening,
            total_mass = density.sum(),
            "Particle-mesh state initialized"
        );

        self.state = Some(MeshState {
            green,
            solver,
            density,
            cells,
        });
        Ok(())
    }

    /// Run `steps` integration steps, then report total energy and positions
    ///
    /// # Arguments
    ///
    /// * `steps` - Number of kick-drift steps to take (zero only re-reports)
    ///
    /// # Returns
    ///
    /// Total energy and particle positions after the last step
    ///
    /// # Errors
    ///
    /// Returns [`PmError::NotInitialized`] if [`Simulation::initialize`] has not
    /// been called, and [`PmError::Diverged`] as soon as a position, velocity
    /// or the total energy stops being finite. The particle state is left as
    /// it was at the failing step, and the run cannot meaningfully continue.
    pub fn evolve(&mut self, steps: usize) -> Result<StepReport> {
        let state = self.state.as_mut().ok_or(PmError::NotInitialized)?;

        for _ in 0..steps {
            advance(state, &mut self.particles, &self.config, self.mesh);
            self.steps_taken += 1;
            if let Some(particle) = self.particles.first_non_finite() {
                error!(step = self.steps_taken, particle, "Particle state is not finite");
                return Err(PmError::Diverged {
                    step: self.steps_taken,
                });
            }
        }

        let energy = self.energy()?.total;
        if !energy.is_finite() {
            error!(step = self.steps_taken, energy, "Total energy is not finite");
            return Err(PmError::Diverged {
                step: self.steps_taken,
            });
        }
        debug!(step = self.steps_taken, energy, "Evolve complete");
        self.last_energy = Some(energy);

        Ok(StepReport {
            energy,
            positions: self.particles.positions().to_vec(),
        })
    }

    /// [`Simulation::evolve`], then append the result to `sink`
    ///
    /// # Errors
    ///
    /// Returns an error if evolving fails or a diagnostics write fails.
    pub fn evolve_with_diagnostics<E: Write, P: Write>(
        &mut self,
        steps: usize,
        sink: &mut DiagnosticsSink<E, P>,
    ) -> Result<StepReport> {
        let report = self.evolve(steps)?;
        sink.record(report.energy, &report.positions)?;
        Ok(report)
    }

    /// Kinetic, potential and total energy of the current state
    ///
    /// # Errors
    ///
    /// Returns [`PmError::NotInitialized`] before initialization.
    pub fn energy(&self) -> Result<EnergyReport> {
        let state = self.state.as_ref().ok_or(PmError::NotInitialized)?;
        let potential_field = state.solver.solve(&state.density);
        let kinetic = self.particles.kinetic_energy();
        let potential = -0.5 * potential_field.dot(&state.density);
        Ok(EnergyReport {
            kinetic,
            potential,
            total: kinetic + potential,
        })
    }

    /// Potential of the current density
    ///
    /// # Errors
    ///
    /// Returns [`PmError::NotInitialized`] before initialization.
    pub fn potential(&self) -> Result<FieldData> {
        let state = self.state.as_ref().ok_or(PmError::NotInitialized)?;
        Ok(state.solver.solve(&state.density))
    }

    /// Force on every particle for the current state
    ///
    /// # Errors
    ///
    /// Returns [`PmError::NotInitialized`] before initialization.
    pub fn particle_forces(&self) -> Result<Vec<Vec2>> {
        let state = self.state.as_ref().ok_or(PmError::NotInitialized)?;
        Ok(forces_for(state, &self.config, self.mesh))
    }

    /// Current density field, once initialized
    pub fn density(&self) -> Option<&FieldData> {
        self.state.as_ref().map(|s| &s.density)
    }

    /// Green's function field, once initialized
    pub fn green_function(&self) -> Option<&FieldData> {
        self.state.as_ref().map(|s| &s.green)
    }

    /// Cells the current density was assigned to, once initialized
    pub fn cell_indices(&self) -> Option<&CellIndices> {
        self.state.as_ref().map(|s| &s.cells)
    }

    /// True once [`Simulation::initialize`] has run
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Particle positions
    pub fn positions(&self) -> &[Vec2] {
        self.particles.positions()
    }

    /// Particle velocities
    pub fn velocities(&self) -> &[Vec2] {
        self.particles.velocities()
    }

    /// Particle masses
    pub fn masses(&self) -> &[f64] {
        self.particles.masses()
    }

    /// Whole particle system
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Configuration the simulation was built with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Working mesh
    pub fn mesh(&self) -> Mesh {
        self.mesh
    }

    /// Steps integrated so far
    pub fn step_count(&self) -> u64 {
        self.steps_taken
    }

    /// Energy reported by the most recent `evolve`
    pub fn last_energy(&self) -> Option<f64> {
        self.last_energy
    }
}

fn forces_for(state: &MeshState, config: &SimulationConfig, mesh: Mesh) -> Vec<Vec2> {
    let potential = state.solver.solve(&state.density);
    let force_mesh = compute_force_mesh(
        &potential,
        &state.density,
        config.gravitational_constant,
        mesh,
    );
    interpolate_forces(&force_mesh, &state.cells)
}

/// One full step; density is rebuilt from the new positions at the end
fn advance(
    state: &mut MeshState,
    particles: &mut ParticleSystem,
    config: &SimulationConfig,
    mesh: Mesh,
) {
    let forces = forces_for(state, config, mesh);

    let (positions, velocities, masses) = particles.state_mut();
    kick_drift(positions, velocities, masses, &forces, config.dt, mesh);

    let (density, cells) = assign_density(particles.positions(), particles.masses(), mesh);
    state.density = density;
    state.cells = cells;
}
