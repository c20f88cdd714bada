//! Simulation configuration
//!
//! Holds the handful of parameters needed to construct a particle-mesh
//! simulation. The boundary mode is the only sizing decision in the system:
//! it determines the working grid side once, and every component receives that
//! derived size instead of branching on the mode itself.

use crate::error::{PmError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest grid side the solver accepts
pub const MIN_GRID_SIZE: usize = 2;

/// How the domain edges behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryMode {
    /// Particles and forces wrap around the grid edges
    #[default]
    Periodic,
    /// Isolated domain: the working grid is doubled so images never reach
    /// the physical quadrant, and the potential border is pinned to zero
    NonPeriodic,
}

impl BoundaryMode {
    /// Side of the working grid for a configured grid side
    #[must_use]
    pub const fn working_size(self, grid_size: usize) -> usize {
        match self {
            Self::Periodic => grid_size,
            Self::NonPeriodic => 2 * grid_size,
        }
    }

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::NonPeriodic => "non-periodic",
        }
    }
}

impl FromStr for BoundaryMode {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "periodic" => Ok(Self::Periodic),
            "non-periodic" | "nonperiodic" | "non_periodic" => Ok(Self::NonPeriodic),
            _ => Err(PmError::UnknownBoundaryMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters required to construct a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Configured grid side `L` (cells per axis of the physical region)
    pub grid_size: usize,
    /// Softening length ε of the Green's function
    pub softening: f64,
    /// Gravitational constant G
    pub gravitational_constant: f64,
    /// Timestep
    pub dt: f64,
    /// Edge behavior
    pub boundary: BoundaryMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 512,
            softening: 0.1,
            gravitational_constant: 1.0,
            dt: 1.0,
            boundary: BoundaryMode::Periodic,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with default softening, G and boundary mode
    #[must_use]
    pub fn new(grid_size: usize, dt: f64) -> Self {
        Self {
            grid_size,
            dt,
            ..Self::default()
        }
    }

    /// Set the softening length
    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }

    /// Set the gravitational constant
    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = g;
        self
    }

    /// Set the boundary mode
    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Side of the grid every solver component works on
    #[must_use]
    pub const fn working_size(&self) -> usize {
        self.boundary.working_size(self.grid_size)
    }

    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is too small or the working grid side is
    /// odd, or if softening, timestep or G is not finite (softening and
    /// timestep must also be strictly positive).
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(PmError::InvalidGridSize(self.grid_size));
        }
        let working = self.working_size();
        if working % 2 != 0 {
            return Err(PmError::OddGridSize(working));
        }
        if !(self.softening.is_finite() && self.softening > 0.0) {
            return Err(PmError::InvalidParameter {
                name: "softening",
                value: self.softening,
            });
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(PmError::InvalidParameter {
                name: "dt",
                value: self.dt,
            });
        }
        if !self.gravitational_constant.is_finite() {
            return Err(PmError::InvalidParameter {
                name: "gravitational_constant",
                value: self.gravitational_constant,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_mode_parsing() {
        assert_eq!("periodic".parse::<BoundaryMode>(), Ok(BoundaryMode::Periodic));
        assert_eq!("Periodic".parse::<BoundaryMode>(), Ok(BoundaryMode::Periodic));
        assert_eq!(
            "Non-Periodic".parse::<BoundaryMode>(),
            Ok(BoundaryMode::NonPeriodic)
        );
        assert_eq!(
            "reflective".parse::<BoundaryMode>(),
            Err(PmError::UnknownBoundaryMode("reflective".to_string()))
        );
    }

    #[test]
    fn test_working_size_doubles_for_non_periodic() {
        let cfg = SimulationConfig::new(64, 1.0);
        assert_eq!(cfg.working_size(), 64);
        let cfg = cfg.with_boundary(BoundaryMode::NonPeriodic);
        assert_eq!(cfg.working_size(), 128);
    }

    #[test]
    fn test_validate_rejects_odd_periodic_grid() {
        let cfg = SimulationConfig::new(33, 1.0);
        assert_eq!(cfg.validate(), Err(PmError::OddGridSize(33)));

        // Doubling makes the working grid even again
        let cfg = cfg.with_boundary(BoundaryMode::NonPeriodic);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let cfg = SimulationConfig::new(1, 1.0);
        assert_eq!(cfg.validate(), Err(PmError::InvalidGridSize(1)));

        let cfg = SimulationConfig::new(32, 1.0).with_softening(0.0);
        assert!(matches!(
            cfg.validate(),
            Err(PmError::InvalidParameter { name: "softening", .. })
        ));

        let cfg = SimulationConfig::new(32, f64::NAN);
        assert!(matches!(
            cfg.validate(),
            Err(PmError::InvalidParameter { name: "dt", .. })
        ));

        let cfg = SimulationConfig::new(32, 1.0).with_gravitational_constant(f64::INFINITY);
        assert!(matches!(
            cfg.validate(),
            Err(PmError::InvalidParameter {
                name: "gravitational_constant",
                ..
            })
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"grid_size": 128, "dt": 5.0, "boundary": "non-periodic"}"#)
                .unwrap();
        assert_eq!(cfg.grid_size, 128);
        assert_eq!(cfg.softening, 0.1);
        assert_eq!(cfg.gravitational_constant, 1.0);
        assert_eq!(cfg.boundary, BoundaryMode::NonPeriodic);
    }
}
