//! Plain-text run diagnostics
//!
//! Optional monitoring output: one line per recorded energy value, and one
//! line per snapshot of the first few particle positions. Every record is
//! flushed immediately so a long run can be inspected while it is going.

use crate::error::Result;
use crate::particles::Vec2;
use std::io::{self, Write};

/// Appends one energy value per line
#[derive(Debug)]
pub struct EnergyLog<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> EnergyLog<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Append `energy` and flush
    ///
    /// # Errors
    ///
    /// Returns [`PmError::Io`](crate::PmError::Io) if the write fails.
    pub fn record(&mut self, energy: f64) -> Result<()> {
        writeln!(self.writer, "{energy}")?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    /// Number of lines written so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Appends a snapshot of the first `tracked` positions per line
#[derive(Debug)]
pub struct PositionLog<W: Write> {
    writer: W,
    tracked: usize,
}

impl<W: Write> PositionLog<W> {
    /// Wrap a writer, tracking the first `tracked` particles
    pub fn new(writer: W, tracked: usize) -> Self {
        Self { writer, tracked }
    }

    /// Append one snapshot line `[[x y] [x y] ...]` and flush
    ///
    /// # Errors
    ///
    /// Returns [`PmError::Io`](crate::PmError::Io) if the write fails.
    pub fn record(&mut self, positions: &[Vec2]) -> Result<()> {
        let line = format_positions(&positions[..self.tracked.min(positions.len())]);
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Format positions as `[[x y] [x y] ...]`
#[must_use]
pub fn format_positions(positions: &[Vec2]) -> String {
    let body: Vec<String> = positions
        .iter()
        .map(|p| format!("[{} {}]", p.x, p.y))
        .collect();
    format!("[{}]", body.join(" "))
}

/// Energy and position logs fed by
/// [`Simulation::evolve_with_diagnostics`](crate::Simulation::evolve_with_diagnostics)
#[derive(Debug)]
pub struct DiagnosticsSink<E: Write = io::Sink, P: Write = io::Sink> {
    energy: Option<EnergyLog<E>>,
    positions: Option<PositionLog<P>>,
}

impl Default for DiagnosticsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink {
    /// Sink that records nothing
    #[must_use]
    pub fn new() -> Self {
        Self {
            energy: None,
            positions: None,
        }
    }
}

impl<E: Write, P: Write> DiagnosticsSink<E, P> {
    /// Record energies to `writer`
    pub fn with_energy<E2: Write>(self, writer: E2) -> DiagnosticsSink<E2, P> {
        DiagnosticsSink {
            energy: Some(EnergyLog::new(writer)),
            positions: self.positions,
        }
    }

    /// Record the first `tracked` positions to `writer`
    pub fn with_positions<P2: Write>(self, writer: P2, tracked: usize) -> DiagnosticsSink<E, P2> {
        DiagnosticsSink {
            energy: self.energy,
            positions: Some(PositionLog::new(writer, tracked)),
        }
    }

    /// Write whichever logs are configured
    ///
    /// # Errors
    ///
    /// Returns [`PmError::Io`](crate::PmError::Io) if a write fails.
    pub fn record(&mut self, energy: f64, positions: &[Vec2]) -> Result<()> {
        if let Some(log) = self.energy.as_mut() {
            log.record(energy)?;
        }
        if let Some(log) = self.positions.as_mut() {
            log.record(positions)?;
        }
        Ok(())
    }

    /// Energy log, if configured
    pub fn energy_log(&self) -> Option<&EnergyLog<E>> {
        self.energy.as_ref()
    }

    /// Split into the configured logs
    pub fn into_parts(self) -> (Option<EnergyLog<E>>, Option<PositionLog<P>>) {
        (self.energy, self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_lines() {
        let mut log = EnergyLog::new(Vec::new());
        log.record(-1.5).unwrap();
        log.record(0.25).unwrap();
        assert_eq!(log.records(), 2);
        assert_eq!(String::from_utf8(log.into_inner()).unwrap(), "-1.5\n0.25\n");
    }

    #[test]
    fn test_position_snapshot_truncates_to_tracked() {
        let mut log = PositionLog::new(Vec::new(), 2);
        let positions = [
            Vec2::new(1.0, 2.5),
            Vec2::new(3.0, 4.0),
            Vec2::new(9.0, 9.0),
        ];
        log.record(&positions).unwrap();
        log.record(&positions[..1]).unwrap();
        assert_eq!(
            String::from_utf8(log.into_inner()).unwrap(),
            "[[1 2.5] [3 4]]\n[[1 2.5]]\n"
        );
    }

    #[test]
    fn test_sink_writes_configured_logs() {
        let mut sink = DiagnosticsSink::new()
            .with_energy(Vec::new())
            .with_positions(Vec::new(), 1);
        sink.record(3.0, &[Vec2::new(0.5, 0.5)]).unwrap();

        let (energy, positions) = sink.into_parts();
        assert_eq!(energy.unwrap().into_inner(), b"3\n".to_vec());
        assert_eq!(positions.unwrap().into_inner(), b"[[0.5 0.5]]\n".to_vec());
    }

    #[test]
    fn test_empty_sink_is_noop() {
        let mut sink = DiagnosticsSink::default();
        sink.record(1.0, &[]).unwrap();
        assert!(sink.energy_log().is_none());
    }
}
