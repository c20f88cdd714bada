use clap::Parser;
use pm_gravity_core::{BoundaryMode, DiagnosticsSink, Scenario, Simulation, SimulationConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Particle-mesh gravity demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "pm-gravity-headless")]
#[command(about = "2D particle-mesh gravity simulation", long_about = None)]
struct Args {
    /// Preset (stationary, orbit, periodic, non-periodic, cosmological)
    #[arg(short, long, default_value = "orbit")]
    scenario: String,

    /// Particle count (ignored by stationary and orbit)
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Random seed for initial conditions
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of recorded frames (default: preset value)
    #[arg(short, long)]
    frames: Option<usize>,

    /// Integration steps per frame (default: preset value)
    #[arg(long)]
    steps_per_frame: Option<usize>,

    /// JSON file with a full simulation configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid side override
    #[arg(long)]
    grid: Option<usize>,

    /// Timestep override
    #[arg(long)]
    dt: Option<f64>,

    /// Softening override
    #[arg(long)]
    softening: Option<f64>,

    /// Boundary override (periodic, non-periodic)
    #[arg(long)]
    boundary: Option<String>,

    /// Write one total energy per frame to this file
    #[arg(long)]
    energy_file: Option<PathBuf>,

    /// Write the first tracked positions per frame to this file
    #[arg(long)]
    positions_file: Option<PathBuf>,

    /// Number of particles written per position snapshot
    #[arg(long, default_value_t = 40)]
    tracked: usize,

    /// Log progress every this many frames
    #[arg(short, long, default_value_t = 10)]
    report_interval: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let scenario: Scenario = args.scenario.parse()?;
    let config = resolve_config(args, scenario)?;
    config.validate()?;

    let count = args
        .particles
        .unwrap_or_else(|| scenario.default_particle_count());
    let frames = args.frames.unwrap_or_else(|| scenario.frames());
    let steps_per_frame = args
        .steps_per_frame
        .unwrap_or_else(|| scenario.steps_per_frame());

    println!("=== Particle-Mesh Gravity Demo ===\n");
    println!(
        "Scenario: {scenario}, grid {}x{} ({}), dt {}, softening {}",
        config.grid_size, config.grid_size, config.boundary, config.dt, config.softening
    );

    // Pinned positions are laid out for the preset grid; rescale to the chosen one
    let mut conditions = scenario.initial_conditions(count, args.seed);
    let scale = config.grid_size as f64 / Scenario::GRID_SIZE as f64;
    for p in &mut conditions.pinned_positions {
        *p *= scale;
    }
    conditions.grid_size = config.grid_size;
    conditions.boundary = config.boundary;

    let particles = conditions.build()?;
    println!(
        "Particles: {} (total mass {:.4})\n",
        particles.len(),
        particles.total_mass()
    );

    let mut sim = Simulation::new(config, particles)?;
    let setup = Instant::now();
    sim.initialize()?;
    info!(
        elapsed_ms = setup.elapsed().as_secs_f64() * 1000.0,
        "Initialized"
    );

    let mut sink = DiagnosticsSink::new()
        .with_energy(open_output(args.energy_file.as_ref())?)
        .with_positions(open_output(args.positions_file.as_ref())?, args.tracked);

    let start = Instant::now();
    let mut initial_energy = None;
    for frame in 0..frames {
        let report = sim.evolve_with_diagnostics(steps_per_frame, &mut sink)?;
        let reference = *initial_energy.get_or_insert(report.energy);

        if args.report_interval > 0 && frame % args.report_interval == 0 {
            info!(
                frame,
                step = sim.step_count(),
                energy = report.energy,
                drift = relative_drift(reference, report.energy),
                "Frame"
            );
        }
    }

    let elapsed = start.elapsed();
    let (energy_log, position_log) = sink.into_parts();
    if let Some(log) = energy_log {
        log.into_inner().flush()?;
    }
    if let Some(log) = position_log {
        log.into_inner().flush()?;
    }

    println!("\n=== Summary ===");
    println!("Steps: {}", sim.step_count());
    println!(
        "Wall time: {:.2}s ({:.2} ms/step)",
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / sim.step_count().max(1) as f64
    );
    if let (Some(first), Some(last)) = (initial_energy, sim.last_energy()) {
        println!("Energy: {first:.6} → {last:.6} (drift {:.3e})", relative_drift(first, last));
    }
    Ok(())
}

/// Preset config, replaced by a JSON file if given, then per-field overrides
fn resolve_config(
    args: &Args,
    scenario: Scenario,
) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)?;
            serde_json::from_reader(io::BufReader::new(file))?
        }
        None => scenario.config(),
    };

    if let Some(grid) = args.grid {
        config.grid_size = grid;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if let Some(softening) = args.softening {
        config.softening = softening;
    }
    if let Some(boundary) = &args.boundary {
        config.boundary = boundary.parse::<BoundaryMode>()?;
    }
    Ok(config)
}

fn open_output(path: Option<&PathBuf>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(io::sink())),
    }
}

fn relative_drift(reference: f64, energy: f64) -> f64 {
    if reference == 0.0 {
        energy - reference
    } else {
        (energy - reference) / reference.abs()
    }
}
