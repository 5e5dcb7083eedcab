mod app;
mod settings;

use app::OrbitApp;
use clap::{Args, Parser, Subcommand};
use eframe::egui;
use orbit_core::config::{DEFAULT_STEP_SIZE, DEFAULT_TOLERANCE};
use orbit_core::{
    format_engine_error, format_fallback_prompt, Algorithm, BackendPreference, EnergyMonitor,
    Engine, EngineError, IntegratorConfig, Kernel, Scenario,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Orbit - An N-body gravity simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive viewer
    View {
        /// Window size in pixels
        #[arg(long, short = 'r', num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        resolution: Option<Vec<f32>>,
        /// Initial scenario (two-body, figure-eight, inner-solar-system)
        #[arg(long, default_value = "inner-solar-system")]
        scenario: String,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Step a scenario without a window and report energy drift
    Run {
        /// Scenario to load (two-body, figure-eight, inner-solar-system)
        #[arg(long, default_value = "two-body")]
        scenario: String,
        /// Number of ticks to run
        #[arg(long, default_value_t = 1000)]
        ticks: usize,
        /// Tick length in days
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Integration algorithm
        #[arg(long, default_value_t = Algorithm::Leapfrog)]
        algorithm: Algorithm,
        /// Fixed sub-step, or largest adaptive sub-step, in days
        #[arg(long, default_value_t = DEFAULT_STEP_SIZE)]
        step_size: f64,
        /// Local error tolerance for adaptive algorithms
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(Args)]
struct BackendArgs {
    /// Use the portable kernel without trying the native library
    #[arg(long)]
    portable: bool,
    /// Path to the native kernel library
    #[arg(long, value_name = "PATH", conflicts_with = "portable")]
    kernel: Option<PathBuf>,
    /// Fall back to the portable kernel without asking
    #[arg(long, short = 'y')]
    yes: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::View {
            resolution,
            scenario,
            backend,
        } => view(resolution, &scenario, &backend),
        Commands::Run {
            scenario,
            ticks,
            dt,
            algorithm,
            step_size,
            tolerance,
            backend,
        } => match IntegratorConfig::new(algorithm, step_size, tolerance) {
            Ok(config) => run_headless(&scenario, ticks, dt, config, &backend),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        match e.downcast_ref::<EngineError>() {
            Some(engine_error) => eprintln!("{}", format_engine_error(engine_error)),
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn find_scenario(name: &str) -> Result<Scenario, Box<dyn std::error::Error>> {
    Scenario::from_name(name).ok_or_else(|| {
        format!(
            "unknown scenario '{name}' (expected one of: {})",
            Scenario::NAMES.join(", ")
        )
        .into()
    })
}

/// Pick the kernel, asking before falling back from a failed native load
fn select_kernel(args: &BackendArgs) -> Result<Kernel, Box<dyn std::error::Error>> {
    let preference = if args.portable {
        BackendPreference::Portable
    } else {
        BackendPreference::Native {
            path: args.kernel.clone(),
        }
    };

    match Kernel::select(&preference) {
        Ok(kernel) => Ok(kernel),
        Err(e) => {
            log::warn!("native kernel unavailable: {e}");
            if args.yes || confirm(&format_fallback_prompt(&e))? {
                log::info!("continuing with the portable kernel");
                Ok(Kernel::portable())
            } else {
                Err("declined to continue without the native kernel".into())
            }
        }
    }
}

/// Ask a yes/no question on stdin; end of input counts as no
fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{question} [y/n] ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n."),
        }
    }
}

fn view(resolution: Option<Vec<f32>>, scenario: &str, backend: &BackendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut viewport = egui::ViewportBuilder::default().with_title("Orbit");
    if let Some(size) = resolution {
        let &[width, height] = &size[..] else {
            return Err("--resolution takes a width and a height".into());
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(format!("invalid resolution {width} x {height}").into());
        }
        viewport = viewport.with_inner_size([width, height]);
    }

    let scenario = find_scenario(scenario)?;
    let mut engine = Engine::new(select_kernel(backend)?);
    engine.load(&scenario)?;

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let name = scenario.name;
    eframe::run_native(
        "Orbit",
        options,
        Box::new(move |cc| Ok(Box::new(OrbitApp::new(engine, name, cc)))),
    )?;
    Ok(())
}

fn run_headless(
    scenario: &str,
    ticks: usize,
    dt: f64,
    config: IntegratorConfig,
    backend: &BackendArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = find_scenario(scenario)?;
    let mut engine = Engine::with_config(select_kernel(backend)?, config);
    let mut monitor = EnergyMonitor::new();
    engine.load(&scenario)?;

    let initial = engine.measure_energy()?;
    println!(
        "{}: {} bodies, {} kernel, {} (step {} days, tolerance {:e})",
        scenario.name,
        engine.body_count(),
        engine.backend(),
        config.algorithm,
        config.step_size,
        config.tolerance
    );
    println!("tick 0: energy = {initial:.12e}");

    let report_every = (ticks / 10).max(1);
    let mut evaluations = 0;
    let mut rejected = 0;
    for tick in 1..=ticks {
        let report = engine.step(dt)?;
        evaluations += report.advance.force_evaluations;
        rejected += report.advance.rejected;

        if let Some(notice) = monitor.check(&mut engine) {
            return Err(format!("tick {tick}: {notice}").into());
        }
        if tick % report_every == 0 || tick == ticks {
            println!(
                "tick {tick}: energy = {:.12e}, drift = {:.3e}",
                report.total_energy,
                drift(report.total_energy, initial)
            );
        }
    }

    println!(
        "simulated {:.2} days, {evaluations} force evaluations, {rejected} rejected steps",
        engine.elapsed_time()
    );
    Ok(())
}

/// Relative energy change, or absolute when the reference is zero
fn drift(energy: f64, initial: f64) -> f64 {
    if initial == 0.0 {
        (energy - initial).abs()
    } else {
        ((energy - initial) / initial).abs()
    }
}
