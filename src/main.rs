//! Harvester - Piezo Energy Harvesting Simulator
//!
//! Loads a template circuit, presses its generators and prints the
//! measurements after every tick.
//!
//! # Usage
//!
//! ```bash
//! harvester --template regulated_system --auto-step-hz 4 --duration-ms 5000 --json > run.jsonl
//! ```

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use harvester_core::{
    error::Result,
    simulation::{Measurements, SessionConfig, FRAME_INTERVAL_MS},
    Session,
};

/// Piezoelectric energy harvesting circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in circuit to load (basic_harvester, regulated_system)
    #[arg(short, long, default_value = "basic_harvester")]
    template: String,

    /// Fraction of full pressure applied per step, 0 to 1
    #[arg(short, long, default_value_t = 1.0)]
    pressure: f64,

    /// Total simulated time in milliseconds
    #[arg(short, long, default_value_t = 2000.0)]
    duration_ms: f64,

    /// Time between printed measurements in milliseconds
    #[arg(long, default_value_t = 50.0)]
    tick_ms: f64,

    /// Press the generators repeatedly at this frequency instead of once
    #[arg(long, value_name = "HZ")]
    auto_step_hz: Option<f64>,

    /// Render cycle period in milliseconds
    #[arg(long, default_value_t = FRAME_INTERVAL_MS)]
    frame_ms: f64,

    /// Print one JSON object per tick
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Sample {
    time_ms: f64,
    #[serde(flatten)]
    measurements: Measurements,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !(args.tick_ms.is_finite() && args.tick_ms > 0.0) {
        return Err(harvester_core::HarvestError::invalid_parameter(
            "tick-ms",
            "must be a positive number of milliseconds",
        ));
    }

    let config = SessionConfig::new()
        .with_pressure(args.pressure)
        .with_frame_interval_ms(args.frame_ms);
    let mut session = Session::with_config(config)?;
    session.set_pressure(args.pressure)?;
    session.load_template(&args.template)?;
    session.start_simulation()?;

    match args.auto_step_hz {
        Some(hz) => session.start_auto_step(hz)?,
        None => {
            session.manual_step()?;
        }
    }

    if !args.json {
        println!(
            "{:>8} {:>9} {:>9} {:>9} {:>8} {:>9} {:>11}",
            "t(ms)", "gen(V)", "rect(V)", "store(V)", "load(mA)", "P(mW)", "E(uJ)"
        );
    }

    let mut elapsed = 0.0;
    while elapsed < args.duration_ms {
        let step = args.tick_ms.min(args.duration_ms - elapsed);
        session.advance(step);
        elapsed += step;
        print_sample(&session, args.json);
    }

    session.stop_simulation();
    tracing::info!("Rendered {} frames", session.frames());
    Ok(())
}

fn print_sample(session: &Session, json: bool) {
    let m = session.measurements();
    if json {
        let sample = Sample {
            time_ms: session.now_ms(),
            measurements: m,
        };
        match serde_json::to_string(&sample) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to encode sample: {}", e),
        }
    } else {
        println!(
            "{:>8.1} {:>9.3} {:>9.3} {:>9.4} {:>8.1} {:>9.3} {:>11.3}",
            session.now_ms(),
            m.generator_voltage,
            m.rectifier_voltage,
            m.storage_voltage,
            m.load_current_ma,
            m.power_mw,
            m.stored_energy_uj
        );
    }
}
