//! # DrillSim Headless Runner
//!
//! Runs one study session without a renderer and prints a summary.
//!
//! # Usage
//!
//! ```bash
//! # Scripted participant sweeping all targets, CSV log in ./Data_Collected
//! drillsim --participant 4
//!
//! # Training bursts for 30 s, rows echoed to stdout
//! drillsim --script training --seconds 30 --sink stdout
//!
//! # Passive condition from a config file, real-time pacing
//! drillsim --config passive.toml --script idle --realtime
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use pm25::{run, RunOptions, Script};
use pm25_study::{FixedStep, Session, StudyConfig, TimeSource, WallClock, WriterEventLog};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Where event rows go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Sink {
    /// `Data_PID{id}_{construction}.csv` in the configured directory.
    Csv,
    /// CSV rows on stdout, no header.
    Stdout,
    /// Discard.
    None,
}

/// PM25 DrillSim headless runner
#[derive(Parser, Debug)]
#[command(name = "drillsim")]
#[command(author, version, about = "Headless PM2.5 drilling exposure study session", long_about = None)]
struct Cli {
    /// Study configuration (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Participant id, overriding the config file
    #[arg(short, long)]
    participant: Option<u32>,

    /// Scripted participant
    #[arg(short, long, value_enum, default_value = "sweep")]
    script: Script,

    /// Maximum session time in seconds
    #[arg(long, default_value = "120")]
    seconds: f64,

    /// Maximum number of ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Fixed tick rate
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Use the wall clock and sleep between ticks
    #[arg(long)]
    realtime: bool,

    /// Event log destination
    #[arg(long, value_enum, default_value = "csv")]
    sink: Sink,

    /// Logging filter (e.g. "info", "pm25_study=debug")
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    info!("PM25 DrillSim v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => StudyConfig::from_file(path)?,
        None => StudyConfig::default(),
    };
    if let Some(participant) = cli.participant {
        config.participant_id = participant;
    }

    let mut session = match cli.sink {
        Sink::Csv => Session::with_csv_log(config)?,
        Sink::Stdout => {
            Session::new(config).with_sink(Box::new(WriterEventLog::new(std::io::stdout())))
        }
        Sink::None => Session::new(config),
    };

    let fps = cli.fps.max(1);
    let mut clock: Box<dyn TimeSource> = if cli.realtime {
        Box::new(WallClock::new())
    } else {
        Box::new(FixedStep::from_rate(fps))
    };
    let options = RunOptions {
        max_seconds: cli.seconds,
        max_ticks: cli.max_ticks,
        pace: cli.realtime.then(|| Duration::from_secs_f64(1.0 / f64::from(fps))),
        ..RunOptions::default()
    };

    let mut driver = cli.script.driver();
    let summary = run(&mut session, driver.as_mut(), clock.as_mut(), options);
    session.disable();

    summary.print_summary();
    Ok(())
}
