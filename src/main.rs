//! RayOS Chronicle
//!
//! Records a small damped pendulum simulation into a shared buffer while a
//! consumer task watches it at UI-frame cadence, then plays back, crops or
//! resizes the recording.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayos_chronicle::{
    ChronicleConfig, CropRequest, LinkedRegistry, RingIndex, ScalarKind, SharedBuffer, Variable,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulated time per tick (s)
const DT: f64 = 0.001;

/// Wall-clock pacing of the simulation loop
const TICK_PERIOD: Duration = Duration::from_micros(500);

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "RayOS Chronicle - Record & replay simulation variables", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Samples per variable (overrides the config file)
    #[arg(short = 's', long, default_value = "0")]
    buffer_size: usize,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the simulation and summarize the buffer
    Record {
        /// Ticks to record (overrides the config file)
        #[arg(short = 'n', long, default_value = "0")]
        ticks: usize,
    },

    /// Record, then play the recording back
    Playback {
        /// Samples per playback frame, negative plays backward
        #[arg(long, default_value = "100", allow_hyphen_values = true)]
        step: isize,

        /// Number of frames to show
        #[arg(short = 'f', long, default_value = "10")]
        frames: usize,
    },

    /// Record, then keep only [from, to]
    Crop {
        from: usize,
        to: usize,
    },

    /// Record, then change the buffer capacity
    Resize {
        size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        log::info!("Loading config from: {}", config_path.display());
        ChronicleConfig::load(config_path)?
    } else {
        ChronicleConfig::default()
    };

    // Override with CLI options
    if cli.buffer_size > 0 {
        config.buffer_size = cli.buffer_size;
    }
    if let Commands::Record { ticks } = cli.command {
        if ticks > 0 {
            config.record_ticks = ticks;
        }
    }
    config.validate()?;

    let (mut shared, consumer) = record(&config).await?;

    match cli.command {
        Commands::Record { .. } => {}

        Commands::Playback { step, frames } => {
            playback(&mut shared, step, frames)?;
        }

        Commands::Crop { from, to } => {
            shared.crop_buffer(CropRequest::new(from, to))?;
            shared.read_buffer();
        }

        Commands::Resize { size } => {
            if !shared.resize_buffer(size) {
                bail!("buffer size unchanged: {} is zero or already the current size", size);
            }
            shared.read_buffer();
        }
    }

    let mut summary = summarize(&shared);
    summary.consumer = Some(consumer);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// The simulated system: a pendulum with a tunable damping gain
struct Pendulum {
    theta: Variable,
    omega: Variable,
    gain: Variable,
    mode: Variable,
    tick: Variable,
}

impl Pendulum {
    const GRAVITY: f64 = 9.81;
    const LENGTH: f64 = 0.5;

    fn new(shared: &SharedBuffer) -> Result<Self> {
        let pendulum = Self {
            theta: shared.add_variable("root.pendulum", "theta", ScalarKind::Double)?,
            omega: shared.add_variable("root.pendulum", "omega", ScalarKind::Double)?,
            gain: shared.add_variable("root.controller", "gain", ScalarKind::Double)?,
            mode: shared.add_enum_variable("root.controller", "mode", &["SWING", "DAMPED"])?,
            tick: shared.add_variable("root", "tick", ScalarKind::Long)?,
        };
        pendulum.theta.set_double(1.0)?;
        pendulum.mode.set_ordinal(Some(0))?;
        Ok(pendulum)
    }

    fn step(&self) -> Result<()> {
        let theta = self.theta.get_double();
        let omega = self.omega.get_double();
        let gain = self.gain.get_double();

        let alpha = -Self::GRAVITY / Self::LENGTH * theta.sin() - gain * omega;
        let omega = omega + alpha * DT;
        self.omega.set_double(omega)?;
        self.theta.set_double(theta + omega * DT)?;
        self.mode.set_ordinal(Some(if gain > 0.0 { 1 } else { 0 }))?;
        self.tick.set_long(self.tick.get_long() + 1)?;
        Ok(())
    }
}

/// What the consumer task observed
#[derive(Debug, Default, Serialize)]
struct ConsumerReport {
    frames_pulled: usize,
    last_theta: f64,
    gain_pushed: bool,
}

/// Run the simulation on a blocking thread while a consumer task pulls at
/// its own cadence and, after a few frames, pushes a damping gain.
async fn record(config: &ChronicleConfig) -> Result<(SharedBuffer, ConsumerReport)> {
    let mut shared = SharedBuffer::from_config(config)?;
    let pendulum = Pendulum::new(&shared)?;
    shared.write_buffer();

    let mut consumer = shared.linker().new_linked_registry(None)?;
    let linked = consumer.update_from_buffer()?;
    log::info!("Consumer linked to {} variables", linked);

    let running = Arc::new(AtomicBool::new(true));
    let period = Duration::from_millis(config.consumer_period_ms);
    let consumer_task = tokio::spawn(run_consumer(consumer, running.clone(), period));

    let ticks = config.record_ticks;
    let simulation = tokio::task::spawn_blocking(move || -> Result<SharedBuffer> {
        for _ in 0..ticks {
            pendulum.step()?;
            shared.tick()?;
            std::thread::sleep(TICK_PERIOD);
        }
        Ok(shared)
    });

    let shared = simulation.await??;
    running.store(false, Ordering::Release);
    let report = consumer_task.await??;

    log::info!(
        "Recorded {} ticks, consumer pulled {} frames",
        ticks,
        report.frames_pulled
    );
    Ok((shared, report))
}

async fn run_consumer(
    consumer: LinkedRegistry,
    running: Arc<AtomicBool>,
    period: Duration,
) -> Result<ConsumerReport> {
    let theta = consumer
        .linked_variable("root.pendulum.theta")
        .context("theta is not linked")?;
    let gain = consumer
        .linked_variable("root.controller.gain")
        .context("gain is not linked")?;

    let mut interval = tokio::time::interval(period);
    let mut report = ConsumerReport::default();

    while running.load(Ordering::Acquire) {
        interval.tick().await;

        if consumer.pull() {
            report.frames_pulled += 1;
            report.last_theta = theta.variable().get_double();
        }

        if report.frames_pulled >= 5 && !report.gain_pushed {
            gain.variable().set_double(2.0)?;
            gain.push();
            report.gain_pushed = true;
            log::info!("Consumer pushed damping gain 2.0");
        }
    }

    Ok(report)
}

fn playback(shared: &mut SharedBuffer, step: isize, frames: usize) -> Result<()> {
    let in_point = shared.properties().in_point();
    shared.set_current_index(in_point);
    shared.read_buffer();

    let theta = shared
        .registry_buffer()
        .find_variable_buffer("root.pendulum.theta")
        .map(|buffer| buffer.variable().clone())
        .context("theta was not recorded")?;

    println!("\n=== Playback (step {}) ===", step);
    for _ in 0..frames {
        let index = shared.properties().current_index();
        println!("[{:>6}] theta = {:+.4}", index, theta.get_double());

        shared.prepare_linked_buffers_for_pull()?;
        shared.increment_buffer_index_by(false, step);
        shared.read_buffer();
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Summary {
    properties: RingIndex,
    frame_bytes: usize,
    variables: Vec<VariableSummary>,
    consumer: Option<ConsumerReport>,
}

#[derive(Debug, Serialize)]
struct VariableSummary {
    name: String,
    kind: ScalarKind,
    first: f64,
    last: f64,
    min: f64,
    max: f64,
}

/// Statistics over the active window of every recorded variable
fn summarize(shared: &SharedBuffer) -> Summary {
    let properties = shared.properties();
    let registry_buffer = shared.registry_buffer();

    let variables = registry_buffer
        .buffers()
        .iter()
        .map(|buffer| {
            let sample = buffer.copy(properties.in_point(), properties.active_length(), properties);
            let values = sample.sample().to_doubles();
            VariableSummary {
                name: buffer.variable().full_name().to_string(),
                kind: buffer.variable().kind(),
                first: values.first().copied().unwrap_or_default(),
                last: values.last().copied().unwrap_or_default(),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect();

    Summary {
        properties,
        frame_bytes: registry_buffer.frame_memory_size(),
        variables,
        consumer: None,
    }
}

fn print_summary(summary: &Summary) {
    let p = &summary.properties;
    println!("\n=== Buffer ===");
    println!("Size: {} samples", p.size());
    println!(
        "Active window: [{}, {}] ({} samples)",
        p.in_point(),
        p.out_point(),
        p.active_length()
    );
    println!("Current index: {}", p.current_index());
    println!("Frame size: {} bytes", summary.frame_bytes);

    println!("\n=== Variables ===");
    for variable in &summary.variables {
        println!(
            "{:<28} {:<8} first {:+10.4}  last {:+10.4}  min {:+10.4}  max {:+10.4}",
            variable.name,
            format!("{:?}", variable.kind),
            variable.first,
            variable.last,
            variable.min,
            variable.max
        );
    }

    if let Some(consumer) = &summary.consumer {
        println!("\n=== Consumer ===");
        println!("Frames pulled: {}", consumer.frames_pulled);
        println!("Last theta seen: {:+.4}", consumer.last_theta);
        println!("Gain pushed: {}", consumer.gain_pushed);
    }
}
