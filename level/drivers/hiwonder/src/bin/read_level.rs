use clap::Parser;
use level::{LevelConfig, LevelEngine, LevelError, LevelState};
use level_hiwonder::{HiwonderSource, OutputRate, SensorSource};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Print a bubble level readout from a Hiwonder IMU")]
struct Args {
    /// Serial port of the IMU
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    #[arg(long, default_value_t = 230400)]
    baud_rate: u32,

    /// Output rate in Hz
    #[arg(long, value_enum, default_value = "100")]
    rate: OutputRate,

    /// TOML file with reference_height, remap_x and remap_y
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides reference_height from the config file
    #[arg(long)]
    reference_height: Option<f32>,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 20)]
    interval_ms: u64,
}

fn load_config(args: &Args) -> Result<LevelConfig, LevelError> {
    let mut config = match &args.config {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::default(),
    };
    if let Some(height) = args.reference_height {
        config.reference_height = height;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), LevelError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let engine = LevelEngine::new(&config)?;
    info!(
        "Level remap ({}, {}) -> z {}, reference height {}",
        config.remap_x,
        config.remap_y,
        engine.remap().z(),
        config.reference_height
    );

    let source = HiwonderSource::new(&args.port, args.baud_rate, args.rate).map_err(|e| {
        error!("Failed to connect to {}: {}", args.port, e);
        e
    })?;
    info!("Connected to {}", args.port);

    let mut state = LevelState::new(engine);
    loop {
        match source.get_data() {
            Ok(pack) => {
                if let Some(frame) = state.process(&pack) {
                    println!("{}\n", frame);
                }
            }
            Err(LevelError::ReadError(e)) => debug!("{}", e),
            Err(e) => {
                error!("Error reading from IMU: {}", e);
                source.stop()?;
                return Err(e);
            }
        }

        thread::sleep(Duration::from_millis(args.interval_ms));
    }
}
