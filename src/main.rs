//! vcnl4040d: runs one VCNL4040 driver instance and logs its readings.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  LinuxBus / SimDevice   LinuxGpio / SimDevice   LogEventSink │
//! │  (BusPort)              (InterruptPort)         (EventSink)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │        SensorService on the control loop thread        │  │
//! │  │  setup · ALS poll · proximity irq · occlusion timer    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcnl4040::adapters::log_sink::LogEventSink;
use vcnl4040::adapters::sim::SimDevice;
use vcnl4040::{DriverConfig, DriverHandle};

#[derive(Parser)]
#[command(name = "vcnl4040d")]
#[command(version)]
#[command(about = "VCNL4040 ambient-light / proximity driver daemon", long_about = None)]
struct Args {
    /// JSON driver configuration; defaults apply to missing fields
    #[arg(short, long, env = "VCNL4040_CONFIG")]
    config: Option<PathBuf>,

    /// Run against the in-memory simulated device
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// ALS counts reported by the simulated device
    #[arg(long, default_value_t = 1000)]
    sim_counts: u16,

    /// GPIO character device carrying the interrupt line
    #[arg(long, default_value = "/dev/gpiochip0")]
    gpio_chip: String,

    /// Seconds between status lines
    #[arg(long, default_value_t = 10)]
    status_interval_secs: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcnl4040=info,vcnl4040d=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("╔══════════════════════════════════════╗");
    info!("║  vcnl4040d v{:<25}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config(args.config.as_deref())?;
    info!(
        "bus={} int={:?} poll={}ms window={} als_it={}ms",
        config.bus_name,
        config.interrupt_pin,
        config.poll_interval_ms,
        config.buffer_capacity,
        config.als_integration_time.millis()
    );

    let driver = if args.simulate {
        let sim = SimDevice::new();
        sim.set_als_counts(args.sim_counts);
        info!("simulated device ({} counts)", args.sim_counts);
        vcnl4040::start(config, sim.clone(), sim, LogEventSink::new())?
    } else {
        start_hardware(config, &args.gpio_chip)?
    };

    let interval = Duration::from_secs(args.status_interval_secs.max(1));
    loop {
        std::thread::sleep(interval);
        report(&driver);
    }
}

fn load_config(path: Option<&Path>) -> Result<DriverConfig> {
    let Some(path) = path else {
        info!("no config file, using defaults");
        return Ok(DriverConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: DriverConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!("config loaded from {}", path.display());
    Ok(config)
}

#[cfg(feature = "linux")]
fn start_hardware(config: DriverConfig, gpio_chip: &str) -> Result<DriverHandle> {
    use vcnl4040::adapters::linux::{LinuxBus, LinuxGpio};

    Ok(vcnl4040::start(config, LinuxBus, LinuxGpio::new(gpio_chip), LogEventSink::new())?)
}

#[cfg(not(feature = "linux"))]
fn start_hardware(_config: DriverConfig, _gpio_chip: &str) -> Result<DriverHandle> {
    anyhow::bail!("built without the `linux` feature; run with --simulate")
}

fn report(driver: &DriverHandle) {
    if !driver.presence() {
        warn!("STATUS | no sensor");
        return;
    }
    match (
        driver.ambient_light_filtered(),
        driver.ambient_light_raw(),
        driver.proximity_raw(),
    ) {
        (Ok(lux), Ok(raw), Ok(prox)) => {
            info!("STATUS | {lux} lux (raw {raw}) | proximity {prox}");
        }
        _ => warn!("STATUS | sensor lost during query"),
    }
}
