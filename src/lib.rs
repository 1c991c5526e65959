//! VCNL4040 ambient-light / proximity driver.
//!
//! One control loop per device instance owns all state and serves a single
//! ordered inbox of poll ticks, interrupt edges, fault-timer expiries and
//! queries.  Hardware is reached only through the port traits in
//! [`app::ports`]; [`adapters`] provides the Linux, simulated, timer and
//! logging implementations.
//!
//! ```no_run
//! use vcnl4040::adapters::log_sink::LogEventSink;
//! use vcnl4040::adapters::sim::SimDevice;
//! use vcnl4040::{DriverConfig, start};
//!
//! let sim = SimDevice::new();
//! let driver = start(DriverConfig::default(), sim.clone(), sim, LogEventSink::new())?;
//! if driver.presence() {
//!     println!("{} lux", driver.ambient_light_filtered()?);
//! }
//! # Ok::<(), vcnl4040::Error>(())
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod protocol;
pub mod runtime;
pub mod sensors;

pub use config::DriverConfig;
pub use error::{Error, NoSensorError};
pub use runtime::{DriverHandle, start};
