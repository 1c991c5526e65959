//! Application core — pure domain logic, zero I/O.
//!
//! Identification, ambient-light polling, proximity interrupt policy,
//! occlusion fault detection and the query answers all live here.  Every
//! interaction with the bus, the interrupt line and timers happens through
//! the **port traits** in [`ports`], so this layer is fully testable against
//! the simulated device.

pub mod events;
pub mod ports;
pub mod service;
pub mod state;
