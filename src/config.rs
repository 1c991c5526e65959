//! Driver configuration parameters
//!
//! Every field has a default, so a JSON file only needs to name the values it
//! overrides.  The configuration is fixed once the driver starts.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::{
    AlsIntegrationTime, DEFAULT_PS_HIGH_THRESHOLD, DEFAULT_PS_LOW_THRESHOLD, LedCurrent, PsDuty,
    PsIntegrationTime, PsMultiPulse, PsPersistence,
};

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    // --- Bus / interrupt ---
    /// Name of the I2C bus (e.g. `/dev/i2c-0` on Linux)
    pub bus_name: String,
    /// GPIO line wired to the sensor's INT pin; `None` disables proximity interrupts
    pub interrupt_pin: Option<u32>,

    // --- Sampling ---
    /// ALS poll period (milliseconds)
    pub poll_interval_ms: u32,
    /// Samples kept per channel for median filtering
    pub buffer_capacity: usize,
    /// ALS integration time (80, 160, 320 or 640 ms)
    pub als_integration_time: AlsIntegrationTime,
    /// Log every sample at info level
    pub log_enabled: bool,

    // --- Proximity ---
    pub ps_integration_time: PsIntegrationTime,
    pub ps_duty: PsDuty,
    pub ps_persistence: PsPersistence,
    pub ps_multi_pulse: PsMultiPulse,
    pub led_current: LedCurrent,
    pub sunlight_cancellation: bool,
    /// "Away" threshold (raw counts)
    pub ps_low_threshold: u16,
    /// "Close" threshold (raw counts)
    pub ps_high_threshold: u16,

    // --- Fault detection ---
    /// How long the sensor may stay covered before it is disabled (milliseconds)
    pub occlusion_timeout_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            // Bus
            bus_name: String::from("i2c-0"),
            interrupt_pin: None,

            // Sampling
            poll_interval_ms: 1000, // 1 Hz
            buffer_capacity: 9,
            als_integration_time: AlsIntegrationTime::Ms80,
            log_enabled: false,

            // Proximity
            ps_integration_time: PsIntegrationTime::T1,
            ps_duty: PsDuty::OneIn40,
            ps_persistence: PsPersistence::One,
            ps_multi_pulse: PsMultiPulse::One,
            led_current: LedCurrent::Ma50,
            sunlight_cancellation: false,
            ps_low_threshold: DEFAULT_PS_LOW_THRESHOLD,
            ps_high_threshold: DEFAULT_PS_HIGH_THRESHOLD,

            // Fault detection
            occlusion_timeout_ms: 300_000, // 5 min
        }
    }
}

impl DriverConfig {
    /// Reject values the driver cannot run with.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.buffer_capacity == 0 {
            return Err(Error::Config("buffer_capacity must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero"));
        }
        if self.occlusion_timeout_ms == 0 {
            return Err(Error::Config("occlusion_timeout_ms must be non-zero"));
        }
        if self.ps_low_threshold >= self.ps_high_threshold {
            return Err(Error::Config("ps_low_threshold must be below ps_high_threshold"));
        }
        Ok(())
    }
}
