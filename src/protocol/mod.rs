//! VCNL4040 register protocol. Pure, no I/O.
//!
//! Every register is 16 bits wide and transferred little-endian: a write
//! is `[command, low, high]`, a read is `write_read([command], [low, high])`.
//!
//! ```text
//!  DriverConfig ──▶ DeviceConfig::from_config ──▶ [(Register, [u8; 2]); 5]
//!                                                   (written once at setup)
//! ```

pub mod encode;

pub use encode::{
    AlsConfig, AlsIntegrationTime, AlsPersistence, LedCurrent, PsConfig12, PsConfig3, PsDuty,
    PsIntegrationTime, PsInterruptMode, PsMultiPulse, PsPersistence,
};

use crate::config::DriverConfig;

/// 7-bit I2C address of the VCNL4040.
pub const DEVICE_ADDRESS: u8 = 0x60;

/// Contents of the ID register (`0x0186`, low byte first).
pub const DEVICE_ID: [u8; 2] = [0x86, 0x01];

/// Default proximity low threshold (raw counts).
pub const DEFAULT_PS_LOW_THRESHOLD: u16 = 3000;

/// Default proximity high threshold (raw counts).
pub const DEFAULT_PS_HIGH_THRESHOLD: u16 = 7000;

/// Register command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    AlsConf = 0x00,
    PsConf12 = 0x03,
    PsConf3Ms = 0x04,
    PsThdl = 0x06,
    PsThdh = 0x07,
    PsData = 0x08,
    AlsData = 0x09,
    IntFlag = 0x0B,
    DeviceId = 0x0C,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Encode a 16-bit threshold as register bytes.
pub const fn encode_threshold(counts: u16) -> [u8; 2] {
    counts.to_le_bytes()
}

/// Decode a 16-bit data register read.
pub const fn decode_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

// ---------------------------------------------------------------------------
// Interrupt flags
// ---------------------------------------------------------------------------

/// Proximity bits of the interrupt-flag register.
///
/// The flags live in the register's high byte (second byte on the wire).
/// ALS and sunlight-protection flags in that byte are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptFlags {
    pub close: bool,
    pub away: bool,
}

impl InterruptFlags {
    const AWAY: u8 = 1 << 0;
    const CLOSE: u8 = 1 << 1;

    pub const fn decode(bytes: [u8; 2]) -> Self {
        let high = bytes[1];
        Self {
            close: high & Self::CLOSE != 0,
            away: high & Self::AWAY != 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Lux conversion
// ---------------------------------------------------------------------------

/// Convert raw ALS counts to lux, `round(lux_per_step * raw)`.
///
/// Computed in integer milli-lux so 0.12/0.06/0.03/0.015 are exact;
/// halves round up.
pub const fn counts_to_lux(raw: u16, it: AlsIntegrationTime) -> u32 {
    let millilux = raw as u32 * it.millilux_per_step();
    (millilux + 500) / 1000
}

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

/// Immutable set of encoded register values, built once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub als_conf: [u8; 2],
    pub ps_conf12: [u8; 2],
    pub ps_conf3_ms: [u8; 2],
    pub ps_low_threshold: [u8; 2],
    pub ps_high_threshold: [u8; 2],
}

impl DeviceConfig {
    pub fn from_config(config: &DriverConfig) -> Self {
        let als = AlsConfig {
            integration_time: config.als_integration_time,
            ..AlsConfig::default()
        };
        let ps12 = PsConfig12 {
            duty: config.ps_duty,
            persistence: config.ps_persistence,
            integration_time: config.ps_integration_time,
            ..PsConfig12::default()
        };
        let ps3 = PsConfig3 {
            multi_pulse: config.ps_multi_pulse,
            sunlight_cancellation: config.sunlight_cancellation,
            led_current: config.led_current,
            ..PsConfig3::default()
        };

        Self {
            als_conf: als.encode(),
            ps_conf12: ps12.encode(),
            ps_conf3_ms: ps3.encode(),
            ps_low_threshold: encode_threshold(config.ps_low_threshold),
            ps_high_threshold: encode_threshold(config.ps_high_threshold),
        }
    }

    /// Register writes in the order setup issues them.
    pub fn writes(&self) -> [(Register, [u8; 2]); 5] {
        [
            (Register::PsThdl, self.ps_low_threshold),
            (Register::PsThdh, self.ps_high_threshold),
            (Register::PsConf12, self.ps_conf12),
            (Register::PsConf3Ms, self.ps_conf3_ms),
            (Register::AlsConf, self.als_conf),
        ]
    }
}
