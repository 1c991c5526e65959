//! Unified error types for the VCNL4040 driver.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be logged, emitted as events and stored without allocation.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::protocol::Register;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus transaction failed.
    Bus(BusError),
    /// One-time identification / configuration failed.
    Setup(SetupFailure),
    /// The device is invalid; only `presence()` can be answered.
    NoSensor(NoSensorError),
    /// Configuration is invalid.
    Config(&'static str),
    /// The control loop could not be started.
    Runtime(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Setup(e) => write!(f, "setup: {e}"),
            Self::NoSensor(e) => write!(f, "{e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The named bus could not be opened.
    Open,
    /// Writing a register failed.
    Write { register: Register, kind: ErrorKind },
    /// Reading a register failed.
    Read { register: Register, kind: ErrorKind },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "bus open failed"),
            Self::Write { register, kind } => {
                write!(f, "write {register:?} (0x{:02X}) failed: {kind}", *register as u8)
            }
            Self::Read { register, kind } => {
                write!(f, "read {register:?} (0x{:02X}) failed: {kind}", *register as u8)
            }
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Setup failures
// ---------------------------------------------------------------------------

/// Why the one-time setup sequence left the device invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFailure {
    /// The configured bus could not be opened.
    BusOpen,
    /// The device-ID read itself failed.
    Probe(BusError),
    /// The device answered with an unexpected ID.
    IdMismatch { found: [u8; 2] },
    /// A configuration write (or the initial proximity read) failed.
    Configure(BusError),
    /// The interrupt line could not be opened or subscribed.
    Interrupt(InterruptError),
}

impl fmt::Display for SetupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusOpen => write!(f, "bus open failed"),
            Self::Probe(e) => write!(f, "device ID probe failed: {e}"),
            Self::IdMismatch { found } => {
                write!(f, "device ID mismatch: got [0x{:02X}, 0x{:02X}]", found[0], found[1])
            }
            Self::Configure(e) => write!(f, "configuration failed: {e}"),
            Self::Interrupt(e) => write!(f, "interrupt line: {e}"),
        }
    }
}

impl From<SetupFailure> for Error {
    fn from(e: SetupFailure) -> Self {
        Self::Setup(e)
    }
}

// ---------------------------------------------------------------------------
// Interrupt-line errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptError {
    /// The line could not be opened.
    Open,
    /// Edge-interrupt registration failed.
    Subscribe,
}

impl fmt::Display for InterruptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open failed"),
            Self::Subscribe => write!(f, "edge subscription failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

/// Returned by every query except `presence()` while the device is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSensorError;

impl fmt::Display for NoSensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no sensor")
    }
}

impl core::error::Error for NoSensorError {}

impl From<NoSensorError> for Error {
    fn from(e: NoSensorError) -> Self {
        Self::NoSensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
