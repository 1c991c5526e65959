//! VCNL4040 register-level driver.
//!
//! Thin wrapper over any `embedded_hal::i2c::I2c` bus.  Every transaction is a
//! fixed 2-byte register read or write at address 0x60; failures are mapped
//! into [`BusError`] tagged with the register involved.

use embedded_hal::i2c::{Error as _, I2c};

use crate::error::BusError;
use crate::protocol::{DEVICE_ADDRESS, DeviceConfig, InterruptFlags, Register, decode_u16};

pub struct Vcnl4040<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Vcnl4040<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn read_register(&mut self, register: Register) -> Result<[u8; 2], BusError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(DEVICE_ADDRESS, &[register.addr()], &mut buf)
            .map_err(|e| BusError::Read { register, kind: e.kind() })?;
        Ok(buf)
    }

    pub fn write_register(&mut self, register: Register, value: [u8; 2]) -> Result<(), BusError> {
        self.i2c
            .write(DEVICE_ADDRESS, &[register.addr(), value[0], value[1]])
            .map_err(|e| BusError::Write { register, kind: e.kind() })
    }

    pub fn read_device_id(&mut self) -> Result<[u8; 2], BusError> {
        self.read_register(Register::DeviceId)
    }

    /// Write thresholds, PS config and ALS config, stopping at the first error.
    pub fn configure(&mut self, config: &DeviceConfig) -> Result<(), BusError> {
        for (register, value) in config.writes() {
            self.write_register(register, value)?;
        }
        Ok(())
    }

    /// Raw ALS counts.
    pub fn read_als_counts(&mut self) -> Result<u16, BusError> {
        self.read_register(Register::AlsData).map(decode_u16)
    }

    /// Raw proximity counts (higher = closer).
    pub fn read_proximity(&mut self) -> Result<u16, BusError> {
        self.read_register(Register::PsData).map(decode_u16)
    }

    /// Reading the flag register also clears it on the device.
    pub fn read_interrupt_flags(&mut self) -> Result<InterruptFlags, BusError> {
        self.read_register(Register::IntFlag).map(InterruptFlags::decode)
    }
}
