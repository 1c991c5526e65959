//! Simulated VCNL4040 for host runs and tests.
//!
//! [`SimDevice`] is a cloneable handle to one shared register file.  It
//! implements both [`BusPort`] (handing out [`SimBus`], an
//! `embedded_hal::i2c::I2c` that answers at 0x60) and [`InterruptPort`]
//! (recording the subscription so [`SimDevice::raise_interrupt`] can post
//! edges into the inbox).  Tests keep one clone to inject readings and
//! faults while the driver owns the others.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use std::sync::Arc;

use crate::app::ports::{BusPort, InterruptPort};
use crate::error::{BusError, InterruptError};
use crate::events::{Edge, EdgeEvent, InboxSender};
use crate::protocol::{DEVICE_ADDRESS, DEVICE_ID, InterruptFlags, Register};

/// Register file indexed by command code.
const REGISTERS: usize = 16;

struct SimState {
    registers: [[u8; 2]; REGISTERS],
    device_id: [u8; 2],
    als_counts: u16,
    proximity: u16,
    flags: InterruptFlags,
    fail_open: bool,
    fail_reads: bool,
    fail_register_read: Option<u8>,
    fail_writes: bool,
    fail_interrupt: bool,
    fail_subscribe: bool,
    opened_bus: Option<String>,
    writes: Vec<(u8, [u8; 2])>,
    subscription: Option<(u32, InboxSender)>,
    edges: u64,
}

impl SimState {
    fn new() -> Self {
        Self {
            registers: [[0; 2]; REGISTERS],
            device_id: DEVICE_ID,
            als_counts: 0,
            proximity: 0,
            flags: InterruptFlags::default(),
            fail_open: false,
            fail_reads: false,
            fail_register_read: None,
            fail_writes: false,
            fail_interrupt: false,
            fail_subscribe: false,
            opened_bus: None,
            writes: Vec::new(),
            subscription: None,
            edges: 0,
        }
    }

    fn read(&mut self, command: u8) -> [u8; 2] {
        match command {
            c if c == Register::DeviceId.addr() => self.device_id,
            c if c == Register::AlsData.addr() => self.als_counts.to_le_bytes(),
            c if c == Register::PsData.addr() => self.proximity.to_le_bytes(),
            c if c == Register::IntFlag.addr() => {
                // Flags live in the high byte and clear on read.
                let flags = core::mem::take(&mut self.flags);
                [0, (u8::from(flags.close) << 1) | u8::from(flags.away)]
            }
            c => self.registers.get(usize::from(c)).copied().unwrap_or_default(),
        }
    }

    fn write(&mut self, command: u8, value: [u8; 2]) -> Result<(), SimBusError> {
        let slot = self.registers.get_mut(usize::from(command)).ok_or(SimBusError::Data)?;
        *slot = value;
        self.writes.push((command, value));
        Ok(())
    }
}

// ── Shared device handle ──────────────────────────────────────

#[derive(Clone)]
pub struct SimDevice {
    state: Arc<Mutex<CriticalSectionRawMutex, RefCell<SimState>>>,
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDevice {
    /// A healthy device: correct ID, dark, nothing nearby.
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(RefCell::new(SimState::new()))) }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn set_device_id(&self, id: [u8; 2]) {
        self.with(|s| s.device_id = id);
    }

    pub fn set_als_counts(&self, counts: u16) {
        self.with(|s| s.als_counts = counts);
    }

    pub fn set_proximity(&self, counts: u16) {
        self.with(|s| s.proximity = counts);
    }

    /// Latch interrupt flags; the next flag-register read clears them.
    pub fn set_interrupt_flags(&self, flags: InterruptFlags) {
        self.with(|s| s.flags = flags);
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.with(|s| s.fail_open = fail);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.with(|s| s.fail_reads = fail);
    }

    /// Fail reads of one register only; `None` clears the fault.
    pub fn set_fail_register_read(&self, register: Option<Register>) {
        self.with(|s| s.fail_register_read = register.map(Register::addr));
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.with(|s| s.fail_writes = fail);
    }

    /// Make opening the interrupt line fail.
    pub fn set_fail_interrupt(&self, fail: bool) {
        self.with(|s| s.fail_interrupt = fail);
    }

    /// Make edge subscription fail after the line opens.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.with(|s| s.fail_subscribe = fail);
    }

    /// Every register write so far, as `(command, [lsb, msb])`.
    pub fn writes(&self) -> Vec<(u8, [u8; 2])> {
        self.with(|s| s.writes.clone())
    }

    pub fn opened_bus(&self) -> Option<String> {
        self.with(|s| s.opened_bus.clone())
    }

    pub fn subscribed_pin(&self) -> Option<u32> {
        self.with(|s| s.subscription.as_ref().map(|(pin, _)| *pin))
    }

    /// Latch `flags` and `proximity`, then pull the INT line low.
    ///
    /// Blocks while the inbox is full.  Returns `false` when nothing is
    /// subscribed or the control loop has stopped.
    pub fn raise_interrupt(&self, flags: InterruptFlags, proximity: u16) -> bool {
        let pending = self.with(|s| {
            s.flags = flags;
            s.proximity = proximity;
            s.edges += 1;
            let timestamp_ns = s.edges * 1_000_000;
            s.subscription
                .as_ref()
                .map(|(pin, sender)| (sender.clone(), EdgeEvent { pin: *pin, timestamp_ns, level: false }))
        });
        match pending {
            Some((sender, edge)) => futures_lite::future::block_on(sender.send_interrupt(edge)),
            None => false,
        }
    }
}

// ── Bus ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimBusError {
    /// Nothing answered at the address, or fault injection is on.
    NoAck,
    /// Malformed transaction.
    Data,
}

impl i2c::Error for SimBusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoAck => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::Data => ErrorKind::Other,
        }
    }
}

pub struct SimBus {
    device: SimDevice,
}

impl i2c::ErrorType for SimBus {
    type Error = SimBusError;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != DEVICE_ADDRESS {
            return Err(SimBusError::NoAck);
        }
        self.device.with(|s| {
            let mut command = None;
            for op in operations.iter_mut() {
                match op {
                    Operation::Write([c]) => command = Some(*c),
                    Operation::Write([c, lsb, msb]) => {
                        if s.fail_writes {
                            return Err(SimBusError::NoAck);
                        }
                        s.write(*c, [*lsb, *msb])?;
                    }
                    Operation::Write(_) => return Err(SimBusError::Data),
                    Operation::Read(buf) => {
                        let c = command.ok_or(SimBusError::Data)?;
                        if s.fail_reads || s.fail_register_read == Some(c) {
                            return Err(SimBusError::NoAck);
                        }
                        let value = s.read(c);
                        for (dst, src) in buf.iter_mut().zip(value) {
                            *dst = src;
                        }
                    }
                }
            }
            Ok(())
        })
    }
}

impl BusPort for SimDevice {
    type Bus = SimBus;

    fn open(&mut self, name: &str) -> Result<SimBus, BusError> {
        let opened = self.with(|s| {
            if s.fail_open {
                return false;
            }
            s.opened_bus = Some(name.to_string());
            true
        });
        if opened { Ok(SimBus { device: self.clone() }) } else { Err(BusError::Open) }
    }
}

// ── Interrupt line ────────────────────────────────────────────

/// Open simulated GPIO line.  Dropping it does not unsubscribe; the
/// simulated line lives as long as the device.
#[derive(Debug)]
pub struct SimLine {
    pub pin: u32,
}

impl InterruptPort for SimDevice {
    type Line = SimLine;

    fn open(&mut self, pin: u32) -> Result<SimLine, InterruptError> {
        if self.with(|s| s.fail_interrupt) {
            return Err(InterruptError::Open);
        }
        Ok(SimLine { pin })
    }

    fn subscribe(
        &mut self,
        line: &mut SimLine,
        edge: Edge,
        sender: InboxSender,
    ) -> Result<(), InterruptError> {
        if edge == Edge::Rising || self.with(|s| s.fail_subscribe) {
            return Err(InterruptError::Subscribe);
        }
        self.with(|s| s.subscription = Some((line.pin, sender)));
        Ok(())
    }
}
