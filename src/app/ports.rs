//! Port traits, the boundary between the driver core and its collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SensorService (domain)
//! ```
//!
//! The bus transport, the interrupt line, timers and event delivery are all
//! external.  Adapters implement these traits; [`SensorService`] consumes
//! them via generics, so the core never touches hardware directly.
//!
//! [`SensorService`]: super::service::SensorService

use core::time::Duration;

use embedded_hal::i2c::I2c;

use crate::error::{BusError, InterruptError};
use crate::events::{Edge, InboxSender, TimerId};

use super::events::DriverEvent;

// ───────────────────────────────────────────────────────────────
// Bus port
// ───────────────────────────────────────────────────────────────

/// Opens a register-addressed serial bus by name.
///
/// The returned bus supplies `write` and `write_read` through
/// `embedded_hal::i2c::I2c`.
pub trait BusPort {
    type Bus: I2c;

    fn open(&mut self, name: &str) -> Result<Self::Bus, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Interrupt port
// ───────────────────────────────────────────────────────────────

/// GPIO line that reports edges into the control loop's inbox.
pub trait InterruptPort {
    /// Open line handle; dropping it releases the line.
    type Line;

    fn open(&mut self, pin: u32) -> Result<Self::Line, InterruptError>;

    /// Start delivering `edge` transitions on `line` as
    /// [`Event::Interrupt`](crate::events::Event::Interrupt).
    fn subscribe(
        &mut self,
        line: &mut Self::Line,
        edge: Edge,
        sender: InboxSender,
    ) -> Result<(), InterruptError>;
}

// ───────────────────────────────────────────────────────────────
// Timer port
// ───────────────────────────────────────────────────────────────

/// Schedules the periodic poll tick and the one-shot fault timer.
///
/// Both post into the inbox ([`Event::PollTick`] and
/// [`Event::FaultTimerExpired`]); neither calls back into the service.
///
/// [`Event::PollTick`]: crate::events::Event::PollTick
/// [`Event::FaultTimerExpired`]: crate::events::Event::FaultTimerExpired
pub trait TimerPort {
    /// Start the periodic poll tick.  Never cancelled.
    fn start_poll_timer(&mut self, period: Duration);

    /// Arm a one-shot that posts `FaultTimerExpired(id)` after `timeout`.
    fn arm_fault_timer(&mut self, id: TimerId, timeout: Duration);

    /// Cancel the arming identified by `id`.  No-op if it already fired.
    fn cancel_fault_timer(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// The driver emits [`DriverEvent`]s through this port.  Adapters decide
/// where they go (log, application signal, telemetry).
pub trait EventSink {
    fn emit(&mut self, event: &DriverEvent);
}
