//! Outbound driver events.
//!
//! The [`SensorService`](super::service::SensorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  The proximity-close
//! signal is the one the application acts on; the rest are diagnostics.

use crate::error::{BusError, SetupFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// Setup finished; `valid` is false when the driver is disabled.
    Started { valid: bool },

    /// Setup failed and the driver is disabled.
    SetupFailed(SetupFailure),

    /// The sensor raised a "close" interrupt.
    ProximityClose { distance: u16 },

    /// The occlusion fault timer was armed.
    OcclusionArmed { distance: u16 },

    /// A qualifying "away" event cancelled the occlusion fault timer.
    OcclusionCleared { distance: u16 },

    /// The sensor stayed covered too long; disabled until restart.
    OcclusionFault,

    /// A bus transaction failed while handling a poll or interrupt; the
    /// event was skipped.
    BusFault(BusError),
}
