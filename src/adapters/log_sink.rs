//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`DriverEvent`] as one log
//! record.  An application that reacts to proximity would implement the
//! same trait instead.

use log::{error, info, warn};

use crate::app::events::DriverEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DriverEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DriverEvent) {
        match event {
            DriverEvent::Started { valid } => {
                info!("START | valid={valid}");
            }
            DriverEvent::SetupFailed(failure) => {
                error!("SETUP | {failure}");
            }
            DriverEvent::ProximityClose { distance } => {
                info!("PROX  | close, distance={distance}");
            }
            DriverEvent::OcclusionArmed { distance } => {
                info!("OCCL  | armed, distance={distance}");
            }
            DriverEvent::OcclusionCleared { distance } => {
                info!("OCCL  | cleared, distance={distance}");
            }
            DriverEvent::OcclusionFault => {
                warn!("OCCL  | fault, sensor disabled");
            }
            DriverEvent::BusFault(e) => {
                warn!("BUS   | {e}");
            }
        }
    }
}
