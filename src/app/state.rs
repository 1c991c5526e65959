//! Mutable state owned by the control loop.

use core::time::Duration;

use crate::events::TimerId;
use crate::protocol::{AlsIntegrationTime, PsIntegrationTime};
use crate::sensors::{ChannelState, Vcnl4040};

/// Everything the control loop mutates.  Only the loop touches it.
pub struct SensorState<B, L> {
    /// Cleared by a setup failure or an occlusion fault; never set again.
    pub valid: bool,
    pub device: Option<Vcnl4040<B>>,
    /// Held to keep the interrupt subscription alive.
    pub interrupt_line: Option<L>,
    pub ambient_light: ChannelState<AlsIntegrationTime>,
    pub proximity: ChannelState<PsIntegrationTime>,
    pub poll_interval: Duration,
    /// Id of the armed occlusion timer, if any.
    pub fault_timer: Option<TimerId>,
    pub log_enabled: bool,
}

impl<B, L> SensorState<B, L> {
    pub fn new(
        ambient_light: ChannelState<AlsIntegrationTime>,
        proximity: ChannelState<PsIntegrationTime>,
        poll_interval: Duration,
        log_enabled: bool,
    ) -> Self {
        Self {
            valid: false,
            device: None,
            interrupt_line: None,
            ambient_light,
            proximity,
            poll_interval,
            fault_timer: None,
            log_enabled,
        }
    }
}
