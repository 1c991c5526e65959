//! Sensor service — the hexagonal core.
//!
//! [`SensorService`] owns the device handle, both measurement channels and
//! the occlusion fault timer id.  It never touches hardware directly: the
//! bus, the interrupt line, timers and outbound events all flow through the
//! port traits in [`super::ports`], so the whole service runs against the
//! simulated device in tests.
//!
//! ```text
//!  BusPort ───────▶ ┌────────────────────────┐ ──▶ EventSink
//!  InterruptPort ──▶│     SensorService      │
//!  TimerPort ◀──────│ setup · poll · irq · q │
//!                   └────────────────────────┘
//! ```

use core::ops::ControlFlow;
use core::time::Duration;

use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::error::{BusError, NoSensorError, SetupFailure};
use crate::events::{Edge, EdgeEvent, Event, InboxSender, Query, QueryReply, TimerId};
use crate::protocol::{DEVICE_ID, DeviceConfig, InterruptFlags, counts_to_lux};
use crate::sensors::{ChannelState, Vcnl4040};

use super::events::DriverEvent;
use super::ports::{BusPort, EventSink, InterruptPort, TimerPort};
use super::state::SensorState;

// ───────────────────────────────────────────────────────────────
// SensorService
// ───────────────────────────────────────────────────────────────

pub struct SensorService<B, L> {
    state: SensorState<B, L>,
    interrupt_pin: Option<u32>,
    ps_low_threshold: u16,
    ps_high_threshold: u16,
    occlusion_timeout: Duration,
    next_timer_id: u32,
}

impl<B: I2c, L> SensorService<B, L> {
    /// Run the one-time identification and configuration sequence.
    ///
    /// Never fails: a setup failure leaves the service invalid (only
    /// `presence()` answers) and is reported through `sink`.  `config` is
    /// expected to have passed [`DriverConfig::validate`].
    pub fn setup<P, Q, T, S>(
        config: &DriverConfig,
        bus: &mut P,
        interrupts: &mut Q,
        sender: &InboxSender,
        timers: &mut T,
        sink: &mut S,
    ) -> Self
    where
        P: BusPort<Bus = B>,
        Q: InterruptPort<Line = L>,
        T: TimerPort,
        S: EventSink,
    {
        let mut service = Self {
            state: SensorState::new(
                ChannelState::new(config.als_integration_time, config.buffer_capacity),
                ChannelState::new(config.ps_integration_time, config.buffer_capacity),
                Duration::from_millis(u64::from(config.poll_interval_ms)),
                config.log_enabled,
            ),
            interrupt_pin: config.interrupt_pin,
            ps_low_threshold: config.ps_low_threshold,
            ps_high_threshold: config.ps_high_threshold,
            occlusion_timeout: Duration::from_millis(u64::from(config.occlusion_timeout_ms)),
            next_timer_id: 0,
        };

        match service.identify_and_configure(config, bus, interrupts, sender, timers, sink) {
            Ok(()) => {
                info!(
                    "VCNL4040 ready on {} (poll {} ms, window {})",
                    config.bus_name,
                    config.poll_interval_ms,
                    service.state.ambient_light.readings().capacity()
                );
            }
            Err(failure) => {
                error!("VCNL4040 setup failed: {failure}; driver disabled");
                service.state.valid = false;
                sink.emit(&DriverEvent::SetupFailed(failure));
            }
        }
        sink.emit(&DriverEvent::Started { valid: service.state.valid });
        service
    }

    fn identify_and_configure<P, Q, T, S>(
        &mut self,
        config: &DriverConfig,
        bus: &mut P,
        interrupts: &mut Q,
        sender: &InboxSender,
        timers: &mut T,
        sink: &mut S,
    ) -> Result<(), SetupFailure>
    where
        P: BusPort<Bus = B>,
        Q: InterruptPort<Line = L>,
        T: TimerPort,
        S: EventSink,
    {
        let i2c = bus.open(&config.bus_name).map_err(|_| SetupFailure::BusOpen)?;
        let mut device = Vcnl4040::new(i2c);

        let id = device.read_device_id().map_err(SetupFailure::Probe)?;
        if id != DEVICE_ID {
            return Err(SetupFailure::IdMismatch { found: id });
        }
        debug!("device ID [0x{:02X}, 0x{:02X}]", id[0], id[1]);

        device
            .configure(&DeviceConfig::from_config(config))
            .map_err(SetupFailure::Configure)?;

        let line = match config.interrupt_pin {
            Some(pin) => {
                let mut line = interrupts.open(pin).map_err(SetupFailure::Interrupt)?;
                interrupts
                    .subscribe(&mut line, Edge::Falling, sender.clone())
                    .map_err(SetupFailure::Interrupt)?;
                info!("proximity interrupt on pin {pin}");
                Some(line)
            }
            None => {
                info!("no interrupt pin configured; proximity events disabled");
                None
            }
        };

        timers.start_poll_timer(self.state.poll_interval);

        let initial = device.read_proximity().map_err(SetupFailure::Configure)?;
        self.state.proximity.record(u32::from(initial));

        self.state.device = Some(device);
        self.state.interrupt_line = line;
        self.state.valid = true;

        if initial > self.ps_high_threshold {
            info!("sensor covered at start (proximity {initial})");
            self.arm_fault_timer(initial, timers, sink);
        }
        Ok(())
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Handle one inbox event.  Breaks on [`Event::Shutdown`].
    pub fn handle<T: TimerPort, S: EventSink>(
        &mut self,
        event: Event,
        timers: &mut T,
        sink: &mut S,
    ) -> ControlFlow<()> {
        match event {
            Event::PollTick => self.on_poll_tick(sink),
            Event::Interrupt(edge) => self.on_interrupt(edge, timers, sink),
            Event::FaultTimerExpired(id) => self.on_fault_timer_expired(id, sink),
            Event::Query { query, reply } => reply.signal(self.query(query)),
            Event::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    // ── Ambient light ─────────────────────────────────────────

    pub fn on_poll_tick<S: EventSink>(&mut self, sink: &mut S) {
        if !self.state.valid {
            return;
        }
        let Some(device) = self.state.device.as_mut() else {
            return;
        };
        let counts = match device.read_als_counts() {
            Ok(counts) => counts,
            Err(e) => return Self::bus_fault("ambient light poll", e, sink),
        };

        let channel = &mut self.state.ambient_light;
        let lux = counts_to_lux(counts, channel.setting);
        let filtered = channel.record(lux);
        if self.state.log_enabled {
            info!("ambient light: {counts} counts, {lux} lux (filtered {filtered})");
        } else {
            debug!("ambient light: {counts} counts, {lux} lux (filtered {filtered})");
        }
    }

    // ── Proximity ─────────────────────────────────────────────

    pub fn on_interrupt<T: TimerPort, S: EventSink>(
        &mut self,
        edge: EdgeEvent,
        timers: &mut T,
        sink: &mut S,
    ) {
        if !self.state.valid {
            debug!("ignoring interrupt on pin {}: driver disabled", edge.pin);
            return;
        }
        if self.interrupt_pin != Some(edge.pin) {
            debug!("ignoring interrupt on foreign pin {}", edge.pin);
            return;
        }
        let Some(device) = self.state.device.as_mut() else {
            return;
        };
        let (flags, distance) = match read_proximity_event(device) {
            Ok(reading) => reading,
            Err(e) => return Self::bus_fault("proximity interrupt", e, sink),
        };
        self.state.proximity.record(u32::from(distance));

        if flags.close {
            info!("proximity close (distance {distance})");
            sink.emit(&DriverEvent::ProximityClose { distance });
        } else if flags.away && distance < self.ps_low_threshold {
            self.cancel_fault_timer(distance, timers, sink);
        } else {
            debug!("proximity interrupt {flags:?} at {distance}: no action");
        }
    }

    // ── Occlusion fault timer ─────────────────────────────────

    /// Only setup arms, so no earlier timer can be live here.
    fn arm_fault_timer<T: TimerPort, S: EventSink>(
        &mut self,
        distance: u16,
        timers: &mut T,
        sink: &mut S,
    ) {
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        let id = TimerId(self.next_timer_id);
        timers.arm_fault_timer(id, self.occlusion_timeout);
        self.state.fault_timer = Some(id);
        info!(
            "occlusion timer armed ({} s)",
            self.occlusion_timeout.as_secs()
        );
        sink.emit(&DriverEvent::OcclusionArmed { distance });
    }

    fn cancel_fault_timer<T: TimerPort, S: EventSink>(
        &mut self,
        distance: u16,
        timers: &mut T,
        sink: &mut S,
    ) {
        let Some(id) = self.state.fault_timer.take() else {
            debug!("sensor uncovered (distance {distance}), no timer armed");
            return;
        };
        timers.cancel_fault_timer(id);
        info!("sensor uncovered (distance {distance}); occlusion timer cancelled");
        sink.emit(&DriverEvent::OcclusionCleared { distance });
    }

    pub fn on_fault_timer_expired<S: EventSink>(&mut self, id: TimerId, sink: &mut S) {
        if self.state.fault_timer != Some(id) {
            debug!("stale occlusion timer {} ignored", id.0);
            return;
        }
        self.state.fault_timer = None;
        self.state.valid = false;
        warn!(
            "sensor covered for {} s; driver disabled until restart",
            self.occlusion_timeout.as_secs()
        );
        sink.emit(&DriverEvent::OcclusionFault);
    }

    fn bus_fault<S: EventSink>(context: &str, e: BusError, sink: &mut S) {
        warn!("{context} skipped: {e}");
        sink.emit(&DriverEvent::BusFault(e));
    }
}

impl<B, L> SensorService<B, L> {
    // ── Queries ───────────────────────────────────────────────

    pub fn query(&self, query: Query) -> QueryReply {
        match query {
            Query::Presence => QueryReply::Presence(self.presence()),
            Query::AmbientLightFiltered => QueryReply::Reading(self.ambient_light_filtered()),
            Query::AmbientLightRaw => QueryReply::Reading(self.ambient_light_raw()),
            Query::ProximityFiltered => QueryReply::Reading(self.proximity_filtered()),
            Query::ProximityRaw => QueryReply::Reading(self.proximity_raw()),
        }
    }

    pub fn presence(&self) -> bool {
        self.state.valid
    }

    pub fn ambient_light_filtered(&self) -> Result<u32, NoSensorError> {
        self.when_valid(self.state.ambient_light.latest_filtered())
    }

    pub fn ambient_light_raw(&self) -> Result<u32, NoSensorError> {
        self.when_valid(self.state.ambient_light.latest_raw())
    }

    pub fn proximity_filtered(&self) -> Result<u32, NoSensorError> {
        self.when_valid(self.state.proximity.latest_filtered())
    }

    pub fn proximity_raw(&self) -> Result<u32, NoSensorError> {
        self.when_valid(self.state.proximity.latest_raw())
    }

    /// Id of the armed occlusion timer, if any.
    pub fn fault_timer(&self) -> Option<TimerId> {
        self.state.fault_timer
    }

    fn when_valid(&self, value: u32) -> Result<u32, NoSensorError> {
        if self.state.valid { Ok(value) } else { Err(NoSensorError) }
    }
}

fn read_proximity_event<B: I2c>(
    device: &mut Vcnl4040<B>,
) -> Result<(InterruptFlags, u16), BusError> {
    let flags = device.read_interrupt_flags()?;
    let distance = device.read_proximity()?;
    Ok((flags, distance))
}
