//! Identification and configuration sequence.

use std::time::Duration;

use vcnl4040::adapters::sim::SimDevice;
use vcnl4040::app::events::DriverEvent;
use vcnl4040::config::DriverConfig;
use vcnl4040::error::{BusError, InterruptError, NoSensorError, SetupFailure};
use vcnl4040::protocol::{LedCurrent, PsDuty, Register};

use crate::mock_hw::{TimerCall, boot};

#[test]
fn default_config_writes_registers_in_order() {
    let h = boot(SimDevice::new(), &DriverConfig::default());

    assert!(h.service.presence());
    assert_eq!(
        h.sim.writes(),
        vec![
            (Register::PsThdl.addr(), [0xB8, 0x0B]),
            (Register::PsThdh.addr(), [0x58, 0x1B]),
            (Register::PsConf12.addr(), [0x00, 0x0B]),
            (Register::PsConf3Ms.addr(), [0x00, 0x00]),
            (Register::AlsConf.addr(), [0x00, 0x00]),
        ]
    );
    assert_eq!(h.sim.opened_bus().as_deref(), Some("i2c-0"));
    assert_eq!(h.timers.calls, vec![TimerCall::StartPoll(Duration::from_millis(1000))]);
    assert_eq!(h.sink.events, vec![DriverEvent::Started { valid: true }]);
}

#[test]
fn custom_thresholds_and_ps_settings_reach_the_device() {
    let config = DriverConfig {
        bus_name: "i2c-3".into(),
        ps_low_threshold: 0x0102,
        ps_high_threshold: 0x0304,
        ps_duty: PsDuty::OneIn320,
        led_current: LedCurrent::Ma200,
        ..DriverConfig::default()
    };
    let h = boot(SimDevice::new(), &config);
    let writes = h.sim.writes();

    assert_eq!(h.sim.opened_bus().as_deref(), Some("i2c-3"));
    assert_eq!(writes[0], (Register::PsThdl.addr(), [0x02, 0x01]));
    assert_eq!(writes[1], (Register::PsThdh.addr(), [0x04, 0x03]));
    assert_eq!(writes[2].1[0] >> 6, 0b11);
    assert_eq!(writes[3].1[1] & 0b111, 0b111);
}

#[test]
fn bus_open_failure_disables_driver() {
    let sim = SimDevice::new();
    sim.set_fail_open(true);
    let h = boot(sim, &DriverConfig::default());

    assert!(!h.service.presence());
    assert_eq!(h.service.ambient_light_raw(), Err(NoSensorError));
    assert!(h.timers.calls.is_empty());
    assert_eq!(
        h.sink.events,
        vec![
            DriverEvent::SetupFailed(SetupFailure::BusOpen),
            DriverEvent::Started { valid: false },
        ]
    );
}

#[test]
fn probe_read_failure_disables_driver() {
    let sim = SimDevice::new();
    sim.set_fail_reads(true);
    let h = boot(sim, &DriverConfig::default());

    assert!(!h.service.presence());
    assert!(matches!(
        h.sink.events[0],
        DriverEvent::SetupFailed(SetupFailure::Probe(BusError::Read { register: Register::DeviceId, .. }))
    ));
    assert!(h.sim.writes().is_empty());
}

#[test]
fn wrong_id_stops_before_any_write() {
    let sim = SimDevice::new();
    sim.set_device_id([0x86, 0x02]);
    let h = boot(sim, &DriverConfig::default());

    assert!(!h.service.presence());
    assert!(h.sim.writes().is_empty());
    assert_eq!(
        h.sink.events[0],
        DriverEvent::SetupFailed(SetupFailure::IdMismatch { found: [0x86, 0x02] })
    );
}

#[test]
fn configuration_write_failure_disables_driver() {
    let sim = SimDevice::new();
    sim.set_fail_writes(true);
    let h = boot(sim, &DriverConfig::default());

    assert!(!h.service.presence());
    assert!(matches!(
        h.sink.events[0],
        DriverEvent::SetupFailed(SetupFailure::Configure(BusError::Write { register: Register::PsThdl, .. }))
    ));
    assert!(h.timers.poll_started().is_none());
}

#[test]
fn interrupt_line_is_subscribed_when_configured() {
    let config = DriverConfig { interrupt_pin: Some(23), ..DriverConfig::default() };
    let h = boot(SimDevice::new(), &config);

    assert!(h.service.presence());
    assert_eq!(h.sim.subscribed_pin(), Some(23));
}

#[test]
fn no_interrupt_pin_means_no_subscription() {
    let h = boot(SimDevice::new(), &DriverConfig::default());
    assert_eq!(h.sim.subscribed_pin(), None);
}

#[test]
fn interrupt_line_failure_is_a_setup_failure() {
    let sim = SimDevice::new();
    sim.set_fail_interrupt(true);
    let config = DriverConfig { interrupt_pin: Some(23), ..DriverConfig::default() };
    let h = boot(sim, &config);

    assert!(!h.service.presence());
    assert_eq!(
        h.sink.events[0],
        DriverEvent::SetupFailed(SetupFailure::Interrupt(InterruptError::Open))
    );
}

#[test]
fn initial_proximity_above_high_threshold_arms_fault_timer() {
    let sim = SimDevice::new();
    sim.set_proximity(8000);
    let h = boot(sim, &DriverConfig::default());

    let id = h.service.fault_timer().expect("timer armed");
    assert_eq!(
        h.timers.calls,
        vec![
            TimerCall::StartPoll(Duration::from_millis(1000)),
            TimerCall::ArmFault(id, Duration::from_millis(300_000)),
        ]
    );
    assert!(h.sink.events.contains(&DriverEvent::OcclusionArmed { distance: 8000 }));
    assert_eq!(h.service.proximity_raw(), Ok(8000));
}

#[test]
fn initial_proximity_at_high_threshold_does_not_arm() {
    let sim = SimDevice::new();
    sim.set_proximity(7000);
    let h = boot(sim, &DriverConfig::default());

    assert!(h.service.fault_timer().is_none());
    assert!(h.timers.armed().is_empty());
}

#[test]
fn initial_proximity_read_failure_is_a_configure_failure() {
    let sim = SimDevice::new();
    sim.set_proximity(8000);
    sim.set_fail_register_read(Some(Register::PsData));
    let mut h = boot(sim, &DriverConfig::default());

    assert!(!h.service.presence());
    assert!(matches!(
        h.sink.events[0],
        DriverEvent::SetupFailed(SetupFailure::Configure(BusError::Read { register: Register::PsData, .. }))
    ));
    assert_eq!(h.sim.writes().len(), 5);
    assert!(h.service.fault_timer().is_none());
    assert!(h.timers.armed().is_empty());

    // Ticks stay no-ops even once the register reads again.
    h.sim.set_fail_register_read(None);
    h.sim.set_als_counts(1000);
    h.service.on_poll_tick(&mut h.sink);
    assert_eq!(h.service.ambient_light_raw(), Err(NoSensorError));
    assert!(!h.sink.events.iter().any(|e| matches!(e, DriverEvent::BusFault(_))));
}

#[test]
fn interrupt_subscription_failure_is_a_setup_failure() {
    let sim = SimDevice::new();
    sim.set_proximity(8000);
    sim.set_fail_subscribe(true);
    let config = DriverConfig { interrupt_pin: Some(23), ..DriverConfig::default() };
    let h = boot(sim, &config);

    assert!(!h.service.presence());
    assert_eq!(
        h.sink.events,
        vec![
            DriverEvent::SetupFailed(SetupFailure::Interrupt(InterruptError::Subscribe)),
            DriverEvent::Started { valid: false },
        ]
    );
    assert_eq!(h.sim.subscribed_pin(), None);
    assert!(h.timers.calls.is_empty());
}
