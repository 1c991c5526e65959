//! Ambient-light polling and filtering.

use vcnl4040::adapters::sim::SimDevice;
use vcnl4040::app::events::DriverEvent;
use vcnl4040::config::DriverConfig;
use vcnl4040::error::{BusError, NoSensorError};
use vcnl4040::events::Event;
use vcnl4040::protocol::{AlsIntegrationTime, Register};

use crate::mock_hw::boot;

#[test]
fn thousand_counts_at_80ms_is_120_lux() {
    let mut h = boot(SimDevice::new(), &DriverConfig::default());
    h.sim.set_als_counts(1000);
    h.service.on_poll_tick(&mut h.sink);

    assert_eq!(h.service.ambient_light_raw(), Ok(120));
    assert_eq!(h.service.ambient_light_filtered(), Ok(120));
}

#[test]
fn longer_integration_time_scales_lux_down() {
    for (it, expected) in [
        (AlsIntegrationTime::Ms160, 60),
        (AlsIntegrationTime::Ms320, 30),
        (AlsIntegrationTime::Ms640, 15),
    ] {
        let config = DriverConfig { als_integration_time: it, ..DriverConfig::default() };
        let mut h = boot(SimDevice::new(), &config);
        h.sim.set_als_counts(1000);
        h.service.on_poll_tick(&mut h.sink);
        assert_eq!(h.service.ambient_light_raw(), Ok(expected), "{it:?}");
    }
}

#[test]
fn filtered_value_is_window_median() {
    let config = DriverConfig { buffer_capacity: 5, ..DriverConfig::default() };
    let mut h = boot(SimDevice::new(), &config);

    // Lux at 80 ms: counts * 0.12.
    for counts in [100u16, 5000, 200, 300, 50] {
        h.sim.set_als_counts(counts);
        h.service.on_poll_tick(&mut h.sink);
    }
    // Window lux [12, 600, 24, 36, 6] sorted [6, 12, 24, 36, 600].
    assert_eq!(h.service.ambient_light_filtered(), Ok(24));
    assert_eq!(h.service.ambient_light_raw(), Ok(6));
}

#[test]
fn window_evicts_oldest_samples() {
    let config = DriverConfig { buffer_capacity: 3, ..DriverConfig::default() };
    let mut h = boot(SimDevice::new(), &config);

    for counts in [10_000u16, 10_000, 10_000, 100, 100] {
        h.sim.set_als_counts(counts);
        h.service.on_poll_tick(&mut h.sink);
    }
    // Window [1200, 12, 12] → sorted [12, 12, 1200].
    assert_eq!(h.service.ambient_light_filtered(), Ok(12));
}

#[test]
fn log_toggle_does_not_change_readings() {
    let config = DriverConfig { log_enabled: true, ..DriverConfig::default() };
    let mut h = boot(SimDevice::new(), &config);
    h.sim.set_als_counts(250);
    h.service.on_poll_tick(&mut h.sink);
    assert_eq!(h.service.ambient_light_raw(), Ok(30));
}

#[test]
fn poll_is_noop_while_invalid() {
    let sim = SimDevice::new();
    sim.set_device_id([0, 0]);
    let mut h = boot(sim, &DriverConfig::default());
    h.sim.set_als_counts(1000);
    let before = h.sink.events.len();
    h.service.on_poll_tick(&mut h.sink);

    assert_eq!(h.service.ambient_light_raw(), Err(NoSensorError));
    assert_eq!(h.sink.events.len(), before);
}

#[test]
fn read_failure_is_reported_and_skipped() {
    let mut h = boot(SimDevice::new(), &DriverConfig::default());
    h.sim.set_als_counts(1000);
    h.service.on_poll_tick(&mut h.sink);

    h.sim.set_fail_reads(true);
    h.sim.set_als_counts(2000);
    h.service.on_poll_tick(&mut h.sink);

    assert!(h.service.presence());
    assert_eq!(h.service.ambient_light_raw(), Ok(120));
    assert!(matches!(
        h.sink.events.last(),
        Some(DriverEvent::BusFault(BusError::Read { register: Register::AlsData, .. }))
    ));

    h.sim.set_fail_reads(false);
    h.service.on_poll_tick(&mut h.sink);
    assert_eq!(h.service.ambient_light_raw(), Ok(240));
}

#[test]
fn poll_tick_event_dispatches_through_handle() {
    let mut h = boot(SimDevice::new(), &DriverConfig::default());
    h.sim.set_als_counts(500);
    let flow = h.service.handle(Event::PollTick, &mut h.timers, &mut h.sink);

    assert!(flow.is_continue());
    assert_eq!(h.service.ambient_light_raw(), Ok(60));
}
