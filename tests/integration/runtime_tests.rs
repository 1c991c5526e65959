//! End-to-end runs of the control loop thread against the simulated device.

use std::time::Duration;

use vcnl4040::adapters::sim::SimDevice;
use vcnl4040::app::events::DriverEvent;
use vcnl4040::config::DriverConfig;
use vcnl4040::error::{Error, NoSensorError};
use vcnl4040::protocol::InterruptFlags;
use vcnl4040::start;

use crate::mock_hw::{SharedSink, wait_until};

const PIN: u32 = 5;
const PATIENCE: Duration = Duration::from_secs(5);

fn fast_config() -> DriverConfig {
    DriverConfig {
        interrupt_pin: Some(PIN),
        poll_interval_ms: 10,
        ..DriverConfig::default()
    }
}

#[test]
fn polls_and_answers_queries() {
    let sim = SimDevice::new();
    sim.set_als_counts(1000);
    let sink = SharedSink::default();
    let driver = start(fast_config(), sim.clone(), sim.clone(), sink.clone()).unwrap();

    assert!(driver.presence());
    assert!(wait_until(PATIENCE, || driver.ambient_light_raw() == Ok(120)));
    assert!(wait_until(PATIENCE, || driver.ambient_light_filtered() == Ok(120)));
    assert!(sink.contains(&DriverEvent::Started { valid: true }));

    driver.stop();
}

#[test]
fn interrupt_edges_reach_the_loop() {
    let sim = SimDevice::new();
    let sink = SharedSink::default();
    let driver = start(fast_config(), sim.clone(), sim.clone(), sink.clone()).unwrap();

    // The first answered query means setup, and so the subscription, is done.
    assert!(driver.presence());
    assert_eq!(sim.subscribed_pin(), Some(PIN));

    assert!(sim.raise_interrupt(InterruptFlags { close: true, away: false }, 7200));
    assert!(wait_until(PATIENCE, || {
        sink.contains(&DriverEvent::ProximityClose { distance: 7200 })
    }));
    assert_eq!(driver.proximity_raw(), Ok(7200));
}

#[test]
fn uncovering_before_timeout_keeps_sensor() {
    let sim = SimDevice::new();
    sim.set_proximity(8000);
    let sink = SharedSink::default();
    let config = DriverConfig { occlusion_timeout_ms: 200, ..fast_config() };
    let driver = start(config, sim.clone(), sim.clone(), sink.clone()).unwrap();

    assert!(driver.presence());
    assert!(sim.raise_interrupt(InterruptFlags { close: false, away: true }, 2000));
    assert!(wait_until(PATIENCE, || {
        sink.contains(&DriverEvent::OcclusionCleared { distance: 2000 })
    }));

    std::thread::sleep(Duration::from_millis(400));
    assert!(driver.presence());
    assert!(!sink.contains(&DriverEvent::OcclusionFault));
}

#[test]
fn staying_covered_disables_sensor() {
    let sim = SimDevice::new();
    sim.set_proximity(8000);
    let sink = SharedSink::default();
    let config = DriverConfig { occlusion_timeout_ms: 50, ..fast_config() };
    let driver = start(config, sim.clone(), sim, sink.clone()).unwrap();

    assert!(wait_until(PATIENCE, || !driver.presence()));
    assert_eq!(driver.ambient_light_filtered(), Err(NoSensorError));
    assert!(sink.contains(&DriverEvent::OcclusionFault));
}

#[test]
fn missing_device_answers_presence_only() {
    let sim = SimDevice::new();
    sim.set_device_id([0x00, 0x00]);
    let driver = start(fast_config(), sim.clone(), sim, SharedSink::default()).unwrap();

    assert!(!driver.presence());
    assert_eq!(driver.ambient_light_raw(), Err(NoSensorError));
    assert_eq!(driver.proximity_filtered(), Err(NoSensorError));
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let sim = SimDevice::new();
    let config = DriverConfig { buffer_capacity: 0, ..DriverConfig::default() };
    let result = start(config, sim.clone(), sim.clone(), SharedSink::default());

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(sim.opened_bus().is_none());
}

#[test]
fn instances_are_independent() {
    let bright = SimDevice::new();
    bright.set_als_counts(2000);
    let dark = SimDevice::new();
    dark.set_device_id([0x12, 0x34]);

    let a = start(fast_config(), bright.clone(), bright, SharedSink::default()).unwrap();
    let b = start(fast_config(), dark.clone(), dark, SharedSink::default()).unwrap();

    assert!(wait_until(PATIENCE, || a.ambient_light_raw() == Ok(240)));
    assert!(!b.presence());
    assert!(a.presence());
}

#[test]
fn queries_after_external_shutdown_report_absent() {
    let sim = SimDevice::new();
    let driver = start(fast_config(), sim.clone(), sim, SharedSink::default()).unwrap();
    assert!(driver.presence());

    assert!(driver.sender().push(vcnl4040::events::Event::Shutdown));
    assert!(wait_until(PATIENCE, || !driver.presence()));
    assert_eq!(driver.ambient_light_raw(), Err(NoSensorError));
}

#[test]
fn wide_window_starts_and_filters() {
    let sim = SimDevice::new();
    sim.set_als_counts(500);
    let config = DriverConfig { buffer_capacity: 64, ..fast_config() };
    let driver = start(config, sim.clone(), sim, SharedSink::default()).unwrap();

    assert!(driver.presence());
    assert!(wait_until(PATIENCE, || driver.ambient_light_filtered() == Ok(60)));
}
