//! Mock collaborators for integration tests.
//!
//! The simulated device from the library stands in for the bus and the
//! interrupt line; these mocks record timer calls and emitted events so
//! tests can assert on the full history.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vcnl4040::adapters::sim::{SimBus, SimDevice, SimLine};
use vcnl4040::app::events::DriverEvent;
use vcnl4040::app::ports::{EventSink, TimerPort};
use vcnl4040::app::service::SensorService;
use vcnl4040::config::DriverConfig;
use vcnl4040::events::{Inbox, InboxSender, TimerId};

// ── Timer call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    StartPoll(Duration),
    ArmFault(TimerId, Duration),
    CancelFault(TimerId),
}

#[derive(Debug, Default)]
pub struct MockTimers {
    pub calls: Vec<TimerCall>,
}

#[allow(dead_code)]
impl MockTimers {
    pub fn armed(&self) -> Vec<TimerId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TimerCall::ArmFault(id, _) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TimerCall::CancelFault(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn poll_started(&self) -> Option<Duration> {
        self.calls.iter().find_map(|c| match c {
            TimerCall::StartPoll(period) => Some(*period),
            _ => None,
        })
    }
}

impl TimerPort for MockTimers {
    fn start_poll_timer(&mut self, period: Duration) {
        self.calls.push(TimerCall::StartPoll(period));
    }

    fn arm_fault_timer(&mut self, id: TimerId, timeout: Duration) {
        self.calls.push(TimerCall::ArmFault(id, timeout));
    }

    fn cancel_fault_timer(&mut self, id: TimerId) {
        self.calls.push(TimerCall::CancelFault(id));
    }
}

// ── Event sinks ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<DriverEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&DriverEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DriverEvent) {
        self.events.push(*event);
    }
}

/// Sink that can cross into the control loop thread.
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    events: Arc<Mutex<Vec<DriverEvent>>>,
}

#[allow(dead_code)]
impl SharedSink {
    pub fn events(&self) -> Vec<DriverEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &DriverEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }
}

impl EventSink for SharedSink {
    fn emit(&mut self, event: &DriverEvent) {
        self.events.lock().unwrap().push(*event);
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Harness {
    pub sim: SimDevice,
    pub service: SensorService<SimBus, SimLine>,
    pub timers: MockTimers,
    pub sink: RecordingSink,
    #[allow(dead_code)]
    pub inbox: Arc<Inbox>,
}

/// Run setup against `sim` with mock timers and a recording sink.
pub fn boot(sim: SimDevice, config: &DriverConfig) -> Harness {
    let inbox = Arc::new(Inbox::new());
    let sender = InboxSender::new(inbox.clone());
    let mut timers = MockTimers::default();
    let mut sink = RecordingSink::default();
    let service = SensorService::setup(
        config,
        &mut sim.clone(),
        &mut sim.clone(),
        &sender,
        &mut timers,
        &mut sink,
    );
    Harness { sim, service, timers, sink, inbox }
}

/// Poll `cond` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
