//! Executor-backed timers.
//!
//! Both timers are tasks on the control loop's `LocalExecutor` that sleep on
//! an `async-io-mini` timer and then post into the inbox, so expiries are
//! serialized with every other event.
//!
//! - Poll timer: periodic, detached, runs for the life of the loop.
//! - Fault timer: one-shot, its `Task` is held here; dropping the task
//!   cancels it.  An expiry that races a cancel is discarded by id in the
//!   service.

use std::sync::Arc;
use std::time::Duration;

use async_io_mini::Timer;
use edge_executor::{LocalExecutor, Task};
use log::{debug, info};

use crate::app::ports::TimerPort;
use crate::events::{Event, Inbox, TimerId};

/// Task slots on the control loop executor (poll + fault + spare).
pub const EXECUTOR_TASKS: usize = 8;

pub struct ExecutorTimers<'e, 'a> {
    executor: &'e LocalExecutor<'a, EXECUTOR_TASKS>,
    inbox: Arc<Inbox>,
    fault: Option<(TimerId, Task<()>)>,
}

impl<'e, 'a> ExecutorTimers<'e, 'a> {
    pub fn new(executor: &'e LocalExecutor<'a, EXECUTOR_TASKS>, inbox: Arc<Inbox>) -> Self {
        Self { executor, inbox, fault: None }
    }

    /// Id of the fault timer task currently held, if any.
    pub fn armed(&self) -> Option<TimerId> {
        self.fault.as_ref().map(|(id, _)| *id)
    }
}

impl TimerPort for ExecutorTimers<'_, '_> {
    fn start_poll_timer(&mut self, period: Duration) {
        let inbox = self.inbox.clone();
        self.executor
            .spawn(async move {
                loop {
                    Timer::after(period).await;
                    inbox.send(Event::PollTick).await;
                }
            })
            .detach();
        info!("poll timer started ({} ms)", period.as_millis());
    }

    fn arm_fault_timer(&mut self, id: TimerId, timeout: Duration) {
        let inbox = self.inbox.clone();
        let task = self.executor.spawn(async move {
            Timer::after(timeout).await;
            inbox.send(Event::FaultTimerExpired(id)).await;
        });
        // Replacing a held task drops, and so cancels, the previous arming.
        self.fault = Some((id, task));
        debug!("fault timer {} armed ({} ms)", id.0, timeout.as_millis());
    }

    fn cancel_fault_timer(&mut self, id: TimerId) {
        if self.armed() == Some(id) {
            self.fault = None;
            debug!("fault timer {} cancelled", id.0);
        }
    }
}
