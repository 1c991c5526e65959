//! Control loop runtime.
//!
//! [`start`] validates the configuration, then spawns one thread that owns
//! all driver state:
//!
//! ```text
//!  ┌──────────────────── vcnl4040 thread ─────────────────────┐
//!  │  futures_lite::block_on                                  │
//!  │  ┌─ edge_executor::LocalExecutor ──────────────────────┐ │
//!  │  │  serve loop ◀── Inbox ◀── poll task / fault task    │ │
//!  │  └─────────────────────▲───────────────────────────────┘ │
//!  └────────────────────────┼─────────────────────────────────┘
//!            DriverHandle ──┤ queries (Signal reply slot)
//!          interrupt layer ─┘ EdgeEvents
//! ```
//!
//! Queries are answered from cached state by the loop itself, so a caller
//! never observes a half-updated channel.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_io_mini::Timer;
use edge_executor::LocalExecutor;
use embassy_sync::signal::Signal;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::adapters::timer::{EXECUTOR_TASKS, ExecutorTimers};
use crate::app::ports::{BusPort, EventSink, InterruptPort, TimerPort};
use crate::app::service::SensorService;
use crate::config::DriverConfig;
use crate::error::{Error, NoSensorError};
use crate::events::{Event, Inbox, InboxSender, Query, QueryReply};

const LIVENESS_CHECK: Duration = Duration::from_millis(50);

/// Start a driver instance on its own control loop thread.
///
/// Setup runs on that thread; a setup failure does not fail `start`, it
/// leaves the instance invalid (see [`DriverHandle::presence`]).  Only an
/// invalid configuration or a failed thread spawn is returned as an error.
pub fn start<P, Q, S>(
    config: DriverConfig,
    bus: P,
    interrupts: Q,
    sink: S,
) -> Result<DriverHandle, Error>
where
    P: BusPort + Send + 'static,
    Q: InterruptPort + Send + 'static,
    S: EventSink + Send + 'static,
{
    config.validate()?;

    let inbox = Arc::new(Inbox::new());
    let loop_inbox = inbox.clone();
    let thread = std::thread::Builder::new()
        .name("vcnl4040".into())
        .spawn(move || run_loop(config, bus, interrupts, sink, loop_inbox))
        .map_err(|_| Error::Runtime("control loop thread spawn failed"))?;

    Ok(DriverHandle { inbox, thread: Some(thread) })
}

fn run_loop<P, Q, S>(
    config: DriverConfig,
    mut bus: P,
    mut interrupts: Q,
    mut sink: S,
    inbox: Arc<Inbox>,
) where
    P: BusPort,
    Q: InterruptPort,
    S: EventSink,
{
    let executor: LocalExecutor<'_, EXECUTOR_TASKS> = LocalExecutor::new();
    let mut timers = ExecutorTimers::new(&executor, inbox.clone());
    let sender = InboxSender::new(inbox.clone());

    let mut service = SensorService::setup(
        &config,
        &mut bus,
        &mut interrupts,
        &sender,
        &mut timers,
        &mut sink,
    );

    futures_lite::future::block_on(
        executor.run(serve(&mut service, &inbox, &mut timers, &mut sink)),
    );
    info!("control loop stopped");
}

/// Drain the inbox until `Shutdown`, then answer any queries still queued.
async fn serve<B, L, T, S>(
    service: &mut SensorService<B, L>,
    inbox: &Inbox,
    timers: &mut T,
    sink: &mut S,
) where
    B: I2c,
    T: TimerPort,
    S: EventSink,
{
    loop {
        let event = inbox.next().await;
        debug!("event: {event:?}");
        if service.handle(event, timers, sink).is_break() {
            break;
        }
    }
    inbox.close();
    while let Some(event) = inbox.try_next() {
        if let Event::Query { query, reply } = event {
            reply.signal(service.query(query));
        }
    }
}

// ───────────────────────────────────────────────────────────────
// DriverHandle
// ───────────────────────────────────────────────────────────────

/// Handle to one running driver instance.
///
/// Each query posts into the inbox and blocks until the loop answers, so
/// it must not be called from the control loop thread itself.  Dropping
/// the handle stops the loop and joins its thread.
pub struct DriverHandle {
    inbox: Arc<Inbox>,
    thread: Option<JoinHandle<()>>,
}

impl DriverHandle {
    /// True while the device is identified and not faulted.
    pub fn presence(&self) -> bool {
        match self.ask(Query::Presence) {
            QueryReply::Presence(valid) => valid,
            QueryReply::Reading(reading) => reading.is_ok(),
        }
    }

    /// Median of the ambient-light window, in lux.
    pub fn ambient_light_filtered(&self) -> Result<u32, NoSensorError> {
        self.reading(Query::AmbientLightFiltered)
    }

    /// Newest ambient-light sample, in lux.
    pub fn ambient_light_raw(&self) -> Result<u32, NoSensorError> {
        self.reading(Query::AmbientLightRaw)
    }

    /// Median of the proximity window, in counts.
    pub fn proximity_filtered(&self) -> Result<u32, NoSensorError> {
        self.reading(Query::ProximityFiltered)
    }

    /// Newest proximity sample, in counts.
    pub fn proximity_raw(&self) -> Result<u32, NoSensorError> {
        self.reading(Query::ProximityRaw)
    }

    /// Producer for collaborators that feed events directly.  Posting
    /// `Shutdown` through it stops the loop; queries then report the
    /// device absent.
    pub fn sender(&self) -> InboxSender {
        InboxSender::new(self.inbox.clone())
    }

    /// Stop the control loop and wait for its thread.
    pub fn stop(self) {
        drop(self);
    }

    fn reading(&self, query: Query) -> Result<u32, NoSensorError> {
        match self.ask(query) {
            QueryReply::Reading(reading) => reading,
            QueryReply::Presence(_) => Err(NoSensorError),
        }
    }

    fn ask(&self, query: Query) -> QueryReply {
        let Some(thread) = self.thread.as_ref().filter(|t| !t.is_finished()) else {
            return stopped_reply(query);
        };
        let reply = Arc::new(Signal::new());
        futures_lite::future::block_on(futures_lite::future::or(
            async {
                self.inbox.send(Event::Query { query, reply: reply.clone() }).await;
                reply.wait().await
            },
            // A loop stopped through `sender()` never answers.
            async {
                while !thread.is_finished() {
                    Timer::after(LIVENESS_CHECK).await;
                }
                stopped_reply(query)
            },
        ))
    }
}

fn stopped_reply(query: Query) -> QueryReply {
    match query {
        Query::Presence => QueryReply::Presence(false),
        _ => QueryReply::Reading(Err(NoSensorError)),
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        futures_lite::future::block_on(futures_lite::future::or(
            self.inbox.send(Event::Shutdown),
            async {
                while !thread.is_finished() {
                    Timer::after(LIVENESS_CHECK).await;
                }
            },
        ));
        if thread.join().is_err() {
            warn!("control loop thread panicked");
        }
    }
}
