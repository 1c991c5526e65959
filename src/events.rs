//! The control loop's inbox.
//!
//! Every input to the driver arrives as an [`Event`] in one bounded FIFO:
//!
//! ```text
//! ┌──────────────┐
//! │ Poll timer   │────▶┌──────────────┐     ┌──────────────┐
//! │ Fault timer  │────▶│    Inbox     │────▶│ Control loop │
//! │ INT line     │────▶│ (FIFO, 32)   │     │  (consumer)  │
//! │ Query caller │────▶│              │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Events are served strictly in arrival order; there is no priority
//! between kinds.  The inbox is an `embassy-sync` channel so producers on
//! other threads (interrupt watcher, query callers) can post without
//! sharing any other state with the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::error::NoSensorError;

/// Maximum number of pending events.
pub const INBOX_DEPTH: usize = 32;

const CLOSED_CHECK: Duration = Duration::from_millis(20);

// ── Event payloads ────────────────────────────────────────────

/// Which GPIO edges should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// One edge reported by the interrupt collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub pin: u32,
    /// Monotonic timestamp from the interrupt layer (nanoseconds).
    pub timestamp_ns: u64,
    /// Line level after the edge (`false` = low).
    pub level: bool,
}

/// Identity of one fault-timer arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// Read-only questions answered from cached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Presence,
    AmbientLightFiltered,
    AmbientLightRaw,
    ProximityFiltered,
    ProximityRaw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryReply {
    Presence(bool),
    Reading(Result<u32, NoSensorError>),
}

/// Slot the control loop fills with a [`QueryReply`].
pub type ReplySlot = Arc<Signal<CriticalSectionRawMutex, QueryReply>>;

/// Everything the control loop reacts to.
pub enum Event {
    /// Periodic ALS poll.
    PollTick,
    /// Edge on the proximity interrupt line.
    Interrupt(EdgeEvent),
    /// The occlusion fault timer fired.
    FaultTimerExpired(TimerId),
    /// Synchronous query; the answer goes into `reply`.
    Query { query: Query, reply: ReplySlot },
    /// Leave the loop.
    Shutdown,
}

impl core::fmt::Debug for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PollTick => write!(f, "PollTick"),
            Self::Interrupt(e) => write!(f, "Interrupt({e:?})"),
            Self::FaultTimerExpired(id) => write!(f, "FaultTimerExpired({})", id.0),
            Self::Query { query, .. } => write!(f, "Query({query:?})"),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

// ── Inbox ─────────────────────────────────────────────────────

pub struct Inbox {
    channel: Channel<CriticalSectionRawMutex, Event, INBOX_DEPTH>,
    closed: AtomicBool,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Mark the consumer gone.  Producers waiting for room give up.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Post without waiting.  Returns `false` if the inbox is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Post, waiting for room if the inbox is full.
    pub async fn send(&self, event: Event) {
        self.channel.send(event).await;
    }

    /// Wait for the next event.
    pub async fn next(&self) -> Event {
        self.channel.receive().await
    }

    /// Pop the next event if one is pending.
    pub fn try_next(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Cloneable producer half handed to collaborators (interrupt layer, timers).
#[derive(Clone)]
pub struct InboxSender {
    inbox: Arc<Inbox>,
}

impl InboxSender {
    pub fn new(inbox: Arc<Inbox>) -> Self {
        Self { inbox }
    }

    /// Post an interrupt edge, waiting for room while the inbox is full.
    ///
    /// The device holds INT low until its flags are read, so a lost edge
    /// would silence the line for good; edges are never dropped.  Resolves
    /// to `false` only once the inbox is closed.
    pub async fn send_interrupt(&self, edge: EdgeEvent) -> bool {
        if self.inbox.is_closed() {
            return false;
        }
        if self.inbox.push(Event::Interrupt(edge)) {
            return true;
        }
        log::debug!("inbox full, holding interrupt on pin {}", edge.pin);
        futures_lite::future::or(
            async {
                self.inbox.send(Event::Interrupt(edge)).await;
                true
            },
            async {
                while !self.inbox.is_closed() {
                    Timer::after(CLOSED_CHECK).await;
                }
                false
            },
        )
        .await
    }

    pub fn push(&self, event: Event) -> bool {
        self.inbox.push(event)
    }

    pub async fn send(&self, event: Event) {
        self.inbox.send(event).await;
    }
}
