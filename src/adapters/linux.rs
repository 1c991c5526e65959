//! Linux adapters: `/dev/i2c-*` through `linux-embedded-hal` and the
//! interrupt line through the GPIO character device.
//!
//! Each subscribed line gets a watcher thread that waits on the kernel's
//! line-event fd and pushes edges into the inbox; it never touches driver
//! state.  Dropping the [`GpioLine`] stops and joins the watcher, which
//! closes the event fd and releases the line.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::sync::Arc;
use std::thread::JoinHandle;

use async_io_mini::Async;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use linux_embedded_hal::I2cdev;
use linux_embedded_hal::gpio_cdev::{
    Chip, EventRequestFlags, EventType, Line, LineEventHandle, LineRequestFlags,
};
use log::{debug, info, warn};

use crate::app::ports::{BusPort, InterruptPort};
use crate::error::{BusError, InterruptError};
use crate::events::{Edge, EdgeEvent, InboxSender};

const CONSUMER: &str = "vcnl4040d";

// ── Bus ───────────────────────────────────────────────────────

/// Opens `/dev/<name>` (or `name` itself when it is an absolute path).
#[derive(Debug, Default)]
pub struct LinuxBus;

impl BusPort for LinuxBus {
    type Bus = I2cdev;

    fn open(&mut self, name: &str) -> Result<I2cdev, BusError> {
        let path = if name.starts_with('/') { name.to_string() } else { format!("/dev/{name}") };
        I2cdev::new(&path)
            .inspect(|_| info!("opened {path}"))
            .map_err(|e| {
                warn!("cannot open {path}: {e}");
                BusError::Open
            })
    }
}

// ── Interrupt line ────────────────────────────────────────────

pub struct LinuxGpio {
    chip: String,
}

impl LinuxGpio {
    /// `chip` is a GPIO character device such as `/dev/gpiochip0`.
    pub fn new(chip: impl Into<String>) -> Self {
        Self { chip: chip.into() }
    }
}

pub struct GpioLine {
    pin: u32,
    line: Line,
    watcher: Option<Watcher>,
}

struct Watcher {
    stop: Arc<Signal<CriticalSectionRawMutex, ()>>,
    thread: JoinHandle<()>,
}

impl Drop for GpioLine {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
            debug!("line {} released", self.pin);
        }
    }
}

impl InterruptPort for LinuxGpio {
    type Line = GpioLine;

    fn open(&mut self, pin: u32) -> Result<GpioLine, InterruptError> {
        let mut chip = Chip::new(&self.chip).map_err(|e| {
            warn!("cannot open {}: {e}", self.chip);
            InterruptError::Open
        })?;
        let line = chip.get_line(pin).map_err(|e| {
            warn!("{}: no line {pin}: {e}", self.chip);
            InterruptError::Open
        })?;
        Ok(GpioLine { pin, line, watcher: None })
    }

    fn subscribe(
        &mut self,
        line: &mut GpioLine,
        edge: Edge,
        sender: InboxSender,
    ) -> Result<(), InterruptError> {
        let flags = match edge {
            Edge::Rising => EventRequestFlags::RISING_EDGE,
            Edge::Falling => EventRequestFlags::FALLING_EDGE,
            Edge::Both => EventRequestFlags::BOTH_EDGES,
        };
        let events = line
            .line
            .events(LineRequestFlags::INPUT, flags, CONSUMER)
            .map_err(|e| {
                warn!("line {}: edge request failed: {e}", line.pin);
                InterruptError::Subscribe
            })?;

        line.watcher = Some(Watcher::spawn(line.pin, events, sender)?);
        Ok(())
    }
}

// ── Watcher ───────────────────────────────────────────────────

/// Pollable fd that yields one edge per read.
trait EdgeSource: AsRawFd {
    /// `(timestamp_ns, level_after_edge)`
    fn read_edge(&mut self) -> io::Result<(u64, bool)>;
}

impl EdgeSource for LineEventHandle {
    fn read_edge(&mut self) -> io::Result<(u64, bool)> {
        let event = self.get_event().map_err(|e| io::Error::other(e.to_string()))?;
        Ok((event.timestamp(), matches!(event.event_type(), EventType::RisingEdge)))
    }
}

impl Watcher {
    fn spawn<E>(pin: u32, source: E, sender: InboxSender) -> Result<Self, InterruptError>
    where
        E: EdgeSource + Send + 'static,
    {
        let stop = Arc::new(Signal::new());
        let watcher_stop = stop.clone();
        let thread = std::thread::Builder::new()
            .name(format!("vcnl4040-irq{pin}"))
            .spawn(move || watch(pin, source, &sender, &watcher_stop))
            .map_err(|_| InterruptError::Subscribe)?;
        Ok(Self { stop, thread })
    }

    /// Returns once the thread has exited and closed its source.
    fn stop(self) {
        self.stop.signal(());
        if self.thread.join().is_err() {
            warn!("interrupt watcher panicked");
        }
    }
}

/// Borrowed view of the source's fd for the reactor.
struct EventFd(RawFd);

impl AsFd for EventFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the owning source outlives every `EventFd`; `watch`
        // drops the reactor registration before the source.
        unsafe { BorrowedFd::borrow_raw(self.0) }
    }
}

fn watch<E: EdgeSource>(
    pin: u32,
    mut source: E,
    sender: &InboxSender,
    stop: &Signal<CriticalSectionRawMutex, ()>,
) {
    let fd = match Async::new(EventFd(source.as_raw_fd())) {
        Ok(fd) => fd,
        Err(e) => {
            warn!("line {pin}: cannot watch event fd: {e}");
            return;
        }
    };

    future::block_on(async {
        loop {
            let readable = future::or(
                async { fd.readable().await.map(|()| true) },
                async {
                    stop.wait().await;
                    Ok(false)
                },
            )
            .await;
            match readable {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("line {pin}: event wait failed: {e}");
                    break;
                }
            }

            let (timestamp_ns, level) = match source.read_edge() {
                Ok(edge) => edge,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => {
                    warn!("line {pin}: event stream ended: {e}");
                    break;
                }
            };
            let edge = EdgeEvent { pin, timestamp_ns, level };
            let posted = future::or(sender.send_interrupt(edge), async {
                stop.wait().await;
                false
            })
            .await;
            if !posted {
                break;
            }
        }
    });

    drop(fd);
    drop(source);
}
