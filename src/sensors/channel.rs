//! Per-channel cached readings.

use crate::filter::CircularBuffer;

/// Filtered state of one measurement channel (ambient light or proximity).
///
/// `latest_raw` is the newest unfiltered sample; `latest_filtered` is the
/// rank-median of the window.  Both read 0 until the first sample lands.
#[derive(Debug, Clone)]
pub struct ChannelState<S> {
    /// Integration time / mode the channel was configured with.
    pub setting: S,
    readings: CircularBuffer<u32>,
    latest_raw: u32,
    latest_filtered: u32,
}

impl<S: Copy> ChannelState<S> {
    /// A zero `capacity` becomes 1; callers validate first.
    pub fn new(setting: S, capacity: usize) -> Self {
        Self {
            setting,
            readings: CircularBuffer::clamped(capacity),
            latest_raw: 0,
            latest_filtered: 0,
        }
    }

    /// Insert a sample and return the new filtered value.
    pub fn record(&mut self, value: u32) -> u32 {
        self.readings.push(value);
        self.latest_raw = self.readings.newest().unwrap_or(value);
        self.latest_filtered = self.readings.median().unwrap_or(value);
        self.latest_filtered
    }

    pub fn latest_raw(&self) -> u32 {
        self.latest_raw
    }

    pub fn latest_filtered(&self) -> u32 {
        self.latest_filtered
    }

    pub fn readings(&self) -> &CircularBuffer<u32> {
        &self.readings
    }
}
