//! Sensor subsystem: the VCNL4040 register driver and per-channel state.
//!
//! The control loop owns one [`Vcnl4040`] and two [`ChannelState`]s
//! (ambient light and proximity).  Nothing here schedules work; the
//! service decides when to read.

pub mod channel;
pub mod vcnl4040;

pub use channel::ChannelState;
pub use vcnl4040::Vcnl4040;
