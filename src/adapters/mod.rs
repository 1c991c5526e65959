//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                       |
//! |------------|---------------------|-----------------------------------|
//! | `linux`    | BusPort             | `/dev/i2c-*` (linux-embedded-hal) |
//! |            | InterruptPort       | GPIO character device             |
//! | `log_sink` | EventSink           | `log` facade                      |
//! | `sim`      | BusPort             | In-memory register file           |
//! |            | InterruptPort       | Injected edges                    |
//! | `timer`    | TimerPort           | Control loop executor             |

#[cfg(feature = "linux")]
pub mod linux;
pub mod log_sink;
pub mod sim;
pub mod timer;
