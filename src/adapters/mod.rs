//! Adapters — concrete implementations of the port traits and the input
//! sources that feed the shared machine state.
//!
//! | Adapter    | Implements / feeds | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `console`  | InputHandler       | stdin (host builds)            |
//! | `log_sink` | EventSink          | `log` facade                   |
//! | `rpi`      | DisplayPort, pins  | BCM GPIO + I²C via rppal       |

pub mod console;
pub mod log_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
