//! Application core — menu and pour orchestration.
//!
//! The [`controller`] runs the FSM against the shared machine state; all
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod controller;
pub mod events;
pub mod ports;
pub mod shared;
