//! Drinkmaker library.
//!
//! Exposes the menu FSM, the pour coordinator and the drivers for
//! integration testing.  Raspberry Pi specific code is behind the `rpi`
//! feature; everything else builds and runs on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispense;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod logging;
pub mod pins;
pub mod recipes;
