//! Outbound application events.
//!
//! The [`Controller`](super::controller::Controller) emits these through
//! the [`EventSink`](super::ports::EventSink) port.

use crate::dispense::PourOutcome;
use crate::fsm::StateId;
use crate::recipes::DrinkId;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(StateId),

    /// The machine moved between states, by button or by timeout.
    StateChanged { from: StateId, to: StateId },

    /// A pour was handed to the coordinator.
    PourStarted(DrinkId),

    /// The coordinator reported the end of a pour.
    PourFinished(PourOutcome),
}
