//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: timing, the drink waiting to be poured, the outcome of the
//! last pour, and the commands the controller applies after each poll.

use std::time::Duration;

use crate::config::MachineConfig;
use crate::dispense::PourOutcome;
use crate::fsm::StateId;
use crate::recipes::DrinkId;

// ---------------------------------------------------------------------------
// Controller commands (written by state handlers; applied by the controller)
// ---------------------------------------------------------------------------

/// Side effects requested by `on_enter` handlers.
///
/// The controller takes each field after the transition, so every request
/// is applied at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerCommands {
    /// Clear the display and show this label.
    pub label: Option<&'static str>,
    /// Start pouring this drink.
    pub pour: Option<DrinkId>,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// State the handler is running for.
    pub current: StateId,
    /// State before the most recent transition.
    pub previous: Option<StateId>,
    /// Time elapsed since the current state was entered.
    pub time_in_state: Duration,

    // -- Pouring --
    /// Drink captured by SELECT, consumed when `Dispensing` is entered.
    pub pending_pour: Option<DrinkId>,
    /// Terminal result of the in-flight pour, consumed by `Dispensing`.
    pub pour_outcome: Option<PourOutcome>,

    // -- Outputs --
    pub commands: ControllerCommands,

    // -- Configuration --
    pub config: MachineConfig,
}

impl FsmContext {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            current: StateId::Start,
            previous: None,
            time_in_state: Duration::ZERO,
            pending_pour: None,
            pour_outcome: None,
            commands: ControllerCommands::default(),
            config,
        }
    }

    /// `true` once the current state has been shown for the dwell time.
    pub fn dwell_elapsed(&self) -> bool {
        self.time_in_state >= self.config.dwell()
    }
}
