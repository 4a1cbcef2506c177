//! Machine state shared between the button callbacks, the controller poll
//! loop and the pour coordinator.
//!
//! ```text
//!  button callbacks ──press()──────▶ ┌──────────────────────┐
//!                                    │ CS mutex:            │
//!  controller ──snapshot()/transition()│  current, pending  │
//!                                    ├──────────────────────┤
//!  pour thread ──finish_pour()──────▶│ Signal<PourOutcome>  │──take_pour_outcome()──▶ controller
//!                                    └──────────────────────┘
//! ```
//!
//! Everything that more than one context writes sits behind one
//! critical-section mutex, so a reader never sees a half-applied change
//! (e.g. `Dispensing` without the drink that was selected).  The pour
//! outcome travels through a single-slot signal: finished and failed are
//! one value, delivered once and consumed once.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::dispense::PourOutcome;
use crate::drivers::button::Button;
use crate::fsm::StateId;
use crate::recipes::DrinkId;

/// Point-in-time copy of the shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineState {
    pub current: StateId,
    /// Drink SELECT was pressed on; set together with `Dispensing`.
    pub pending_pour: Option<DrinkId>,
}

pub struct SharedMachine {
    state: CriticalSectionMutex<RefCell<MachineState>>,
    pour_outcome: Signal<CriticalSectionRawMutex, PourOutcome>,
    shutdown: AtomicBool,
}

impl Default for SharedMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMachine {
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionMutex::new(RefCell::new(MachineState {
                current: StateId::Start,
                pending_pour: None,
            })),
            pour_outcome: Signal::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> MachineState {
        self.state.lock(|s| *s.borrow())
    }

    pub fn current(&self) -> StateId {
        self.snapshot().current
    }

    /// Apply a debounced button press.  Returns the new state, or `None` if
    /// the press does nothing in the current state.
    pub fn press(&self, button: Button) -> Option<StateId> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let next = s.current.on_button(button)?;
            if next == StateId::Dispensing {
                s.pending_pour = s.current.drink();
            }
            s.current = next;
            Some(next)
        })
    }

    /// Move `from` → `to`, unless something else changed the state first.
    pub fn transition(&self, from: StateId, to: StateId) -> bool {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.current != from {
                return false;
            }
            s.current = to;
            true
        })
    }

    /// Overwrite the state unconditionally.
    pub fn force(&self, to: StateId) {
        self.state.lock(|s| s.borrow_mut().current = to);
    }

    /// Hand the selected drink to whoever starts the pour.
    pub fn take_pending_pour(&self) -> Option<DrinkId> {
        self.state.lock(|s| s.borrow_mut().pending_pour.take())
    }

    // ── Pour completion ───────────────────────────────────────

    /// Publish the terminal result of a pour.
    pub fn finish_pour(&self, outcome: PourOutcome) {
        self.pour_outcome.signal(outcome);
    }

    /// Consume the pour result, if one is waiting.
    pub fn take_pour_outcome(&self) -> Option<PourOutcome> {
        self.pour_outcome.try_take()
    }

    // ── Shutdown ──────────────────────────────────────────────

    /// Safe to call from a signal handler thread.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
