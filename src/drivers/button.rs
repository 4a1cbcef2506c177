//! Edge-debounced menu buttons.
//!
//! ## Hardware
//!
//! Three active-high momentary switches with pull-downs.  The GPIO layer
//! calls [`InputHandler::on_edge`] for every edge with a microsecond
//! timestamp, from its own interrupt thread.  Only rising edges count as
//! presses.
//!
//! ## Debounce
//!
//! Each button remembers the timestamp of its last *accepted* press.  A
//! rising edge closer than the threshold to that timestamp is contact
//! bounce and is dropped.  Rejected edges do not move the window.
//!
//! The callback path is lock-free apart from the short critical section
//! inside [`SharedMachine::press`]; it never allocates or sleeps.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::app::shared::SharedMachine;
use crate::pins;

/// Marks a button that has never been pressed.
const NEVER: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    Up = 0,
    Down = 1,
    Select = 2,
}

impl Button {
    pub const COUNT: usize = 3;
    pub const ALL: [Button; Button::COUNT] = [Self::Up, Self::Down, Self::Select];

    /// BCM GPIO the button is wired to.
    pub const fn gpio(self) -> u8 {
        match self {
            Self::Up => pins::UP_BUTTON_GPIO,
            Self::Down => pins::DOWN_BUTTON_GPIO,
            Self::Select => pins::SELECT_BUTTON_GPIO,
        }
    }
}

/// Per-button minimum spacing between accepted presses.
pub struct Debouncer {
    threshold_us: u64,
    last_accepted_us: [AtomicU64; Button::COUNT],
}

impl Debouncer {
    pub fn new(threshold_us: u64) -> Self {
        Self {
            threshold_us,
            last_accepted_us: [
                AtomicU64::new(NEVER),
                AtomicU64::new(NEVER),
                AtomicU64::new(NEVER),
            ],
        }
    }

    /// `true` if a press of `button` at `tick_us` should be acted on.
    pub fn accept(&self, button: Button, tick_us: u64) -> bool {
        let slot = &self.last_accepted_us[button as usize];
        let last = slot.load(Ordering::Acquire);
        if last != NEVER && tick_us.saturating_sub(last) < self.threshold_us {
            return false;
        }
        // Two edges racing for the same window: only one wins.
        slot.compare_exchange(last, tick_us, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Button callback target: debounces, then applies the press to the
/// shared machine state.
pub struct InputHandler {
    debouncer: Debouncer,
    machine: Arc<SharedMachine>,
}

impl InputHandler {
    pub fn new(threshold_us: u64, machine: Arc<SharedMachine>) -> Self {
        Self {
            debouncer: Debouncer::new(threshold_us),
            machine,
        }
    }

    /// Handle one raw edge.  `rising` is `true` for a low → high edge.
    pub fn on_edge(&self, button: Button, rising: bool, tick_us: u64) {
        if !rising || !self.debouncer.accept(button, tick_us) {
            return;
        }
        if let Some(state) = self.machine.press(button) {
            debug!("Button {:?} -> {:?}", button, state);
        }
    }
}
