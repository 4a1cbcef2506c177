//! Function-pointer finite state machine engine for the drink menu.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │  StateTable                                           │
//! │  ┌──────────────────┬───────────┬───────────────────┐ │
//! │  │ StateKind        │ on_enter  │ on_update         │ │
//! │  ├──────────────────┼───────────┼───────────────────┤ │
//! │  │ Start            │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  │ Menu             │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  │ ThatsIt          │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  │ Dispensing       │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  │ FinishDispensing │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  │ Error            │ fn(ctx)   │ fn(ctx)->Option<> │ │
//! │  └──────────────────┴───────────┴───────────────────┘ │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a self-contained FSM, the current state is also written by the
//! button callbacks, so the engine does not apply the transitions its
//! `on_update` handlers request.  [`Fsm::tick`] returns the requested
//! state; the controller publishes it to the shared machine state and then
//! calls [`Fsm::transition`] for every change it observes, whoever made it.

pub mod context;
pub mod states;

use std::time::{Duration, Instant};

use context::FsmContext;
use log::info;

use crate::drivers::button::Button;
use crate::recipes::DrinkId;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state the machine can be in.
///
/// Menu order is `Drink(0) < Drink(1) < … < Drink(last) < ThatsIt`; the
/// remaining states are outside the menu and ignore UP / DOWN / SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Start,
    Drink(DrinkId),
    ThatsIt,
    Dispensing,
    FinishDispensing,
    Error,
}

impl StateId {
    /// Which row of the state table handles this state.
    pub const fn kind(self) -> StateKind {
        match self {
            Self::Start => StateKind::Start,
            Self::Drink(_) => StateKind::Menu,
            Self::ThatsIt => StateKind::ThatsIt,
            Self::Dispensing => StateKind::Dispensing,
            Self::FinishDispensing => StateKind::FinishDispensing,
            Self::Error => StateKind::Error,
        }
    }

    /// Text shown on the LCD.  `\n` starts the second row.
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Welcome!\nPlease wait...",
            Self::Drink(drink) => drink.recipe().name,
            Self::ThatsIt => "That's it!\n(for now!)",
            Self::Dispensing => "Pouring...\nPlease wait...",
            Self::FinishDispensing => "Finished pouring\nEnjoy your drink",
            Self::Error => "A critical error\nhas occurred...",
        }
    }

    pub const fn drink(self) -> Option<DrinkId> {
        match self {
            Self::Drink(drink) => Some(drink),
            _ => None,
        }
    }

    /// The state a debounced button press moves to, or `None` if the press
    /// is ignored in this state.
    ///
    /// Only drink states react to input.  UP stops at the first drink,
    /// DOWN stops at `ThatsIt`, SELECT starts a pour.
    pub fn on_button(self, button: Button) -> Option<StateId> {
        let drink = self.drink()?;
        match button {
            Button::Up => drink.prev().map(Self::Drink),
            Button::Down => Some(drink.next().map_or(Self::ThatsIt, Self::Drink)),
            Button::Select => Some(Self::Dispensing),
        }
    }
}

/// Row index into the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateKind {
    Start = 0,
    Menu = 1,
    ThatsIt = 2,
    Dispensing = 3,
    FinishDispensing = 4,
    Error = 5,
}

impl StateKind {
    /// Total number of state kinds — used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to `StateKind`.  Panics on out-of-range in
    /// debug builds; returns `Error` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Start,
            1 => Self::Menu,
            2 => Self::ThatsIt,
            3 => Self::Dispensing,
            4 => Self::FinishDispensing,
            5 => Self::Error,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.  Runs exactly once per transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-poll update handler.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single kind of state.
pub struct StateDescriptor {
    pub kind: StateKind,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateKind as usize`.
    table: [StateDescriptor; StateKind::COUNT],
    current: StateId,
    /// When the current state was entered.
    entered_at: Instant,
    poll_count: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateKind::COUNT], initial: StateId, now: Instant) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.kind as usize == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial,
            entered_at: now,
            poll_count: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext, now: Instant) {
        info!(
            "FSM starting in state: {} ({:?})",
            self.descriptor(self.current).name,
            self.current
        );
        self.entered_at = now;
        ctx.current = self.current;
        ctx.time_in_state = Duration::ZERO;
        self.enter(ctx);
    }

    /// Run `on_update` for the current state and return the transition it
    /// asks for, if any.  The transition is not applied here.
    pub fn tick(&mut self, ctx: &mut FsmContext, now: Instant) -> Option<StateId> {
        self.poll_count += 1;
        ctx.current = self.current;
        ctx.time_in_state = now.saturating_duration_since(self.entered_at);

        (self.descriptor(self.current).on_update)(ctx)
    }

    /// Move to `next`: update the pointer and timing, then run `on_enter`.
    pub fn transition(&mut self, next: StateId, ctx: &mut FsmContext, now: Instant) {
        info!(
            "FSM transition: {} -> {} ({:?} -> {:?})",
            self.descriptor(self.current).name,
            self.descriptor(next).name,
            self.current,
            next
        );

        ctx.previous = Some(self.current);
        self.current = next;
        self.entered_at = now;
        ctx.current = next;
        ctx.time_in_state = Duration::ZERO;

        self.enter(ctx);
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Number of `tick()` calls since construction.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn descriptor(&self, state: StateId) -> &StateDescriptor {
        &self.table[state.kind() as usize]
    }

    fn enter(&self, ctx: &mut FsmContext) {
        if let Some(enter) = self.descriptor(self.current).on_enter {
            enter(ctx);
        }
    }
}
