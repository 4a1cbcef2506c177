//! Concrete state handler functions and table builder.
//!
//! Each state kind is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  START ──[dwell]──▶ DRINK 0 ◀─UP/DOWN─▶ … ◀─UP/DOWN─▶ DRINK n ──DOWN──▶ THATS_IT
//!                        ▲                   │                             │
//!                        │                 SELECT                 [dwell] ─┘ (to DRINK n)
//!                        │                   ▼
//!                        │              DISPENSING ──[poured]──▶ FINISH_DISPENSING
//!                        │                   │                          │
//!                        │               [failed]                    [dwell]
//!                        │                   ▼                          │
//!                        └──────[dwell]── ERROR                         │
//!                        └──────────────────────────────────────────────┘
//! ```

use log::{error, info, warn};

use super::context::FsmContext;
use super::{StateDescriptor, StateId, StateKind};
use crate::dispense::PourOutcome;
use crate::recipes::DrinkId;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateKind::COUNT] {
    [
        // Index 0 — Start
        StateDescriptor {
            kind: StateKind::Start,
            name: "Start",
            on_enter: Some(show_label),
            on_update: to_first_drink_after_dwell,
        },
        // Index 1 — Menu (one per drink)
        StateDescriptor {
            kind: StateKind::Menu,
            name: "Menu",
            on_enter: Some(show_label),
            on_update: menu_update,
        },
        // Index 2 — ThatsIt
        StateDescriptor {
            kind: StateKind::ThatsIt,
            name: "ThatsIt",
            on_enter: Some(show_label),
            on_update: thats_it_update,
        },
        // Index 3 — Dispensing
        StateDescriptor {
            kind: StateKind::Dispensing,
            name: "Dispensing",
            on_enter: Some(dispensing_enter),
            on_update: dispensing_update,
        },
        // Index 4 — FinishDispensing
        StateDescriptor {
            kind: StateKind::FinishDispensing,
            name: "FinishDispensing",
            on_enter: Some(show_label),
            on_update: to_first_drink_after_dwell,
        },
        // Index 5 — Error
        StateDescriptor {
            kind: StateKind::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_update: to_first_drink_after_dwell,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared handlers
// ═══════════════════════════════════════════════════════════════════════════

fn show_label(ctx: &mut FsmContext) {
    ctx.commands.label = Some(ctx.current.label());
}

/// Start, FinishDispensing and Error all fall back to the top of the menu.
fn to_first_drink_after_dwell(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.dwell_elapsed().then_some(StateId::Drink(DrinkId::FIRST))
}

// ═══════════════════════════════════════════════════════════════════════════
//  MENU — driven entirely by the buttons
// ═══════════════════════════════════════════════════════════════════════════

fn menu_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  THATS_IT — end of the menu, bounce back to the last drink
// ═══════════════════════════════════════════════════════════════════════════

fn thats_it_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.dwell_elapsed().then_some(StateId::Drink(DrinkId::LAST))
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISPENSING
// ═══════════════════════════════════════════════════════════════════════════

fn dispensing_enter(ctx: &mut FsmContext) {
    show_label(ctx);
    match ctx.pending_pour.take() {
        Some(drink) => {
            info!("DISPENSING: pouring {}", drink);
            ctx.commands.pour = Some(drink);
        }
        None => {
            // Entered without a SELECT on a drink; nothing to pour.
            error!("DISPENSING: no drink selected");
            ctx.pour_outcome = Some(PourOutcome::Failed);
        }
    }
}

fn dispensing_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.pour_outcome.take()? {
        PourOutcome::Poured => Some(StateId::FinishDispensing),
        PourOutcome::Failed => Some(StateId::Error),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR — operator-visible, recovers to the menu on its own
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    show_label(ctx);
    warn!(
        "ERROR: pour failed, back to the menu in {}s",
        ctx.config.dwell_secs
    );
}
