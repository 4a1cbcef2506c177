//! Machine controller — the poll loop that owns the display.
//!
//! [`Controller`] owns the FSM, its context and the display.  Button
//! callbacks and the pour coordinator never touch either; they write to
//! [`SharedMachine`] and the controller picks the change up on its next
//! poll.
//!
//! ```text
//!  SharedMachine ──▶ ┌──────────────────────┐ ──▶ DisplayPort
//!                    │      Controller      │
//!  EventSink    ◀─── │  Fsm · FsmContext    │ ──▶ DispensePort
//!                    └──────────────────────┘
//! ```
//!
//! One poll:
//! 1. enter whatever state the buttons moved the machine to;
//! 2. hand a finished pour's outcome to the FSM;
//! 3. run the current state's update handler and publish the transition
//!    it asks for (compare-and-set, so a concurrent press wins);
//! 4. apply the commands the entered state issued (label, pour).

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::config::MachineConfig;
use crate::dispense::{Dispenser, ThreadLauncher};
use crate::drivers::pump::PumpBank;
use crate::error::{PumpError, Result};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::recipes::INGREDIENT_COUNT;

use super::events::AppEvent;
use super::ports::{DispensePort, DisplayPort, EventSink};
use super::shared::SharedMachine;

/// Shown while the process winds down.
pub const SHUTDOWN_MESSAGE: &str = "Machine\nterminating...";

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<D, X> {
    fsm: Fsm,
    ctx: FsmContext,
    machine: Arc<SharedMachine>,
    display: D,
    dispenser: X,
}

impl<D: DisplayPort, X: DispensePort> Controller<D, X> {
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(
        config: MachineConfig,
        machine: Arc<SharedMachine>,
        display: D,
        dispenser: X,
        now: Instant,
    ) -> Self {
        let fsm = Fsm::new(build_state_table(), machine.current(), now);
        Self {
            fsm,
            ctx: FsmContext::new(config),
            machine,
            display,
            dispenser,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Render the initial state.
    pub fn start(&mut self, now: Instant, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx, now);
        self.apply_commands(sink);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
    }

    /// Run one poll.  Returns `true` if a pour outcome was consumed.
    pub fn poll(&mut self, now: Instant, sink: &mut impl EventSink) -> bool {
        // 1. Input
        let observed = self.machine.current();
        if observed != self.fsm.current_state() {
            self.enter(observed, now, sink);
        }

        // 2. Pour completion
        let outcome = self.machine.take_pour_outcome();
        if let Some(outcome) = outcome {
            sink.emit(&AppEvent::PourFinished(outcome));
            if self.fsm.current_state() == StateId::Dispensing {
                self.ctx.pour_outcome = Some(outcome);
            } else {
                warn!(
                    "Pour outcome {:?} arrived in {:?}, dropped",
                    outcome,
                    self.fsm.current_state()
                );
            }
        }

        // 3. Timeouts and pour results
        if let Some(next) = self.fsm.tick(&mut self.ctx, now) {
            let from = self.fsm.current_state();
            if self.machine.transition(from, next) {
                self.enter(next, now, sink);
            } else {
                debug!("{:?} -> {:?} superseded by input", from, next);
            }
        }

        outcome.is_some()
    }

    /// Poll until shutdown is requested.  A pour in progress is always
    /// allowed to finish first.
    pub fn run(&mut self, sink: &mut impl EventSink) {
        let interval = self.ctx.config.poll_interval();
        loop {
            if self.machine.shutdown_requested() && self.fsm.current_state() != StateId::Dispensing {
                break;
            }
            let pour_finished = self.poll(Instant::now(), sink);
            if !pour_finished {
                thread::sleep(interval);
            }
        }
        info!(
            "Poll loop stopped in {:?} after {} polls",
            self.fsm.current_state(),
            self.fsm.poll_count()
        );
    }

    /// Show the shutdown message for `hold`, blank the display and switch
    /// every pump off.
    pub fn shutdown(&mut self, hold: Duration) -> core::result::Result<(), PumpError> {
        if let Err(e) = self.display.show(SHUTDOWN_MESSAGE) {
            error!("Display: {}", e);
        }
        thread::sleep(hold);
        if let Err(e) = self.display.clear() {
            error!("Display: {}", e);
        }
        self.dispenser.all_off()
    }

    // ── Queries ───────────────────────────────────────────────

    /// State the controller last entered.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn dispenser(&self) -> &X {
        &self.dispenser
    }

    /// Give the display back, e.g. to release the bus.
    pub fn into_display(self) -> D {
        self.display
    }

    // ── Internal ──────────────────────────────────────────────

    fn enter(&mut self, next: StateId, now: Instant, sink: &mut impl EventSink) {
        let from = self.fsm.current_state();
        if next == StateId::Dispensing {
            self.ctx.pending_pour = self.machine.take_pending_pour();
        }
        self.fsm.transition(next, &mut self.ctx, now);
        sink.emit(&AppEvent::StateChanged { from, to: next });
        self.apply_commands(sink);
    }

    /// Carry out what the entered state asked for.
    fn apply_commands(&mut self, sink: &mut impl EventSink) {
        let commands = core::mem::take(&mut self.ctx.commands);

        if let Some(label) = commands.label {
            if let Err(e) = self.display.show(label) {
                error!("Display: {}", e);
            }
        }

        if let Some(drink) = commands.pour {
            sink.emit(&AppEvent::PourStarted(drink));
            self.dispenser.begin_pour(drink);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Wiring
// ───────────────────────────────────────────────────────────────

/// Run the machine on the given hardware until shutdown is requested.
///
/// Returns the display so the caller can release it.
pub fn run_machine<D, P>(
    config: &MachineConfig,
    machine: Arc<SharedMachine>,
    display: D,
    pumps: [P; INGREDIENT_COUNT],
) -> Result<D>
where
    D: DisplayPort,
    P: OutputPin + Send + 'static,
{
    let mut bank = PumpBank::new(pumps);
    // Relays may come up energised.
    bank.all_off()?;

    let dispenser = Dispenser::new(bank, config, ThreadLauncher, Arc::clone(&machine));
    let mut sink = LogEventSink::new();
    let mut controller = Controller::new(
        config.clone(),
        machine,
        display,
        dispenser,
        Instant::now(),
    );

    controller.start(Instant::now(), &mut sink);
    controller.run(&mut sink);
    controller.shutdown(config.shutdown_message())?;

    Ok(controller.into_display())
}
