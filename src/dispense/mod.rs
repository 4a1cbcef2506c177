//! Pour coordinator.
//!
//! A pour runs one unit of work per ingredient with a non-zero quantity,
//! all at once, so it lasts as long as the slowest pump:
//!
//! ```text
//!  pour(drink)
//!    │  plan: [(pump 0, 30s), (pump 2, 30s), (pump 3, 15s), (pump 4, 0.5s)]
//!    │
//!    ├──▶ pump-0  ████████████████████████████
//!    ├──▶ pump-2  ████████████████████████████
//!    ├──▶ pump-3  ██████████████
//!    └──▶ pump-4  █
//!    │
//!    │  join all ─▶ sweep every pump off ─▶ PourReport
//! ```
//!
//! ## Failure handling
//!
//! - A unit that cannot be started fails the pour.  Units not started yet
//!   are abandoned, running units are woken through the [`StopSignal`] and
//!   switch their pump off early.
//! - A unit whose pump reports an error, or that panics, fails the pour the
//!   same way.
//! - Once the pour has failed no further unit is started.
//!
//! Whatever happened, every pump in the bank (not just the ones the recipe
//! uses) is commanded off after all units have joined and before the
//! outcome is published.

pub mod launcher;
pub mod plan;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

pub use launcher::{TaskLauncher, ThreadLauncher};
pub use plan::{PourTiming, PumpAssignment, plan, pour_length};

use crate::app::ports::DispensePort;
use crate::app::shared::SharedMachine;
use crate::config::MachineConfig;
use crate::drivers::pump::{PumpActuator, PumpBank, RunOutcome, StopSignal};
use crate::error::PumpError;
use crate::recipes::DrinkId;

/// Terminal result of one pour, published once to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PourOutcome {
    Poured,
    Failed,
}

/// What happened during one pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PourReport {
    pub drink: DrinkId,
    pub outcome: PourOutcome,
    /// Units that were started.
    pub launched: usize,
    /// Units abandoned because the pour had already failed.
    pub not_started: usize,
    pub elapsed: Duration,
}

pub struct Dispenser<P, L = ThreadLauncher> {
    pumps: Arc<Mutex<PumpBank<P>>>,
    timing: PourTiming,
    launcher: Arc<L>,
    machine: Arc<SharedMachine>,
}

impl<P, L> Clone for Dispenser<P, L> {
    fn clone(&self) -> Self {
        Self {
            pumps: Arc::clone(&self.pumps),
            timing: self.timing,
            launcher: Arc::clone(&self.launcher),
            machine: Arc::clone(&self.machine),
        }
    }
}

impl<P, L> Dispenser<P, L>
where
    P: OutputPin + Send,
    L: TaskLauncher,
{
    pub fn new(
        pumps: PumpBank<P>,
        config: &MachineConfig,
        launcher: L,
        machine: Arc<SharedMachine>,
    ) -> Self {
        Self {
            pumps: Arc::new(Mutex::new(pumps)),
            timing: PourTiming::from_config(config),
            launcher: Arc::new(launcher),
            machine,
        }
    }

    /// Pour `drink` and block until every pump has stopped.
    pub fn pour(&self, drink: DrinkId) -> PourReport {
        let started = Instant::now();
        let assignments = plan(drink.recipe(), &self.timing);
        info!(
            "Pouring {} with {} pumps, ~{:?}",
            drink,
            assignments.len(),
            pour_length(&assignments)
        );

        let mut bank = self.pumps.lock().unwrap_or_else(PoisonError::into_inner);
        let stop = StopSignal::new();
        let failed = AtomicBool::new(false);

        let units: Vec<(&mut PumpActuator<P>, Duration)> = bank
            .iter_mut()
            .filter_map(|pump| {
                let index = pump.index();
                assignments
                    .iter()
                    .find(|a| a.pump == index)
                    .map(|a| (pump, a.duration))
            })
            .collect();

        let (launched, not_started) = {
            let stop = &stop;
            let failed = &failed;
            thread::scope(|scope| {
                let mut handles = Vec::with_capacity(units.len());
                let mut not_started = 0;

                for (pump, duration) in units {
                    if failed.load(Ordering::Acquire) {
                        debug!("Pour already failed, skipping pump {}", pump.index());
                        not_started += 1;
                        continue;
                    }
                    let index = pump.index();
                    let unit = move || run_unit(pump, duration, stop, failed);
                    match self.launcher.launch_scoped(scope, format!("pump-{index}"), unit) {
                        Ok(handle) => handles.push((index, handle)),
                        Err(e) => {
                            error!("Could not start pump {}: {}", index, e);
                            failed.store(true, Ordering::Release);
                            stop.trigger();
                            not_started += 1;
                        }
                    }
                }

                let launched = handles.len();
                for (index, handle) in handles {
                    if handle.join().is_err() {
                        error!("Pump {} unit panicked", index);
                        failed.store(true, Ordering::Release);
                    }
                }
                (launched, not_started)
            })
        };

        // Sweep every pump, used by this recipe or not.
        if let Err(e) = bank.all_off() {
            error!("Safety sweep: {}", e);
            failed.store(true, Ordering::Release);
        }
        drop(bank);

        let outcome = if failed.load(Ordering::Acquire) {
            PourOutcome::Failed
        } else {
            PourOutcome::Poured
        };
        let elapsed = started.elapsed();
        match outcome {
            PourOutcome::Poured => info!("Poured {} in {:?}", drink, elapsed),
            PourOutcome::Failed => warn!(
                "Pour of {} failed after {:?} ({} started, {} abandoned)",
                drink, elapsed, launched, not_started
            ),
        }

        PourReport {
            drink,
            outcome,
            launched,
            not_started,
            elapsed,
        }
    }

    /// Command every pump off, waiting for an in-flight pour to finish first.
    pub fn all_off(&self) -> Result<(), PumpError> {
        self.pumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .all_off()
    }
}

impl<P, L> Dispenser<P, L>
where
    P: OutputPin + Send + 'static,
    L: TaskLauncher + 'static,
{
    /// Pour `drink` on a coordinator thread and publish the outcome to the
    /// shared machine state when done.  Returns immediately.
    pub fn begin_pour(&self, drink: DrinkId) {
        let this = self.clone();
        let coordinator = move || {
            let report = this.pour(drink);
            this.machine.finish_pour(report.outcome);
        };
        if let Err(e) = self
            .launcher
            .launch(format!("pour-{}", drink.index()), coordinator)
        {
            error!("Could not start pour of {}: {}", drink, e);
            if let Err(e) = self.all_off() {
                error!("Safety sweep: {}", e);
            }
            self.machine.finish_pour(PourOutcome::Failed);
        }
    }
}

impl<P, L> DispensePort for Dispenser<P, L>
where
    P: OutputPin + Send + 'static,
    L: TaskLauncher + 'static,
{
    fn begin_pour(&mut self, drink: DrinkId) {
        Dispenser::begin_pour(self, drink);
    }

    fn all_off(&mut self) -> Result<(), PumpError> {
        Dispenser::all_off(self)
    }
}

fn run_unit<P: OutputPin>(
    pump: &mut PumpActuator<P>,
    duration: Duration,
    stop: &StopSignal,
    failed: &AtomicBool,
) {
    if failed.load(Ordering::Acquire) {
        debug!("Pour already failed, pump {} stays off", pump.index());
        return;
    }
    match pump.run(duration, stop) {
        Ok(RunOutcome::Completed) => {}
        Ok(RunOutcome::Stopped) => debug!("Pump {} stopped early", pump.index()),
        Err(e) => {
            error!("{}", e);
            failed.store(true, Ordering::Release);
            stop.trigger();
        }
    }
}
