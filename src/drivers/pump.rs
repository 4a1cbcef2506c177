//! Pump relay driver.
//!
//! Each pump is a relay on one digital output: HIGH runs the pump, LOW
//! stops it.  A [`PumpActuator`] owns its pin exclusively; during a pour
//! exactly one thread holds `&mut` to it.
//!
//! ## Safety contract
//!
//! [`PumpActuator::run`] drives the output LOW on every exit path, and
//! [`PumpActuator::force_off`] may be called at any time, any number of
//! times.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: the Raspberry Pi
//! back-end passes rppal pins, the simulator and tests pass in-memory pins.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::PumpError;
use crate::recipes::INGREDIENT_COUNT;

/// How a timed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ran for the full duration.
    Completed,
    /// Cut short by the pour's [`StopSignal`].
    Stopped,
}

/// One-way "stop now" flag that sleeping pump runs wake up on.
pub struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Wake every run waiting on this signal.  Cannot be undone.
    pub fn trigger(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_all();
    }

    /// Sleep for `timeout` or until triggered.  Returns `true` if triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

pub struct PumpActuator<P> {
    index: usize,
    pin: P,
}

impl<P: OutputPin> PumpActuator<P> {
    pub fn new(index: usize, pin: P) -> Self {
        Self { index, pin }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Run the pump for `duration`, or until `stop` fires.
    ///
    /// The output is driven LOW afterwards however the wait ended, including
    /// when switching on failed.
    pub fn run(&mut self, duration: Duration, stop: &StopSignal) -> Result<RunOutcome, PumpError> {
        if self.pin.set_high().is_err() {
            self.force_off()?;
            return Err(PumpError::SwitchOnFailed { pump: self.index });
        }
        debug!("Turning on pump {} for {:?}", self.index, duration);

        let stopped = stop.wait_timeout(duration);

        self.force_off()?;
        Ok(if stopped {
            RunOutcome::Stopped
        } else {
            RunOutcome::Completed
        })
    }

    /// Drive the output LOW.  Idempotent.
    pub fn force_off(&mut self) -> Result<(), PumpError> {
        self.pin
            .set_low()
            .map_err(|_| PumpError::SwitchOffFailed { pump: self.index })?;
        debug!("Turning off pump {}", self.index);
        Ok(())
    }
}

/// Every pump on the machine, indexed by ingredient slot.
pub struct PumpBank<P> {
    pumps: [PumpActuator<P>; INGREDIENT_COUNT],
}

impl<P: OutputPin> PumpBank<P> {
    pub fn new(pins: [P; INGREDIENT_COUNT]) -> Self {
        let mut index = 0;
        let pumps = pins.map(|pin| {
            let pump = PumpActuator::new(index, pin);
            index += 1;
            pump
        });
        Self { pumps }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PumpActuator<P>> {
        self.pumps.iter_mut()
    }

    /// Command every pump off.  Every pump is attempted even if one fails;
    /// the first failure is returned.
    pub fn all_off(&mut self) -> Result<(), PumpError> {
        let mut first_err = None;
        for pump in &mut self.pumps {
            if let Err(e) = pump.force_off() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
