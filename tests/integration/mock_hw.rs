//! Mock hardware for integration tests.
//!
//! Pumps use the crate's simulated pins (probed for level and switch-on
//! count); this module adds the pieces the simulator does not model: a
//! pin that refuses to switch on, a launcher that refuses to start
//! threads, and an event sink that records everything.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use drinkmaker::app::events::AppEvent;
use drinkmaker::app::ports::EventSink;
use drinkmaker::app::shared::SharedMachine;
use drinkmaker::config::MachineConfig;
use drinkmaker::dispense::{Dispenser, TaskLauncher, ThreadLauncher};
use drinkmaker::drivers::pump::PumpBank;
use drinkmaker::drivers::sim::{PinProbe, SimOutputPin};
use drinkmaker::pins::PUMP_GPIOS;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

// ── Pins ──────────────────────────────────────────────────────

/// Simulated pin that can be told to fail when switched on.
pub struct MockPin {
    inner: SimOutputPin,
    fail_high: bool,
}

#[derive(Debug)]
pub struct RelayFault;

impl embedded_hal::digital::Error for RelayFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for MockPin {
    type Error = RelayFault;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), RelayFault> {
        self.inner.set_low().map_err(|never| match never {})
    }

    fn set_high(&mut self) -> Result<(), RelayFault> {
        if self.fail_high {
            return Err(RelayFault);
        }
        self.inner.set_high().map_err(|never| match never {})
    }
}

/// Five pumps on the production GPIO numbers; `faulty` pumps fail to
/// switch on.
pub fn mock_pumps(faulty: &[usize]) -> ([MockPin; 5], Vec<PinProbe>) {
    let mut index = 0;
    let pins = PUMP_GPIOS.map(|gpio| {
        let pin = MockPin {
            inner: SimOutputPin::new(gpio),
            fail_high: faulty.contains(&index),
        };
        index += 1;
        pin
    });
    let probes = pins.iter().map(|p| p.inner.probe()).collect();
    (pins, probes)
}

pub fn all_low(probes: &[PinProbe]) -> bool {
    probes.iter().all(|p| !p.is_high())
}

// ── Launchers ─────────────────────────────────────────────────

/// Starts threads normally, except the `fail_at`-th scoped unit of each
/// pour (0-based) or, if `fail_coordinator` is set, every detached task.
pub struct FailingLauncher {
    fail_at: Option<usize>,
    fail_coordinator: bool,
    attempts: AtomicUsize,
}

impl FailingLauncher {
    pub fn unit(fail_at: usize) -> Self {
        Self {
            fail_at: Some(fail_at),
            fail_coordinator: false,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn coordinator() -> Self {
        Self {
            fail_at: None,
            fail_coordinator: true,
            attempts: AtomicUsize::new(0),
        }
    }
}

impl TaskLauncher for FailingLauncher {
    fn launch_scoped<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        task: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope,
    {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if Some(attempt) == self.fail_at {
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "thread limit"));
        }
        ThreadLauncher.launch_scoped(scope, name, task)
    }

    fn launch<F>(&self, name: String, task: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.fail_coordinator {
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "thread limit"));
        }
        ThreadLauncher.launch(name, task)
    }
}

// ── Config ────────────────────────────────────────────────────

/// Production constants with pumps sped up: one part runs for
/// `ms_per_part` milliseconds.
pub fn fast_config(ms_per_part: f64) -> MachineConfig {
    MachineConfig {
        time_per_ml_secs: ms_per_part / 1000.0,
        ..MachineConfig::default()
    }
}

pub fn dispenser<L: TaskLauncher>(
    pins: [MockPin; 5],
    config: &MachineConfig,
    launcher: L,
    machine: &Arc<SharedMachine>,
) -> Dispenser<MockPin, L> {
    Dispenser::new(PumpBank::new(pins), config, launcher, Arc::clone(machine))
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Waiting ───────────────────────────────────────────────────

/// Call `step` every few milliseconds until it returns `true`.
/// Panics after `limit`.
pub fn wait_until(limit: Duration, mut step: impl FnMut() -> bool) {
    let deadline = Instant::now() + limit;
    while !step() {
        assert!(Instant::now() < deadline, "condition not reached within {limit:?}");
        std::thread::sleep(Duration::from_millis(2));
    }
}
