//! Pour coordinator against mock pumps: timing, fail-fast and the
//! all-pumps-off guarantee.

use std::sync::Arc;
use std::time::{Duration, Instant};

use drinkmaker::app::shared::SharedMachine;
use drinkmaker::config::MachineConfig;
use drinkmaker::dispense::{PourOutcome, PourTiming, PumpAssignment, ThreadLauncher, plan};
use drinkmaker::recipes::{DRINKS, DrinkId, Ingredient};
use embedded_hal::digital::OutputPin;

use super::mock_hw::{FailingLauncher, all_low, dispenser, fast_config, mock_pumps, wait_until};

// ── Planning ──────────────────────────────────────────────────

#[test]
fn first_drink_plan_matches_calibration() {
    let timing = PourTiming::from_config(&MachineConfig::default());
    let assignments = plan(DrinkId::FIRST.recipe(), &timing);
    assert_eq!(
        assignments.as_slice(),
        &[
            PumpAssignment { pump: 0, duration: Duration::from_millis(30_000) },
            PumpAssignment { pump: 2, duration: Duration::from_millis(30_000) },
            PumpAssignment { pump: 3, duration: Duration::from_millis(15_000) },
            PumpAssignment { pump: 4, duration: Duration::from_millis(500) },
        ]
    );
}

#[test]
fn spare_pump_never_planned() {
    let timing = PourTiming::from_config(&MachineConfig::default());
    for recipe in &DRINKS {
        assert!(
            plan(recipe, &timing)
                .iter()
                .all(|a| a.pump != Ingredient::Spare.pump()),
            "{:?}",
            recipe.name
        );
    }
}

// ── Successful pours ──────────────────────────────────────────

#[test]
fn pour_takes_longest_ingredient_not_sum() {
    // Sunrise Splash at 2 ms/part: 240, 240, 120 and 4 ms.
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &fast_config(2.0), ThreadLauncher, &machine);

    let t0 = Instant::now();
    let report = d.pour(DrinkId::FIRST);
    let elapsed = t0.elapsed();

    assert_eq!(report.outcome, PourOutcome::Poured);
    assert!(elapsed >= Duration::from_millis(240), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "took the sum: {elapsed:?}");
    assert!(all_low(&probes));
}

#[test]
fn zero_quantity_pumps_untouched() {
    // ORANGE only uses the orange pump.
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &fast_config(0.1), ThreadLauncher, &machine);

    let report = d.pour(DrinkId::new(7).unwrap());
    assert_eq!(report.launched, 1);
    let rises: Vec<u32> = probes.iter().map(|p| p.rises()).collect();
    assert_eq!(rises, vec![0, 0, 1, 0, 0]);
}

#[test]
fn consecutive_pours_reuse_the_pumps() {
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &fast_config(0.1), ThreadLauncher, &machine);

    assert_eq!(d.pour(DrinkId::new(8).unwrap()).outcome, PourOutcome::Poured);
    assert_eq!(d.pour(DrinkId::new(8).unwrap()).outcome, PourOutcome::Poured);
    assert_eq!(probes[0].rises(), 2);
    assert!(all_low(&probes));
}

#[test]
fn sweep_switches_off_pumps_outside_the_recipe() {
    // Spare pump left energised, e.g. by a relay that came up HIGH.
    let (mut pins, probes) = mock_pumps(&[]);
    let spare = Ingredient::Spare.pump();
    pins[spare].set_high().unwrap();
    assert!(probes[spare].is_high());

    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &fast_config(0.1), ThreadLauncher, &machine);

    // ORANGE only runs the orange pump.
    let report = d.pour(DrinkId::new(7).unwrap());
    assert_eq!(report.outcome, PourOutcome::Poured);
    assert_eq!(report.launched, 1);
    assert!(!probes[spare].is_high());
    assert!(all_low(&probes));
}

// ── Failure paths ─────────────────────────────────────────────

#[test]
fn launch_failure_on_second_unit() {
    // Production timing: a pump left running would hold the pour for 30 s.
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let launcher = FailingLauncher::unit(1);
    let d = dispenser(pins, &MachineConfig::default(), launcher, &machine);

    let t0 = Instant::now();
    let report = d.pour(DrinkId::FIRST);

    assert_eq!(report.outcome, PourOutcome::Failed);
    assert_eq!(report.launched, 1);
    assert_eq!(report.not_started, 3);
    assert!(t0.elapsed() < Duration::from_secs(5), "running pump not stopped");
    assert!(all_low(&probes));
    // Nothing after the failure point was ever switched on.
    for pump in 2..5 {
        assert_eq!(probes[pump].rises(), 0, "pump {pump}");
    }
}

#[test]
fn launch_failure_on_first_unit_starts_nothing() {
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &MachineConfig::default(), FailingLauncher::unit(0), &machine);

    let report = d.pour(DrinkId::FIRST);
    assert_eq!(report.outcome, PourOutcome::Failed);
    assert_eq!(report.launched, 0);
    assert_eq!(report.not_started, 4);
    assert!(probes.iter().all(|p| p.rises() == 0));
}

#[test]
fn pump_fault_fails_pour_and_stops_the_rest() {
    // Soda water relay is broken; the others would run for 30 s.
    let (pins, probes) = mock_pumps(&[Ingredient::SodaWater.pump()]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &MachineConfig::default(), ThreadLauncher, &machine);

    let t0 = Instant::now();
    let report = d.pour(DrinkId::FIRST);
    assert_eq!(report.outcome, PourOutcome::Failed);
    assert!(t0.elapsed() < Duration::from_secs(5));
    assert!(all_low(&probes));
}

#[test]
fn coordinator_launch_failure_reports_failed() {
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let launcher = FailingLauncher::coordinator();
    let d = dispenser(pins, &MachineConfig::default(), launcher, &machine);

    d.begin_pour(DrinkId::FIRST);
    assert_eq!(machine.take_pour_outcome(), Some(PourOutcome::Failed));
    assert!(probes.iter().all(|p| p.rises() == 0));
    assert!(all_low(&probes));
}

// ── Terminal signal ───────────────────────────────────────────

#[test]
fn pumps_off_when_outcome_observed() {
    let (pins, probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let d = dispenser(pins, &fast_config(0.5), ThreadLauncher, &machine);

    d.begin_pour(DrinkId::new(3).unwrap());
    let mut outcome = None;
    wait_until(Duration::from_secs(5), || {
        outcome = machine.take_pour_outcome();
        outcome.is_some()
    });
    assert_eq!(outcome, Some(PourOutcome::Poured));
    assert!(all_low(&probes));
    // Delivered once.
    assert_eq!(machine.take_pour_outcome(), None);
}

#[test]
fn late_launch_failure_reaches_the_machine() {
    let (pins, _probes) = mock_pumps(&[]);
    let machine = Arc::new(SharedMachine::new());
    let launcher = FailingLauncher::unit(2);
    let d = dispenser(pins, &fast_config(0.1), launcher, &machine);

    d.begin_pour(DrinkId::FIRST);
    let mut outcome = None;
    wait_until(Duration::from_secs(5), || {
        outcome = machine.take_pour_outcome();
        outcome.is_some()
    });
    assert_eq!(outcome, Some(PourOutcome::Failed));
}
