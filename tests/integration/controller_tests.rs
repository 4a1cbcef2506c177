//! Controller → Dispenser → pumps, with buttons fed through the debouncer
//! and the menu rendered on the simulated display.
//!
//! Menu timing uses synthetic instants so dwell timeouts are exact; pours
//! run on real threads with sped-up pumps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use drinkmaker::app::controller::Controller;
use drinkmaker::app::events::AppEvent;
use drinkmaker::app::shared::SharedMachine;
use drinkmaker::config::MachineConfig;
use drinkmaker::dispense::{Dispenser, PourOutcome, TaskLauncher, ThreadLauncher};
use drinkmaker::drivers::button::{Button, InputHandler};
use drinkmaker::drivers::sim::{PinProbe, SimDisplay};
use drinkmaker::fsm::StateId;
use drinkmaker::recipes::{DRINK_COUNT, DrinkId};

use super::mock_hw::{
    FailingLauncher, MockPin, RecordingSink, all_low, dispenser, fast_config, mock_pumps, wait_until,
};

struct Rig<L: TaskLauncher + 'static> {
    controller: Controller<SimDisplay, Dispenser<MockPin, L>>,
    machine: Arc<SharedMachine>,
    input: InputHandler,
    probes: Vec<PinProbe>,
    sink: RecordingSink,
    t0: Instant,
    /// Synthetic clock offset for the controller, in ms.
    now_ms: u64,
    /// Synthetic button timestamp, in µs.
    tick_us: u64,
}

impl<L: TaskLauncher + 'static> Rig<L> {
    fn new(config: MachineConfig, launcher: L) -> Self {
        let machine = Arc::new(SharedMachine::new());
        let (pins, probes) = mock_pumps(&[]);
        let d = dispenser(pins, &config, launcher, &machine);
        let input = InputHandler::new(config.debounce_us(), Arc::clone(&machine));
        let t0 = Instant::now();
        let mut controller = Controller::new(config, Arc::clone(&machine), SimDisplay::new(), d, t0);
        let mut sink = RecordingSink::default();
        controller.start(t0, &mut sink);
        Self {
            controller,
            machine,
            input,
            probes,
            sink,
            t0,
            now_ms: 0,
            tick_us: 0,
        }
    }

    /// Advance the synthetic clock by `ms` and poll once.
    fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        let now = self.t0 + Duration::from_millis(self.now_ms);
        self.controller.poll(now, &mut self.sink);
    }

    /// A clean press: well clear of the previous one.
    fn press(&mut self, button: Button) {
        self.tick_us += 1_000_000;
        self.input.on_edge(button, true, self.tick_us);
    }

    /// Poll every 100 synthetic ms (and a few real ms) until `state`.
    fn poll_until(&mut self, state: StateId) {
        wait_until(Duration::from_secs(10), || {
            self.advance(100);
            self.controller.state() == state
        });
    }

    fn lines(&self) -> [String; 2] {
        self.controller.display().lines()
    }

    fn to_menu(&mut self) {
        self.advance(3_000);
        assert_eq!(self.controller.state(), StateId::Drink(DrinkId::FIRST));
    }
}

// ── Scenario A: select drink 0, pour completes ────────────────

#[test]
fn first_drink_pours_to_finish() {
    let mut rig = Rig::new(fast_config(0.5), ThreadLauncher);
    rig.to_menu();
    assert_eq!(rig.lines(), ["Sunrise Splash", ""]);

    rig.press(Button::Select);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::Dispensing);
    assert_eq!(rig.lines(), ["Pouring...", "Please wait..."]);

    rig.poll_until(StateId::FinishDispensing);
    assert_eq!(rig.lines(), ["Finished pouring", "Enjoy your drink"]);
    assert!(all_low(&rig.probes));
    for (pump, expected) in [(0, 1), (1, 0), (2, 1), (3, 1), (4, 1)] {
        assert_eq!(rig.probes[pump].rises(), expected, "pump {pump}");
    }
    assert!(rig.sink.events.contains(&AppEvent::PourStarted(DrinkId::FIRST)));
    assert!(rig.sink.events.contains(&AppEvent::PourFinished(PourOutcome::Poured)));

    rig.advance(3_000);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::FIRST));
}

#[test]
fn buttons_inert_while_pouring() {
    let mut rig = Rig::new(fast_config(2.0), ThreadLauncher);
    rig.to_menu();
    rig.press(Button::Select);
    rig.advance(100);
    for button in Button::ALL {
        rig.press(button);
    }
    assert_eq!(rig.machine.current(), StateId::Dispensing);
    rig.poll_until(StateId::FinishDispensing);
    let pours = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::PourStarted(_)))
        .count();
    assert_eq!(pours, 1);
}

// ── Scenario B: second unit cannot start ──────────────────────

#[test]
fn launch_failure_shows_error_then_recovers() {
    let mut rig = Rig::new(MachineConfig::default(), FailingLauncher::unit(1));
    rig.to_menu();
    rig.press(Button::Select);
    rig.advance(100);

    rig.poll_until(StateId::Error);
    assert_eq!(rig.lines(), ["A critical error", "has occurred..."]);
    assert!(all_low(&rig.probes));
    for pump in [2, 3, 4] {
        assert_eq!(rig.probes[pump].rises(), 0, "pump {pump} started after the failure");
    }

    rig.advance(3_000);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::FIRST));
}

// ── Scenario C: Start times out to the first drink ────────────

#[test]
fn start_times_out_to_first_drink() {
    let mut rig = Rig::new(MachineConfig::default(), ThreadLauncher);
    assert_eq!(rig.lines(), ["Welcome!", "Please wait..."]);
    rig.advance(2_900);
    assert_eq!(rig.controller.state(), StateId::Start);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::FIRST));
}

// ── Scenario D: DOWN from the last drink ──────────────────────

#[test]
fn down_from_last_drink_reaches_thats_it_once() {
    let mut rig = Rig::new(MachineConfig::default(), ThreadLauncher);
    rig.to_menu();
    for _ in 0..DRINK_COUNT - 1 {
        rig.press(Button::Down);
    }
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::LAST));

    rig.press(Button::Down);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::ThatsIt);

    rig.press(Button::Down);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::ThatsIt);

    rig.advance(3_000);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::LAST));
}

// ── Debounce through the whole stack ──────────────────────────

#[test]
fn bounced_press_moves_one_drink() {
    let mut rig = Rig::new(MachineConfig::default(), ThreadLauncher);
    rig.to_menu();
    rig.input.on_edge(Button::Down, true, 10_000_000);
    rig.input.on_edge(Button::Down, false, 10_005_000);
    rig.input.on_edge(Button::Down, true, 10_010_000);
    rig.input.on_edge(Button::Down, true, 10_150_000);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::new(1).unwrap()));
    assert_eq!(rig.lines(), ["Tropical Fizz", ""]);
}

#[test]
fn up_at_first_drink_is_noop() {
    let mut rig = Rig::new(MachineConfig::default(), ThreadLauncher);
    rig.to_menu();
    rig.press(Button::Up);
    rig.advance(100);
    assert_eq!(rig.controller.state(), StateId::Drink(DrinkId::FIRST));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_leaves_display_blank_and_pumps_off() {
    let mut rig = Rig::new(MachineConfig::default(), ThreadLauncher);
    rig.machine.request_shutdown();
    rig.controller.run(&mut rig.sink);
    rig.controller.shutdown(Duration::ZERO).unwrap();
    assert_eq!(rig.lines(), ["", ""]);
    assert!(all_low(&rig.probes));
}
