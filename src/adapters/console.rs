//! Keyboard stand-in for the button panel.
//!
//! Reads stdin on a background thread.  Each key on a line is one press:
//!
//! | key | action        |
//! |-----|---------------|
//! | `u` | UP            |
//! | `d` | DOWN          |
//! | `s` | SELECT        |
//! | `q` | shut down     |
//!
//! Presses go through the same [`InputHandler`] as the GPIO interrupts,
//! stamped with the time since the console started, so typing `dd` on one
//! line is debounced into a single press just like contact bounce.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{info, warn};

use crate::app::shared::SharedMachine;
use crate::drivers::button::{Button, InputHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press(Button),
    Quit,
}

pub fn parse_key(key: char) -> Option<ConsoleCommand> {
    match key.to_ascii_lowercase() {
        'u' => Some(ConsoleCommand::Press(Button::Up)),
        'd' => Some(ConsoleCommand::Press(Button::Down)),
        's' => Some(ConsoleCommand::Press(Button::Select)),
        'q' => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

/// Apply every key in `line`.  Returns `false` once a quit was seen.
pub fn handle_line(line: &str, origin: Instant, input: &InputHandler, machine: &SharedMachine) -> bool {
    for key in line.chars().filter(|c| !c.is_whitespace()) {
        match parse_key(key) {
            Some(ConsoleCommand::Press(button)) => {
                let tick_us = origin.elapsed().as_micros() as u64;
                input.on_edge(button, true, tick_us);
            }
            Some(ConsoleCommand::Quit) => {
                machine.request_shutdown();
                return false;
            }
            None => warn!("Unknown key {:?} (u/d/s/q)", key),
        }
    }
    true
}

/// Start the stdin reader.  The thread is detached; it ends on `q` or EOF.
pub fn spawn(input: Arc<InputHandler>, machine: Arc<SharedMachine>) -> io::Result<()> {
    info!("Console buttons: u = UP, d = DOWN, s = SELECT, q = quit");
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let origin = Instant::now();
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if !handle_line(&line, origin, &input, &machine) {
                    return;
                }
            }
            // Stdin closed: nobody can press buttons any more.
            info!("Console closed, shutting down");
            machine.request_shutdown();
        })
        .map(drop)
}
