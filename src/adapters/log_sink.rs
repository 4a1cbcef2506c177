//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events through the
//! `log` facade, so they end up wherever the installed logger sends them.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::dispense::PourOutcome;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PourStarted(drink) => {
                info!("POUR  | started {}", drink);
            }
            AppEvent::PourFinished(PourOutcome::Poured) => {
                info!("POUR  | finished");
            }
            AppEvent::PourFinished(PourOutcome::Failed) => {
                warn!("POUR  | failed");
            }
        }
    }
}
