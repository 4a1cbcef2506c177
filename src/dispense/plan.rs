//! Recipe → per-pump run durations.

use std::time::Duration;

use heapless::Vec;

use crate::config::MachineConfig;
use crate::recipes::{INGREDIENT_COUNT, Recipe};

/// Flow calibration used to turn parts into run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PourTiming {
    pub volume_per_part_ml: u32,
    pub time_per_ml_secs: f64,
}

impl PourTiming {
    pub fn from_config(config: &MachineConfig) -> Self {
        Self {
            volume_per_part_ml: config.volume_per_part_ml,
            time_per_ml_secs: config.time_per_ml_secs,
        }
    }

    /// Run time for `parts` of one ingredient, truncated to whole
    /// milliseconds.
    pub fn duration_for(&self, parts: u32) -> Duration {
        let ml = f64::from(parts) * f64::from(self.volume_per_part_ml);
        Duration::from_millis((ml * self.time_per_ml_secs * 1000.0) as u64)
    }
}

/// One pump and how long it runs for a single pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpAssignment {
    pub pump: usize,
    pub duration: Duration,
}

/// Assignments for every ingredient with a non-zero quantity, in pump
/// order.  Each pump index appears at most once.
pub fn plan(recipe: &Recipe, timing: &PourTiming) -> Vec<PumpAssignment, INGREDIENT_COUNT> {
    let mut assignments = Vec::new();
    for (pump, &parts) in recipe.parts.iter().enumerate() {
        if parts == 0 {
            continue;
        }
        // At most one entry per ingredient slot, so this cannot overflow.
        let _ = assignments.push(PumpAssignment {
            pump,
            duration: timing.duration_for(parts),
        });
    }
    assignments
}

/// Wall-clock length of a pour: the slowest pump, not the sum.
pub fn pour_length(assignments: &[PumpAssignment]) -> Duration {
    assignments
        .iter()
        .map(|a| a.duration)
        .max()
        .unwrap_or(Duration::ZERO)
}
