//! In-memory pins and display for host builds.
//!
//! ## Dual-target design
//!
//! With the `rpi` feature the machine drives rppal pins and the I²C LCD.
//! Without it, [`SimOutputPin`] and [`SimDisplay`] stand in for them: they
//! keep their state in memory and log every change, so the binary runs on
//! any host and tests can inspect what the hardware would have seen.

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, info};

use crate::app::ports::{self, DISPLAY_COLS, DISPLAY_ROWS, DisplayPort};
use crate::error::DisplayError;

// ═══════════════════════════════════════════════════════════════════════════
//  Output pin
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct PinLevel {
    high: AtomicBool,
    /// Low → high transitions since creation.
    rises: AtomicU32,
}

/// Read-only view of a [`SimOutputPin`], usable after the pin has been
/// moved into a pump.
#[derive(Debug, Clone)]
pub struct PinProbe(Arc<PinLevel>);

impl PinProbe {
    pub fn is_high(&self) -> bool {
        self.0.high.load(Ordering::Acquire)
    }

    pub fn rises(&self) -> u32 {
        self.0.rises.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SimOutputPin {
    gpio: u8,
    level: Arc<PinLevel>,
}

impl SimOutputPin {
    pub fn new(gpio: u8) -> Self {
        Self {
            gpio,
            level: Arc::new(PinLevel::default()),
        }
    }

    pub fn probe(&self) -> PinProbe {
        PinProbe(Arc::clone(&self.level))
    }
}

impl ErrorType for SimOutputPin {
    type Error = Infallible;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.high.store(false, Ordering::Release);
        debug!("GPIO {} -> LOW", self.gpio);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.level.high.swap(true, Ordering::AcqRel) {
            self.level.rises.fetch_add(1, Ordering::AcqRel);
        }
        debug!("GPIO {} -> HIGH", self.gpio);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Display
// ═══════════════════════════════════════════════════════════════════════════

const ROWS: usize = DISPLAY_ROWS as usize;
const COLS: usize = DISPLAY_COLS as usize;

/// A 16x2 character buffer.  Characters past the last column are dropped,
/// like on the panel.
#[derive(Debug)]
pub struct SimDisplay {
    cells: [[u8; COLS]; ROWS],
    row: usize,
    col: usize,
    last_shown: Option<String>,
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[b' '; COLS]; ROWS],
            row: 0,
            col: 0,
            last_shown: None,
        }
    }

    /// Both rows, trailing blanks trimmed.
    pub fn lines(&self) -> [String; 2] {
        self.cells
            .map(|row| String::from_utf8_lossy(&row).trim_end().to_owned())
    }

    /// Text of the most recent [`DisplayPort::show`].
    pub fn last_shown(&self) -> Option<&str> {
        self.last_shown.as_deref()
    }
}

impl DisplayPort for SimDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.cells = [[b' '; COLS]; ROWS];
        self.row = 0;
        self.col = 0;
        debug!("LCD clear");
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError> {
        ports::check_cursor(row, col)?;
        self.row = row as usize;
        self.col = col as usize;
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        if let Some(cell) = self.cells[self.row].get_mut(self.col) {
            *cell = byte;
        }
        self.col += 1;
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<(), DisplayError> {
        self.clear()?;
        ports::write_text(self, text)?;
        let [top, bottom] = self.lines();
        info!("LCD | {:<16} | {:<16} |", top, bottom);
        self.last_shown = Some(text.to_owned());
        Ok(())
    }
}
