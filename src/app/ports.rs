//! Port traits — the boundary between the controller and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! The display, the pour coordinator and the event sinks implement these
//! traits.  The [`Controller`](super::controller::Controller) consumes them
//! via generics, so the menu logic runs unchanged against the I²C LCD, the
//! simulated display, or a test double.

use crate::error::{DisplayError, PumpError};
use crate::recipes::DrinkId;

/// Character rows on the display.
pub const DISPLAY_ROWS: u8 = 2;
/// Character columns on the display.
pub const DISPLAY_COLS: u8 = 16;

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → LCD)
// ───────────────────────────────────────────────────────────────

/// A 16x2 character display.
pub trait DisplayPort {
    /// Blank the screen and home the cursor.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Move the cursor.  `row < DISPLAY_ROWS`, `col < DISPLAY_COLS`.
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError>;

    /// Draw one character at the cursor and advance it.
    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError>;

    /// Draw `text` from the cursor.  A `\n` moves to the start of the
    /// second row and is not drawn.  No wrapping or scrolling.
    fn write(&mut self, text: &str) -> Result<(), DisplayError> {
        write_text(self, text)
    }

    /// Replace the whole screen with `text`.
    fn show(&mut self, text: &str) -> Result<(), DisplayError> {
        self.clear()?;
        self.write(text)
    }
}

/// Default body of [`DisplayPort::write`], callable from overrides.
pub fn write_text<D: DisplayPort + ?Sized>(display: &mut D, text: &str) -> Result<(), DisplayError> {
    for byte in text.bytes() {
        if byte == b'\n' {
            display.set_cursor(1, 0)?;
        } else {
            display.write_byte(byte)?;
        }
    }
    Ok(())
}

/// Shared range check for [`DisplayPort::set_cursor`] implementations.
pub fn check_cursor(row: u8, col: u8) -> Result<(), DisplayError> {
    if row >= DISPLAY_ROWS || col >= DISPLAY_COLS {
        return Err(DisplayError::CursorOutOfRange { row, col });
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Dispense port (driven adapter: domain → pumps)
// ───────────────────────────────────────────────────────────────

/// Starts pours and stops pumps.
pub trait DispensePort {
    /// Start pouring `drink` in the background.  The outcome is delivered
    /// through the shared machine state, never through this call.
    fn begin_pour(&mut self, drink: DrinkId);

    /// Command every pump off.
    fn all_off(&mut self) -> Result<(), PumpError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
