//! GPIO / peripheral pin assignments for the dispenser board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Numbers are BCM GPIO numbers.

use crate::recipes::INGREDIENT_COUNT;

// ---------------------------------------------------------------------------
// Menu buttons (active-high, internal pull-down, rising edge = press)
// ---------------------------------------------------------------------------

pub const UP_BUTTON_GPIO: u8 = 17;
pub const DOWN_BUTTON_GPIO: u8 = 27;
pub const SELECT_BUTTON_GPIO: u8 = 22;

// ---------------------------------------------------------------------------
// Pump relays, indexed by ingredient slot
// ---------------------------------------------------------------------------

/// HIGH = pump running.
pub const PUMP_GPIOS: [u8; INGREDIENT_COUNT] = [5, 6, 13, 19, 26];

// ---------------------------------------------------------------------------
// 16x2 LCD behind a PCF8574 I²C backpack
// ---------------------------------------------------------------------------

pub const LCD_I2C_BUS: u8 = 1;
/// Use `i2cdetect -y 1` to confirm; some backpacks ship as 0x3F.
pub const LCD_I2C_ADDR: u8 = 0x27;
