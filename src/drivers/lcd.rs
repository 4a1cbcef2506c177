//! HD44780 16x2 character LCD behind a PCF8574 I²C backpack.
//!
//! ## Wiring
//!
//! The backpack maps its eight outputs onto the panel as
//! `D7 D6 D5 D4 BL EN RW RS`, so every byte on the bus carries one nibble
//! of panel data in the upper half plus the control lines in the lower
//! half.  The panel runs in 4-bit mode: each command or character is two
//! nibbles, each latched by pulsing EN.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::i2c::I2c` and `embedded_hal::delay::DelayNs`:
//! on the Pi these are rppal's I²C bus and delay, in tests a recording bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::app::ports::{self, DisplayPort};
use crate::error::DisplayError;

const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0x04;
const REGISTER_SELECT: u8 = 0x01;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

// Commands
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_8BIT: u8 = 0x30;
const CMD_FUNCTION_4BIT: u8 = 0x20;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// Clear takes ~1.5 ms on the panel.
const CLEAR_DELAY_US: u32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Command,
    Data,
}

pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Lcd1602<I2C, D> {
    /// Bring the panel up in 4-bit, two-line mode with the display on, the
    /// cursor hidden and the screen cleared.
    pub fn new(i2c: I2C, delay: D, address: u8) -> Result<Self, DisplayError> {
        let mut lcd = Self {
            i2c,
            delay,
            address,
        };
        lcd.init()?;
        info!("LCD ready at I2C address {:#04x}", address);
        Ok(lcd)
    }

    /// Hand the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        // Power-on wait (>40 ms after Vcc rises).
        self.delay.delay_ms(50);

        // Reset by instruction: three 8-bit function sets, then 4-bit.
        self.write_nibble(CMD_FUNCTION_8BIT, Mode::Command)?;
        self.delay.delay_us(4_500);
        self.write_nibble(CMD_FUNCTION_8BIT, Mode::Command)?;
        self.delay.delay_us(4_500);
        self.write_nibble(CMD_FUNCTION_8BIT, Mode::Command)?;
        self.delay.delay_us(150);
        self.write_nibble(CMD_FUNCTION_4BIT, Mode::Command)?;

        self.write_byte_mode(CMD_FUNCTION_4BIT_2LINE, Mode::Command)?;
        self.write_byte_mode(CMD_DISPLAY_ON, Mode::Command)?;
        self.clear()?;
        self.write_byte_mode(CMD_ENTRY_INCREMENT, Mode::Command)
    }

    /// Latch the upper four bits of `nibble`.
    fn write_nibble(&mut self, nibble: u8, mode: Mode) -> Result<(), DisplayError> {
        let rs = if mode == Mode::Data { REGISTER_SELECT } else { 0 };
        let data = (nibble & 0xF0) | BACKLIGHT | rs;

        self.i2c
            .write(self.address, &[data | ENABLE])
            .map_err(|_| DisplayError::BusWriteFailed)?;
        self.delay.delay_us(1);
        self.i2c
            .write(self.address, &[data & !ENABLE])
            .map_err(|_| DisplayError::BusWriteFailed)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn write_byte_mode(&mut self, byte: u8, mode: Mode) -> Result<(), DisplayError> {
        self.write_nibble(byte & 0xF0, mode)?;
        self.write_nibble(byte << 4, mode)
    }
}

impl<I2C: I2c, D: DelayNs> DisplayPort for Lcd1602<I2C, D> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        debug!("Clearing LCD");
        self.write_byte_mode(CMD_CLEAR, Mode::Command)?;
        self.delay.delay_us(CLEAR_DELAY_US);
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError> {
        ports::check_cursor(row, col)?;
        self.write_byte_mode(CMD_SET_DDRAM | (ROW_OFFSETS[row as usize] + col), Mode::Command)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.write_byte_mode(byte, Mode::Data)
    }

    fn write(&mut self, text: &str) -> Result<(), DisplayError> {
        debug!("Writing to LCD: {:?}", text);
        ports::write_text(self, text)
    }
}
