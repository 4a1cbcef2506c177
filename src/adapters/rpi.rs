//! Raspberry Pi hardware back-end (`rpi` feature).
//!
//! Claims the BCM pins listed in [`pins`](crate::pins) through rppal:
//! buttons as pulled-down inputs with rising-edge interrupts, pumps as
//! outputs starting LOW, and the LCD on I²C bus 1.  rppal's `hal` feature
//! provides the `embedded-hal` 1.0 impls the drivers are generic over.
//!
//! Dropping [`RpiHardware`] releases every pin.

use std::sync::Arc;

use log::info;
use rppal::gpio::{Event, Gpio, InputPin, OutputPin, Trigger};
use rppal::hal::Delay;
use rppal::i2c::I2c;

use crate::drivers::button::{Button, InputHandler};
use crate::drivers::lcd::Lcd1602;
use crate::error::InitError;
use crate::pins;
use crate::recipes::INGREDIENT_COUNT;

pub type RpiDisplay = Lcd1602<I2c, Delay>;

pub struct RpiHardware {
    pub display: RpiDisplay,
    pub pumps: [OutputPin; INGREDIENT_COUNT],
    /// Held so the interrupt callbacks stay registered.
    pub buttons: Vec<InputPin>,
}

/// Claim every pin and bring up the LCD.
pub fn init(input: &Arc<InputHandler>) -> Result<RpiHardware, InitError> {
    let gpio = Gpio::new().map_err(|_| InitError::Gpio(0))?;

    let mut buttons = Vec::with_capacity(Button::COUNT);
    for button in Button::ALL {
        let gpio_num = button.gpio();
        let mut pin = gpio
            .get(gpio_num)
            .map_err(|_| InitError::Gpio(gpio_num))?
            .into_input_pulldown();
        let input = Arc::clone(input);
        pin.set_async_interrupt(Trigger::RisingEdge, None, move |event: Event| {
            input.on_edge(button, true, event.timestamp.as_micros() as u64);
        })
        .map_err(|_| InitError::Gpio(gpio_num))?;
        buttons.push(pin);
    }

    let mut outputs = Vec::with_capacity(INGREDIENT_COUNT);
    for gpio_num in pins::PUMP_GPIOS {
        let pin = gpio
            .get(gpio_num)
            .map_err(|_| InitError::Gpio(gpio_num))?
            .into_output_low();
        outputs.push(pin);
    }
    let pumps: [OutputPin; INGREDIENT_COUNT] = outputs
        .try_into()
        .map_err(|_| InitError::Gpio(pins::PUMP_GPIOS[0]))?;

    let i2c = I2c::with_bus(pins::LCD_I2C_BUS).map_err(|_| InitError::Display)?;
    let display =
        Lcd1602::new(i2c, Delay::new(), pins::LCD_I2C_ADDR).map_err(|_| InitError::Display)?;

    info!(
        "GPIO ready: buttons {:?}, pumps {:?}",
        Button::ALL.map(Button::gpio),
        pins::PUMP_GPIOS
    );
    Ok(RpiHardware {
        display,
        pumps,
        buttons,
    })
}
