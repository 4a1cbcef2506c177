//! Peripheral drivers: buttons, pumps, the LCD, and their simulated
//! stand-ins.

pub mod button;
pub mod lcd;
pub mod pump;
pub mod sim;
