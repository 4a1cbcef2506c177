//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a drinkmaker subsystem
//! against mock pumps and the simulated display.  All tests run on the
//! host with no real hardware required.

mod controller_tests;
mod dispense_tests;
mod mock_hw;
