//! Unified error types for the dispenser.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! startup path and the pour aggregation uniform.  Variants are `Copy` so
//! they can be passed across pump threads without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The recipe table violates a startup invariant.
    Recipe(RecipeError),
    /// A pump output could not be driven.
    Pump(PumpError),
    /// The character display rejected a command.
    Display(DisplayError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral or process initialisation failed.
    Init(InitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe(e) => write!(f, "recipe: {e}"),
            Self::Pump(e) => write!(f, "pump: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Recipe errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeError {
    /// The drink would overflow the glass.
    ExceedsGlass {
        name: &'static str,
        total_parts: u32,
        volume_ml: u32,
        glass_ml: u32,
    },
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsGlass {
                name,
                total_parts,
                volume_ml,
                glass_ml,
            } => write!(
                f,
                "drink {:?} has {} parts totalling {} ml, more than the {} ml glass",
                name, total_parts, volume_ml, glass_ml
            ),
        }
    }
}

impl std::error::Error for RecipeError {}

impl From<RecipeError> for Error {
    fn from(e: RecipeError) -> Self {
        Self::Recipe(e)
    }
}

// ---------------------------------------------------------------------------
// Pump errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpError {
    /// Driving the output active failed; the pump never started.
    SwitchOnFailed { pump: usize },
    /// Driving the output inactive failed; the pump may still be running.
    SwitchOffFailed { pump: usize },
}

impl fmt::Display for PumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchOnFailed { pump } => write!(f, "pump {pump} failed to switch on"),
            Self::SwitchOffFailed { pump } => write!(f, "pump {pump} failed to switch off"),
        }
    }
}

impl std::error::Error for PumpError {}

impl From<PumpError> for Error {
    fn from(e: PumpError) -> Self {
        Self::Pump(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// Cursor position outside the 2x16 panel.
    CursorOutOfRange { row: u8, col: u8 },
    /// The I2C write to the backpack failed.
    BusWriteFailed,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CursorOutOfRange { row, col } => {
                write!(f, "cursor ({row}, {col}) outside the panel")
            }
            Self::BusWriteFailed => write!(f, "I2C write failed"),
        }
    }
}

impl std::error::Error for DisplayError {}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    Unreadable,
    /// The config file is not valid JSON for [`MachineConfig`](crate::config::MachineConfig).
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "config file unreadable"),
            Self::Malformed => write!(f, "config file malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The error log file could not be opened for appending.
    LogFile,
    /// A logger was already installed.
    Logger,
    /// GPIO controller or a pin could not be claimed.
    Gpio(u8),
    /// The I2C bus or the LCD backpack did not respond.
    Display,
    /// The shutdown signal handler could not be installed.
    SignalHandler,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogFile => write!(f, "failed to open error log"),
            Self::Logger => write!(f, "logger already installed"),
            Self::Gpio(pin) => write!(f, "failed to claim GPIO {pin}"),
            Self::Display => write!(f, "LCD init failed, check that I2C is enabled and the panel is connected"),
            Self::SignalHandler => write!(f, "failed to install signal handler"),
        }
    }
}

impl std::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
