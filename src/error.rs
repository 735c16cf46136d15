//! Unified error types for the EduBit board layer.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! application-facing surface uniform. All variants are `Copy` so they can be
//! passed through ISR-adjacent code without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Terminal operations (names the call that was rejected)
// ---------------------------------------------------------------------------

/// The operation a caller invoked on a terminal handle. Carried inside
/// [`Error::Unsupported`] so logs name the rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOp {
    WriteDigital,
    ReadDigital,
    WriteAnalog,
    SetAnalogFrequency,
    ReadAnalog,
}

impl fmt::Display for TerminalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteDigital => write!(f, "write_digital"),
            Self::ReadDigital => write!(f, "read_digital"),
            Self::WriteAnalog => write!(f, "write_analog"),
            Self::SetAnalogFrequency => write!(f, "set_analog_frequency"),
            Self::ReadAnalog => write!(f, "read_analog"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level board error
// ---------------------------------------------------------------------------

/// Every fallible operation in the board layer funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The logical terminal name is not part of the board's pin map.
    InvalidTerminal,
    /// The pin's capability profile does not include the invoked operation.
    Unsupported(TerminalOp),
    /// All PWM timer slots are held; nothing can be allocated until a holder
    /// releases. Never retried internally.
    ResourceExhausted,
    /// Requested PWM frequency or period resolves to 0 Hz.
    InvalidFrequency,
    /// Note name outside "C3".."G9" or note number outside 48..=127.
    InvalidNote,
    /// An ESP-IDF call failed; carries the `esp_err_t` return code.
    Hardware(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTerminal => write!(f, "terminal must be 'P0'-'P16','P19','P20'"),
            Self::Unsupported(op) => write!(f, "{op} not supported on this terminal"),
            Self::ResourceExhausted => write!(f, "PWM timer pool depleted"),
            Self::InvalidFrequency => write!(f, "frequency must be more than 0 Hz"),
            Self::InvalidNote => write!(f, "note must be 'C3'-'G9' or number 48-127"),
            Self::Hardware(rc) => write!(f, "hardware call failed (rc={rc})"),
        }
    }
}

impl core::error::Error for Error {}

/// Terminal operations never map cleanly onto the embedded-hal error
/// taxonomy; everything surfaces as `Other` with the typed detail intact.
impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Board-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
