//! EduBit board support library.
//!
//! Exposes the edge-terminal resource manager (registry, per-pin binding
//! state machine, shared PWM timer pool) plus the button and buzzer drivers
//! built on its contract. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; every other target
//! gets the in-memory simulation layer, so the full state machine runs
//! under host-side `cargo test`.

#![deny(unused_must_use)]

pub mod board;
pub mod drivers;
pub mod terminal;

mod error;
mod pins;

pub use board::Board;
pub use drivers::button::{Button, ButtonId};
pub use drivers::buzzer::{Buzzer, Sound};
pub use error::{Error, Result, TerminalOp};
pub use terminal::{
    CapabilityProfile, DUTY_MAX, PinMode, TIMER_COUNT, Terminal, TerminalRegistry, TimerId,
    TimerPool,
};
