//! The assembled board: registry, buttons, buzzer.
//!
//! One `Board` is built at startup and shared with every consumer — the
//! process-wide replacement for the original firmware's module-level
//! singletons. Terminal handles cloned out of it all point at the same
//! per-pin state, and the buzzer draws from the same timer pool as the
//! terminals.

use std::sync::Arc;

use crate::drivers::button::{Button, ButtonId};
use crate::drivers::buzzer::Buzzer;
use crate::error::Result;
use crate::terminal::{Terminal, TerminalRegistry};

pub struct Board {
    registry: Arc<TerminalRegistry>,
    button_a: Button,
    button_b: Button,
    buzzer: Buzzer,
}

impl Board {
    /// Build the registry, bind both buttons, and prepare the buzzer.
    pub fn new() -> Result<Self> {
        let registry = Arc::new(TerminalRegistry::new());
        let button_a = Button::new(ButtonId::A, &registry)?;
        let button_b = Button::new(ButtonId::B, &registry)?;
        let buzzer = Buzzer::new(registry.timer_pool());
        Ok(Self {
            registry,
            button_a,
            button_b,
            buzzer,
        })
    }

    /// Shared handle to an edge terminal by logical name.
    pub fn terminal(&self, name: &str) -> Result<Terminal> {
        self.registry.terminal(name)
    }

    pub fn registry(&self) -> &Arc<TerminalRegistry> {
        &self.registry
    }

    pub fn button_a(&self) -> &Button {
        &self.button_a
    }

    pub fn button_b(&self) -> &Button {
        &self.button_b
    }

    pub fn buzzer(&mut self) -> &mut Buzzer {
        &mut self.buzzer
    }
}
