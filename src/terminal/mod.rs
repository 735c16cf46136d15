//! Edge-terminal resource manager.
//!
//! The registry hands out exactly one shared handle per logical terminal
//! name; all consumers of "P0" — application code, buttons, anything —
//! mutate the same underlying [`PinBinding`], never shadow copies. Bindings
//! are created lazily on first lookup and live for the process lifetime.
//!
//! ESP-IDF runs `std` threads on a preemptive FreeRTOS kernel, so every
//! binding and the timer pool sit behind a mutex; handle operations lock,
//! run one synchronous transition, and return.

pub mod binding;
pub mod timer_pool;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

use crate::error::{Error, Result};
use crate::pins;

pub use binding::{CapabilityProfile, DUTY_MAX, PinBinding, PinMode};
pub use timer_pool::{TIMER_COUNT, TimerId, TimerPool};

/// Lock a mutex, recovering the data from a poisoned lock — a panicked
/// holder must not wedge every other consumer of the pin.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Terminal handle
// ---------------------------------------------------------------------------

/// Cheap, cloneable handle to one edge terminal.
///
/// Clones refer to the same [`PinBinding`]; mutations through one handle are
/// observed by every other handle for the same terminal name.
#[derive(Clone)]
pub struct Terminal {
    inner: Arc<Mutex<PinBinding>>,
}

impl Terminal {
    fn new(gpio: i32, profile: CapabilityProfile, pool: Arc<Mutex<TimerPool>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PinBinding::new(gpio, profile, pool))),
        }
    }

    /// Drive the terminal as a digital output at the given level.
    pub fn write_digital(&self, value: bool) -> Result<()> {
        lock(&self.inner).write_digital(value)
    }

    /// Sample the terminal as a digital input.
    pub fn read_digital(&self) -> Result<bool> {
        lock(&self.inner).read_digital()
    }

    /// Record the analog-out level (0..=1023); applied immediately when PWM
    /// is live, otherwise stored for the next activation.
    pub fn write_analog(&self, value: u16) -> Result<()> {
        lock(&self.inner).write_analog(value)
    }

    /// Bind the terminal to a PWM output at `hz`.
    pub fn set_analog_frequency(&self, hz: u32) -> Result<()> {
        lock(&self.inner).set_analog_frequency(hz)
    }

    /// Set the PWM period in milliseconds.
    pub fn set_analog_period_ms(&self, period: u32) -> Result<()> {
        lock(&self.inner).set_analog_period_ms(period)
    }

    /// Set the PWM period in microseconds.
    pub fn set_analog_period_us(&self, period: u32) -> Result<()> {
        lock(&self.inner).set_analog_period_us(period)
    }

    /// Read the terminal through the ADC; see [`PinBinding::read_analog`].
    pub fn read_analog(&self, millivolts: bool) -> Result<f32> {
        lock(&self.inner).read_analog(millivolts)
    }

    /// Tear down a live PWM output and return its timer slot. Idempotent.
    pub fn release_pwm(&self) -> Result<()> {
        lock(&self.inner).release_pwm()
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn gpio(&self) -> i32 {
        lock(&self.inner).gpio()
    }

    pub fn profile(&self) -> CapabilityProfile {
        lock(&self.inner).profile()
    }

    pub fn mode(&self) -> PinMode {
        lock(&self.inner).mode()
    }

    /// The persisted analog-out level, whatever the current mode.
    pub fn duty(&self) -> u16 {
        lock(&self.inner).duty()
    }

    pub fn pwm_active(&self) -> bool {
        lock(&self.inner).pwm_active()
    }

    pub fn adc_active(&self) -> bool {
        lock(&self.inner).adc_active()
    }

    /// Frequency of the live PWM output, if any.
    pub fn pwm_frequency(&self) -> Option<u32> {
        lock(&self.inner).pwm_frequency()
    }

    /// Duty currently applied to the live PWM output, if any.
    pub fn pwm_duty(&self) -> Option<u16> {
        lock(&self.inner).pwm_duty()
    }

    /// Timer slot held by the live PWM output, if any.
    pub fn held_timer(&self) -> Option<TimerId> {
        lock(&self.inner).held_timer()
    }

    /// Whether two handles refer to the same underlying binding.
    pub fn same_binding(&self, other: &Terminal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// embedded-hal interop: a terminal handle is usable anywhere a driver wants
// a plain digital pin. Mode switching happens underneath, as with the native
// write_digital/read_digital calls.

impl embedded_hal::digital::ErrorType for Terminal {
    type Error = Error;
}

impl embedded_hal::digital::OutputPin for Terminal {
    fn set_low(&mut self) -> Result<()> {
        self.write_digital(false)
    }

    fn set_high(&mut self) -> Result<()> {
        self.write_digital(true)
    }
}

impl embedded_hal::digital::InputPin for Terminal {
    fn is_high(&mut self) -> Result<bool> {
        self.read_digital()
    }

    fn is_low(&mut self) -> Result<bool> {
        self.read_digital().map(|level| !level)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Logical-name → handle registry with a one-handle-per-terminal cache.
///
/// Constructed once at startup (usually inside [`Board`](crate::Board)) and
/// shared by reference with every consumer; there is deliberately no global
/// instance.
pub struct TerminalRegistry {
    pool: Arc<Mutex<TimerPool>>,
    slots: Mutex<[Option<Terminal>; pins::TERMINAL_SLOTS]>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        info!(
            "terminal registry ready ({} terminals, {} pwm timers)",
            pins::TERMINALS.len(),
            TIMER_COUNT
        );
        Self {
            pool: Arc::new(Mutex::new(TimerPool::new())),
            slots: Mutex::new([const { None }; pins::TERMINAL_SLOTS]),
        }
    }

    /// Look up a terminal by logical name ("P0".."P16", "P19", "P20").
    ///
    /// The first call for a name constructs its binding; every call returns
    /// a handle to the same stored instance.
    pub fn terminal(&self, name: &str) -> Result<Terminal> {
        let spec = pins::lookup(name).ok_or(Error::InvalidTerminal)?;
        let mut slots = lock(&self.slots);
        let handle = match &slots[spec.index] {
            Some(existing) => existing.clone(),
            None => {
                let created = Terminal::new(spec.gpio, spec.profile, Arc::clone(&self.pool));
                slots[spec.index] = Some(created.clone());
                created
            }
        };
        Ok(handle)
    }

    /// The PWM timer pool shared by every terminal and the buzzer.
    pub fn timer_pool(&self) -> Arc<Mutex<TimerPool>> {
        Arc::clone(&self.pool)
    }
}

impl Default for TerminalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_are_rejected() {
        let reg = TerminalRegistry::new();
        assert!(matches!(reg.terminal("P17"), Err(Error::InvalidTerminal)));
        assert!(matches!(reg.terminal("Q0"), Err(Error::InvalidTerminal)));
        assert!(matches!(reg.terminal(""), Err(Error::InvalidTerminal)));
    }

    #[test]
    fn lookup_is_identity_stable() {
        let reg = TerminalRegistry::new();
        let a = reg.terminal("P13").unwrap();
        let b = reg.terminal("P13").unwrap();
        assert!(a.same_binding(&b));
        // Distinct terminals get distinct bindings.
        let c = reg.terminal("P14").unwrap();
        assert!(!a.same_binding(&c));
    }

    #[test]
    fn handles_serve_as_embedded_hal_pins() {
        use embedded_hal::digital::{InputPin, OutputPin};

        let reg = TerminalRegistry::new();
        let mut p14 = reg.terminal("P14").unwrap();
        p14.set_high().unwrap();
        assert_eq!(p14.mode(), PinMode::Digital);
        // Trait-side reads rebind to input exactly like read_digital.
        let _ = p14.is_low().unwrap();
        assert_eq!(p14.mode(), PinMode::Digital);
    }

    #[test]
    fn profiles_come_from_the_board_map() {
        let reg = TerminalRegistry::new();
        assert_eq!(
            reg.terminal("P0").unwrap().profile(),
            CapabilityProfile::Hybrid
        );
        assert_eq!(
            reg.terminal("P7").unwrap().profile(),
            CapabilityProfile::DigitalOnly
        );
    }
}
