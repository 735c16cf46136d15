//! Per-pin peripheral binding state machine.
//!
//! One `PinBinding` exists per physical terminal. Digital I/O, PWM
//! analog-out, and ADC analog-in all target the same pin, so every operation
//! first tears down whichever rival peripheral is live before binding its
//! own — no central scheduler, no cross-pin coordination. The requested
//! analog-out `duty` survives every transition (including full PWM teardown)
//! so "configure then activate" works in either order.
//!
//! ## State machine
//!
//! | Operation              | From `Pwm`              | From `Adc`      | New mode  |
//! |------------------------|-------------------------|-----------------|-----------|
//! | `write_digital`        | release timer + PWM     | drop ADC        | `Digital` |
//! | `read_digital`         | release timer + PWM     | drop ADC        | `Digital` |
//! | `write_analog`         | retune duty in place    | store duty only | unchanged |
//! | `set_analog_frequency` | retune freq in place    | drop ADC        | `Pwm`     |
//! | `read_analog`          | release timer + PWM     | reuse ADC       | `Adc`     |
//! | `release_pwm`          | release timer + PWM     | no-op           | `Unbound` |

use std::sync::{Arc, Mutex};

use log::debug;

use super::lock;
use super::timer_pool::{TimerId, TimerPool};
use crate::drivers::hw_adc::AdcChannel;
use crate::drivers::hw_gpio;
use crate::drivers::hw_pwm::PwmChannel;
use crate::error::{Error, Result, TerminalOp};

/// Largest analog-out level (10-bit LEDC duty).
pub const DUTY_MAX: u16 = 1023;

/// Raw-sample band inside which the calibrated ADC reading is trusted.
/// Outside it the uncalibrated raw sample is returned unscaled, silently.
const CALIB_RAW_MIN: u16 = 150;
const CALIB_RAW_MAX: u16 = 2450;

/// Full-scale calibrated reading in millivolts (11 dB attenuation).
const CALIB_FULL_SCALE_MV: f32 = 3300.0;
/// Full-scale raw sample (12-bit ADC).
const RAW_FULL_SCALE: f32 = 4095.0;

// ---------------------------------------------------------------------------
// Capability classification
// ---------------------------------------------------------------------------

/// What a physical pin can do. Fixed at construction from the board map;
/// checked on every call so only the pin's real capabilities are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityProfile {
    /// Digital read/write only.
    DigitalOnly,
    /// Analog (ADC) read only — no output driver on the pin.
    AnalogInOnly,
    /// Digital read/write, PWM analog-out, and ADC analog-in, mutually
    /// exclusive.
    Hybrid,
}

impl CapabilityProfile {
    pub const fn supports_digital(self) -> bool {
        matches!(self, Self::DigitalOnly | Self::Hybrid)
    }

    pub const fn supports_pwm(self) -> bool {
        matches!(self, Self::Hybrid)
    }

    pub const fn supports_adc(self) -> bool {
        matches!(self, Self::AnalogInOnly | Self::Hybrid)
    }
}

// ---------------------------------------------------------------------------
// Binding state
// ---------------------------------------------------------------------------

/// Which peripheral currently owns the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Unbound,
    Digital,
    Pwm,
    Adc,
}

/// State machine for one physical terminal.
///
/// Owned by the registry behind a mutex; all callers of the same logical
/// terminal mutate this one instance.
pub struct PinBinding {
    gpio: i32,
    profile: CapabilityProfile,
    mode: PinMode,
    /// Last analog-out level requested; persists across every transition.
    duty: u16,
    /// Live PWM output. Present iff `mode == Pwm`; owns its timer slot.
    pwm: Option<PwmChannel>,
    /// Live ADC input. Present iff `mode == Adc`.
    adc: Option<AdcChannel>,
    pool: Arc<Mutex<TimerPool>>,
}

impl PinBinding {
    pub(crate) fn new(gpio: i32, profile: CapabilityProfile, pool: Arc<Mutex<TimerPool>>) -> Self {
        Self {
            gpio,
            profile,
            mode: PinMode::Unbound,
            duty: 0,
            pwm: None,
            adc: None,
            pool,
        }
    }

    // ── Digital I/O ───────────────────────────────────────────

    /// Drive the pin as a digital output at the given level.
    pub fn write_digital(&mut self, value: bool) -> Result<()> {
        if !self.profile.supports_digital() {
            return Err(Error::Unsupported(TerminalOp::WriteDigital));
        }
        self.teardown_adc();
        self.release_pwm()?;
        hw_gpio::configure_output(self.gpio)?;
        hw_gpio::write(self.gpio, value);
        self.mode = PinMode::Digital;
        Ok(())
    }

    /// Sample the pin as a digital input.
    pub fn read_digital(&mut self) -> Result<bool> {
        if !self.profile.supports_digital() {
            return Err(Error::Unsupported(TerminalOp::ReadDigital));
        }
        self.teardown_adc();
        self.release_pwm()?;
        hw_gpio::configure_input(self.gpio)?;
        self.mode = PinMode::Digital;
        Ok(hw_gpio::read(self.gpio))
    }

    // ── PWM analog-out ────────────────────────────────────────

    /// Record the analog-out level (0..=1023, clamped).
    ///
    /// Always persisted; only applied to hardware immediately when PWM is
    /// already live. A later `set_analog_frequency` picks it up otherwise.
    pub fn write_analog(&mut self, value: u16) -> Result<()> {
        if !self.profile.supports_pwm() {
            return Err(Error::Unsupported(TerminalOp::WriteAnalog));
        }
        let value = value.min(DUTY_MAX);
        self.duty = value;
        if let Some(pwm) = self.pwm.as_mut() {
            pwm.set_duty(value)?;
        }
        Ok(())
    }

    /// Bind the pin to a PWM output at `hz`, creating the output on first
    /// use (with the persisted duty) or retuning the live one in place.
    ///
    /// First activation draws a slot from the shared timer pool;
    /// [`Error::ResourceExhausted`] propagates to the caller unchanged.
    pub fn set_analog_frequency(&mut self, hz: u32) -> Result<()> {
        if !self.profile.supports_pwm() {
            return Err(Error::Unsupported(TerminalOp::SetAnalogFrequency));
        }
        if hz == 0 {
            return Err(Error::InvalidFrequency);
        }
        self.teardown_adc();
        if let Some(pwm) = self.pwm.as_mut() {
            // Live output: retune only, the held timer slot is kept.
            pwm.set_frequency(hz)?;
        } else {
            let timer = lock(&self.pool).acquire()?;
            match PwmChannel::new(self.gpio, timer, hz, self.duty) {
                Ok(pwm) => self.pwm = Some(pwm),
                Err(e) => {
                    // The slot must not leak when channel setup fails.
                    lock(&self.pool).release(timer);
                    return Err(e);
                }
            }
            debug!("gpio{}: pwm bound at {hz} Hz on {timer}", self.gpio);
        }
        self.mode = PinMode::Pwm;
        Ok(())
    }

    /// Set the PWM period in milliseconds (frequency = 1000 / period).
    pub fn set_analog_period_ms(&mut self, period: u32) -> Result<()> {
        if period == 0 {
            return Err(Error::InvalidFrequency);
        }
        self.set_analog_frequency(1000 / period)
    }

    /// Set the PWM period in microseconds (frequency = 1_000_000 / period).
    pub fn set_analog_period_us(&mut self, period: u32) -> Result<()> {
        if period == 0 {
            return Err(Error::InvalidFrequency);
        }
        self.set_analog_frequency(1_000_000 / period)
    }

    /// Tear down the PWM output, return its timer slot to the pool, and
    /// reset the pin to a plain output. Idempotent; the persisted duty is
    /// NOT cleared.
    pub fn release_pwm(&mut self) -> Result<()> {
        if let Some(pwm) = self.pwm.take() {
            let timer = pwm.deinit();
            lock(&self.pool).release(timer);
            hw_gpio::configure_output(self.gpio)?;
            self.mode = PinMode::Unbound;
        }
        Ok(())
    }

    // ── ADC analog-in ─────────────────────────────────────────

    /// Read the pin through the ADC, creating the channel (fixed 11 dB
    /// attenuation) on first use.
    ///
    /// With `millivolts` the calibrated reading is returned directly.
    /// Otherwise the raw sample is read alongside the calibrated one: inside
    /// the trusted band the calibrated value is rescaled to the raw 0–4095
    /// range; outside it the raw sample is returned as-is.
    pub fn read_analog(&mut self, millivolts: bool) -> Result<f32> {
        if !self.profile.supports_adc() {
            return Err(Error::Unsupported(TerminalOp::ReadAnalog));
        }
        self.teardown_pwm();
        if self.adc.is_none() {
            self.adc = Some(AdcChannel::new(self.gpio)?);
            debug!("gpio{}: adc bound", self.gpio);
        }
        self.mode = PinMode::Adc;
        let adc = self.adc.as_ref().expect("ADC channel bound above");

        if millivolts {
            return Ok(f32::from(adc.read_millivolts()?));
        }
        let raw = adc.read_raw()?;
        let calib = adc.read_millivolts()?;
        if (CALIB_RAW_MIN..=CALIB_RAW_MAX).contains(&raw) {
            Ok(f32::from(calib) / CALIB_FULL_SCALE_MV * RAW_FULL_SCALE)
        } else {
            Ok(f32::from(raw))
        }
    }

    // ── Teardown helpers ──────────────────────────────────────

    /// Drop the live ADC channel, if any.
    fn teardown_adc(&mut self) {
        if let Some(adc) = self.adc.take() {
            adc.deinit();
            if self.mode == PinMode::Adc {
                self.mode = PinMode::Unbound;
            }
        }
    }

    /// Drop the live PWM output and return its timer slot, without touching
    /// the pin's GPIO configuration (the caller binds its own peripheral
    /// next).
    fn teardown_pwm(&mut self) {
        if let Some(pwm) = self.pwm.take() {
            let timer = pwm.deinit();
            lock(&self.pool).release(timer);
            if self.mode == PinMode::Pwm {
                self.mode = PinMode::Unbound;
            }
        }
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.profile
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// The persisted analog-out level, whatever the current mode.
    pub fn duty(&self) -> u16 {
        self.duty
    }

    pub fn pwm_active(&self) -> bool {
        self.pwm.is_some()
    }

    pub fn adc_active(&self) -> bool {
        self.adc.is_some()
    }

    /// Frequency of the live PWM output, if any.
    pub fn pwm_frequency(&self) -> Option<u32> {
        self.pwm.as_ref().map(PwmChannel::frequency)
    }

    /// Duty currently applied to the live PWM output, if any.
    pub fn pwm_duty(&self) -> Option<u16> {
        self.pwm.as_ref().map(PwmChannel::duty)
    }

    /// Timer slot held by the live PWM output, if any.
    pub fn held_timer(&self) -> Option<TimerId> {
        self.pwm.as_ref().map(PwmChannel::timer)
    }
}
