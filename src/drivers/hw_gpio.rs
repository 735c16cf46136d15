//! Raw GPIO configuration and level access.
//!
//! Terminals rebind their pin direction on every digital call (the binding
//! state machine decides when), so these are thin one-shot helpers rather
//! than owning pin drivers.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: raw `gpio_config` / `gpio_set_level` / `gpio_get_level`.
//! On host/test: a per-GPIO level array with injection hooks.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
#[cfg(target_os = "espidf")]
use crate::error::Error;

/// Highest GPIO number routed on this board.
#[cfg(not(target_os = "espidf"))]
const GPIO_LINES: usize = 40;

/// Simulated pin levels. Digital writes store here and reads load from
/// here, so host tests see a loopback; `sim_set_level` injects input
/// stimulus the same way.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [AtomicBool; GPIO_LINES] = [const { AtomicBool::new(false) }; GPIO_LINES];

// ── Direction config ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn configure_output(pin: i32) -> Result<()> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: gpio_config touches only the register block for `pin`; the
    // caller holds the pin's binding lock.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(Error::Hardware(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_output(_pin: i32) -> Result<()> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn configure_input(pin: i32) -> Result<()> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: as configure_output.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(Error::Hardware(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_input(_pin: i32) -> Result<()> {
    Ok(())
}

// ── Level access ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn write(pin: i32, high: bool) {
    SIM_LEVELS[pin as usize].store(high, Ordering::Relaxed);
}

#[cfg(target_os = "espidf")]
pub fn read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn read(pin: i32) -> bool {
    SIM_LEVELS[pin as usize].load(Ordering::Relaxed)
}

// ── Test injection ────────────────────────────────────────────

/// Inject a simulated input level (host/test only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    SIM_LEVELS[pin as usize].store(high, Ordering::Relaxed);
}

/// Observe a simulated output level (host/test only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(pin: i32) -> bool {
    SIM_LEVELS[pin as usize].load(Ordering::Relaxed)
}
