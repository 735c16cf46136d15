//! User buttons A and B with ISR-side debounce.
//!
//! ## Hardware
//!
//! Active-low momentary switches with external pull-ups, sharing their GPIO
//! lines with edge terminals (A on P5's pin, B on P11's). Level reads go
//! through the shared terminal handle, so a button and application code
//! polling the same terminal observe one hardware state.
//!
//! ## Debounce
//!
//! The GPIO falling-edge ISR drops edges arriving within 150 ms of the
//! previous accepted edge, then latches was-pressed and bumps the running
//! press count. Both are read-and-clear from the main loop. All ISR state
//! is lock-free atomics; the ISR never touches pin-binding state.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::Result;
use crate::pins;
use crate::terminal::{Terminal, TerminalRegistry};

const DEBOUNCE_MS: u32 = 150;

/// The two user buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    A,
    B,
}

impl ButtonId {
    const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    const fn terminal_name(self) -> &'static str {
        match self {
            Self::A => pins::BUTTON_A_TERMINAL,
            Self::B => pins::BUTTON_B_TERMINAL,
        }
    }

    const fn gpio(self) -> i32 {
        match self {
            Self::A => pins::BUTTON_A_GPIO,
            Self::B => pins::BUTTON_B_GPIO,
        }
    }
}

/// Per-button ISR state. Written by the ISR, read-and-cleared by the main
/// loop; constructing a button twice therefore observes the same counters.
static PRESS_COUNT: [AtomicU32; 2] = [const { AtomicU32::new(0) }; 2];
static WAS_PRESSED: [AtomicBool; 2] = [const { AtomicBool::new(false) }; 2];
static LAST_EDGE_MS: [AtomicU32; 2] = [const { AtomicU32::new(0) }; 2];

/// ISR handler — register on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomics only).
pub fn button_isr_handler(id: ButtonId, now_ms: u32) {
    let i = id.index();
    let last = LAST_EDGE_MS[i].load(Ordering::Acquire);
    if now_ms.wrapping_sub(last) < DEBOUNCE_MS {
        return;
    }
    LAST_EDGE_MS[i].store(now_ms, Ordering::Release);
    WAS_PRESSED[i].store(true, Ordering::Release);
    PRESS_COUNT[i].fetch_add(1, Ordering::AcqRel);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_a_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u32;
    button_isr_handler(ButtonId::A, now_ms);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_b_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: as button_a_gpio_isr.
    let now_ms = (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u32;
    button_isr_handler(ButtonId::B, now_ms);
}

#[cfg(target_os = "espidf")]
fn install_isr(id: ButtonId) -> Result<()> {
    use esp_idf_svc::sys::*;

    use crate::error::Error;

    let gpio = id.gpio();
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << gpio,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The registered handlers
    // only touch lock-free atomics.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(Error::Hardware(ret));
        }
        let isr = match id {
            ButtonId::A => button_a_gpio_isr as unsafe extern "C" fn(*mut core::ffi::c_void),
            ButtonId::B => button_b_gpio_isr,
        };
        let ret = gpio_isr_handler_add(gpio, Some(isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        gpio_intr_enable(gpio);
    }
    log::info!("button {id:?}: ISR armed on gpio{gpio}");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn install_isr(_id: ButtonId) -> Result<()> {
    Ok(())
}

pub struct Button {
    id: ButtonId,
    terminal: Terminal,
}

impl Button {
    /// Bind the button's shared terminal and arm its falling-edge ISR.
    pub fn new(id: ButtonId, registry: &TerminalRegistry) -> Result<Self> {
        let terminal = registry.terminal(id.terminal_name())?;
        install_isr(id)?;
        Ok(Self { id, terminal })
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Raw pin level (high = released, low = pressed).
    pub fn get_value(&self) -> Result<bool> {
        self.terminal.read_digital()
    }

    /// Whether the button is held down right now.
    pub fn is_pressed(&self) -> Result<bool> {
        Ok(!self.terminal.read_digital()?)
    }

    /// Whether the button was pressed since the last call. Read-and-clear.
    pub fn was_pressed(&self) -> bool {
        WAS_PRESSED[self.id.index()].swap(false, Ordering::AcqRel)
    }

    /// Running total of debounced presses since the last call. Read-and-clear.
    pub fn get_presses(&self) -> u32 {
        PRESS_COUNT[self.id.index()].swap(0, Ordering::AcqRel)
    }
}
