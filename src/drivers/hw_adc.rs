//! Oneshot ADC input channel with line-fitting calibration.
//!
//! An `AdcChannel` is the live ADC hardware object a pin binding owns while
//! in ADC mode. Channels are configured at a fixed 11 dB attenuation
//! (`DB_12` is its esp-idf 5 name, 0 – ~3.1 V range) and 12-bit width; the
//! calibrated read path converts raw samples to millivolts through the
//! eFuse/Vref line-fitting scheme.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: oneshot unit handles (one per ADC unit, created lazily and
//! retained for the process lifetime) plus a per-channel calibration handle.
//! On host/test: raw samples come from a per-GPIO injection array; the
//! calibrated reading is derived linearly from the raw sample.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use std::sync::Mutex;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::error::Error;
use crate::error::Result;

// ── Board ADC routing ─────────────────────────────────────────

/// GPIO → (unit, channel) for this board's analog-capable pins.
#[cfg(target_os = "espidf")]
const fn adc_route(gpio: i32) -> Option<(usize, u32)> {
    match gpio {
        // ADC1
        36 => Some((0, 0)),
        39 => Some((0, 3)),
        32 => Some((0, 4)),
        33 => Some((0, 5)),
        34 => Some((0, 6)),
        // ADC2
        15 => Some((1, 3)),
        13 => Some((1, 4)),
        12 => Some((1, 5)),
        14 => Some((1, 6)),
        _ => None,
    }
}

/// Lazily-created oneshot unit handles, one per ADC unit. Stored as raw
/// addresses so the array stays `Send`; the mutex serializes creation.
#[cfg(target_os = "espidf")]
static UNIT_HANDLES: Mutex<[usize; 2]> = Mutex::new([0; 2]);

#[cfg(target_os = "espidf")]
fn unit_handle(unit: usize) -> Result<adc_oneshot_unit_handle_t> {
    let mut handles = UNIT_HANDLES
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if handles[unit] == 0 {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: unit as adc_unit_t,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: unit creation is serialized by UNIT_HANDLES' mutex and
        // happens at most once per unit.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        handles[unit] = handle as usize;
    }
    Ok(handles[unit] as adc_oneshot_unit_handle_t)
}

// ── Test injection ────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const GPIO_LINES: usize = 40;

/// Simulated raw samples, 12-bit, indexed by GPIO.
#[cfg(not(target_os = "espidf"))]
static SIM_ADC_RAW: [AtomicU16; GPIO_LINES] = [const { AtomicU16::new(0) }; GPIO_LINES];

/// Inject a simulated raw ADC sample (host/test only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_raw(gpio: i32, raw: u16) {
    SIM_ADC_RAW[gpio as usize].store(raw.min(4095), Ordering::Relaxed);
}

// ── Channel ───────────────────────────────────────────────────

pub struct AdcChannel {
    gpio: i32,
    #[cfg(target_os = "espidf")]
    unit: usize,
    #[cfg(target_os = "espidf")]
    channel: u32,
    /// Calibration handle address (kept as usize so the owning binding
    /// stays `Send`; the binding lock serializes all use).
    #[cfg(target_os = "espidf")]
    cali: usize,
}

impl AdcChannel {
    #[cfg(target_os = "espidf")]
    pub fn new(gpio: i32) -> Result<Self> {
        let Some((unit, channel)) = adc_route(gpio) else {
            return Err(Error::Hardware(ESP_ERR_INVALID_ARG as i32));
        };
        let handle = unit_handle(unit)?;

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: the unit handle is valid for the process lifetime and
        // channel reconfiguration is an independent register write.
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }

        let cali_cfg = adc_cali_line_fitting_config_t {
            unit_id: unit as adc_unit_t,
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
            ..Default::default()
        };
        let mut cali: adc_cali_handle_t = core::ptr::null_mut();
        // SAFETY: creates an independent calibration scheme handle.
        let ret = unsafe { adc_cali_create_scheme_line_fitting(&cali_cfg, &mut cali) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }

        Ok(Self {
            gpio,
            unit,
            channel,
            cali: cali as usize,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(gpio: i32) -> Result<Self> {
        Ok(Self { gpio })
    }

    /// Uncalibrated 12-bit sample.
    #[cfg(target_os = "espidf")]
    pub fn read_raw(&self) -> Result<u16> {
        let handle = unit_handle(self.unit)?;
        let mut raw: i32 = 0;
        // SAFETY: oneshot read on a configured channel; the binding lock
        // prevents concurrent reads of this channel.
        let ret = unsafe { adc_oneshot_read(handle, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        Ok(raw.max(0) as u16)
    }

    /// Uncalibrated 12-bit sample.
    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&self) -> Result<u16> {
        Ok(SIM_ADC_RAW[self.gpio as usize].load(Ordering::Relaxed))
    }

    /// Calibrated reading in millivolts.
    #[cfg(target_os = "espidf")]
    pub fn read_millivolts(&self) -> Result<u16> {
        let raw = self.read_raw()?;
        let mut mv: i32 = 0;
        // SAFETY: the calibration handle was created in new() and lives
        // until deinit(); raw-to-voltage is a pure table lookup.
        let ret = unsafe {
            adc_cali_raw_to_voltage(self.cali as adc_cali_handle_t, i32::from(raw), &mut mv)
        };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        Ok(mv.max(0) as u16)
    }

    /// Calibrated reading in millivolts (linear model in simulation).
    #[cfg(not(target_os = "espidf"))]
    pub fn read_millivolts(&self) -> Result<u16> {
        let raw = u32::from(self.read_raw()?);
        Ok((raw * 3300 / 4095) as u16)
    }

    /// Release the calibration scheme. The oneshot unit handle is shared
    /// and retained; a later rebind reconfigures the channel in place.
    pub fn deinit(self) {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: the handle is dropped exactly once, here.
            let ret =
                unsafe { adc_cali_delete_scheme_line_fitting(self.cali as adc_cali_handle_t) };
            if ret != ESP_OK as i32 {
                log::warn!("gpio{}: adc calibration teardown failed (rc={ret})", self.gpio);
            }
        }
    }
}
