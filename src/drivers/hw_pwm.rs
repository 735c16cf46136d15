//! LEDC PWM output channel.
//!
//! One `PwmChannel` is the live PWM hardware object a pin binding (or the
//! buzzer) owns while in PWM mode. Channel `n` is always driven by timer
//! `n`, so the 4-slot timer pool bounds live channels as well; a channel
//! owns its timer slot from construction until `deinit` hands it back for
//! the pool to release.
//!
//! Duty is 10-bit (0..=1023), matching the terminal analog-out range.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: LEDC low-speed timer + channel via raw sys calls.
//! On host/test: state tracked in the struct only.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::error::Error;
use crate::error::Result;
use crate::terminal::timer_pool::TimerId;

pub struct PwmChannel {
    gpio: i32,
    timer: TimerId,
    freq_hz: u32,
    duty: u16,
}

impl PwmChannel {
    /// Configure LEDC timer `timer` and its paired channel on `gpio`,
    /// starting output at the given frequency and duty.
    pub fn new(gpio: i32, timer: TimerId, freq_hz: u32, duty: u16) -> Result<Self> {
        let channel = Self {
            gpio,
            timer,
            freq_hz,
            duty,
        };
        channel.configure_hw()?;
        Ok(channel)
    }

    #[cfg(target_os = "espidf")]
    fn configure_hw(&self) -> Result<()> {
        let timer_cfg = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: self.timer.index() as u32,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
            freq_hz: self.freq_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: the timer slot was acquired from the pool, so no other
        // channel is configuring this timer concurrently.
        let ret = unsafe { ledc_timer_config(&timer_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }

        let chan_cfg = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: self.timer.index() as u32,
            timer_sel: self.timer.index() as u32,
            gpio_num: self.gpio,
            duty: u32::from(self.duty),
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: channel number equals the pool-owned timer index.
        let ret = unsafe { ledc_channel_config(&chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Hardware(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn configure_hw(&self) -> Result<()> {
        Ok(())
    }

    /// Apply a new duty (0..=1023) to the running output.
    pub fn set_duty(&mut self, duty: u16) -> Result<()> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: duty register writes on a configured channel.
            let ret = unsafe {
                let ret = ledc_set_duty(
                    ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    self.timer.index() as u32,
                    u32::from(duty),
                );
                if ret == ESP_OK as i32 {
                    ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.timer.index() as u32)
                } else {
                    ret
                }
            };
            if ret != ESP_OK as i32 {
                return Err(Error::Hardware(ret));
            }
        }
        self.duty = duty;
        Ok(())
    }

    /// Retune the output frequency in place; the timer slot is kept.
    pub fn set_frequency(&mut self, hz: u32) -> Result<()> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: frequency reconfig of a timer this channel owns.
            let ret = unsafe {
                ledc_set_freq(
                    ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    self.timer.index() as u32,
                    hz,
                )
            };
            if ret != ESP_OK as i32 {
                return Err(Error::Hardware(ret));
            }
        }
        self.freq_hz = hz;
        Ok(())
    }

    /// Stop the output and surrender the timer slot for the caller to
    /// return to the pool.
    pub fn deinit(self) -> TimerId {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: ledc_stop parks the configured channel at idle level 0.
            let ret = unsafe {
                ledc_stop(
                    ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    self.timer.index() as u32,
                    0,
                )
            };
            if ret != ESP_OK as i32 {
                log::warn!("gpio{}: ledc_stop failed (rc={ret})", self.gpio);
            }
        }
        self.timer
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn frequency(&self) -> u32 {
        self.freq_hz
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }
}
