//! Peripheral drivers and the dual-target hardware access layer.

pub mod button;
pub mod buzzer;
pub mod hw_adc;
pub mod hw_gpio;
pub mod hw_pwm;
