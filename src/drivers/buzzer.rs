//! Piezo buzzer driver with note-table lookup.
//!
//! Sounds are given as letter notation ("C3".."G9", sharps as "CS4"), MIDI
//! note numbers (48..=127), or a raw frequency in Hz. The buzzer drives its
//! dedicated output line through an LEDC channel at duty 10/1023 — loud
//! enough for the piezo, quiet enough for a classroom.
//!
//! The PWM timer comes from the same 4-slot pool the edge terminals share:
//! the first sound acquires a slot, later sounds retune the channel in
//! place, and `release()` hands the slot back. While the buzzer holds a
//! slot, at most three terminals can be in PWM mode.

use std::sync::{Arc, Mutex};

use crate::drivers::hw_pwm::PwmChannel;
use crate::error::{Error, Result};
use crate::pins;
use crate::terminal::{TimerId, TimerPool, lock};

/// Fixed buzzer drive level (of 1023).
const BUZZER_DUTY: u16 = 10;

const MIDI_MIN: u8 = 48;
const MIDI_MAX: u8 = 127;

/// Chromatic scale C3..G9, one entry per MIDI note number 48..=127.
/// Frequencies are the board's historical tuning table, reproduced exactly.
const TONE_MAP: [(&str, u32); 80] = [
    ("C3", 131),
    ("CS3", 139),
    ("D3", 147),
    ("DS3", 156),
    ("E3", 165),
    ("F3", 175),
    ("FS3", 185),
    ("G3", 196),
    ("GS3", 208),
    ("A3", 220),
    ("AS3", 233),
    ("B3", 247),
    ("C4", 262),
    ("CS4", 277),
    ("D4", 294),
    ("DS4", 311),
    ("E4", 330),
    ("F4", 349),
    ("FS4", 370),
    ("G4", 392),
    ("GS4", 415),
    ("A4", 440),
    ("AS4", 466),
    ("B4", 494),
    ("C5", 523),
    ("CS5", 554),
    ("D5", 587),
    ("DS5", 622),
    ("E5", 659),
    ("F5", 699),
    ("FS5", 740),
    ("G5", 784),
    ("GS5", 831),
    ("A5", 880),
    ("AS5", 932),
    ("B5", 988),
    ("C6", 1047),
    ("CS6", 1109),
    ("D6", 1175),
    ("DS6", 1245),
    ("E6", 1319),
    ("F6", 1397),
    ("FS6", 1480),
    ("G6", 1568),
    ("GS6", 1661),
    ("A6", 1760),
    ("AS6", 1865),
    ("B6", 1976),
    ("C7", 2093),
    ("CS7", 2218),
    ("D7", 2349),
    ("DS7", 2489),
    ("E7", 2637),
    ("F7", 2794),
    ("FS7", 2960),
    ("G7", 3136),
    ("GS7", 3322),
    ("A7", 3520),
    ("AS7", 3729),
    ("B7", 3951),
    ("C8", 4186),
    ("CS8", 4435),
    ("D8", 4699),
    ("DS8", 4978),
    ("E8", 5274),
    ("F8", 5588),
    ("FS8", 5920),
    ("G8", 6272),
    ("GS8", 6645),
    ("A8", 7040),
    ("AS8", 7459),
    ("B8", 7902),
    ("C9", 8372),
    ("CS9", 8870),
    ("D9", 9397),
    ("DS9", 9956),
    ("E9", 10548),
    ("F9", 11175),
    ("FS9", 11840),
    ("G9", 12544),
];

/// What to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound<'a> {
    /// Letter notation, "C3".."G9" (sharps as "CS4").
    Note(&'a str),
    /// MIDI note number, 48..=127.
    NoteNumber(u8),
    /// Raw frequency in Hz (must be non-zero).
    Hz(u32),
}

impl Sound<'_> {
    /// Resolve to a PWM frequency.
    pub fn frequency(&self) -> Result<u32> {
        match *self {
            Self::Note(name) => TONE_MAP
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, hz)| *hz)
                .ok_or(Error::InvalidNote),
            Self::NoteNumber(nn) => {
                if (MIDI_MIN..=MIDI_MAX).contains(&nn) {
                    Ok(TONE_MAP[(nn - MIDI_MIN) as usize].1)
                } else {
                    Err(Error::InvalidNote)
                }
            }
            Self::Hz(hz) => {
                if hz == 0 {
                    Err(Error::InvalidFrequency)
                } else {
                    Ok(hz)
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
fn delay_ms(ms: u32) {
    esp_idf_hal::delay::FreeRtos::delay_ms(ms);
}

#[cfg(not(target_os = "espidf"))]
fn delay_ms(ms: u32) {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
}

pub struct Buzzer {
    pool: Arc<Mutex<TimerPool>>,
    pwm: Option<PwmChannel>,
}

impl Buzzer {
    /// No timer slot is claimed until the first sound.
    pub fn new(pool: Arc<Mutex<TimerPool>>) -> Self {
        Self { pool, pwm: None }
    }

    /// Sound the buzzer.
    ///
    /// With `duration` Some(ms), blocks for the duration and silences; with
    /// None, sounds until `off()` or `release()`.
    pub fn on(&mut self, sound: Sound<'_>, duration: Option<u32>) -> Result<()> {
        let hz = sound.frequency()?;
        if let Some(pwm) = self.pwm.as_mut() {
            pwm.set_frequency(hz)?;
            pwm.set_duty(BUZZER_DUTY)?;
        } else {
            let timer = lock(&self.pool).acquire()?;
            match PwmChannel::new(pins::BUZZER_GPIO, timer, hz, BUZZER_DUTY) {
                Ok(pwm) => self.pwm = Some(pwm),
                Err(e) => {
                    lock(&self.pool).release(timer);
                    return Err(e);
                }
            }
        }
        if let Some(ms) = duration {
            delay_ms(ms);
            self.off()?;
        }
        Ok(())
    }

    /// Silence the buzzer; the timer slot and channel are kept for the next
    /// sound.
    pub fn off(&mut self) -> Result<()> {
        if let Some(pwm) = self.pwm.as_mut() {
            pwm.set_duty(0)?;
        }
        Ok(())
    }

    /// Silence the buzzer and return its timer slot to the pool. Idempotent.
    pub fn release(&mut self) -> Result<()> {
        self.off()?;
        if let Some(pwm) = self.pwm.take() {
            let timer = pwm.deinit();
            lock(&self.pool).release(timer);
        }
        Ok(())
    }

    /// Frequency of the current (possibly silenced) channel, if any.
    pub fn current_frequency(&self) -> Option<u32> {
        self.pwm.as_ref().map(PwmChannel::frequency)
    }

    /// Timer slot held since the first sound, if any.
    pub fn held_timer(&self) -> Option<TimerId> {
        self.pwm.as_ref().map(PwmChannel::timer)
    }
}
