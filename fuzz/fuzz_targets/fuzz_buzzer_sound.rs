//! Fuzz target: `Sound::frequency`
//!
//! Resolves arbitrary note names, note numbers, and frequencies and asserts
//! the lookup never panics and every accepted sound lands in the table's
//! frequency range.
//!
//! cargo fuzz run fuzz_buzzer_sound

#![no_main]

use edubit::Sound;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };

    let sound = match selector % 3 {
        0 => match core::str::from_utf8(rest) {
            Ok(name) => Sound::Note(name),
            Err(_) => return,
        },
        1 => Sound::NoteNumber(rest.first().copied().unwrap_or(0)),
        _ => {
            let mut hz = [0u8; 4];
            for (slot, byte) in hz.iter_mut().zip(rest) {
                *slot = *byte;
            }
            Sound::Hz(u32::from_le_bytes(hz))
        }
    };

    if let Ok(hz) = sound.frequency() {
        match sound {
            // Table-backed sounds resolve inside the C3..G9 range.
            Sound::Note(_) | Sound::NoteNumber(_) => assert!((131..=12544).contains(&hz)),
            Sound::Hz(raw) => assert_eq!(hz, raw),
        }
    }
});
