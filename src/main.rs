//! EduBit Firmware — Main Entry Point
//!
//! Flash-target self-test: bring up the board, chirp the buzzer, then poll
//! the buttons — A plays a note, B logs an analog sample from P0. Mostly a
//! living example of the terminal/button/buzzer contracts; real lessons
//! link the library instead.

#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use log::{info, warn};

    use edubit::{Board, Sound};

    // ── ESP-IDF bootstrap ─────────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("EduBit board layer v{}", env!("CARGO_PKG_VERSION"));

    let mut board = Board::new().context("board bring-up failed")?;

    // Startup chirp confirms the timer pool and buzzer line work.
    board.buzzer().on(Sound::Note("E5"), Some(120))?;
    board.buzzer().release()?;

    let p0 = board.terminal("P0").context("terminal map broken")?;

    loop {
        if board.button_a().was_pressed() {
            board.buzzer().on(Sound::Note("A4"), Some(80))?;
            board.buzzer().release()?;
        }
        if board.button_b().was_pressed() {
            match p0.read_analog(true) {
                Ok(mv) => info!("P0: {mv:.0} mV"),
                Err(e) => warn!("P0 analog read failed: {e}"),
            }
        }
        esp_idf_hal::delay::FreeRtos::delay_ms(50);
    }
}

/// The binary only targets the board (see `required-features`); host-side
/// work goes through the library and its test suites.
#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("edubit: firmware binary; build with --features espidf for the board");
}
