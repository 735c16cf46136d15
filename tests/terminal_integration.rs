//! Integration tests for the terminal resource manager, driven end-to-end
//! against the simulated hardware layer.
//!
//! Runs on host (x86_64) only — on the board these paths exercise real
//! GPIO/LEDC/ADC registers and are validated on hardware instead.

#![cfg(not(target_os = "espidf"))]

use edubit::drivers::{hw_adc, hw_gpio};
use edubit::{Error, PinMode, TerminalOp, TerminalRegistry};

// ── Registry identity ─────────────────────────────────────────

#[test]
fn lookups_share_one_binding() {
    let reg = TerminalRegistry::new();
    let first = reg.terminal("P13").unwrap();
    let second = reg.terminal("P13").unwrap();
    assert!(first.same_binding(&second));

    // Mutations through one handle are observed through the other.
    first.write_digital(true).unwrap();
    assert_eq!(second.mode(), PinMode::Digital);
    assert!(hw_gpio::sim_level(second.gpio()));
    second.write_digital(false).unwrap();
    assert!(!hw_gpio::sim_level(first.gpio()));
}

// ── Capability gating ─────────────────────────────────────────

#[test]
fn digital_only_terminals_reject_analog_ops() {
    let reg = TerminalRegistry::new();

    let p7 = reg.terminal("P7").unwrap();
    assert_eq!(
        p7.write_analog(512),
        Err(Error::Unsupported(TerminalOp::WriteAnalog))
    );
    assert_eq!(
        p7.set_analog_frequency(440),
        Err(Error::Unsupported(TerminalOp::SetAnalogFrequency))
    );

    let p4 = reg.terminal("P4").unwrap();
    assert_eq!(
        p4.read_analog(false),
        Err(Error::Unsupported(TerminalOp::ReadAnalog))
    );

    // The rejected calls left both pins untouched.
    assert_eq!(p7.mode(), PinMode::Unbound);
    assert_eq!(p4.mode(), PinMode::Unbound);
    p7.write_digital(true).unwrap();
    assert_eq!(p7.mode(), PinMode::Digital);
}

// ── Duty persistence ──────────────────────────────────────────

#[test]
fn duty_set_before_activation_is_applied() {
    let reg = TerminalRegistry::new();
    let p1 = reg.terminal("P1").unwrap();

    // Configure-then-activate: the level is stored with no hardware effect.
    p1.write_analog(500).unwrap();
    assert_eq!(p1.duty(), 500);
    assert_eq!(p1.mode(), PinMode::Unbound);
    assert!(!p1.pwm_active());

    // Activation applies the persisted duty, not a default.
    p1.set_analog_frequency(440).unwrap();
    assert_eq!(p1.mode(), PinMode::Pwm);
    assert_eq!(p1.pwm_duty(), Some(500));
    assert_eq!(p1.pwm_frequency(), Some(440));

    // Live writes retune the running output in place.
    p1.write_analog(200).unwrap();
    assert_eq!(p1.pwm_duty(), Some(200));

    // Teardown keeps the persisted level.
    p1.release_pwm().unwrap();
    assert_eq!(p1.duty(), 200);
}

#[test]
fn duty_survives_full_pwm_teardown() {
    let reg = TerminalRegistry::new();
    let p2 = reg.terminal("P2").unwrap();
    p2.set_analog_frequency(1000).unwrap();
    p2.write_analog(321).unwrap();
    p2.release_pwm().unwrap();
    assert!(!p2.pwm_active());

    p2.set_analog_frequency(2000).unwrap();
    assert_eq!(p2.pwm_duty(), Some(321));
}

// ── Timer pool arbitration ────────────────────────────────────

#[test]
fn fifth_pwm_bind_exhausts_the_pool() {
    let reg = TerminalRegistry::new();
    for (i, name) in ["P0", "P1", "P2", "P3"].iter().enumerate() {
        let t = reg.terminal(name).unwrap();
        t.set_analog_frequency(1000).unwrap();
        assert_eq!(t.held_timer().map(|id| id.index()), Some(i));
    }

    let p5 = reg.terminal("P5").unwrap();
    assert_eq!(p5.set_analog_frequency(1000), Err(Error::ResourceExhausted));
    assert_eq!(p5.mode(), PinMode::Unbound);

    // Any holder releasing unblocks the waiter, reusing the freed slot.
    reg.terminal("P2").unwrap().release_pwm().unwrap();
    p5.set_analog_frequency(1000).unwrap();
    assert_eq!(p5.held_timer().map(|id| id.index()), Some(2));
}

#[test]
fn retuning_never_draws_a_second_slot() {
    let reg = TerminalRegistry::new();
    let pool = reg.timer_pool();
    let p16 = reg.terminal("P16").unwrap();

    p16.set_analog_frequency(500).unwrap();
    p16.set_analog_frequency(5000).unwrap();
    p16.set_analog_period_ms(20).unwrap();
    assert_eq!(pool.lock().unwrap().available(), 3);
    assert_eq!(p16.pwm_frequency(), Some(50));
}

#[test]
fn release_pwm_is_idempotent() {
    let reg = TerminalRegistry::new();
    let pool = reg.timer_pool();
    let p8 = reg.terminal("P8").unwrap();

    p8.set_analog_frequency(440).unwrap();
    assert_eq!(pool.lock().unwrap().available(), 3);

    p8.release_pwm().unwrap();
    p8.release_pwm().unwrap();
    assert_eq!(pool.lock().unwrap().available(), 4);
    assert_eq!(p8.mode(), PinMode::Unbound);

    // The slot came back exactly once: rebinding drains one slot again.
    p8.set_analog_frequency(440).unwrap();
    assert_eq!(pool.lock().unwrap().available(), 3);
}

// ── Mode transitions ──────────────────────────────────────────

#[test]
fn adc_gives_way_to_digital_cleanly() {
    let reg = TerminalRegistry::new();
    let p0 = reg.terminal("P0").unwrap();

    hw_adc::sim_set_adc_raw(p0.gpio(), 2000);
    let sample = p0.read_analog(false).unwrap();
    assert!((sample - 2000.0).abs() < 3.0); // calibrated, rescaled to raw range
    assert!(p0.adc_active());
    assert_eq!(p0.mode(), PinMode::Adc);

    // Digital write must tear the ADC down and drive the pin high.
    p0.write_digital(true).unwrap();
    assert!(!p0.adc_active());
    assert_eq!(p0.mode(), PinMode::Digital);
    assert!(hw_gpio::sim_level(p0.gpio()));

    // And the follow-up read sees digital state, not stale ADC state.
    assert_eq!(p0.read_digital(), Ok(true));
    assert_eq!(p0.mode(), PinMode::Digital);
}

#[test]
fn pwm_and_adc_are_mutually_exclusive() {
    let reg = TerminalRegistry::new();
    let pool = reg.timer_pool();
    let p9 = reg.terminal("P9").unwrap();

    let check = |expected: PinMode| {
        assert!(!(p9.pwm_active() && p9.adc_active()));
        assert_eq!(p9.mode(), expected);
        let held = usize::from(p9.pwm_active());
        assert_eq!(pool.lock().unwrap().available(), 4 - held);
    };

    p9.read_analog(true).unwrap();
    check(PinMode::Adc);
    p9.set_analog_frequency(440).unwrap();
    check(PinMode::Pwm);
    p9.read_analog(false).unwrap();
    check(PinMode::Adc);
    p9.write_digital(false).unwrap();
    check(PinMode::Digital);
    p9.set_analog_frequency(880).unwrap();
    check(PinMode::Pwm);
    p9.release_pwm().unwrap();
    check(PinMode::Unbound);
}

// ── ADC calibration band ──────────────────────────────────────

#[test]
fn raw_samples_outside_the_band_pass_through() {
    let reg = TerminalRegistry::new();
    let p16 = reg.terminal("P16").unwrap();

    // Below the trusted band: the raw sample comes back unscaled.
    hw_adc::sim_set_adc_raw(p16.gpio(), 100);
    assert_eq!(p16.read_analog(false), Ok(100.0));

    // Above it: same.
    hw_adc::sim_set_adc_raw(p16.gpio(), 2451);
    assert_eq!(p16.read_analog(false), Ok(2451.0));

    // On the lower edge the calibrated value is used (sim calibration is
    // linear, so the rescaled reading lands near — not on — the raw value).
    hw_adc::sim_set_adc_raw(p16.gpio(), 150);
    let on_edge = p16.read_analog(false).unwrap();
    assert!((on_edge - 148.9).abs() < 0.2);
}

#[test]
fn millivolt_reads_use_the_calibrated_path() {
    let reg = TerminalRegistry::new();
    let p3 = reg.terminal("P3").unwrap();
    hw_adc::sim_set_adc_raw(p3.gpio(), 1024);
    // Linear sim calibration: 1024/4095 of 3300 mV, floored.
    assert_eq!(p3.read_analog(true), Ok(825.0));
    assert_eq!(p3.mode(), PinMode::Adc);
}
