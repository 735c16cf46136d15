//! Property tests for the binding state machine and timer pool.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets. On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use edubit::{DUTY_MAX, Error, PinMode, TIMER_COUNT, TerminalRegistry, TimerId, TimerPool};
use proptest::prelude::*;

// ── Binding state machine ─────────────────────────────────────

#[derive(Debug, Clone)]
enum PinOp {
    WriteDigital(bool),
    ReadDigital,
    WriteAnalog(u16),
    SetFrequency(u32),
    SetPeriodMs(u32),
    ReadAnalog(bool),
    ReleasePwm,
}

fn arb_pin_op() -> impl Strategy<Value = PinOp> {
    prop_oneof![
        any::<bool>().prop_map(PinOp::WriteDigital),
        Just(PinOp::ReadDigital),
        (0u16..=2048u16).prop_map(PinOp::WriteAnalog),
        (1u32..=40_000u32).prop_map(PinOp::SetFrequency),
        (1u32..=1000u32).prop_map(PinOp::SetPeriodMs),
        any::<bool>().prop_map(PinOp::ReadAnalog),
        Just(PinOp::ReleasePwm),
    ]
}

proptest! {
    /// After any operation sequence on a hybrid pin: at most one live
    /// peripheral, duty in range, mode consistent with the live objects,
    /// and the pool ledger balanced.
    #[test]
    fn hybrid_pin_invariants_hold(
        ops in proptest::collection::vec(arb_pin_op(), 1..=40),
    ) {
        let reg = TerminalRegistry::new();
        let pin = reg.terminal("P16").unwrap();
        let pool = reg.timer_pool();

        for op in &ops {
            let result = match op {
                PinOp::WriteDigital(v) => pin.write_digital(*v),
                PinOp::ReadDigital => pin.read_digital().map(|_| ()),
                PinOp::WriteAnalog(duty) => pin.write_analog(*duty),
                PinOp::SetFrequency(hz) => pin.set_analog_frequency(*hz),
                PinOp::SetPeriodMs(ms) => pin.set_analog_period_ms(*ms),
                PinOp::ReadAnalog(mv) => pin.read_analog(*mv).map(|_| ()),
                PinOp::ReleasePwm => pin.release_pwm(),
            };
            // A lone hybrid pin can never exhaust the 4-slot pool, and
            // every generated op is within its capability profile.
            prop_assert!(result.is_ok(), "{:?} failed: {:?}", op, result);

            prop_assert!(!(pin.pwm_active() && pin.adc_active()));
            prop_assert!(pin.duty() <= DUTY_MAX);
            prop_assert_eq!(pin.pwm_active(), pin.mode() == PinMode::Pwm);
            prop_assert_eq!(pin.adc_active(), pin.mode() == PinMode::Adc);
            prop_assert_eq!(pin.held_timer().is_some(), pin.mode() == PinMode::Pwm);

            let available = pool.lock().unwrap().available();
            prop_assert_eq!(available, TIMER_COUNT - usize::from(pin.pwm_active()));
        }
    }

    /// Lookup never panics, whatever the name; anything outside the board
    /// map is InvalidTerminal.
    #[test]
    fn lookup_is_total(name in ".*") {
        let reg = TerminalRegistry::new();
        if let Err(e) = reg.terminal(&name) {
            prop_assert_eq!(e, Error::InvalidTerminal);
        }
    }
}

// ── Timer pool ledger ─────────────────────────────────────────

#[derive(Debug, Clone)]
enum PoolOp {
    Acquire,
    Release(usize),
}

fn arb_pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        Just(PoolOp::Acquire),
        (0usize..8).prop_map(PoolOp::Release),
    ]
}

proptest! {
    /// Arbitrary acquire/release interleavings (including defensive double
    /// releases) never double-allocate a slot or drift the ledger.
    #[test]
    fn pool_never_double_allocates(
        ops in proptest::collection::vec(arb_pool_op(), 1..=60),
    ) {
        let mut pool = TimerPool::new();
        let mut held: Vec<TimerId> = Vec::new();

        for op in ops {
            match op {
                PoolOp::Acquire => match pool.acquire() {
                    Ok(id) => {
                        prop_assert!(!held.contains(&id), "slot {} handed out twice", id);
                        held.push(id);
                    }
                    Err(e) => {
                        prop_assert_eq!(e, Error::ResourceExhausted);
                        prop_assert_eq!(held.len(), TIMER_COUNT);
                    }
                },
                PoolOp::Release(pick) => {
                    if !held.is_empty() {
                        let id = held.remove(pick % held.len());
                        pool.release(id);
                        // Defensive double release must be a no-op.
                        pool.release(id);
                    }
                }
            }
            prop_assert_eq!(pool.available(), TIMER_COUNT - held.len());
        }
    }
}
