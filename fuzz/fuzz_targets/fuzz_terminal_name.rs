//! Fuzz target: `TerminalRegistry::terminal`
//!
//! Looks up arbitrary strings and asserts that the registry never panics,
//! only ever resolves names from the closed board map, and stays identity
//! stable for whatever it does resolve.
//!
//! cargo fuzz run fuzz_terminal_name

#![no_main]

use edubit::TerminalRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = core::str::from_utf8(data) else {
        return;
    };

    let registry = TerminalRegistry::new();
    if let Ok(handle) = registry.terminal(name) {
        // Only the board's 19 terminal names may resolve.
        assert!(name.starts_with('P'));
        let again = registry.terminal(name).expect("resolved name must stay valid");
        assert!(handle.same_binding(&again));
    }
});
