//! GPIO / peripheral pin assignments for the EduBit main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  The terminal map is board-specific persisted
//! configuration and must be reproduced exactly for hardware compatibility;
//! it is never computed at runtime.

use crate::terminal::CapabilityProfile;

// ---------------------------------------------------------------------------
// Edge terminals
// ---------------------------------------------------------------------------

/// One row of the logical-to-physical terminal map.
pub struct TerminalSpec {
    /// Logical name printed on the board edge ("P0".."P20").
    pub name: &'static str,
    /// Registry cache slot, equal to the numeric suffix of `name`.
    pub index: usize,
    /// ESP32 GPIO number.
    pub gpio: i32,
    /// Operating modes the physical pin supports.
    pub profile: CapabilityProfile,
}

const fn spec(
    name: &'static str,
    index: usize,
    gpio: i32,
    profile: CapabilityProfile,
) -> TerminalSpec {
    TerminalSpec {
        name,
        index,
        gpio,
        profile,
    }
}

/// The complete board edge. P17 and P18 are not routed on this board, so the
/// valid-name set is exactly P0–P16, P19, P20.
pub const TERMINALS: [TerminalSpec; 19] = [
    spec("P0", 0, 32, CapabilityProfile::Hybrid),
    spec("P1", 1, 33, CapabilityProfile::Hybrid),
    spec("P2", 2, 36, CapabilityProfile::Hybrid),
    spec("P3", 3, 39, CapabilityProfile::Hybrid),
    spec("P4", 4, 25, CapabilityProfile::DigitalOnly),
    spec("P5", 5, 15, CapabilityProfile::Hybrid),
    spec("P6", 6, 26, CapabilityProfile::DigitalOnly),
    spec("P7", 7, 5, CapabilityProfile::DigitalOnly),
    spec("P8", 8, 14, CapabilityProfile::Hybrid),
    spec("P9", 9, 12, CapabilityProfile::Hybrid),
    spec("P10", 10, 0, CapabilityProfile::DigitalOnly),
    spec("P11", 11, 27, CapabilityProfile::DigitalOnly),
    spec("P12", 12, 4, CapabilityProfile::DigitalOnly),
    spec("P13", 13, 18, CapabilityProfile::DigitalOnly),
    spec("P14", 14, 19, CapabilityProfile::DigitalOnly),
    spec("P15", 15, 23, CapabilityProfile::DigitalOnly),
    spec("P16", 16, 13, CapabilityProfile::Hybrid),
    spec("P19", 19, 22, CapabilityProfile::DigitalOnly),
    spec("P20", 20, 21, CapabilityProfile::DigitalOnly),
];

/// Number of registry cache slots (indices 0..=20; 17 and 18 stay empty).
pub const TERMINAL_SLOTS: usize = 21;

/// Look up a terminal by its logical name.
pub fn lookup(name: &str) -> Option<&'static TerminalSpec> {
    TERMINALS.iter().find(|t| t.name == name)
}

// ---------------------------------------------------------------------------
// User buttons (active-low, falling-edge ISR)
// ---------------------------------------------------------------------------

/// Button A shares terminal P5's physical pin.
pub const BUTTON_A_GPIO: i32 = 15;
pub const BUTTON_A_TERMINAL: &str = "P5";
/// Button B shares terminal P11's physical pin.
pub const BUTTON_B_GPIO: i32 = 27;
pub const BUTTON_B_TERMINAL: &str = "P11";

// ---------------------------------------------------------------------------
// Piezo buzzer
// ---------------------------------------------------------------------------

/// Buzzer output line. By board convention the buzzer owns this line (it is
/// also routed to terminal P4); driving P4 while the buzzer is sounding
/// contends for the pin, exactly as on the original board.
pub const BUZZER_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// On-board sensors
// ---------------------------------------------------------------------------

/// Ambient light sensor — analog input only (GPIO 34 has no output driver).
pub const LIGHT_SENSOR_GPIO: i32 = 34;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_is_closed_set() {
        assert_eq!(TERMINALS.len(), 19);
        assert!(lookup("P17").is_none());
        assert!(lookup("P18").is_none());
        assert!(lookup("P21").is_none());
        assert!(lookup("p0").is_none()); // names are case-sensitive
        assert!(lookup("").is_none());
    }

    #[test]
    fn hardware_map_matches_board() {
        let p0 = lookup("P0").unwrap();
        assert_eq!(p0.gpio, 32);
        assert_eq!(p0.profile, CapabilityProfile::Hybrid);

        let p4 = lookup("P4").unwrap();
        assert_eq!(p4.gpio, 25);
        assert_eq!(p4.profile, CapabilityProfile::DigitalOnly);

        let p20 = lookup("P20").unwrap();
        assert_eq!(p20.gpio, 21);
        assert_eq!(p20.index, 20);
    }

    #[test]
    fn indices_fit_registry_slots() {
        for t in &TERMINALS {
            assert!(t.index < TERMINAL_SLOTS);
            assert_eq!(format!("P{}", t.index), t.name);
        }
    }
}
