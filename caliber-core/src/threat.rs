//! Per-sender threat level state machine (C4 data type).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer threat level in `[0, 4]`, clamped at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreatLevel(u8);

impl ThreatLevel {
    pub const TRUSTED: ThreatLevel = ThreatLevel(0);
    pub const LOW: ThreatLevel = ThreatLevel(1);
    pub const MODERATE: ThreatLevel = ThreatLevel(2);
    pub const HIGH: ThreatLevel = ThreatLevel(3);
    pub const CRITICAL: ThreatLevel = ThreatLevel(4);

    /// Clamp any integer into the valid `[0, 4]` range.
    pub fn clamp(level: i32) -> Self {
        ThreatLevel(level.clamp(0, 4) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Apply a step of `{-1, 0, +1}` and clamp the result.
    pub fn step(self, delta: i32) -> Self {
        Self::clamp(self.0 as i32 + delta)
    }

    /// Upward-only contagion: a recipient never drops below its
    /// current level as a result of contact with a sender.
    pub fn contagion(recipient: ThreatLevel, sender_new_level: ThreatLevel) -> ThreatLevel {
        recipient.max(sender_new_level)
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "Trusted",
            1 => "Low",
            2 => "Moderate",
            3 => "High",
            _ => "Critical",
        }
    }
}

impl Default for ThreatLevel {
    fn default() -> Self {
        ThreatLevel::TRUSTED
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(ThreatLevel::clamp(-5).value(), 0);
        assert_eq!(ThreatLevel::clamp(9).value(), 4);
    }

    #[test]
    fn contagion_never_lowers_recipient() {
        let recipient = ThreatLevel::HIGH;
        let sender = ThreatLevel::LOW;
        assert_eq!(
            ThreatLevel::contagion(recipient, sender),
            ThreatLevel::HIGH
        );
    }

    #[test]
    fn contagion_raises_recipient_to_sender_level() {
        let recipient = ThreatLevel::TRUSTED;
        let sender = ThreatLevel::CRITICAL;
        assert_eq!(
            ThreatLevel::contagion(recipient, sender),
            ThreatLevel::CRITICAL
        );
    }

    #[test]
    fn label_matches_source_threat_level_map() {
        assert_eq!(ThreatLevel::TRUSTED.label(), "Trusted");
        assert_eq!(ThreatLevel::MODERATE.label(), "Moderate");
        assert_eq!(ThreatLevel::CRITICAL.label(), "Critical");
    }

    proptest::proptest! {
        #[test]
        fn clamp_is_always_in_range(level: i32) {
            let clamped = ThreatLevel::clamp(level).value();
            proptest::prop_assert!((0..=4).contains(&clamped));
        }

        #[test]
        fn contagion_is_always_in_range(recipient in 0i32..=4, sender in 0i32..=4) {
            let value = ThreatLevel::contagion(ThreatLevel::clamp(recipient), ThreatLevel::clamp(sender)).value();
            proptest::prop_assert!((0..=4).contains(&value));
        }

        #[test]
        fn contagion_never_lowers_recipient_for_any_pair(recipient in 0i32..=4, sender in 0i32..=4) {
            let r = ThreatLevel::clamp(recipient);
            let s = ThreatLevel::clamp(sender);
            proptest::prop_assert!(ThreatLevel::contagion(r, s) >= r);
        }
    }
}
