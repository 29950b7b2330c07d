//! Watchdog state machine.
//!
//! ```text
//! Unarmed ──feed()──► Armed ──feed()──► Armed (deadline superseded)
//!    ▲                  │
//!    │   disarm()       │ deadline missed
//!    ├──────────────────┤
//!    │                  ▼
//!    └───disarm()───  Fired ──feed()──► Armed
//! ```
//!
//! `Fired` behaves like `Unarmed` (nothing is pending), but remembers that the
//! last cycle fired so a racing `disarm` can report it.

use serde::{Deserialize, Serialize};

/// Watchdog operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WatchdogStatus {
    /// Nothing is pending.
    #[default]
    Unarmed,
    /// A deadline is pending.
    Armed,
    /// The last deadline was missed and the interruption was delivered.
    Fired,
}

impl WatchdogStatus {
    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_armed(self) -> bool {
        matches!(self, Self::Armed)
    }

    /// Get the status as a string slice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unarmed => "Unarmed",
            Self::Armed => "Armed",
            Self::Fired => "Fired",
        }
    }
}

impl std::fmt::Display for WatchdogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a call to `disarm` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisarmOutcome {
    /// A pending deadline was cancelled before it fired.
    Disarmed {
        /// Generation of the cancelled cycle.
        generation: u64,
    },
    /// Nothing was pending.
    NotArmed,
    /// The cycle had already fired before the disarm was observed.
    AlreadyFired {
        /// Generation of the cycle that fired.
        generation: u64,
    },
}

impl DisarmOutcome {
    /// Whether this disarm cancelled a pending deadline.
    #[must_use]
    pub fn cancelled(self) -> bool {
        matches!(self, Self::Disarmed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(WatchdogStatus::Unarmed.to_string(), "Unarmed");
        assert_eq!(WatchdogStatus::Armed.to_string(), "Armed");
        assert_eq!(WatchdogStatus::Fired.to_string(), "Fired");
    }

    #[test]
    fn test_only_armed_is_armed() {
        assert!(WatchdogStatus::Armed.is_armed());
        assert!(!WatchdogStatus::Unarmed.is_armed());
        assert!(!WatchdogStatus::Fired.is_armed());
        assert_eq!(WatchdogStatus::default(), WatchdogStatus::Unarmed);
    }

    #[test]
    fn test_disarm_outcome_cancelled() {
        assert!(DisarmOutcome::Disarmed { generation: 1 }.cancelled());
        assert!(!DisarmOutcome::NotArmed.cancelled());
        assert!(!DisarmOutcome::AlreadyFired { generation: 1 }.cancelled());
    }
}
