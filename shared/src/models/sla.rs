//! SLA countdown status

use serde::{Deserialize, Serialize};

use crate::util::HOUR_MILLIS;

const MINUTE_MILLIS: i64 = 60 * 1000;

/// Remaining hours under which an open deadline counts as at risk
pub const SLA_WARNING_HOURS: i64 = 2;

/// Traffic-light state of an SLA deadline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Safe,
    Warning,
    Breached,
}

/// SLA status with a human-readable countdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaState {
    pub status: SlaStatus,
    /// "{h}h {m}m" or "SLA Breached"
    pub remaining: String,
}

impl SlaStatus {
    /// Evaluate `deadline` at `now` (both Unix millis)
    pub fn evaluate(deadline: i64, now: i64) -> SlaState {
        let diff = deadline - now;
        if diff < 0 {
            return SlaState {
                status: SlaStatus::Breached,
                remaining: "SLA Breached".to_string(),
            };
        }

        let hours = diff / HOUR_MILLIS;
        let minutes = (diff % HOUR_MILLIS) / MINUTE_MILLIS;
        let status = if hours < SLA_WARNING_HOURS {
            SlaStatus::Warning
        } else {
            SlaStatus::Safe
        };

        SlaState {
            status,
            remaining: format!("{hours}h {minutes}m"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_safe_with_countdown() {
        let state = SlaStatus::evaluate(NOW + 5 * HOUR_MILLIS + 30 * MINUTE_MILLIS, NOW);
        assert_eq!(state.status, SlaStatus::Safe);
        assert_eq!(state.remaining, "5h 30m");
    }

    #[test]
    fn test_warning_under_two_hours() {
        let state = SlaStatus::evaluate(NOW + HOUR_MILLIS + 59 * MINUTE_MILLIS, NOW);
        assert_eq!(state.status, SlaStatus::Warning);
        assert_eq!(state.remaining, "1h 59m");

        // exactly two hours left is no longer a warning
        let state = SlaStatus::evaluate(NOW + 2 * HOUR_MILLIS, NOW);
        assert_eq!(state.status, SlaStatus::Safe);
    }

    #[test]
    fn test_deadline_now_is_warning_not_breach() {
        let state = SlaStatus::evaluate(NOW, NOW);
        assert_eq!(state.status, SlaStatus::Warning);
        assert_eq!(state.remaining, "0h 0m");
    }

    #[test]
    fn test_breached() {
        let state = SlaStatus::evaluate(NOW - 1, NOW);
        assert_eq!(state.status, SlaStatus::Breached);
        assert_eq!(state.remaining, "SLA Breached");
        assert_eq!(serde_json::to_string(&state.status).unwrap(), "\"breached\"");
    }
}
