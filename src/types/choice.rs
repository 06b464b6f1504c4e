//! Resolved choice records

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use crate::{REGISTRY_BACKDATE_MS, REGISTRY_BACKDATE_STEP_MS};

/// One accepted choice, immutable once appended to history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChoice {
    pub phase_id: String,
    /// Label of the option the user picked
    pub option_selected: String,
    /// Label of the option the system predicted
    pub predicted_option: String,
    /// Wall clock at resolution
    pub timestamp: DateTime<Utc>,
    /// Time between options becoming visible and the pick
    pub hesitation_ms: u64,
    pub was_correct_prediction: bool,
}

impl ResolvedChoice {
    /// Timestamp shown in the registry, backdated so the entry looks pre-logged
    pub fn logged_at(&self, index: usize) -> DateTime<Utc> {
        let offset = REGISTRY_BACKDATE_MS + index as i64 * REGISTRY_BACKDATE_STEP_MS;
        self.timestamp - Duration::milliseconds(offset)
    }

    /// Registry verdict tag
    pub fn verdict(&self) -> &'static str {
        if self.was_correct_prediction {
            "[MATCH]"
        } else {
            "[DEVIATION → CONVERGENCE]"
        }
    }

    /// Hesitation in seconds, two decimals
    pub fn hesitation_display(&self) -> String {
        format!("{:.2}s", self.hesitation_ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn choice(correct: bool) -> ResolvedChoice {
        ResolvedChoice {
            phase_id: "observation_1".to_string(),
            option_selected: "Stay".to_string(),
            predicted_option: "Stay".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            hesitation_ms: 1234,
            was_correct_prediction: correct,
        }
    }

    #[test]
    fn test_logged_at_backdates_per_index() {
        let c = choice(true);
        assert_eq!(c.logged_at(0), Utc.with_ymd_and_hms(2024, 1, 1, 11, 54, 0).unwrap());
        assert_eq!(c.logged_at(2), Utc.with_ymd_and_hms(2024, 1, 1, 11, 52, 0).unwrap());
    }

    #[test]
    fn test_verdict_and_hesitation() {
        assert_eq!(choice(true).verdict(), "[MATCH]");
        assert_eq!(choice(false).verdict(), "[DEVIATION → CONVERGENCE]");
        assert_eq!(choice(true).hesitation_display(), "1.23s");
    }
}
