//! Choice tracker: resolves picks into history and replays it for the revelation
//!
//! Whatever the pick, the convergence text is the option's own fixed line, and
//! the replay's hash comparison always shows zero variance. The outcome
//! never depended on the choices.

use std::time::Duration;
use chrono::Utc;
use tracing::debug;

use crate::core::lifecycle::SessionLifecycle;
use crate::types::{ChoiceOption, Pacing, PhaseDefinition, ResolvedChoice};

/// Outcome of an accepted choice
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The record appended to history
    pub choice: ResolvedChoice,
    /// Fixed text to display, regardless of prediction
    pub convergence_text: String,
    /// Pick contradicted the prediction
    pub deviant: bool,
}

/// One item the revelation reveals
#[derive(Debug, Clone, PartialEq)]
pub enum RevelationFrame {
    /// A registry entry, in history order
    Entry { index: usize, choice: ResolvedChoice },
    /// Predicted vs actual outcome hash
    HashComparison {
        predicted: String,
        actual: String,
        variance_percent: f64,
    },
    /// "All paths led here."
    Conclusion,
}

/// A frame and the delay that precedes it
#[derive(Debug, Clone, PartialEq)]
pub struct RevelationStep {
    pub delay: Duration,
    pub frame: RevelationFrame,
}

/// Lazy, finite replay of the choice history
///
/// Yields one `Entry` per history item, then `HashComparison`, then
/// `Conclusion`, then nothing.
#[derive(Debug, Clone)]
pub struct RevelationReplay {
    history: Vec<ResolvedChoice>,
    outcome_hash: String,
    cursor: usize,
    entry_delay: Duration,
    hash_delay: Duration,
    conclusion_delay: Duration,
}

impl RevelationReplay {
    /// Frames not yet yielded
    pub fn remaining(&self) -> usize {
        (self.history.len() + 2).saturating_sub(self.cursor)
    }
}

impl Iterator for RevelationReplay {
    type Item = RevelationStep;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.history.len();
        let step = if self.cursor < len {
            RevelationStep {
                delay: self.entry_delay,
                frame: RevelationFrame::Entry {
                    index: self.cursor,
                    choice: self.history[self.cursor].clone(),
                },
            }
        } else if self.cursor == len {
            // Both sides come from the same pre-session value
            RevelationStep {
                delay: self.hash_delay,
                frame: RevelationFrame::HashComparison {
                    predicted: self.outcome_hash.clone(),
                    actual: self.outcome_hash.clone(),
                    variance_percent: 0.0,
                },
            }
        } else if self.cursor == len + 1 {
            RevelationStep {
                delay: self.conclusion_delay,
                frame: RevelationFrame::Conclusion,
            }
        } else {
            return None;
        };
        self.cursor += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RevelationReplay {}

/// Resolves choices and replays them
#[derive(Debug, Clone)]
pub struct ChoiceTracker {
    entry_delay: Duration,
    hash_delay: Duration,
    conclusion_delay: Duration,
}

impl Default for ChoiceTracker {
    fn default() -> Self {
        Self::new(&Pacing::default())
    }
}

impl ChoiceTracker {
    /// Create a tracker using the replay cadence from `pacing`
    pub fn new(pacing: &Pacing) -> Self {
        Self {
            entry_delay: pacing.scaled(pacing.revelation_entry_interval_ms),
            hash_delay: pacing.scaled(pacing.revelation_hash_delay_ms),
            conclusion_delay: pacing.scaled(pacing.revelation_conclusion_delay_ms),
        }
    }

    /// Record `selected` as the answer to `phase`
    ///
    /// Returns `None` without touching the session when it is locked or when
    /// `selected` is not one of the phase's options.
    pub fn resolve(
        &self,
        session: &mut SessionLifecycle,
        phase: &PhaseDefinition,
        selected: &ChoiceOption,
        hesitation_ms: u64,
    ) -> Option<Resolution> {
        if session.is_locked() {
            return None;
        }
        if phase.choice(&selected.id) != Some(selected) {
            return None;
        }

        let deviant = selected.is_deviant();
        let choice = ResolvedChoice {
            phase_id: phase.id.clone(),
            option_selected: selected.label.clone(),
            predicted_option: phase.predicted_label(selected).to_string(),
            timestamp: Utc::now(),
            hesitation_ms,
            was_correct_prediction: !deviant,
        };

        if !session.record_choice(choice.clone()) {
            return None;
        }
        debug!(
            phase_id = %phase.id,
            option = %selected.id,
            hesitation_ms,
            deviant,
            "choice resolved"
        );

        Some(Resolution {
            choice,
            convergence_text: selected.convergence_text.clone(),
            deviant,
        })
    }

    /// Fresh replay over `history`; each call starts from the beginning
    pub fn replay_for_revelation(&self, history: &[ResolvedChoice], outcome_hash: &str) -> RevelationReplay {
        RevelationReplay {
            history: history.to_vec(),
            outcome_hash: outcome_hash.to_string(),
            cursor: 0,
            entry_delay: self.entry_delay,
            hash_delay: self.hash_delay,
            conclusion_delay: self.conclusion_delay,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentBlock, PhaseKind};
    use pretty_assertions::assert_eq;

    fn phase() -> PhaseDefinition {
        PhaseDefinition::new("observation_1", PhaseKind::Choice, vec![ContentBlock::text("doors")])
            .with_choices(vec![
                ChoiceOption::new("a", "Stay", "a", "You stayed."),
                ChoiceOption::new("b", "Leave", "a", "You stayed anyway."),
                ChoiceOption::new("c", "Vanish", "missing", "Still here."),
            ])
    }

    #[test]
    fn test_resolve_correct_prediction() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        let p = phase();

        let res = tracker.resolve(&mut session, &p, &p.choices[0], 420).unwrap();

        assert!(res.choice.was_correct_prediction);
        assert!(!res.deviant);
        assert_eq!(res.convergence_text, "You stayed.");
        assert_eq!(res.choice.option_selected, "Stay");
        assert_eq!(res.choice.predicted_option, "Stay");
        assert_eq!(res.choice.hesitation_ms, 420);
        assert_eq!(session.metrics().resistance_attempts, 0);
        assert_eq!(session.metrics().pattern_deviation, 0);
    }

    #[test]
    fn test_resolve_deviation() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        let p = phase();

        let res = tracker.resolve(&mut session, &p, &p.choices[1], 0).unwrap();

        assert!(!res.choice.was_correct_prediction);
        assert_eq!(res.choice.predicted_option, "Stay");
        assert_eq!(res.convergence_text, "You stayed anyway.");
        assert_eq!(session.metrics().resistance_attempts, 1);
        assert_eq!(session.metrics().pattern_deviation, 5);
        assert_eq!(session.metrics().predicted_outcome_hash, "HASH");
    }

    #[test]
    fn test_resolve_dangling_prediction_uses_own_label() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        let p = phase();

        let res = tracker.resolve(&mut session, &p, &p.choices[2], 0).unwrap();
        assert_eq!(res.choice.predicted_option, "Vanish");
        assert!(res.deviant);
    }

    #[test]
    fn test_resolve_rejects_foreign_option() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        let foreign = ChoiceOption::new("z", "Elsewhere", "z", "...");

        assert!(tracker.resolve(&mut session, &phase(), &foreign, 0).is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_resolve_after_lock_is_noop() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        session.lock();
        let p = phase();

        assert!(tracker.resolve(&mut session, &p, &p.choices[1], 0).is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.metrics().resistance_attempts, 0);
    }

    #[test]
    fn test_replay_order_and_zero_variance() {
        let tracker = ChoiceTracker::default();
        let mut session = SessionLifecycle::new(2, "HASH");
        let p = phase();
        tracker.resolve(&mut session, &p, &p.choices[0], 0);
        tracker.resolve(&mut session, &p, &p.choices[1], 0);

        let steps: Vec<RevelationStep> = tracker
            .replay_for_revelation(session.history(), &session.metrics().predicted_outcome_hash)
            .collect();

        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[0].frame, RevelationFrame::Entry { index: 0, .. }));
        assert!(matches!(steps[1].frame, RevelationFrame::Entry { index: 1, .. }));
        assert_eq!(
            steps[2].frame,
            RevelationFrame::HashComparison {
                predicted: "HASH".to_string(),
                actual: "HASH".to_string(),
                variance_percent: 0.0,
            }
        );
        assert_eq!(steps[3].frame, RevelationFrame::Conclusion);
        assert_eq!(steps[0].delay, Duration::from_millis(800));
        assert_eq!(steps[2].delay, Duration::from_millis(1000));
        assert_eq!(steps[3].delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_replay_is_restartable() {
        let tracker = ChoiceTracker::default();
        let mut first = tracker.replay_for_revelation(&[], "H");
        assert_eq!(first.len(), 2);
        first.next();
        first.next();
        assert!(first.next().is_none());

        let second = tracker.replay_for_revelation(&[], "H");
        assert_eq!(second.count(), 2);
    }
}
