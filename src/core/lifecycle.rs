//! Session lifecycle: sole owner of `SessionState`
//!
//! Phase index only moves forward, the closing sequence starts once, and the
//! lock is permanent. Every mutator is a silent no-op after lock.

use tracing::{debug, info};
use crate::types::{HiddenMetrics, MetricEvent, ResolvedChoice, SessionState};

/// Result of asking the session to move on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to this phase index
    Advanced(usize),
    /// Already on the last phase; closing sequence begins, lock follows
    ClosingStarted,
    /// Closing already begun or session locked
    Ignored,
}

#[derive(Debug)]
pub struct SessionLifecycle {
    state: SessionState,
    total_phases: usize,
    closing: bool,
}

impl SessionLifecycle {
    /// Create a session over a script of `total_phases`
    ///
    /// The outcome hash is taken once here and never recomputed.
    pub fn new(total_phases: usize, predicted_outcome_hash: impl Into<String>) -> Self {
        Self {
            state: SessionState::new(predicted_outcome_hash),
            total_phases,
            closing: false,
        }
    }

    /// Move to the next phase, or begin closing from the last one
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.state.is_locked || self.closing {
            return AdvanceOutcome::Ignored;
        }
        if self.state.phase + 1 >= self.total_phases {
            self.closing = true;
            info!(phase = self.state.phase, "script exhausted; closing sequence started");
            return AdvanceOutcome::ClosingStarted;
        }
        self.state.phase += 1;
        debug!(phase = self.state.phase, "phase advanced");
        AdvanceOutcome::Advanced(self.state.phase)
    }

    /// Lock the session. Idempotent.
    pub fn lock(&mut self) {
        if self.state.is_locked {
            return;
        }
        self.state.is_locked = true;
        info!(
            choices = self.state.choice_history.len(),
            deviations = self.state.deviation_count(),
            "session locked"
        );
    }

    /// Append a resolved choice and fold it into the metrics
    ///
    /// Returns false (and changes nothing) once locked.
    pub fn record_choice(&mut self, choice: ResolvedChoice) -> bool {
        if self.state.is_locked {
            return false;
        }
        let event = MetricEvent::ChoiceResolved {
            deviant: !choice.was_correct_prediction,
        };
        self.state.hidden_metrics = self.state.hidden_metrics.clone().reduce(&event);
        self.state.choice_history.push(choice);
        true
    }

    /// Set once; later calls and calls after lock change nothing
    pub fn mark_revelation_triggered(&mut self) {
        if !self.state.is_locked {
            self.state.revelation_triggered = true;
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase_index(&self) -> usize {
        self.state.phase
    }

    pub fn total_phases(&self) -> usize {
        self.total_phases
    }

    pub fn history(&self) -> &[ResolvedChoice] {
        &self.state.choice_history
    }

    pub fn metrics(&self) -> &HiddenMetrics {
        &self.state.hidden_metrics
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked
    }

    pub fn revelation_triggered(&self) -> bool {
        self.state.revelation_triggered
    }

    /// Phase progress ratio `phase / total` used for ambience
    pub fn progress(&self) -> f64 {
        if self.total_phases == 0 {
            return 0.0;
        }
        self.state.phase as f64 / self.total_phases as f64
    }
}

// =============================================================================
// TESTS
// =============================================================================
