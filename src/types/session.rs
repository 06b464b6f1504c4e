//! Session state snapshot

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{HiddenMetrics, ResolvedChoice};

/// Everything one run of the experience accumulates
///
/// Only `SessionLifecycle` mutates this; everyone else reads clones or
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Current phase index (0-based, never decreases)
    pub phase: usize,
    pub choice_history: Vec<ResolvedChoice>,
    pub hidden_metrics: HiddenMetrics,
    /// Terminal; once true nothing else changes
    pub is_locked: bool,
    /// Set once the revelation replay has completed
    pub revelation_triggered: bool,
    pub start_timestamp: DateTime<Utc>,
}

impl SessionState {
    /// Create a session at phase 0 with an empty history
    pub fn new(predicted_outcome_hash: impl Into<String>) -> Self {
        Self {
            phase: 0,
            choice_history: Vec::new(),
            hidden_metrics: HiddenMetrics::new(predicted_outcome_hash),
            is_locked: false,
            revelation_triggered: false,
            start_timestamp: Utc::now(),
        }
    }

    /// Number of choices that deviated from the prediction
    pub fn deviation_count(&self) -> usize {
        self.choice_history
            .iter()
            .filter(|c| !c.was_correct_prediction)
            .count()
    }
}
