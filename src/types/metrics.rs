//! Hidden metrics and their reducer
//!
//! The outcome hash is fixed at session start. No event recomputes it, and
//! compliance / drift are carried but never moved by any current event.

use serde::{Deserialize, Serialize};
use crate::{DEVIATION_INCREMENT, INITIAL_COMPLIANCE_INDEX};

/// Events the metrics react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent {
    /// A choice was accepted; `deviant` when the pick contradicted the prediction
    ChoiceResolved { deviant: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenMetrics {
    pub predicted_outcome_hash: String,
    pub emotional_compliance_index: u32,
    pub observation_drift: u32,
    pub resistance_attempts: u32,
    pub pattern_deviation: u32,
}

impl HiddenMetrics {
    /// Fresh metrics around a pre-computed outcome hash
    pub fn new(predicted_outcome_hash: impl Into<String>) -> Self {
        Self {
            predicted_outcome_hash: predicted_outcome_hash.into(),
            emotional_compliance_index: INITIAL_COMPLIANCE_INDEX,
            observation_drift: 0,
            resistance_attempts: 0,
            pattern_deviation: 0,
        }
    }

    /// Pure reducer: `(metrics, event) -> metrics'`
    pub fn reduce(self, event: &MetricEvent) -> Self {
        match *event {
            MetricEvent::ChoiceResolved { deviant: true } => Self {
                resistance_attempts: self.resistance_attempts.saturating_add(1),
                pattern_deviation: self.pattern_deviation.saturating_add(DEVIATION_INCREMENT),
                ..self
            },
            MetricEvent::ChoiceResolved { deviant: false } => self,
        }
    }
}
