//! Read-only projection handed to presentation

use serde::{Deserialize, Serialize};
use crate::types::{ChoiceOption, PhaseKind, SubPhase};

/// What presentation may know about the session at any instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Current phase index
    pub phase_index: usize,
    /// Script length
    pub total_phases: usize,
    pub phase_id: String,
    pub phase_kind: PhaseKind,
    pub sub_phase: SubPhase,
    /// Content blocks of the current phase already revealed
    pub visible_blocks: usize,
    /// System messages of the current phase already revealed
    pub visible_messages: usize,
    /// Options that can be selected right now (empty otherwise)
    pub choices: Vec<ChoiceOption>,
    pub is_locked: bool,
}

impl SessionView {
    /// Observation progress in percent (`phase / total`)
    pub fn progress_percent(&self) -> u32 {
        if self.total_phases == 0 {
            return 0;
        }
        ((self.phase_index as f64 / self.total_phases as f64) * 100.0).round() as u32
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.sub_phase.color_code();
        let reset = SubPhase::color_reset();

        format!(
            "{}VIGIL | phase={}/{} ({}) | {} | progress={}%{}",
            color,
            self.phase_index + 1,
            self.total_phases,
            self.phase_id,
            self.sub_phase,
            self.progress_percent(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | id={} | kind={} | sub={} | blocks={} | messages={} | choices={} | locked={}",
            self.phase_index,
            self.phase_id,
            self.phase_kind,
            self.sub_phase,
            self.visible_blocks,
            self.visible_messages,
            self.choices.len(),
            self.is_locked
        )
    }
}
