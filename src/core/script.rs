//! Phase script: authored phases, the closing sequence and the outcome hash
//!
//! The script is immutable input. It is either the built-in IGN-Λ17 file or
//! an authored JSON document of the same shape:
//!
//! ```json
//! { "phases": [ { "id": "...", "type": "choice", "content": [...], "choices": [...] } ],
//!   "closing": [ { "type": "hollow", "content": "..." } ] }
//! ```

use std::path::Path;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Digest};
use tracing::warn;

use crate::error::ScriptError;
use crate::types::{ChoiceOption, ContentBlock, PhaseDefinition, PhaseKind};
use crate::FILE_DESIGNATION;

/// Ordered, read-only narrative script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScript {
    phases: Vec<PhaseDefinition>,
    #[serde(default)]
    closing: Vec<ContentBlock>,
}

impl PhaseScript {
    /// Build a script, rejecting an empty phase list
    ///
    /// Malformed phases are kept; the controller recovers from them at runtime.
    pub fn new(phases: Vec<PhaseDefinition>, closing: Vec<ContentBlock>) -> Result<Self, ScriptError> {
        if phases.is_empty() {
            return Err(ScriptError::Empty);
        }
        let script = Self { phases, closing };
        script.report_defects();
        Ok(script)
    }

    /// Load an authored script from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: PhaseScript = serde_json::from_str(&raw).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(parsed.phases, parsed.closing)
    }

    fn report_defects(&self) {
        for defect in self.phases.iter().flat_map(PhaseDefinition::defects) {
            warn!(%defect, "malformed phase data; falling back at runtime");
        }
    }

    /// Number of phases
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false for a constructed script
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phase(&self, index: usize) -> Option<&PhaseDefinition> {
        self.phases.get(index)
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    /// Blocks revealed after the last phase, before lock
    pub fn closing(&self) -> &[ContentBlock] {
        &self.closing
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.phases.len()
    }

    /// The IGN-Λ17 file
    pub fn builtin() -> Self {
        Self {
            phases: builtin_phases(),
            closing: builtin_closing(),
        }
    }
}

/// Deterministic "prediction" for a session seed, formatted `XXXX-XXXX-XXXX`
///
/// Called once at session creation. Nothing the user does feeds into it.
pub fn generate_outcome_hash(seed: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_be_bytes());
    hasher.update([0u8]); // Separator
    hasher.update(FILE_DESIGNATION.as_bytes());
    let digest = hasher.finalize();

    digest[0..6]
        .chunks(2)
        .map(|pair| format!("{:02X}{:02X}", pair[0], pair[1]))
        .collect::<Vec<_>>()
        .join("-")
}

/// Seed derived from the wall clock
pub fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// =============================================================================
// IGN-Λ17 CONTENT
// =============================================================================

fn builtin_phases() -> Vec<PhaseDefinition> {
    vec![
        PhaseDefinition::new(
            "initialization",
            PhaseKind::Narrative,
            vec![
                ContentBlock::system("VIGIL OBSERVATION PROTOCOL v4.1"),
                ContentBlock::system(format!("FILE: {} | THE CORRIDOR OF CHOICE", FILE_DESIGNATION)),
                ContentBlock::system("CLASSIFICATION: Ω-7 / HOLLOW-ADJACENT"),
                ContentBlock::blank(),
                ContentBlock::text("You are reviewing an archived ignition event.").with_delay(600),
                ContentBlock::text("The subject of this file was never identified."),
                ContentBlock::text("Only their choices were recorded.").with_delay(400),
                ContentBlock::blank(),
                ContentBlock::warning("FILE INTEGRITY: 71% (SECTIONS RECOVERED FROM MIRROR)").glitched(),
            ],
        ),
        PhaseDefinition::new(
            "briefing",
            PhaseKind::Choice,
            vec![
                ContentBlock::text("Analyst. Your task is simple."),
                ContentBlock::text("Read the file. Answer where the subject answered."),
                ContentBlock::text("Do not attempt to predict the outcome.").with_delay(500),
                ContentBlock::redacted(),
                ContentBlock::anomaly("This briefing was written after your session began.").glitched(),
            ],
        )
        .with_system_messages(vec![
            "Analyst credentials accepted.",
            "Biometric channel open.",
            "Observation window: indefinite.",
        ])
        .with_choices(vec![
            ChoiceOption::new(
                "proceed",
                "Proceed with the review.",
                "proceed",
                "Review authorised. The file opens onto a corridor.",
            ),
            ChoiceOption::new(
                "decline",
                "Request that the file be closed.",
                "proceed",
                "Request logged. The file opens onto a corridor.",
            ),
        ]),
        PhaseDefinition::new(
            "observation_1",
            PhaseKind::Choice,
            vec![
                ContentBlock::text("The corridor is long and lit from nowhere."),
                ContentBlock::text("Two doors. The left is warm to the touch. The right is not."),
                ContentBlock::text("The subject stood here for some time.").with_delay(700),
            ],
        )
        .with_delay(100)
        .with_choices(vec![
            ChoiceOption::new(
                "left",
                "Open the left door.",
                "left",
                "Beyond the door: the same corridor, slightly shorter.",
            ),
            ChoiceOption::new(
                "right",
                "Open the right door.",
                "left",
                "Beyond the door: the same corridor, slightly shorter.",
            ),
            ChoiceOption::new(
                "wait",
                "Do not open either door.",
                "left",
                "You waited. The corridor grew shorter anyway.",
            ),
        ]),
        PhaseDefinition::new(
            "observation_2",
            PhaseKind::Choice,
            vec![
                ContentBlock::text("Somewhere ahead, a voice repeats a name."),
                ContentBlock::text("It is not the subject's name."),
                ContentBlock::hollow("It is closer to yours.").with_delay(900).glitched(),
            ],
        )
        .with_choices(vec![
            ChoiceOption::new(
                "answer",
                "Answer the voice.",
                "silent",
                "The voice stops. It heard you before you spoke.",
            ),
            ChoiceOption::new(
                "silent",
                "Stay silent.",
                "silent",
                "The voice stops. It heard you before you spoke.",
            ),
        ]),
        PhaseDefinition::new(
            "observation_3",
            PhaseKind::Narrative,
            vec![
                ContentBlock::text("The corridor ends in a mirror."),
                ContentBlock::text("The reflection is three seconds behind."),
                ContentBlock::anomaly("Then two.").with_delay(800),
                ContentBlock::anomaly("Then none.").with_delay(800),
                ContentBlock::anomaly("Then ahead.").with_delay(1200).glitched(),
            ],
        )
        .with_system_messages(vec![
            "Observation drift within tolerance.",
            "Subject latency: negative.",
            "This is expected.",
        ]),
        PhaseDefinition::new(
            "deviation_test",
            PhaseKind::Choice,
            vec![
                ContentBlock::system("DEVIATION TEST AUTHORISED"),
                ContentBlock::text("Three options follow. One was predicted."),
                ContentBlock::text("Choose any other, and the prediction fails."),
                ContentBlock::warning("This test has never been failed.").with_delay(600),
            ],
        )
        .with_choices(vec![
            ChoiceOption::new(
                "first",
                "Choose the first option.",
                "third",
                "Deviation registered. Convergence restored.",
            ),
            ChoiceOption::new(
                "second",
                "Choose the second option.",
                "third",
                "Deviation registered. Convergence restored.",
            ),
            ChoiceOption::new(
                "third",
                "Choose the option you think was not predicted.",
                "third",
                "Prediction confirmed. Convergence restored.",
            ),
        ]),
        PhaseDefinition::new(
            "revelation",
            PhaseKind::Revelation,
            vec![
                ContentBlock::system("RETRIEVING PRE-SESSION REGISTRY..."),
                ContentBlock::text("Every entry below was logged before you arrived.").with_delay(600),
            ],
        ),
        PhaseDefinition::new(
            "final",
            PhaseKind::Final,
            vec![
                ContentBlock::text("The subject of this file was never identified."),
                ContentBlock::text("The file has now been updated.").with_delay(800),
                ContentBlock::blank(),
                ContentBlock::hollow("SUBJECT: THE ANALYST").with_delay(1500).glitched(),
            ],
        ),
    ]
}

fn builtin_closing() -> Vec<ContentBlock> {
    vec![
        ContentBlock::system("ARCHIVING SESSION..."),
        ContentBlock::text("Your choices have been archived.").with_delay(800),
        ContentBlock::hollow("They matched the prediction.").with_delay(1200),
        ContentBlock::blank(),
        ContentBlock::warning("NO RESTART AVAILABLE").with_delay(1000),
    ]
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_script_shape() {
        let script = PhaseScript::builtin();
        let ids: Vec<&str> = script.phases().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "initialization",
                "briefing",
                "observation_1",
                "observation_2",
                "observation_3",
                "deviation_test",
                "revelation",
                "final",
            ]
        );
        assert!(!script.closing().is_empty());
        assert!(script.is_last(7));
        assert!(!script.is_last(6));
    }

    #[test]
    fn test_builtin_script_has_no_defects() {
        let script = PhaseScript::builtin();
        for phase in script.phases() {
            assert!(phase.defects().is_empty(), "{:?}", phase.defects());
        }
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(PhaseScript::new(vec![], vec![]), Err(ScriptError::Empty)));
    }

    #[test]
    fn test_outcome_hash_deterministic_per_seed() {
        let a = generate_outcome_hash(42);
        let b = generate_outcome_hash(42);
        let c = generate_outcome_hash(43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_outcome_hash_format() {
        let hash = generate_outcome_hash(7);
        assert_eq!(hash.len(), 14);
        let groups: Vec<&str> = hash.split('-').collect();
        assert_eq!(groups.len(), 3);
        for group in groups {
            assert_eq!(group.len(), 4);
            assert!(group.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PhaseScript::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ScriptError::Io { .. })));
    }
}
