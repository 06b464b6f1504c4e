//! Authored phase data: phases, content blocks and choice options
//!
//! Field names follow the authored JSON format (`type`, `predictedId`,
//! `convergenceText`, `systemMessages`, `delay`).

use serde::{Deserialize, Serialize};

/// Narrative role of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Narrative,
    Choice,
    Revelation,
    Final,
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PhaseKind::Narrative => "NARRATIVE",
            PhaseKind::Choice => "CHOICE",
            PhaseKind::Revelation => "REVELATION",
            PhaseKind::Final => "FINAL",
        };
        write!(f, "{}", name)
    }
}

/// Presentation tag of a content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    System,
    Redacted,
    Warning,
    Anomaly,
    Hollow,
}

impl BlockKind {
    /// Line prefix used by the terminal renderer
    pub fn prefix(&self) -> &'static str {
        match self {
            BlockKind::System => "[SYS] ",
            BlockKind::Warning => "[WRN] ",
            BlockKind::Anomaly => "[!] ",
            _ => "",
        }
    }
}

/// One revealable line of narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    /// Reveal delay for this block (falls back to the pacing default)
    #[serde(default, rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub glitch: bool,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            delay_ms: None,
            glitch: false,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Text, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(BlockKind::System, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Warning, content)
    }

    pub fn anomaly(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Anomaly, content)
    }

    pub fn hollow(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Hollow, content)
    }

    pub fn redacted() -> Self {
        Self::new(BlockKind::Redacted, "")
    }

    /// An empty spacer line
    pub fn blank() -> Self {
        Self::text("")
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn glitched(mut self) -> Self {
        self.glitch = true;
        self
    }
}

/// A selectable response
///
/// `predicted_id` may point at this option or another one; it only decides
/// whether the pick counts as a deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub predicted_id: String,
    pub convergence_text: String,
}

impl ChoiceOption {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        predicted_id: impl Into<String>,
        convergence_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            predicted_id: predicted_id.into(),
            convergence_text: convergence_text.into(),
        }
    }

    /// Does picking this option contradict the prediction?
    pub fn is_deviant(&self) -> bool {
        self.id != self.predicted_id
    }
}

/// One step of the authored script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PhaseKind,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_messages: Vec<String>,
    /// Base delay added to every block reveal in this phase
    #[serde(default, rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PhaseDefinition {
    pub fn new(id: impl Into<String>, kind: PhaseKind, content: Vec<ContentBlock>) -> Self {
        Self {
            id: id.into(),
            kind,
            content,
            choices: Vec::new(),
            system_messages: Vec::new(),
            delay_ms: None,
        }
    }

    pub fn with_choices(mut self, choices: Vec<ChoiceOption>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_system_messages<S: Into<String>>(mut self, messages: Vec<S>) -> Self {
        self.system_messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Find an option of this phase by id
    pub fn choice(&self, id: &str) -> Option<&ChoiceOption> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// Label of the option `selected` was predicted to be, or its own label
    /// when the reference dangles
    pub fn predicted_label<'a>(&'a self, selected: &'a ChoiceOption) -> &'a str {
        self.choice(&selected.predicted_id)
            .map(|c| c.label.as_str())
            .unwrap_or(selected.label.as_str())
    }

    /// Problems that are recovered at runtime but worth reporting
    pub fn defects(&self) -> Vec<String> {
        let mut defects = Vec::new();
        if self.kind == PhaseKind::Choice && self.choices.is_empty() {
            defects.push(format!("phase '{}' is a choice phase without options", self.id));
        }
        for option in &self.choices {
            if self.choice(&option.predicted_id).is_none() {
                defects.push(format!(
                    "phase '{}' option '{}' predicts unknown option '{}'",
                    self.id, option.id, option.predicted_id
                ));
            }
        }
        defects
    }
}
