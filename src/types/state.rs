//! Sub-phase definitions

use serde::{Deserialize, Serialize};

/// Stage of the active phase, as seen by presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubPhase {
    /// Content blocks are being revealed
    Content,
    /// System messages are being revealed
    System,
    /// A choice prompt is pending or being resolved
    Choice,
    /// The choice registry is being replayed
    Revelation,
    /// The script is exhausted, the closing text is running
    Closing,
    /// Terminal state, no restart
    Locked,
}

impl SubPhase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            SubPhase::Content => "\x1b[32m",    // Green
            SubPhase::System => "\x1b[90m",     // Gray
            SubPhase::Choice => "\x1b[33m",     // Yellow
            SubPhase::Revelation => "\x1b[35m", // Magenta
            SubPhase::Closing => "\x1b[36m",    // Cyan
            SubPhase::Locked => "\x1b[31m",     // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for SubPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubPhase::Content => "CONTENT",
            SubPhase::System => "SYSTEM",
            SubPhase::Choice => "CHOICE",
            SubPhase::Revelation => "REVELATION",
            SubPhase::Closing => "CLOSING",
            SubPhase::Locked => "LOCKED",
        };
        write!(f, "{}", name)
    }
}
