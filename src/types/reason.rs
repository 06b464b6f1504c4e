//! Reason codes for controller transitions and ignored inputs

use serde::{Deserialize, Serialize};

/// Why the controller did (or did not do) something
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Phase flow
    // =========================================================================
    /// Entered a phase, content reveal started
    R101_PHASE_ENTERED,
    /// A content block became visible
    R102_BLOCK_REVEALED,
    /// A system message became visible
    R103_SYSTEM_MESSAGE_REVEALED,
    /// All system messages shown, waiting before re-evaluation
    R104_SYSTEM_COMPLETE_PENDING,
    /// Nothing else in the phase, advance scheduled
    R105_AUTO_ADVANCE_SCHEDULED,
    /// Content done, system messages starting
    R106_SYSTEM_STARTED,

    // =========================================================================
    // R2xx: Choice
    // =========================================================================
    /// Choice prompt announced, options not yet selectable
    R201_CHOICE_PROMPTED,
    /// Options visible, hesitation clock running
    R202_CHOICE_OPEN,
    /// Options visible for too long
    R203_HESITATION_DETECTED,
    /// Selection accepted, processing
    R204_CHOICE_PROCESSING,
    /// Choice recorded, convergence text shown
    R205_CHOICE_RESOLVED,

    // =========================================================================
    // R3xx: Revelation
    // =========================================================================
    /// Registry replay started
    R301_REVELATION_STARTED,
    /// A replay frame was shown
    R302_REVELATION_FRAME,
    /// Replay finished, revelation flag set
    R303_REVELATION_COMPLETE,

    // =========================================================================
    // R4xx: Closing
    // =========================================================================
    /// Script exhausted, closing sequence started
    R401_CLOSING_STARTED,
    /// A closing block became visible
    R402_CLOSING_BLOCK_REVEALED,
    /// Session locked
    R403_SESSION_LOCKED,
    /// Lock delay elapsed while closing text remains; locks after the last block
    R404_LOCK_DEFERRED,

    // =========================================================================
    // R9xx: Ignored
    // =========================================================================
    /// Selection while no choice is open
    R901_INPUT_NOT_PENDING,
    /// Selection while a previous one is still being resolved
    R902_INPUT_BUSY,
    /// Selection of an option the phase does not offer
    R903_INPUT_UNKNOWN_OPTION,
    /// Anything after lock
    R904_SESSION_LOCKED,
    /// Timer scheduled by an earlier phase
    R905_TIMER_STALE,
    /// Timer that does not apply to the current stage
    R906_TIMER_UNEXPECTED,
    /// `Start` received twice
    R907_ALREADY_STARTED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_PHASE_ENTERED => "R101_PHASE_ENTERED",
            Self::R102_BLOCK_REVEALED => "R102_BLOCK_REVEALED",
            Self::R103_SYSTEM_MESSAGE_REVEALED => "R103_SYSTEM_MESSAGE_REVEALED",
            Self::R104_SYSTEM_COMPLETE_PENDING => "R104_SYSTEM_COMPLETE_PENDING",
            Self::R105_AUTO_ADVANCE_SCHEDULED => "R105_AUTO_ADVANCE_SCHEDULED",
            Self::R106_SYSTEM_STARTED => "R106_SYSTEM_STARTED",
            Self::R201_CHOICE_PROMPTED => "R201_CHOICE_PROMPTED",
            Self::R202_CHOICE_OPEN => "R202_CHOICE_OPEN",
            Self::R203_HESITATION_DETECTED => "R203_HESITATION_DETECTED",
            Self::R204_CHOICE_PROCESSING => "R204_CHOICE_PROCESSING",
            Self::R205_CHOICE_RESOLVED => "R205_CHOICE_RESOLVED",
            Self::R301_REVELATION_STARTED => "R301_REVELATION_STARTED",
            Self::R302_REVELATION_FRAME => "R302_REVELATION_FRAME",
            Self::R303_REVELATION_COMPLETE => "R303_REVELATION_COMPLETE",
            Self::R401_CLOSING_STARTED => "R401_CLOSING_STARTED",
            Self::R402_CLOSING_BLOCK_REVEALED => "R402_CLOSING_BLOCK_REVEALED",
            Self::R403_SESSION_LOCKED => "R403_SESSION_LOCKED",
            Self::R404_LOCK_DEFERRED => "R404_LOCK_DEFERRED",
            Self::R901_INPUT_NOT_PENDING => "R901_INPUT_NOT_PENDING",
            Self::R902_INPUT_BUSY => "R902_INPUT_BUSY",
            Self::R903_INPUT_UNKNOWN_OPTION => "R903_INPUT_UNKNOWN_OPTION",
            Self::R904_SESSION_LOCKED => "R904_SESSION_LOCKED",
            Self::R905_TIMER_STALE => "R905_TIMER_STALE",
            Self::R906_TIMER_UNEXPECTED => "R906_TIMER_UNEXPECTED",
            Self::R907_ALREADY_STARTED => "R907_ALREADY_STARTED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_PHASE_ENTERED => "Phase entered",
            Self::R102_BLOCK_REVEALED => "Content block revealed",
            Self::R103_SYSTEM_MESSAGE_REVEALED => "System message revealed",
            Self::R104_SYSTEM_COMPLETE_PENDING => "System messages complete",
            Self::R105_AUTO_ADVANCE_SCHEDULED => "Advancing without input",
            Self::R106_SYSTEM_STARTED => "System messages starting",
            Self::R201_CHOICE_PROMPTED => "Awaiting input protocol",
            Self::R202_CHOICE_OPEN => "Options visible",
            Self::R203_HESITATION_DETECTED => "Hesitation detected",
            Self::R204_CHOICE_PROCESSING => "Processing response",
            Self::R205_CHOICE_RESOLVED => "Choice resolved, converging",
            Self::R301_REVELATION_STARTED => "Revelation started",
            Self::R302_REVELATION_FRAME => "Registry frame shown",
            Self::R303_REVELATION_COMPLETE => "Revelation complete",
            Self::R401_CLOSING_STARTED => "Closing sequence started",
            Self::R402_CLOSING_BLOCK_REVEALED => "Closing block revealed",
            Self::R403_SESSION_LOCKED => "Terminal locked",
            Self::R404_LOCK_DEFERRED => "Lock deferred until closing text ends",
            Self::R901_INPUT_NOT_PENDING => "No choice pending",
            Self::R902_INPUT_BUSY => "Previous choice still resolving",
            Self::R903_INPUT_UNKNOWN_OPTION => "Option not offered",
            Self::R904_SESSION_LOCKED => "Session is locked",
            Self::R905_TIMER_STALE => "Timer from a previous phase",
            Self::R906_TIMER_UNEXPECTED => "Timer does not apply",
            Self::R907_ALREADY_STARTED => "Session already started",
        }
    }

    /// Was the event dropped without touching state?
    pub fn is_ignored(&self) -> bool {
        self.code().starts_with("R9")
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
