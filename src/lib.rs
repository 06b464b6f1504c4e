//! VIGIL: IGN-Λ17 "The Corridor of Choice"
//!
//! Phase script → SubPhaseController → (ChoiceTracker, SessionLifecycle) → sinks

pub mod core;
pub mod error;
pub mod logging;
pub mod types;

// =============================================================================
// CONTENT PACING (milliseconds)
// =============================================================================

/// Reveal delay for a content block that does not set its own
pub const DEFAULT_BLOCK_DELAY_MS: u64 = 150;

/// Interval between system messages
pub const SYSTEM_MESSAGE_INTERVAL_MS: u64 = 600;

/// Pause after the last system message before re-evaluating
pub const SYSTEM_COMPLETE_DELAY_MS: u64 = 500;

/// Pause before a phase without input moves on
pub const AUTO_ADVANCE_DELAY_MS: u64 = 1500;

// =============================================================================
// CHOICE PACING (milliseconds)
// =============================================================================

/// "Awaiting input protocol..." before options become selectable
pub const CHOICE_PROMPT_DELAY_MS: u64 = 1500;

/// Time with visible options before hesitation is acknowledged
pub const HESITATION_THRESHOLD_MS: u64 = 8000;

/// Processing delay when the pick matches the prediction
pub const PROCESSING_DELAY_COMPLIANT_MS: u64 = 1500;

/// Processing delay when the pick deviates (the system answers faster)
pub const PROCESSING_DELAY_DEVIANT_MS: u64 = 800;

/// How long convergence text stays before the phase advances
pub const CONVERGENCE_DWELL_MS: u64 = 2500;

// =============================================================================
// REVELATION / CLOSING PACING (milliseconds)
// =============================================================================

/// Cadence of registry entries during the revelation replay
pub const REVELATION_ENTRY_INTERVAL_MS: u64 = 800;

/// Pause before the outcome hash comparison
pub const REVELATION_HASH_DELAY_MS: u64 = 1000;

/// Pause before the conclusion line
pub const REVELATION_CONCLUSION_DELAY_MS: u64 = 1500;

/// Pause between revelation completion and the next phase
pub const REVELATION_ADVANCE_DELAY_MS: u64 = 2000;

/// Base delay for each closing block
pub const CLOSING_BASE_DELAY_MS: u64 = 500;

/// Closing sequence start → terminal lock
pub const LOCK_DELAY_MS: u64 = 8000;

// =============================================================================
// HIDDEN METRICS
// =============================================================================

/// Initial emotional compliance index
pub const INITIAL_COMPLIANCE_INDEX: u32 = 100;

/// Pattern deviation added per deviant choice
pub const DEVIATION_INCREMENT: u32 = 5;

/// Offset applied to the first "pre-logged" registry timestamp (milliseconds)
pub const REGISTRY_BACKDATE_MS: i64 = 360_000;

/// Additional backdate per registry entry (milliseconds)
pub const REGISTRY_BACKDATE_STEP_MS: i64 = 60_000;

// =============================================================================
// AUDIO MAPPING
// =============================================================================

/// Intensity at phase 0
pub const INTENSITY_FLOOR: f64 = 0.3;

/// Intensity gained across the whole script
pub const INTENSITY_SPAN: f64 = 0.4;

/// Heartbeat at phase 0 (bpm)
pub const HEARTBEAT_FLOOR_BPM: u32 = 50;

/// Heartbeat gained across the whole script (bpm)
pub const HEARTBEAT_SPAN_BPM: u32 = 40;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

/// File designation shown in headers and mixed into the outcome hash
pub const FILE_DESIGNATION: &str = "IGN-Λ17";
