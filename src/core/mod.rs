//! Core modules for VIGIL

pub mod script;
pub mod lifecycle;
pub mod tracker;
pub mod sinks;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod controller;
pub mod terminal;
pub mod audio;
pub mod runtime;

pub use script::{PhaseScript, generate_outcome_hash, clock_seed};
pub use lifecycle::{SessionLifecycle, AdvanceOutcome};
pub use tracker::{ChoiceTracker, Resolution, RevelationFrame, RevelationReplay, RevelationStep};
pub use sinks::{
    AudioChannel, AudioCue, AudioSink, AudioStatus, Notification, PresentationSink, ambience_for,
};
#[cfg(any(test, feature = "test-util"))]
pub use recording::{RecordingAudio, RecordingPresenter};
pub use controller::{Effect, Event, Scheduled, SubPhaseController, Timer, Transition};
pub use terminal::TerminalPresenter;
pub use audio::{SilentAudio, TerminalBell};
pub use runtime::{Input, SessionRunner, spawn_stdin_reader};
