//! Collaborator interfaces: presentation and audio
//!
//! Both sinks are downstream observers. Calls are fire-and-forget; a failing
//! sink is logged and never reaches `SessionState`.

use tracing::{debug, warn};

use crate::core::tracker::RevelationFrame;
use crate::error::SinkError;
use crate::types::{ChoiceOption, ContentBlock, SessionView};
use crate::{HEARTBEAT_FLOOR_BPM, HEARTBEAT_SPAN_BPM, INTENSITY_FLOOR, INTENSITY_SPAN};

// =============================================================================
// PRESENTATION
// =============================================================================

/// Something presentation should show now
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A new phase became current (see the view for which)
    PhaseEntered,
    BlockRevealed(ContentBlock),
    SystemMessage(String),
    /// "Awaiting input protocol..."; options are not selectable yet
    AwaitingInput,
    ChoicesPresented(Vec<ChoiceOption>),
    /// "Hesitation detected. Take your time. The outcome is unchanged."
    HesitationAcknowledged,
    /// Selection accepted, being processed
    Processing { label: String },
    Convergence(String),
    Revelation(RevelationFrame),
    ClosingBlock(ContentBlock),
    Locked,
}

pub trait PresentationSink: Send {
    fn present(&mut self, view: &SessionView, note: &Notification) -> Result<(), SinkError>;
}

// =============================================================================
// AUDIO
// =============================================================================

/// Semantic audio events emitted by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    Hesitation,
    ChoiceResolved { deviant: bool },
    RevelationStart,
    SessionLocked,
    /// Ambient intensity, 0..1
    Intensity(f64),
    /// Heartbeat rate in bpm
    HeartbeatRate(u32),
}

/// Map phase progress (`phase / total`) to ambient intensity and heartbeat
pub fn ambience_for(progress: f64) -> (f64, u32) {
    let progress = progress.clamp(0.0, 1.0);
    let intensity = INTENSITY_FLOOR + progress * INTENSITY_SPAN;
    let heartbeat = HEARTBEAT_FLOOR_BPM + (progress * HEARTBEAT_SPAN_BPM as f64).floor() as u32;
    (intensity, heartbeat)
}

/// Platform audio backend
pub trait AudioSink: Send {
    /// Acquire the backend. Must be idempotent.
    fn initialize(&mut self) -> Result<(), SinkError>;
    /// Release everything the backend holds
    fn teardown(&mut self);
    fn on_hesitation(&mut self) -> Result<(), SinkError>;
    fn on_choice_resolved(&mut self, was_deviant: bool) -> Result<(), SinkError>;
    fn on_revelation_start(&mut self) -> Result<(), SinkError>;
    fn on_session_locked(&mut self) -> Result<(), SinkError>;
    fn set_intensity(&mut self, intensity: f64) -> Result<(), SinkError>;
    fn set_heartbeat_rate(&mut self, bpm: u32) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// Waiting for the first user interaction
    Dormant,
    Ready,
    /// Initialization failed; cues are dropped for the rest of the session
    Unavailable,
    TornDown,
}

/// Single owner of the session's audio sink
///
/// Initializes lazily on the first user interaction, remembers ambience set
/// before that, and swallows (logs) every backend failure.
#[derive(Debug)]
pub struct AudioChannel<A: AudioSink> {
    sink: A,
    status: AudioStatus,
    intensity: f64,
    heartbeat_bpm: u32,
}

impl<A: AudioSink> AudioChannel<A> {
    pub fn new(sink: A) -> Self {
        Self {
            sink,
            status: AudioStatus::Dormant,
            intensity: INTENSITY_FLOOR,
            heartbeat_bpm: HEARTBEAT_FLOOR_BPM,
        }
    }

    /// Called on user interaction. Only the first call does anything.
    pub fn activate(&mut self) {
        if self.status != AudioStatus::Dormant {
            return;
        }
        match self.sink.initialize() {
            Ok(()) => {
                self.status = AudioStatus::Ready;
                debug!("audio initialized");
                let (intensity, bpm) = (self.intensity, self.heartbeat_bpm);
                self.dispatch(&AudioCue::Intensity(intensity));
                self.dispatch(&AudioCue::HeartbeatRate(bpm));
            }
            Err(e) => {
                self.status = AudioStatus::Unavailable;
                warn!(error = %e, "audio unavailable; continuing silently");
            }
        }
    }

    /// Forward a cue if the backend is ready
    pub fn cue(&mut self, cue: &AudioCue) {
        match *cue {
            AudioCue::Intensity(v) => self.intensity = v,
            AudioCue::HeartbeatRate(bpm) => self.heartbeat_bpm = bpm,
            _ => {}
        }
        if self.status == AudioStatus::Ready {
            self.dispatch(cue);
        }
    }

    fn dispatch(&mut self, cue: &AudioCue) {
        let result = match *cue {
            AudioCue::Hesitation => self.sink.on_hesitation(),
            AudioCue::ChoiceResolved { deviant } => self.sink.on_choice_resolved(deviant),
            AudioCue::RevelationStart => self.sink.on_revelation_start(),
            AudioCue::SessionLocked => self.sink.on_session_locked(),
            AudioCue::Intensity(v) => self.sink.set_intensity(v),
            AudioCue::HeartbeatRate(bpm) => self.sink.set_heartbeat_rate(bpm),
        };
        if let Err(e) = result {
            warn!(error = %e, ?cue, "audio cue failed");
        }
    }

    /// Release the backend. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.status == AudioStatus::Ready {
            self.sink.teardown();
        }
        self.status = AudioStatus::TornDown;
    }

    pub fn status(&self) -> AudioStatus {
        self.status
    }

    /// Last ambience requested, whether or not it reached the backend
    pub fn ambience(&self) -> (f64, u32) {
        (self.intensity, self.heartbeat_bpm)
    }
}

// =============================================================================
// TESTS
// =============================================================================
