//! In-memory sinks for driving sessions in tests
//!
//! Compiled for unit tests and behind the `test-util` feature.

use std::sync::{Arc, Mutex};

use crate::core::sinks::{AudioCue, AudioSink, Notification, PresentationSink};
use crate::error::SinkError;
use crate::types::SessionView;

/// Presentation sink that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<Vec<(SessionView, Notification)>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything presented so far
    pub fn entries(&self) -> Vec<(SessionView, Notification)> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.entries().into_iter().map(|(_, note)| note).collect()
    }
}

impl PresentationSink for RecordingPresenter {
    fn present(&mut self, view: &SessionView, note: &Notification) -> Result<(), SinkError> {
        if let Ok(mut log) = self.log.lock() {
            log.push((view.clone(), note.clone()));
        }
        Ok(())
    }
}

/// Audio sink that records cues; can be told to fail
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Arc<Mutex<Vec<AudioCue>>>,
    fail_init: bool,
    fail_cues: bool,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that cannot be initialized
    pub fn unavailable() -> Self {
        Self { fail_init: true, ..Self::default() }
    }

    /// Backend that initializes but errors on every cue
    pub fn failing() -> Self {
        Self { fail_cues: true, ..Self::default() }
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&mut self, cue: AudioCue) -> Result<(), SinkError> {
        if self.fail_cues {
            return Err(SinkError::AudioUnavailable("cue rejected".to_string()));
        }
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
        Ok(())
    }
}

impl AudioSink for RecordingAudio {
    fn initialize(&mut self) -> Result<(), SinkError> {
        if self.fail_init {
            return Err(SinkError::AudioUnavailable("no backend".to_string()));
        }
        Ok(())
    }

    fn teardown(&mut self) {}

    fn on_hesitation(&mut self) -> Result<(), SinkError> {
        self.record(AudioCue::Hesitation)
    }

    fn on_choice_resolved(&mut self, was_deviant: bool) -> Result<(), SinkError> {
        self.record(AudioCue::ChoiceResolved { deviant: was_deviant })
    }

    fn on_revelation_start(&mut self) -> Result<(), SinkError> {
        self.record(AudioCue::RevelationStart)
    }

    fn on_session_locked(&mut self) -> Result<(), SinkError> {
        self.record(AudioCue::SessionLocked)
    }

    fn set_intensity(&mut self, intensity: f64) -> Result<(), SinkError> {
        self.record(AudioCue::Intensity(intensity))
    }

    fn set_heartbeat_rate(&mut self, bpm: u32) -> Result<(), SinkError> {
        self.record(AudioCue::HeartbeatRate(bpm))
    }
}
