//! Audio backends
//!
//! The terminal has no mixer, so the bell stands in for the discrete cues and
//! the ambient layer (intensity, heartbeat) is only traced.

use std::io::{IsTerminal, Write};
use tracing::trace;

use crate::core::sinks::AudioSink;
use crate::error::SinkError;

const BEL: &[u8] = b"\x07";

/// Rings the terminal bell on discrete cues
pub struct TerminalBell<W: Write + Send> {
    out: W,
    ready: bool,
    require_tty: bool,
}

impl TerminalBell<std::io::Stdout> {
    /// Bell on stdout; unavailable when stdout is not a terminal
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
            ready: false,
            require_tty: true,
        }
    }
}

impl<W: Write + Send> TerminalBell<W> {
    /// Bell on an arbitrary writer, no terminal check
    pub fn new(out: W) -> Self {
        Self {
            out,
            ready: false,
            require_tty: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn ring(&mut self, times: usize) -> Result<(), SinkError> {
        if !self.ready {
            return Err(SinkError::AudioUnavailable("bell not initialized".to_string()));
        }
        for _ in 0..times {
            self.out.write_all(BEL)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> AudioSink for TerminalBell<W> {
    fn initialize(&mut self) -> Result<(), SinkError> {
        if self.require_tty && !std::io::stdout().is_terminal() {
            return Err(SinkError::AudioUnavailable("stdout is not a terminal".to_string()));
        }
        self.ready = true;
        Ok(())
    }

    fn teardown(&mut self) {
        self.ready = false;
    }

    fn on_hesitation(&mut self) -> Result<(), SinkError> {
        self.ring(1)
    }

    fn on_choice_resolved(&mut self, was_deviant: bool) -> Result<(), SinkError> {
        // Compliance is silent
        if was_deviant {
            self.ring(2)
        } else {
            Ok(())
        }
    }

    fn on_revelation_start(&mut self) -> Result<(), SinkError> {
        self.ring(1)
    }

    fn on_session_locked(&mut self) -> Result<(), SinkError> {
        self.ring(3)
    }

    fn set_intensity(&mut self, intensity: f64) -> Result<(), SinkError> {
        trace!(intensity, "ambient intensity");
        Ok(())
    }

    fn set_heartbeat_rate(&mut self, bpm: u32) -> Result<(), SinkError> {
        trace!(bpm, "heartbeat rate");
        Ok(())
    }
}

/// Backend for `--no-audio`: accepts everything, plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn initialize(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn teardown(&mut self) {}

    fn on_hesitation(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_choice_resolved(&mut self, _was_deviant: bool) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_revelation_start(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_session_locked(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn set_intensity(&mut self, _intensity: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn set_heartbeat_rate(&mut self, _bpm: u32) -> Result<(), SinkError> {
        Ok(())
    }
}
