//! Async session runner
//!
//! Owns the controller and both sinks on a single task. Timers are spawned
//! as sleeps racing a per-epoch cancellation token, so a phase change kills
//! every timer the previous phase left behind. Zero-delay timers skip the
//! scheduler and go through a local FIFO to keep their order.

use std::collections::VecDeque;
use std::io::BufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::controller::{Effect, Event, Scheduled, SubPhaseController, Transition};
use crate::core::sinks::{AudioChannel, AudioSink, AudioStatus, PresentationSink};
use crate::error::VigilError;
use crate::types::{ReasonCode, SessionState};

/// A line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 1-based position in the visible option list
    Select(usize),
    /// Option id
    SelectId(String),
    /// Leave the session; accepted in every stage
    Quit,
}

impl Input {
    /// Parse a line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Some(Input::Quit);
        }
        match line.parse::<usize>() {
            Ok(n) => Some(Input::Select(n)),
            Err(_) => Some(Input::SelectId(line.to_string())),
        }
    }
}

/// Forward stdin lines to `tx` from a blocking thread
///
/// The thread ends at EOF or once the receiver is dropped.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Input>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            };
            if let Some(input) = Input::parse(&line) {
                if tx.blocking_send(input).is_err() {
                    break;
                }
            }
        }
        debug!("stdin reader finished");
    })
}

/// Drives one session from `Start` to lock
pub struct SessionRunner<P: PresentationSink, A: AudioSink> {
    controller: SubPhaseController,
    presenter: P,
    audio: AudioChannel<A>,
    cancel: CancellationToken,
    epoch_token: CancellationToken,
    epoch: u64,
    ready: VecDeque<Event>,
    held: VecDeque<Input>,
    timer_tx: mpsc::UnboundedSender<Event>,
    timer_rx: mpsc::UnboundedReceiver<Event>,
}

impl<P: PresentationSink, A: AudioSink> SessionRunner<P, A> {
    pub fn new(controller: SubPhaseController, presenter: P, audio: A, cancel: CancellationToken) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let epoch_token = cancel.child_token();
        let epoch = controller.epoch();
        Self {
            controller,
            presenter,
            audio: AudioChannel::new(audio),
            cancel,
            epoch_token,
            epoch,
            ready: VecDeque::new(),
            held: VecDeque::new(),
            timer_tx,
            timer_rx,
        }
    }

    pub fn controller(&self) -> &SubPhaseController {
        &self.controller
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.audio.status()
    }

    /// Run until the terminal locks
    ///
    /// Input is read in every stage. Lines typed before a choice opens are
    /// held and applied once the options appear; picks made while an earlier
    /// one is still processing are dropped. Returns the final state, or
    /// `Interrupted` on cancellation, `Quit`, or input closing while a choice
    /// is pending with nothing held.
    pub async fn run(mut self, mut input: mpsc::Receiver<Input>) -> Result<SessionState, VigilError> {
        info!(
            phases = self.controller.script().len(),
            outcome_hash = %self.controller.state().hidden_metrics.predicted_outcome_hash,
            "session started"
        );

        let result = self.drive(&mut input).await;

        self.epoch_token.cancel();
        self.audio.teardown();
        result
    }

    async fn drive(&mut self, input: &mut mpsc::Receiver<Input>) -> Result<SessionState, VigilError> {
        if self.apply(Event::Start) {
            return Ok(self.controller.state().clone());
        }

        let mut input_open = true;
        loop {
            if let Some(event) = self.ready.pop_front() {
                if self.apply(event) {
                    return Ok(self.controller.state().clone());
                }
                continue;
            }

            if self.controller.awaiting_choice() {
                if let Some(line) = self.held.pop_front() {
                    if let Some(event) = self.selection(line) {
                        if self.apply(event) {
                            return Ok(self.controller.state().clone());
                        }
                    }
                    continue;
                }
                if !input_open {
                    warn!("input closed while a choice is pending");
                    return Err(VigilError::Interrupted);
                }
            }

            let event = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("session cancelled");
                    return Err(VigilError::Interrupted);
                }
                Some(event) = self.timer_rx.recv() => event,
                line = input.recv(), if input_open => match line {
                    Some(Input::Quit) => {
                        info!(sub_phase = %self.controller.sub_phase(), "session abandoned by user");
                        return Err(VigilError::Interrupted);
                    }
                    Some(line) => {
                        self.audio.activate();
                        match self.accept(line) {
                            Some(event) => event,
                            None => continue,
                        }
                    }
                    None => {
                        debug!("input closed");
                        input_open = false;
                        continue;
                    }
                },
            };

            if self.apply(event) {
                return Ok(self.controller.state().clone());
            }
        }
    }

    /// Route a line read from input according to the current stage
    fn accept(&mut self, line: Input) -> Option<Event> {
        if self.controller.awaiting_choice() {
            return self.selection(line);
        }
        if self.controller.choice_in_flight() {
            debug!(
                reason = ReasonCode::R902_INPUT_BUSY.code(),
                ?line,
                "selection dropped while an earlier pick is pending"
            );
            return None;
        }
        if self.controller.is_locked() {
            return None;
        }
        self.held.push_back(line);
        None
    }

    /// Map user input onto an option of the open choice
    fn selection(&self, input: Input) -> Option<Event> {
        let choices = self.controller.open_choices();
        let option_id = match input {
            Input::Select(n) => match n.checked_sub(1).and_then(|i| choices.get(i)) {
                Some(option) => option.id.clone(),
                None => {
                    debug!(selection = n, available = choices.len(), "selection out of range");
                    return None;
                }
            },
            Input::SelectId(id) => id,
            Input::Quit => return None,
        };
        Some(Event::ChoiceSelected { option_id })
    }

    /// Feed one event to the controller and carry out its effects
    ///
    /// Returns true once the session has finished.
    fn apply(&mut self, event: Event) -> bool {
        let now = tokio::time::Instant::now().into_std();
        let Transition { reason, effects } = self.controller.handle(event, now);
        if reason.is_ignored() {
            debug!(reason = reason.code(), "event ignored");
        }

        if self.controller.epoch() != self.epoch {
            self.epoch_token.cancel();
            self.epoch_token = self.cancel.child_token();
            self.epoch = self.controller.epoch();
        }

        let mut finished = false;
        for effect in effects {
            match effect {
                Effect::Schedule(scheduled) => self.schedule(scheduled),
                Effect::Present(view, note) => {
                    if let Err(e) = self.presenter.present(&view, &note) {
                        warn!(error = %e, "presentation failed");
                    }
                }
                Effect::Cue(cue) => self.audio.cue(&cue),
                Effect::Finished => finished = true,
            }
        }
        finished
    }

    fn schedule(&mut self, scheduled: Scheduled) {
        let event = scheduled.event();
        if scheduled.after.is_zero() {
            self.ready.push_back(event);
            return;
        }

        let tx = self.timer_tx.clone();
        let token = self.epoch_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(scheduled.after) => {
                    let _ = tx.send(event);
                }
            }
        });
    }
}
