//! Sub-phase controller: explicit state machine over the phase script
//!
//! Stage flow inside a phase:
//! - CONTENT → SYSTEM: content revealed and the phase has system messages
//! - CONTENT/SYSTEM → CHOICE: the phase has options
//! - CONTENT/SYSTEM → REVELATION: the phase is a revelation
//! - otherwise → auto-advance after a pacing delay
//! - CHOICE → advance after the convergence dwell
//! - REVELATION → advance after the replay completes
//!
//! Advancing past the last phase starts CLOSING, and LOCKED follows after a delay.
//!
//! `handle` never sleeps or performs I/O. It returns the effects to run:
//! timers to schedule (tagged with the current epoch), notifications for
//! presentation and cues for audio.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::lifecycle::{AdvanceOutcome, SessionLifecycle};
use crate::core::script::{generate_outcome_hash, PhaseScript};
use crate::core::sinks::{ambience_for, AudioCue, Notification};
use crate::core::tracker::{ChoiceTracker, RevelationFrame, RevelationReplay};
use crate::types::{
    ChoiceOption, Pacing, PhaseDefinition, PhaseKind, ReasonCode, SessionState, SessionView,
    SubPhase,
};

/// Timer kinds the controller schedules for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    RevealBlock,
    RevealMessage,
    SystemComplete,
    ShowChoices,
    Hesitation,
    ChoiceProcessed,
    ConvergenceComplete,
    RevelationTick,
    Advance,
    RevealClosingBlock,
    Lock,
}

/// Controller input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Enter the first phase
    Start,
    /// A scheduled timer fired
    Timer { epoch: u64, timer: Timer },
    /// The user picked an option
    ChoiceSelected { option_id: String },
}

/// A timer request; the runtime cancels it when `epoch` is superseded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub after: Duration,
    pub epoch: u64,
    pub timer: Timer,
}

impl Scheduled {
    /// The event to deliver when this timer fires
    pub fn event(&self) -> Event {
        Event::Timer {
            epoch: self.epoch,
            timer: self.timer,
        }
    }
}

/// Work for the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Schedule(Scheduled),
    /// Notification plus the view at the moment it was emitted
    Present(SessionView, Notification),
    Cue(AudioCue),
    /// Session locked; nothing further will happen
    Finished,
}

/// Result of one `handle` call
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub reason: ReasonCode,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn ignored(reason: ReasonCode) -> Self {
        Self {
            reason,
            effects: Vec::new(),
        }
    }

    /// Timers requested by this transition
    pub fn scheduled(&self) -> impl Iterator<Item = &Scheduled> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Schedule(s) => Some(s),
            _ => None,
        })
    }

    /// Notifications emitted by this transition
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Present(_, note) => Some(note),
            _ => None,
        })
    }

    /// Audio cues emitted by this transition
    pub fn cues(&self) -> impl Iterator<Item = &AudioCue> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Cue(cue) => Some(cue),
            _ => None,
        })
    }
}

/// Stages of the choice sub-phase
#[derive(Debug, Clone)]
enum ChoiceStage {
    /// Prompt delay; options not selectable yet
    Awaiting,
    /// Options visible since `visible_at`
    Open {
        visible_at: Instant,
        hesitation_acknowledged: bool,
    },
    /// A pick was accepted and is being processed
    Processing { option: ChoiceOption, hesitation_ms: u64 },
    /// Convergence text on screen
    Converging,
}

#[derive(Debug, Clone)]
enum Stage {
    /// Before `Start`
    Idle,
    Content,
    System,
    Choice(ChoiceStage),
    Revelation {
        replay: RevelationReplay,
        pending: Option<RevelationFrame>,
    },
    /// Waiting out a pacing delay before the next phase
    Advancing,
    /// `lock_due` is set when the lock timer fires before the closing text ends
    Closing { lock_due: bool },
    Locked,
}

/// Drives the session through the script
#[derive(Debug)]
pub struct SubPhaseController {
    script: Arc<PhaseScript>,
    session: SessionLifecycle,
    tracker: ChoiceTracker,
    pacing: Pacing,
    stage: Stage,
    sub_phase: SubPhase,
    /// Bumped on every phase entry and at closing; stale timers are dropped
    epoch: u64,
    visible_blocks: usize,
    visible_messages: usize,
    visible_closing: usize,
}

impl SubPhaseController {
    /// Create a controller for a fresh session
    ///
    /// The outcome hash is fixed here, once.
    pub fn new(script: PhaseScript, pacing: Pacing, outcome_hash: impl Into<String>) -> Self {
        let session = SessionLifecycle::new(script.len(), outcome_hash);
        let tracker = ChoiceTracker::new(&pacing);
        Self {
            script: Arc::new(script),
            session,
            tracker,
            pacing,
            stage: Stage::Idle,
            sub_phase: SubPhase::Content,
            epoch: 0,
            visible_blocks: 0,
            visible_messages: 0,
            visible_closing: 0,
        }
    }

    /// Create a controller whose outcome hash derives from `seed`
    pub fn with_seed(script: PhaseScript, pacing: Pacing, seed: u64) -> Self {
        Self::new(script, pacing, generate_outcome_hash(seed))
    }

    /// Apply one event at time `now`
    pub fn handle(&mut self, event: Event, now: Instant) -> Transition {
        if self.session.is_locked() {
            return Transition::ignored(ReasonCode::R904_SESSION_LOCKED);
        }

        let mut fx = Vec::new();
        let reason = match event {
            Event::Start => {
                if matches!(self.stage, Stage::Idle) {
                    self.enter_phase(&mut fx)
                } else {
                    ReasonCode::R907_ALREADY_STARTED
                }
            }
            Event::Timer { epoch, timer } => {
                if epoch != self.epoch {
                    ReasonCode::R905_TIMER_STALE
                } else {
                    self.on_timer(timer, now, &mut fx)
                }
            }
            Event::ChoiceSelected { option_id } => self.on_select(&option_id, now, &mut fx),
        };

        debug!(
            reason = reason.code(),
            phase = self.session.phase_index(),
            sub_phase = %self.sub_phase,
            epoch = self.epoch,
            effects = fx.len(),
            "transition"
        );

        Transition { reason, effects: fx }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn on_timer(&mut self, timer: Timer, now: Instant, fx: &mut Vec<Effect>) -> ReasonCode {
        let script = Arc::clone(&self.script);
        let Some(phase) = script.phase(self.session.phase_index()) else {
            return ReasonCode::R906_TIMER_UNEXPECTED;
        };

        match (&mut self.stage, timer) {
            (Stage::Content, Timer::RevealBlock) => {
                let Some(block) = phase.content.get(self.visible_blocks) else {
                    return self.content_complete(phase, true, fx);
                };
                self.visible_blocks += 1;
                self.present(fx, Notification::BlockRevealed(block.clone()));
                if self.visible_blocks < phase.content.len() {
                    self.schedule_block(phase, fx);
                    ReasonCode::R102_BLOCK_REVEALED
                } else {
                    self.content_complete(phase, true, fx)
                }
            }

            (Stage::System, Timer::RevealMessage) => {
                if let Some(message) = phase.system_messages.get(self.visible_messages) {
                    self.visible_messages += 1;
                    self.present(fx, Notification::SystemMessage(message.clone()));
                }
                if self.visible_messages < phase.system_messages.len() {
                    self.schedule(fx, self.pacing.system_message_interval_ms, Timer::RevealMessage);
                    ReasonCode::R103_SYSTEM_MESSAGE_REVEALED
                } else {
                    self.schedule(fx, self.pacing.system_complete_delay_ms, Timer::SystemComplete);
                    ReasonCode::R104_SYSTEM_COMPLETE_PENDING
                }
            }

            (Stage::System, Timer::SystemComplete) => self.content_complete(phase, false, fx),

            (Stage::Choice(ChoiceStage::Awaiting), Timer::ShowChoices) => {
                self.stage = Stage::Choice(ChoiceStage::Open {
                    visible_at: now,
                    hesitation_acknowledged: false,
                });
                self.present(fx, Notification::ChoicesPresented(phase.choices.clone()));
                self.schedule(fx, self.pacing.hesitation_threshold_ms, Timer::Hesitation);
                ReasonCode::R202_CHOICE_OPEN
            }

            (
                Stage::Choice(ChoiceStage::Open {
                    hesitation_acknowledged,
                    ..
                }),
                Timer::Hesitation,
            ) if !*hesitation_acknowledged => {
                *hesitation_acknowledged = true;
                fx.push(Effect::Cue(AudioCue::Hesitation));
                self.present(fx, Notification::HesitationAcknowledged);
                ReasonCode::R203_HESITATION_DETECTED
            }

            (Stage::Choice(ChoiceStage::Processing { option, hesitation_ms }), Timer::ChoiceProcessed) => {
                let option = option.clone();
                let hesitation_ms = *hesitation_ms;
                self.stage = Stage::Choice(ChoiceStage::Converging);
                match self.tracker.resolve(&mut self.session, phase, &option, hesitation_ms) {
                    Some(resolution) => {
                        fx.push(Effect::Cue(AudioCue::ChoiceResolved {
                            deviant: resolution.deviant,
                        }));
                        self.present(fx, Notification::Convergence(resolution.convergence_text));
                    }
                    None => {
                        // Not reachable while unlocked; keep the phase moving regardless
                        self.present(fx, Notification::Convergence(option.convergence_text));
                    }
                }
                self.schedule(fx, self.pacing.convergence_dwell_ms, Timer::ConvergenceComplete);
                ReasonCode::R205_CHOICE_RESOLVED
            }

            (Stage::Choice(ChoiceStage::Converging), Timer::ConvergenceComplete) => self.advance(fx),

            (Stage::Revelation { replay, pending }, Timer::RevelationTick) => {
                let frame = pending.take();
                let next = replay.next();
                if let Some(step) = &next {
                    *pending = Some(step.frame.clone());
                }
                if let Some(frame) = frame {
                    self.present(fx, Notification::Revelation(frame));
                }
                match next {
                    Some(step) => {
                        self.schedule_after(fx, step.delay, Timer::RevelationTick);
                        ReasonCode::R302_REVELATION_FRAME
                    }
                    None => {
                        self.session.mark_revelation_triggered();
                        self.stage = Stage::Advancing;
                        self.schedule(fx, self.pacing.revelation_advance_delay_ms, Timer::Advance);
                        ReasonCode::R303_REVELATION_COMPLETE
                    }
                }
            }

            (Stage::Advancing, Timer::Advance) => self.advance(fx),

            (Stage::Closing { lock_due }, Timer::RevealClosingBlock) => {
                let lock_due = *lock_due;
                if let Some(block) = script.closing().get(self.visible_closing) {
                    self.visible_closing += 1;
                    self.present(fx, Notification::ClosingBlock(block.clone()));
                }
                if self.visible_closing < script.closing().len() {
                    self.schedule_closing_block(fx);
                } else if lock_due {
                    return self.lock_session(fx);
                }
                ReasonCode::R402_CLOSING_BLOCK_REVEALED
            }

            (Stage::Closing { lock_due }, Timer::Lock) => {
                if self.visible_closing < script.closing().len() {
                    // Lock waits for the last closing block
                    *lock_due = true;
                    ReasonCode::R404_LOCK_DEFERRED
                } else {
                    self.lock_session(fx)
                }
            }

            _ => ReasonCode::R906_TIMER_UNEXPECTED,
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    fn on_select(&mut self, option_id: &str, now: Instant, fx: &mut Vec<Effect>) -> ReasonCode {
        let visible_at = match &self.stage {
            Stage::Choice(ChoiceStage::Open { visible_at, .. }) => *visible_at,
            Stage::Choice(ChoiceStage::Processing { .. } | ChoiceStage::Converging) => {
                return ReasonCode::R902_INPUT_BUSY;
            }
            _ => return ReasonCode::R901_INPUT_NOT_PENDING,
        };

        let script = Arc::clone(&self.script);
        let Some(option) = script
            .phase(self.session.phase_index())
            .and_then(|p| p.choice(option_id))
        else {
            return ReasonCode::R903_INPUT_UNKNOWN_OPTION;
        };

        let hesitation_ms = now.saturating_duration_since(visible_at).as_millis() as u64;
        let delay = self.pacing.processing_delay(option.is_deviant());

        self.stage = Stage::Choice(ChoiceStage::Processing {
            option: option.clone(),
            hesitation_ms,
        });
        self.present(fx, Notification::Processing {
            label: option.label.clone(),
        });
        self.schedule_after(fx, delay, Timer::ChoiceProcessed);
        ReasonCode::R204_CHOICE_PROCESSING
    }

    // =========================================================================
    // Phase flow
    // =========================================================================

    fn enter_phase(&mut self, fx: &mut Vec<Effect>) -> ReasonCode {
        self.epoch += 1;
        self.stage = Stage::Content;
        self.sub_phase = SubPhase::Content;
        self.visible_blocks = 0;
        self.visible_messages = 0;

        let script = Arc::clone(&self.script);
        let index = self.session.phase_index();
        let Some(phase) = script.phase(index) else {
            return self.begin_closing(fx);
        };

        info!(phase = index, phase_id = %phase.id, kind = %phase.kind, "phase entered");
        self.present(fx, Notification::PhaseEntered);

        let (intensity, bpm) = ambience_for(self.session.progress());
        fx.push(Effect::Cue(AudioCue::Intensity(intensity)));
        fx.push(Effect::Cue(AudioCue::HeartbeatRate(bpm)));

        if phase.content.is_empty() {
            self.content_complete(phase, true, fx);
        } else {
            self.schedule_block(phase, fx);
        }
        ReasonCode::R101_PHASE_ENTERED
    }

    /// Decide what follows the content (or system) stage
    fn content_complete(
        &mut self,
        phase: &PhaseDefinition,
        allow_system: bool,
        fx: &mut Vec<Effect>,
    ) -> ReasonCode {
        if allow_system && !phase.system_messages.is_empty() {
            self.stage = Stage::System;
            self.sub_phase = SubPhase::System;
            self.schedule(fx, self.pacing.system_message_interval_ms, Timer::RevealMessage);
            ReasonCode::R106_SYSTEM_STARTED
        } else if !phase.choices.is_empty() {
            self.stage = Stage::Choice(ChoiceStage::Awaiting);
            self.sub_phase = SubPhase::Choice;
            self.present(fx, Notification::AwaitingInput);
            self.schedule(fx, self.pacing.choice_prompt_delay_ms, Timer::ShowChoices);
            ReasonCode::R201_CHOICE_PROMPTED
        } else if phase.kind == PhaseKind::Revelation {
            self.start_revelation(fx)
        } else {
            // Also the fallback for a choice phase without options
            self.stage = Stage::Advancing;
            self.schedule(fx, self.pacing.auto_advance_delay_ms, Timer::Advance);
            ReasonCode::R105_AUTO_ADVANCE_SCHEDULED
        }
    }

    fn start_revelation(&mut self, fx: &mut Vec<Effect>) -> ReasonCode {
        let mut replay = self.tracker.replay_for_revelation(
            self.session.history(),
            &self.session.metrics().predicted_outcome_hash,
        );
        let first = replay.next();
        let delay = first.as_ref().map(|s| s.delay).unwrap_or_default();

        self.sub_phase = SubPhase::Revelation;
        self.stage = Stage::Revelation {
            replay,
            pending: first.map(|s| s.frame),
        };
        fx.push(Effect::Cue(AudioCue::RevelationStart));
        self.schedule_after(fx, delay, Timer::RevelationTick);
        ReasonCode::R301_REVELATION_STARTED
    }

    fn advance(&mut self, fx: &mut Vec<Effect>) -> ReasonCode {
        match self.session.advance() {
            AdvanceOutcome::Advanced(_) => self.enter_phase(fx),
            AdvanceOutcome::ClosingStarted => self.begin_closing(fx),
            AdvanceOutcome::Ignored => ReasonCode::R906_TIMER_UNEXPECTED,
        }
    }

    fn begin_closing(&mut self, fx: &mut Vec<Effect>) -> ReasonCode {
        self.epoch += 1;
        self.stage = Stage::Closing { lock_due: false };
        self.sub_phase = SubPhase::Closing;
        self.visible_closing = 0;

        fx.push(Effect::Cue(AudioCue::SessionLocked));
        self.schedule_closing_block(fx);
        self.schedule(fx, self.pacing.lock_delay_ms, Timer::Lock);
        ReasonCode::R401_CLOSING_STARTED
    }

    fn lock_session(&mut self, fx: &mut Vec<Effect>) -> ReasonCode {
        self.session.lock();
        self.stage = Stage::Locked;
        self.sub_phase = SubPhase::Locked;
        self.present(fx, Notification::Locked);
        fx.push(Effect::Finished);
        ReasonCode::R403_SESSION_LOCKED
    }

    // =========================================================================
    // Effect helpers
    // =========================================================================

    fn schedule(&self, fx: &mut Vec<Effect>, ms: u64, timer: Timer) {
        self.schedule_after(fx, self.pacing.scaled(ms), timer);
    }

    fn schedule_after(&self, fx: &mut Vec<Effect>, after: Duration, timer: Timer) {
        fx.push(Effect::Schedule(Scheduled {
            after,
            epoch: self.epoch,
            timer,
        }));
    }

    fn schedule_block(&self, phase: &PhaseDefinition, fx: &mut Vec<Effect>) {
        if let Some(block) = phase.content.get(self.visible_blocks) {
            let delay = self.pacing.block_delay(phase.delay_ms.unwrap_or(0), block.delay_ms);
            self.schedule_after(fx, delay, Timer::RevealBlock);
        }
    }

    fn schedule_closing_block(&self, fx: &mut Vec<Effect>) {
        if let Some(block) = self.script.closing().get(self.visible_closing) {
            let delay = self.pacing.block_delay(self.pacing.closing_base_delay_ms, block.delay_ms);
            self.schedule_after(fx, delay, Timer::RevealClosingBlock);
        }
    }

    fn present(&self, fx: &mut Vec<Effect>, note: Notification) {
        fx.push(Effect::Present(self.view(), note));
    }

    // =========================================================================
    // Read-only access
    // =========================================================================

    /// Projection for presentation
    pub fn view(&self) -> SessionView {
        let index = self.session.phase_index();
        let phase = self.script.phase(index);
        let choices = match (&self.stage, phase) {
            (Stage::Choice(ChoiceStage::Open { .. }), Some(p)) => p.choices.clone(),
            _ => Vec::new(),
        };

        SessionView {
            phase_index: index,
            total_phases: self.script.len(),
            phase_id: phase.map(|p| p.id.clone()).unwrap_or_default(),
            phase_kind: phase.map(|p| p.kind).unwrap_or(PhaseKind::Final),
            sub_phase: self.sub_phase,
            visible_blocks: self.visible_blocks,
            visible_messages: self.visible_messages,
            choices,
            is_locked: self.session.is_locked(),
        }
    }

    pub fn session(&self) -> &SessionLifecycle {
        &self.session
    }

    /// Snapshot of the session state
    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn script(&self) -> &PhaseScript {
        &self.script
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn sub_phase(&self) -> SubPhase {
        self.sub_phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Options selectable right now (empty unless a choice is open)
    pub fn open_choices(&self) -> Vec<ChoiceOption> {
        self.view().choices
    }

    /// Is a pick currently accepted?
    pub fn awaiting_choice(&self) -> bool {
        matches!(self.stage, Stage::Choice(ChoiceStage::Open { .. }))
    }

    /// Is an earlier pick still being processed or converging?
    pub fn choice_in_flight(&self) -> bool {
        matches!(
            self.stage,
            Stage::Choice(ChoiceStage::Processing { .. } | ChoiceStage::Converging)
        )
    }

    pub fn is_locked(&self) -> bool {
        self.session.is_locked()
    }
}

// =============================================================================
// TESTS
// =============================================================================
