//! Virtual-time driver for the controller
//!
//! Timers go into a queue keyed by due time; `step` jumps the clock to the
//! earliest one and fires it. No real time passes.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use vigil::core::{Effect, Event, Notification, PhaseScript, SubPhaseController, Transition};
use vigil::types::{ChoiceOption, ContentBlock, Pacing, PhaseDefinition, PhaseKind, ReasonCode};

pub const TEST_HASH: &str = "ABCD-1234-EF56";

pub struct Sim {
    pub ctrl: SubPhaseController,
    origin: Instant,
    elapsed: Duration,
    seq: u64,
    queue: Vec<(Duration, u64, Event)>,
    pub reasons: Vec<ReasonCode>,
    pub notes: Vec<(Duration, Notification)>,
}

impl Sim {
    pub fn new(script: PhaseScript, pacing: Pacing) -> Self {
        Self::from_controller(SubPhaseController::new(script, pacing, TEST_HASH))
    }

    pub fn from_controller(ctrl: SubPhaseController) -> Self {
        Self {
            ctrl,
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            seq: 0,
            queue: Vec::new(),
            reasons: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn start(&mut self) -> ReasonCode {
        self.apply(Event::Start)
    }

    pub fn apply(&mut self, event: Event) -> ReasonCode {
        let now = self.origin + self.elapsed;
        let transition: Transition = self.ctrl.handle(event, now);
        for effect in &transition.effects {
            match effect {
                Effect::Schedule(s) => {
                    self.seq += 1;
                    self.queue.push((self.elapsed + s.after, self.seq, s.event()));
                }
                Effect::Present(_, note) => self.notes.push((self.elapsed, note.clone())),
                Effect::Cue(_) | Effect::Finished => {}
            }
        }
        self.reasons.push(transition.reason);
        transition.reason
    }

    pub fn select(&mut self, option_id: &str) -> ReasonCode {
        self.apply(Event::ChoiceSelected {
            option_id: option_id.to_string(),
        })
    }

    /// Fire the earliest pending timer
    pub fn step(&mut self) -> Option<ReasonCode> {
        let next = self
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(_, (due, seq, _))| (*due, *seq))
            .map(|(i, _)| i)?;
        let (due, _, event) = self.queue.remove(next);
        self.elapsed = self.elapsed.max(due);
        Some(self.apply(event))
    }

    /// Let `ms` of virtual time pass, firing whatever falls due
    pub fn wait(&mut self, ms: u64) {
        let until = self.elapsed + Duration::from_millis(ms);
        while let Some(due) = self.queue.iter().map(|(due, _, _)| *due).min() {
            if due > until {
                break;
            }
            self.step();
        }
        self.elapsed = until;
    }

    /// Step until options are selectable (or nothing is left to run)
    pub fn run_until_choice(&mut self) -> bool {
        for _ in 0..10_000 {
            if self.ctrl.awaiting_choice() {
                return true;
            }
            if self.step().is_none() {
                return false;
            }
        }
        false
    }

    /// Step until the session locks (or nothing is left to run)
    pub fn run_to_lock(&mut self) -> bool {
        for _ in 0..10_000 {
            if self.ctrl.is_locked() {
                return true;
            }
            if self.step().is_none() {
                return self.ctrl.is_locked();
            }
        }
        false
    }

    /// Answer every choice with the option `pick` names for its phase
    pub fn play(&mut self, pick: impl Fn(&str) -> &'static str) -> bool {
        loop {
            if !self.run_until_choice() {
                return self.run_to_lock();
            }
            let phase_id = self.ctrl.view().phase_id;
            self.select(pick(&phase_id));
        }
    }

    pub fn count(&self, pred: impl Fn(&Notification) -> bool) -> usize {
        self.notes.iter().filter(|(_, n)| pred(n)).count()
    }
}

/// Choice phase "p0" (Stay predicted) followed by final phase "p1"
pub fn stay_or_leave() -> PhaseScript {
    PhaseScript::new(
        vec![
            PhaseDefinition::new("p0", PhaseKind::Choice, vec![ContentBlock::text("A door.")])
                .with_choices(vec![
                    ChoiceOption::new("a", "Stay", "a", "You stayed."),
                    ChoiceOption::new("b", "Leave", "a", "You stayed anyway."),
                ]),
            PhaseDefinition::new("p1", PhaseKind::Final, vec![ContentBlock::text("End.")]),
        ],
        vec![ContentBlock::hollow("Archived.")],
    )
    .expect("non-empty script")
}

/// The compliant answer for every choice in the built-in file
pub fn compliant(phase_id: &str) -> &'static str {
    match phase_id {
        "briefing" => "proceed",
        "observation_1" => "left",
        "observation_2" => "silent",
        "deviation_test" => "third",
        _ => "none",
    }
}

/// A deviant answer for every choice in the built-in file
pub fn deviant(phase_id: &str) -> &'static str {
    match phase_id {
        "briefing" => "decline",
        "observation_1" => "right",
        "observation_2" => "answer",
        "deviation_test" => "first",
        _ => "none",
    }
}
