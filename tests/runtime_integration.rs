//! Integration tests for the async runner
//!
//! Runs under paused tokio time; sleeps complete as soon as the runtime is idle.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use vigil::core::{
    generate_outcome_hash, AudioCue, Input, Notification, PhaseScript, RecordingAudio,
    RecordingPresenter, SessionRunner, SubPhaseController,
};
use vigil::error::VigilError;
use vigil::types::{ChoiceOption, ContentBlock, Pacing, PhaseDefinition, PhaseKind, SubPhase};

fn builtin(pacing: Pacing) -> SubPhaseController {
    SubPhaseController::with_seed(PhaseScript::builtin(), pacing, 7)
}

async fn answers(inputs: Vec<Input>) -> mpsc::Receiver<Input> {
    let (tx, rx) = mpsc::channel(16);
    for input in inputs {
        tx.send(input).await.unwrap();
    }
    rx
}

/// Two back-to-back choice phases, then a final one
fn two_doors() -> PhaseScript {
    let door = |id: &str| {
        PhaseDefinition::new(id, PhaseKind::Choice, vec![ContentBlock::text("A door.")]).with_choices(vec![
            ChoiceOption::new("a", "Stay", "a", "You stayed."),
            ChoiceOption::new("b", "Leave", "a", "You stayed anyway."),
        ])
    };
    PhaseScript::new(
        vec![
            door("p0"),
            door("p1"),
            PhaseDefinition::new("p2", PhaseKind::Final, vec![ContentBlock::text("End.")]),
        ],
        vec![],
    )
    .unwrap()
}

fn mixed_answers() -> Vec<Input> {
    vec![
        Input::Select(1),
        Input::Select(2),
        Input::SelectId("answer".to_string()),
        Input::Select(3),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_builtin_session_reaches_lock() {
    let presenter = RecordingPresenter::new();
    let audio = RecordingAudio::new();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        presenter.clone(),
        audio.clone(),
        CancellationToken::new(),
    );

    let state = assert_ok!(runner.run(answers(mixed_answers()).await).await);

    assert!(state.is_locked);
    assert!(state.revelation_triggered);
    assert_eq!(state.phase, 7);
    assert_eq!(state.choice_history.len(), 4);
    assert_eq!(state.deviation_count(), 2);
    assert_eq!(state.hidden_metrics.resistance_attempts, 2);
    assert_eq!(state.hidden_metrics.pattern_deviation, 10);
    assert_eq!(state.hidden_metrics.predicted_outcome_hash, generate_outcome_hash(7));

    let selected: Vec<&str> = state
        .choice_history
        .iter()
        .map(|c| c.option_selected.as_str())
        .collect();
    assert_eq!(
        selected,
        vec![
            "Proceed with the review.",
            "Open the right door.",
            "Answer the voice.",
            "Choose the option you think was not predicted.",
        ]
    );

    let entries = presenter.entries();
    let (last_view, last_note) = entries.last().unwrap();
    assert_eq!(*last_note, Notification::Locked);
    assert_eq!(last_view.sub_phase, SubPhase::Locked);
    assert!(last_view.is_locked);
    let revelation_frames = entries
        .iter()
        .filter(|(_, n)| matches!(n, Notification::Revelation(_)))
        .count();
    assert_eq!(revelation_frames, 6);

    let cues = audio.cues();
    assert_eq!(
        cues.iter()
            .filter(|c| **c == AudioCue::ChoiceResolved { deviant: true })
            .count(),
        2
    );
    assert!(cues.contains(&AudioCue::RevelationStart));
    assert!(cues.contains(&AudioCue::SessionLocked));
}

#[tokio::test(start_paused = true)]
async fn test_buffered_answers_wait_for_options() {
    let presenter = RecordingPresenter::new();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        presenter.clone(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );

    let state = assert_ok!(runner.run(answers(mixed_answers()).await).await);

    // Every pick was applied the moment its options appeared
    assert!(state.choice_history.iter().all(|c| c.hesitation_ms == 0));
    assert!(!presenter
        .notifications()
        .contains(&Notification::HesitationAcknowledged));
}

#[tokio::test(start_paused = true)]
async fn test_instant_pacing_keeps_order() {
    let presenter = RecordingPresenter::new();
    let runner = SessionRunner::new(
        builtin(Pacing::instant()),
        presenter.clone(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );

    let state = assert_ok!(runner.run(answers(mixed_answers()).await).await);
    assert!(state.is_locked);

    let notes = presenter.notifications();
    let closing = notes
        .iter()
        .filter(|n| matches!(n, Notification::ClosingBlock(_)))
        .count();
    assert_eq!(closing, PhaseScript::builtin().closing().len());

    let conclusion = notes
        .iter()
        .position(|n| *n == Notification::Revelation(vigil::core::RevelationFrame::Conclusion))
        .unwrap();
    let first_closing = notes
        .iter()
        .position(|n| matches!(n, Notification::ClosingBlock(_)))
        .unwrap();
    assert!(conclusion < first_closing);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_audio_does_not_change_outcome() {
    let audio = RecordingAudio::unavailable();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        RecordingPresenter::new(),
        audio.clone(),
        CancellationToken::new(),
    );

    let state = assert_ok!(runner.run(answers(mixed_answers()).await).await);
    assert!(state.is_locked);
    assert_eq!(state.choice_history.len(), 4);
    assert!(audio.cues().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failing_audio_does_not_change_outcome() {
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        RecordingPresenter::new(),
        RecordingAudio::failing(),
        CancellationToken::new(),
    );

    let state = assert_ok!(runner.run(answers(mixed_answers()).await).await);
    assert!(state.is_locked);
    assert_eq!(state.deviation_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        RecordingPresenter::new(),
        RecordingAudio::new(),
        cancel,
    );

    let err = assert_err!(runner.run(answers(vec![]).await).await);
    assert!(matches!(err, VigilError::Interrupted));
}

#[tokio::test(start_paused = true)]
async fn test_quit_interrupts_during_narrative() {
    let presenter = RecordingPresenter::new();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        presenter.clone(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );

    let err = assert_err!(runner.run(answers(vec![Input::Quit]).await).await);
    assert!(matches!(err, VigilError::Interrupted));
    assert!(!presenter.notifications().contains(&Notification::AwaitingInput));
}

#[tokio::test(start_paused = true)]
async fn test_quit_interrupts_during_closing() {
    let script = PhaseScript::new(
        vec![PhaseDefinition::new("final", PhaseKind::Final, vec![ContentBlock::text("End.")])],
        vec![ContentBlock::hollow("Archived.")],
    )
    .unwrap();
    let presenter = RecordingPresenter::new();
    let runner = SessionRunner::new(
        SubPhaseController::with_seed(script, Pacing::default(), 7),
        presenter.clone(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );
    let (tx, rx) = mpsc::channel(4);

    let typist = async move {
        // closing starts at 1650, lock is due at 9650
        sleep(Duration::from_millis(3000)).await;
        tx.send(Input::Quit).await.unwrap();
    };
    let (result, ()) = tokio::join!(runner.run(rx), typist);

    assert!(matches!(assert_err!(result), VigilError::Interrupted));
    let notes = presenter.notifications();
    assert!(notes.iter().any(|n| matches!(n, Notification::ClosingBlock(_))));
    assert!(!notes.contains(&Notification::Locked));
}

#[tokio::test(start_paused = true)]
async fn test_pick_during_processing_is_not_carried_forward() {
    let runner = SessionRunner::new(
        SubPhaseController::with_seed(two_doors(), Pacing::default(), 7),
        RecordingPresenter::new(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );
    let (tx, rx) = mpsc::channel(4);

    let typist = async move {
        // p0 options open at 1650
        sleep(Duration::from_millis(1700)).await;
        tx.send(Input::Select(1)).await.unwrap();
        // p0 is processing until 3200
        sleep(Duration::from_millis(100)).await;
        tx.send(Input::Select(2)).await.unwrap();
        // p1 options open at 7350
        sleep(Duration::from_millis(7200)).await;
        tx.send(Input::Select(1)).await.unwrap();
    };
    let (result, ()) = tokio::join!(runner.run(rx), typist);

    let state = assert_ok!(result);
    assert!(state.is_locked);
    assert_eq!(state.choice_history.len(), 2);
    assert_eq!(state.choice_history[0].phase_id, "p0");
    assert_eq!(state.choice_history[0].option_selected, "Stay");
    assert_eq!(state.choice_history[1].phase_id, "p1");
    assert_eq!(state.choice_history[1].option_selected, "Stay");
    assert!(state.choice_history[1].hesitation_ms > 0);
    assert_eq!(state.deviation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_closed_input_during_choice_interrupts() {
    let presenter = RecordingPresenter::new();
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        presenter.clone(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );

    let err = assert_err!(runner.run(answers(vec![Input::Select(1)]).await).await);
    assert!(matches!(err, VigilError::Interrupted));
    assert!(!presenter.notifications().contains(&Notification::Locked));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_selection_is_skipped() {
    let runner = SessionRunner::new(
        builtin(Pacing::default()),
        RecordingPresenter::new(),
        RecordingAudio::new(),
        CancellationToken::new(),
    );

    let mut inputs = vec![Input::Select(9), Input::Select(0)];
    inputs.extend(mixed_answers());
    let state = assert_ok!(runner.run(answers(inputs).await).await);
    assert_eq!(state.choice_history.len(), 4);
    assert_eq!(state.choice_history[0].phase_id, "briefing");
}
