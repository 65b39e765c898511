use super::*;
use crate::steps::{decryption_step, outbound_steps, StepKind};
use shared::domain::{Direction, Participant};

#[test]
fn progress_is_zero_without_expected_steps() {
    let mut recorder = TimelineRecorder::new();
    assert_eq!(recorder.progress_fraction(), 0.0);

    let [key, _, _] = outbound_steps(Direction::AliceToBob);
    recorder.record_step(key, "cached key");
    assert_eq!(recorder.progress_fraction(), 0.0);
    assert_eq!(recorder.entries().len(), 1);
}

#[test]
fn progress_is_monotonic_and_bounded() {
    let mut recorder = TimelineRecorder::new();
    recorder.reset(4);

    let mut last = recorder.progress_fraction();
    for step in outbound_steps(Direction::AliceToBob) {
        recorder.record_step(step, "ok");
        let current = recorder.progress_fraction();
        assert!(current >= last);
        last = current;
    }
    assert_eq!(recorder.completed_steps(), 3);
    assert!((recorder.progress_fraction() - 0.75).abs() < f64::EPSILON);

    recorder.record_step(decryption_step(Participant::Bob), "Hello");
    recorder.record_step(decryption_step(Participant::Bob), "Hello");
    assert_eq!(recorder.entries().len(), 5);
    assert_eq!(recorder.completed_steps(), 4);
    assert_eq!(recorder.progress_fraction(), 1.0);
}

#[test]
fn reset_discards_entries_and_progress() {
    let mut recorder = TimelineRecorder::new();
    recorder.reset(4);
    for step in outbound_steps(Direction::BobToAlice) {
        recorder.record_step(step, "ok");
    }

    recorder.reset(4);

    assert!(recorder.entries().is_empty());
    assert_eq!(recorder.progress_fraction(), 0.0);
    assert_eq!(recorder.expected_steps(), 4);
}

#[test]
fn entries_preserve_recording_order() {
    let mut recorder = TimelineRecorder::new();
    recorder.reset(4);
    for step in outbound_steps(Direction::AliceToBob) {
        recorder.record_step(step, "ok");
    }

    let kinds: Vec<_> = recorder.entries().iter().map(|e| e.step.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::KeyRetrieval,
            StepKind::Encryption,
            StepKind::Transmission
        ]
    );
    let stamps: Vec<_> = recorder.entries().iter().map(|e| e.timestamp).collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
}
