use super::*;
use crate::steps::{decryption_step, outbound_steps};
use shared::domain::Direction;

#[test]
fn fresh_session_is_disconnected_and_empty() {
    let session = SessionState::new();
    assert!(!session.is_connected());
    assert!(session.key(Participant::Alice).is_none());
    assert!(session.take_ciphertext(Participant::Bob).is_none());
    assert_eq!(session.active_scenario(), None);
}

#[test]
fn take_ciphertext_does_not_clear_pending_value() {
    let mut session = SessionState::new();
    session.store_ciphertext(Participant::Bob, Ciphertext::new("AQID"));

    assert_eq!(
        session.take_ciphertext(Participant::Bob),
        Some(Ciphertext::new("AQID"))
    );
    assert_eq!(
        session.take_ciphertext(Participant::Bob),
        Some(Ciphertext::new("AQID"))
    );
    assert!(session.take_ciphertext(Participant::Alice).is_none());
}

#[test]
fn reset_keeps_ciphertexts_of_other_recipients() {
    let mut session = SessionState::new();
    session.reset_for_scenario(Direction::AliceToBob, 4);
    session.store_ciphertext(Participant::Bob, Ciphertext::new("for-bob"));
    let [key, encrypt, _] = outbound_steps(Direction::AliceToBob);
    session.record_step(key, "cached key");
    session.record_step(encrypt, "ciphertext");

    session.reset_for_scenario(Direction::BobToAlice, 4);

    assert_eq!(session.completed_steps(), 0);
    assert_eq!(session.expected_steps(), 4);
    assert!(session.timeline().entries().is_empty());
    assert_eq!(session.active_scenario(), Some(Direction::BobToAlice));
    assert_eq!(
        session.take_ciphertext(Participant::Bob),
        Some(Ciphertext::new("for-bob"))
    );
}

#[test]
fn completed_steps_never_exceed_expected() {
    let mut session = SessionState::new();
    session.reset_for_scenario(Direction::AliceToBob, 2);
    for _ in 0..5 {
        session.record_step(decryption_step(Participant::Bob), "Hello");
    }
    assert_eq!(session.completed_steps(), 2);
    assert_eq!(session.timeline().entries().len(), 5);
    assert_eq!(session.timeline().progress_fraction(), 1.0);
}

#[test]
fn counters_follow_the_recorded_timeline() {
    let mut session = SessionState::new();
    session.record_step(decryption_step(Participant::Alice), "before any scenario");
    assert_eq!(session.completed_steps(), 0);

    session.reset_for_scenario(Direction::BobToAlice, 4);
    for step in outbound_steps(Direction::BobToAlice) {
        session.record_step(step, "ok");
    }
    assert_eq!(session.completed_steps(), session.timeline().completed_steps());
    assert_eq!(session.completed_steps(), 3);
}
