//! Per-engine session bookkeeping: connectivity, cached keys, in-flight ciphertexts and
//! progress counters for the active scenario.

use std::collections::HashMap;

use shared::domain::{Ciphertext, Participant, PublicKeyMaterial, ScenarioId};

use crate::{
    steps::ScenarioStep,
    timeline::{TimelineEntry, TimelineRecorder},
};

/// Progress counters live in the embedded timeline of the active scenario.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    connected: bool,
    keys: HashMap<Participant, PublicKeyMaterial>,
    pending_ciphertexts: HashMap<Participant, Ciphertext>,
    active_scenario: Option<ScenarioId>,
    timeline: TimelineRecorder,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connectivity(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn store_key(&mut self, participant: Participant, key: PublicKeyMaterial) {
        self.keys.insert(participant, key);
    }

    pub fn key(&self, participant: Participant) -> Option<&PublicKeyMaterial> {
        self.keys.get(&participant)
    }

    pub fn store_ciphertext(&mut self, recipient: Participant, ciphertext: Ciphertext) {
        self.pending_ciphertexts.insert(recipient, ciphertext);
    }

    /// Reads the pending ciphertext without clearing it, so decryption can be repeated.
    pub fn take_ciphertext(&self, recipient: Participant) -> Option<Ciphertext> {
        self.pending_ciphertexts.get(&recipient).cloned()
    }

    pub fn reset_for_scenario(&mut self, scenario: ScenarioId, expected_steps: u32) {
        self.active_scenario = Some(scenario);
        self.timeline.reset(expected_steps);
    }

    /// Records a completed step of the active scenario. The count saturates at `expected_steps`.
    pub fn record_step(&mut self, step: ScenarioStep, summary: impl Into<String>) -> TimelineEntry {
        self.timeline.record_step(step, summary)
    }

    pub fn timeline(&self) -> &TimelineRecorder {
        &self.timeline
    }

    pub fn active_scenario(&self) -> Option<ScenarioId> {
        self.active_scenario
    }

    pub fn completed_steps(&self) -> u32 {
        self.timeline.completed_steps()
    }

    pub fn expected_steps(&self) -> u32 {
        self.timeline.expected_steps()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
