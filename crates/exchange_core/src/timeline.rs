use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::steps::ScenarioStep;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub step: ScenarioStep,
    pub result_summary: String,
}

/// Append-only log of the steps completed in the active scenario.
#[derive(Debug, Default, Clone)]
pub struct TimelineRecorder {
    entries: Vec<TimelineEntry>,
    completed_steps: u32,
    expected_steps: u32,
}

impl TimelineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, expected_steps: u32) {
        self.entries.clear();
        self.completed_steps = 0;
        self.expected_steps = expected_steps;
    }

    /// Appends an entry. Entries past `expected_steps` are kept but do not advance progress.
    pub fn record_step(&mut self, step: ScenarioStep, summary: impl Into<String>) -> TimelineEntry {
        let entry = TimelineEntry {
            timestamp: Utc::now(),
            step,
            result_summary: summary.into(),
        };
        self.entries.push(entry.clone());
        if self.completed_steps < self.expected_steps {
            self.completed_steps += 1;
        }
        entry
    }

    pub fn progress_fraction(&self) -> f64 {
        if self.expected_steps == 0 {
            return 0.0;
        }
        f64::from(self.completed_steps) / f64::from(self.expected_steps)
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn completed_steps(&self) -> u32 {
        self.completed_steps
    }

    pub fn expected_steps(&self) -> u32 {
        self.expected_steps
    }
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;
