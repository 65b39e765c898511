//! Turns engine and controller events into console lines.

use chrono::Local;
use exchange_core::{
    steps::{Actor, ScenarioStep},
    timeline::TimelineEntry,
    ExchangeEvent, ExchangeSnapshot,
};
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tracing::debug;

use crate::controller::events::{UiErrorContext, UiEvent};

const PROGRESS_WIDTH: usize = 20;

pub fn progress_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        fraction * 100.0
    )
}

fn actor_label(actor: Actor) -> String {
    match actor {
        Actor::Participant(participant) => participant.to_string(),
        Actor::System => "network".to_string(),
    }
}

fn step_heading(step: &ScenarioStep) -> String {
    format!("{} {} ({})", step.icon, step.title, actor_label(step.actor))
}

pub fn render_timeline_entry(entry: &TimelineEntry) -> Vec<String> {
    let time = entry.timestamp.with_timezone(&Local).format("%H:%M:%S");
    vec![
        format!("  {time}  {}", step_heading(&entry.step)),
        format!("            {}", entry.step.description),
        format!("            -> {}", entry.result_summary),
    ]
}

pub fn render_exchange_event(event: &ExchangeEvent) -> Vec<String> {
    match event {
        ExchangeEvent::ConnectivityChanged { connected: true } => {
            vec!["● connected to the crypto service".to_string()]
        }
        ExchangeEvent::ConnectivityChanged { connected: false } => {
            vec!["○ crypto service unreachable".to_string()]
        }
        ExchangeEvent::ScenarioStarted { direction, .. } => {
            vec![format!(
                "── exchange {} → {} ──",
                direction.sender(),
                direction.recipient()
            )]
        }
        ExchangeEvent::StepStarted { step, .. } => {
            vec![format!("  … {}", step_heading(step))]
        }
        ExchangeEvent::StepCompleted {
            entry, progress, ..
        } => {
            let mut lines = render_timeline_entry(entry);
            lines.push(format!("  {}", progress_bar(*progress)));
            lines
        }
        ExchangeEvent::CiphertextDelivered {
            recipient,
            ciphertext,
        } => vec![format!("  {recipient} received ciphertext: {ciphertext}")],
        ExchangeEvent::MessageDecrypted {
            recipient,
            plaintext,
        } => vec![format!("  {recipient} decrypted: {plaintext}")],
        ExchangeEvent::ScenarioFailed { step, reason, .. } => {
            vec![format!("  ✗ {step:?} step aborted: {reason}")]
        }
        ExchangeEvent::StatusChanged(status) => vec![format!("  status: {status}")],
    }
}

pub fn render_snapshot(snapshot: &ExchangeSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "connection: {}",
        if snapshot.connected {
            "connected"
        } else {
            "disconnected"
        }
    )];

    for (participant, key) in &snapshot.keys {
        lines.push(format!("{participant} public key: {}", key.preview()));
    }
    for (participant, ciphertext) in &snapshot.pending_ciphertexts {
        let size = ciphertext
            .decoded_len()
            .map(|len| format!(" ({len} bytes)"))
            .unwrap_or_default();
        lines.push(format!("{participant} has ciphertext{size}: {ciphertext}"));
    }

    match snapshot.active_scenario {
        Some(direction) => lines.push(format!(
            "scenario {direction}: {}/{} steps {}",
            snapshot.completed_steps,
            snapshot.expected_steps,
            progress_bar(snapshot.progress)
        )),
        None => lines.push("no exchange started yet".to_string()),
    }
    for entry in &snapshot.timeline {
        lines.extend(render_timeline_entry(entry));
    }
    lines.push(format!("status: {}", snapshot.status));
    lines
}

pub fn render_ui_event(event: &UiEvent) -> Vec<String> {
    match event {
        UiEvent::Exchange(event) => render_exchange_event(event),
        UiEvent::Notice(notice) => vec![format!("✓ {}", notice.message)],
        UiEvent::Error(error) => {
            debug!(detail = %error.detail(), "ui: showing error notice");
            let label = match error.context() {
                UiErrorContext::Startup => "startup",
                UiErrorContext::SendMessage => "send",
                UiErrorContext::DecryptMessage => "decrypt",
            };
            let mut line = format!("✗ [{label}] {}", error.message());
            if error.requires_reconnect() {
                line.push_str(" (type 'reconnect' to retry)");
            }
            vec![line]
        }
        UiEvent::Status(snapshot) => render_snapshot(snapshot),
        UiEvent::Info(text) => text.lines().map(str::to_string).collect(),
    }
}

pub fn spawn_presenter(mut ui_rx: UnboundedReceiver<UiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            for line in render_ui_event(&event) {
                println!("{line}");
            }
        }
    })
}

#[cfg(test)]
#[path = "../tests/presenter_tests.rs"]
mod tests;
