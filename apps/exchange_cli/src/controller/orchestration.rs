//! Command orchestration from console input to the exchange engine.

use std::{ops::ControlFlow, sync::Arc};

use exchange_core::ExchangeHandle;
use shared::domain::Participant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::{
    backend_bridge::commands::{ConsoleCommand, HELP_TEXT},
    controller::events::{Notice, UiError, UiErrorContext, UiEvent},
};

/// Runs a command without blocking the prompt, so a decrypt can proceed while a send
/// is still waiting on the service.
pub fn dispatch_command(
    handle: &Arc<dyn ExchangeHandle>,
    cmd: ConsoleCommand,
    ui_tx: &UnboundedSender<UiEvent>,
) -> ControlFlow<()> {
    debug!(command = cmd.name(), "queued console->engine command");

    match cmd {
        ConsoleCommand::Quit => return ControlFlow::Break(()),
        ConsoleCommand::Help => {
            let _ = ui_tx.send(UiEvent::Info(HELP_TEXT.to_string()));
        }
        other => {
            let handle = Arc::clone(handle);
            let ui_tx = ui_tx.clone();
            tokio::spawn(async move {
                let event = run_command(handle.as_ref(), other).await;
                let _ = ui_tx.send(event);
            });
        }
    }

    ControlFlow::Continue(())
}

/// Executes one engine-bound command and turns its outcome into a UI event.
pub async fn run_command(handle: &dyn ExchangeHandle, cmd: ConsoleCommand) -> UiEvent {
    match cmd {
        ConsoleCommand::Send { sender, message } => {
            let outcome = match sender {
                Participant::Alice => handle.send_as_alice(&message).await,
                Participant::Bob => handle.send_as_bob(&message).await,
            };
            match outcome {
                Ok(receipt) => UiEvent::Notice(Notice::new(format!(
                    "Message encrypted and sent to {}",
                    receipt.direction.recipient()
                ))),
                Err(err) => {
                    debug!(error = %err, "send command failed");
                    UiEvent::Error(UiError::from_exchange(UiErrorContext::SendMessage, &err))
                }
            }
        }
        ConsoleCommand::Decrypt { recipient } => {
            let outcome = match recipient {
                Participant::Alice => handle.decrypt_as_alice().await,
                Participant::Bob => handle.decrypt_as_bob().await,
            };
            match outcome {
                Ok(_) => UiEvent::Notice(Notice::new("Message decrypted successfully")),
                Err(err) => {
                    debug!(error = %err, "decrypt command failed");
                    UiEvent::Error(UiError::from_exchange(UiErrorContext::DecryptMessage, &err))
                }
            }
        }
        ConsoleCommand::Reconnect => match handle.initialize().await {
            Ok(()) => UiEvent::Notice(Notice::new("Connection to the RSA server established")),
            Err(err) => UiEvent::Error(UiError::from_exchange(UiErrorContext::Startup, &err)),
        },
        ConsoleCommand::Status => UiEvent::Status(Box::new(handle.snapshot().await)),
        ConsoleCommand::Help => UiEvent::Info(HELP_TEXT.to_string()),
        ConsoleCommand::Quit => UiEvent::Info("bye".to_string()),
    }
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
