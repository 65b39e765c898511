//! Runtime bridge from the engine's event broadcast to the console's UI queue.

use std::sync::Arc;

use exchange_core::ExchangeHandle;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc::UnboundedSender},
    task::JoinHandle,
};
use tracing::warn;

use crate::controller::events::UiEvent;

pub fn launch(handle: &Arc<dyn ExchangeHandle>, ui_tx: UnboundedSender<UiEvent>) -> JoinHandle<()> {
    let mut events = handle.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if ui_tx.send(UiEvent::Exchange(event)).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ui: exchange events dropped, console fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
