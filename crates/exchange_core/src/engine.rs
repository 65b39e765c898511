//! Scenario engine: sequences the exchange steps against the gateway and publishes
//! ordered events for whatever renders them.

use std::{collections::BTreeMap, sync::Arc};

use shared::domain::{
    Ciphertext, Direction, Participant, PublicKeyMaterial, ScenarioId, ScenarioRunId,
};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::{
    error::{ExchangeError, ExchangeResult, ValidationError},
    gateway::ServiceGateway,
    session::SessionState,
    steps::{decryption_step, outbound_steps, ScenarioStep, StepKind, EXPECTED_STEPS},
    timeline::TimelineEntry,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const IDLE_STATUS: &str = "Waiting for a message";

#[derive(Debug, Clone)]
pub enum ExchangeEvent {
    ConnectivityChanged {
        connected: bool,
    },
    ScenarioStarted {
        run_id: ScenarioRunId,
        direction: Direction,
        expected_steps: u32,
    },
    StepStarted {
        run_id: Option<ScenarioRunId>,
        step: ScenarioStep,
    },
    StepCompleted {
        run_id: Option<ScenarioRunId>,
        entry: TimelineEntry,
        completed_steps: u32,
        expected_steps: u32,
        progress: f64,
    },
    CiphertextDelivered {
        recipient: Participant,
        ciphertext: Ciphertext,
    },
    MessageDecrypted {
        recipient: Participant,
        plaintext: String,
    },
    ScenarioFailed {
        run_id: Option<ScenarioRunId>,
        step: StepKind,
        reason: String,
    },
    StatusChanged(String),
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub run_id: ScenarioRunId,
    pub direction: Direction,
    pub ciphertext: Ciphertext,
}

#[derive(Debug, Clone)]
pub struct ExchangeSnapshot {
    pub connected: bool,
    pub keys: BTreeMap<Participant, PublicKeyMaterial>,
    pub pending_ciphertexts: BTreeMap<Participant, Ciphertext>,
    pub active_scenario: Option<ScenarioId>,
    pub run_id: Option<ScenarioRunId>,
    pub completed_steps: u32,
    pub expected_steps: u32,
    pub progress: f64,
    pub timeline: Vec<TimelineEntry>,
    pub status: String,
}

struct EngineState {
    session: SessionState,
    current_run: Option<ScenarioRunId>,
    /// Set once the current run's ciphertext reached its recipient.
    delivered_run: Option<ScenarioRunId>,
    status: String,
}

impl EngineState {
    /// The current run, if its ciphertext was delivered to `recipient` and awaits their decryption.
    fn run_awaiting(&self, recipient: Participant) -> Option<ScenarioRunId> {
        let run_id = self.delivered_run?;
        let addressed = self.session.active_scenario().map(Direction::recipient) == Some(recipient);
        (self.current_run == Some(run_id) && addressed).then_some(run_id)
    }

    fn record_completion(
        &mut self,
        run_id: ScenarioRunId,
        step: ScenarioStep,
        summary: String,
    ) -> ExchangeEvent {
        let entry = self.session.record_step(step, summary);
        ExchangeEvent::StepCompleted {
            run_id: Some(run_id),
            entry,
            completed_steps: self.session.completed_steps(),
            expected_steps: self.session.expected_steps(),
            progress: self.session.timeline().progress_fraction(),
        }
    }
}

pub struct ExchangeEngine {
    gateway: Arc<dyn ServiceGateway>,
    inner: Mutex<EngineState>,
    /// Held by the running send. Dropping the send future releases it.
    send_slot: Mutex<()>,
    events: broadcast::Sender<ExchangeEvent>,
}

impl ExchangeEngine {
    pub fn new(gateway: Arc<dyn ServiceGateway>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            gateway,
            inner: Mutex::new(EngineState {
                session: SessionState::new(),
                current_run: None,
                delivered_run: None,
                status: IDLE_STATUS.to_string(),
            }),
            send_slot: Mutex::new(()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExchangeEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ExchangeEvent) {
        let _ = self.events.send(event);
    }

    /// Fetches the service key and caches it for both participants. Not retried on failure.
    pub async fn initialize(&self) -> ExchangeResult<()> {
        match self.gateway.fetch_public_key().await {
            Ok(key) => {
                {
                    let mut guard = self.inner.lock().await;
                    // One service key stands in for both participants' keys.
                    for participant in Participant::ALL {
                        guard.session.store_key(participant, key.clone());
                    }
                    guard.session.set_connectivity(true);
                }
                info!(key_preview = %key.preview(), "exchange: connected to crypto service");
                self.emit(ExchangeEvent::ConnectivityChanged { connected: true });
                Ok(())
            }
            Err(err) => {
                self.inner.lock().await.session.set_connectivity(false);
                error!(error = %err, "exchange: crypto service unreachable");
                self.emit(ExchangeEvent::ConnectivityChanged { connected: false });
                Err(ExchangeError::Unreachable(err.to_string()))
            }
        }
    }

    /// Runs key retrieval, encryption and transmission for a message from `sender`.
    pub async fn send_from(
        &self,
        sender: Participant,
        message: &str,
    ) -> ExchangeResult<SendReceipt> {
        let direction = Direction::from_sender(sender);
        let message = message.trim();
        let (run_id, _slot) = self.begin_scenario(direction, message).await?;

        self.run_outbound(run_id, direction, message).await
    }

    async fn begin_scenario(
        &self,
        direction: Direction,
        message: &str,
    ) -> ExchangeResult<(ScenarioRunId, MutexGuard<'_, ()>)> {
        let mut guard = self.inner.lock().await;

        let checked = if message.is_empty() {
            Err(ValidationError::EmptyMessage)
        } else if !guard.session.is_connected()
            || guard.session.key(direction.recipient()).is_none()
        {
            Err(ValidationError::NotConnected)
        } else {
            self.send_slot
                .try_lock()
                .map_err(|_| ValidationError::ScenarioInFlight {
                    active: guard.session.active_scenario().unwrap_or(direction),
                })
        };
        let slot = match checked {
            Ok(slot) => slot,
            Err(rejection) => {
                warn!(%direction, reason = %rejection, "exchange: send rejected");
                return Err(rejection.into());
            }
        };

        let run_id = ScenarioRunId::new();
        guard.session.reset_for_scenario(direction, EXPECTED_STEPS);
        guard.current_run = Some(run_id);
        guard.delivered_run = None;
        drop(guard);

        info!(%direction, %run_id, "exchange: scenario started");
        self.emit(ExchangeEvent::ScenarioStarted {
            run_id,
            direction,
            expected_steps: EXPECTED_STEPS,
        });
        Ok((run_id, slot))
    }

    async fn run_outbound(
        &self,
        run_id: ScenarioRunId,
        direction: Direction,
        message: &str,
    ) -> ExchangeResult<SendReceipt> {
        let recipient = direction.recipient();
        let run = Some(run_id);
        let [key_step, encrypt_step, transmit_step] = outbound_steps(direction);

        self.emit(ExchangeEvent::StepStarted {
            run_id: run,
            step: key_step.clone(),
        });
        let key_summary = self
            .inner
            .lock()
            .await
            .session
            .key(recipient)
            .map_or_else(
                || format!("No cached key for {recipient}"),
                |key| format!("Using {recipient}'s key {}", key.preview()),
            );
        self.complete_step(run_id, key_step, key_summary).await;

        self.emit(ExchangeEvent::StepStarted {
            run_id: run,
            step: encrypt_step.clone(),
        });
        let ciphertext = match self.gateway.encrypt(message).await {
            Ok(ciphertext) => ciphertext,
            Err(err) => {
                error!(%direction, %run_id, error = %err, "exchange: encryption failed");
                let failure = ExchangeError::EncryptionFailed(err.to_string());
                self.emit(ExchangeEvent::ScenarioFailed {
                    run_id: run,
                    step: StepKind::Encryption,
                    reason: failure.to_string(),
                });
                return Err(failure);
            }
        };
        self.inner
            .lock()
            .await
            .session
            .store_ciphertext(recipient, ciphertext.clone());
        let encrypt_summary = match ciphertext.decoded_len() {
            Some(len) => format!("{len}-byte ciphertext produced"),
            None => "Ciphertext produced".to_string(),
        };
        self.complete_step(run_id, encrypt_step, encrypt_summary).await;

        self.emit(ExchangeEvent::StepStarted {
            run_id: run,
            step: transmit_step.clone(),
        });
        self.complete_step(
            run_id,
            transmit_step,
            format!("Ciphertext delivered to {recipient}"),
        )
        .await;
        self.inner.lock().await.delivered_run = Some(run_id);
        self.emit(ExchangeEvent::CiphertextDelivered {
            recipient,
            ciphertext: ciphertext.clone(),
        });
        self.set_status(format!("Message in transit to {recipient}..."))
            .await;

        info!(%direction, %run_id, "exchange: ciphertext delivered");
        Ok(SendReceipt {
            run_id,
            direction,
            ciphertext,
        })
    }

    /// Decrypts the ciphertext pending for `recipient`. Can be repeated; the ciphertext is kept.
    ///
    /// Only a decryption by the recipient of the delivered current run completes its fourth
    /// step. Reading an older ciphertext returns the plaintext but leaves the timeline alone.
    pub async fn decrypt_as(&self, recipient: Participant) -> ExchangeResult<String> {
        let (ciphertext, run) = {
            let guard = self.inner.lock().await;
            (
                guard.session.take_ciphertext(recipient),
                guard.run_awaiting(recipient),
            )
        };
        let Some(ciphertext) = ciphertext else {
            let rejection = ValidationError::NoCiphertext { recipient };
            warn!(%recipient, reason = %rejection, "exchange: decrypt rejected");
            return Err(rejection.into());
        };

        let step = decryption_step(recipient);
        self.emit(ExchangeEvent::StepStarted {
            run_id: run,
            step: step.clone(),
        });

        let plaintext = match self.gateway.decrypt(&ciphertext).await {
            Ok(plaintext) => plaintext,
            Err(err) => {
                error!(%recipient, error = %err, "exchange: decryption failed");
                let failure = ExchangeError::DecryptionFailed(err.to_string());
                self.emit(ExchangeEvent::ScenarioFailed {
                    run_id: run,
                    step: StepKind::Decryption,
                    reason: failure.to_string(),
                });
                return Err(failure);
            }
        };

        let completion = {
            let mut guard = self.inner.lock().await;
            match run {
                Some(run_id) if guard.run_awaiting(recipient) == Some(run_id) => Some(
                    guard.record_completion(run_id, step, format!("Decrypted message: {plaintext}")),
                ),
                _ => None,
            }
        };
        let counted = completion.is_some();
        if let Some(event) = completion {
            self.emit(event);
        }
        self.emit(ExchangeEvent::MessageDecrypted {
            recipient,
            plaintext: plaintext.clone(),
        });

        if counted {
            self.set_status("Secure exchange completed".to_string())
                .await;
            info!(%recipient, "exchange: message decrypted");
        } else {
            info!(%recipient, "exchange: earlier message decrypted outside the active scenario");
        }
        Ok(plaintext)
    }

    async fn complete_step(&self, run_id: ScenarioRunId, step: ScenarioStep, summary: String) {
        let event = self
            .inner
            .lock()
            .await
            .record_completion(run_id, step, summary);
        self.emit(event);
    }

    async fn set_status(&self, status: String) {
        self.inner.lock().await.status = status.clone();
        self.emit(ExchangeEvent::StatusChanged(status));
    }

    pub async fn snapshot(&self) -> ExchangeSnapshot {
        let guard = self.inner.lock().await;
        let keys = Participant::ALL
            .into_iter()
            .filter_map(|p| guard.session.key(p).cloned().map(|key| (p, key)))
            .collect();
        let pending_ciphertexts = Participant::ALL
            .into_iter()
            .filter_map(|p| guard.session.take_ciphertext(p).map(|ct| (p, ct)))
            .collect();

        ExchangeSnapshot {
            connected: guard.session.is_connected(),
            keys,
            pending_ciphertexts,
            active_scenario: guard.session.active_scenario(),
            run_id: guard.current_run,
            completed_steps: guard.session.completed_steps(),
            expected_steps: guard.session.expected_steps(),
            progress: guard.session.timeline().progress_fraction(),
            timeline: guard.session.timeline().entries().to_vec(),
            status: guard.status.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
