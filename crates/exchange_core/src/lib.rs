use async_trait::async_trait;
use shared::domain::Participant;
use tokio::sync::broadcast;

pub mod engine;
pub mod error;
pub mod gateway;
pub mod session;
pub mod steps;
pub mod timeline;

pub use engine::{ExchangeEngine, ExchangeEvent, ExchangeSnapshot, SendReceipt};
pub use error::{ExchangeError, ExchangeResult, ValidationError};
pub use gateway::{HttpGateway, ServiceGateway};

/// The user-facing surface of an exchange: four actions plus startup and observation.
#[async_trait]
pub trait ExchangeHandle: Send + Sync {
    async fn initialize(&self) -> ExchangeResult<()>;
    async fn send_as_alice(&self, message: &str) -> ExchangeResult<SendReceipt>;
    async fn send_as_bob(&self, message: &str) -> ExchangeResult<SendReceipt>;
    async fn decrypt_as_alice(&self) -> ExchangeResult<String>;
    async fn decrypt_as_bob(&self) -> ExchangeResult<String>;
    async fn snapshot(&self) -> ExchangeSnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<ExchangeEvent>;
}

#[async_trait]
impl ExchangeHandle for ExchangeEngine {
    async fn initialize(&self) -> ExchangeResult<()> {
        ExchangeEngine::initialize(self).await
    }

    async fn send_as_alice(&self, message: &str) -> ExchangeResult<SendReceipt> {
        self.send_from(Participant::Alice, message).await
    }

    async fn send_as_bob(&self, message: &str) -> ExchangeResult<SendReceipt> {
        self.send_from(Participant::Bob, message).await
    }

    async fn decrypt_as_alice(&self) -> ExchangeResult<String> {
        self.decrypt_as(Participant::Alice).await
    }

    async fn decrypt_as_bob(&self) -> ExchangeResult<String> {
        self.decrypt_as(Participant::Bob).await
    }

    async fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeEngine::snapshot(self).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ExchangeEvent> {
        self.subscribe()
    }
}
