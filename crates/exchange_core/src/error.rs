use shared::{
    domain::{Direction, Participant},
    error::ErrorCode,
};
use thiserror::Error;

/// Local precondition failures. None of these ever reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("encryption service is not connected")]
    NotConnected,
    #[error("no ciphertext pending for {recipient}")]
    NoCiphertext { recipient: Participant },
    #[error("scenario {active} is still in flight")]
    ScenarioInFlight { active: Direction },
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("encryption service unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

impl ExchangeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unreachable(_) => ErrorCode::Unreachable,
            Self::Validation(_) => ErrorCode::Validation,
            Self::EncryptionFailed(_) => ErrorCode::EncryptionFailed,
            Self::DecryptionFailed(_) => ErrorCode::DecryptionFailed,
        }
    }

    /// Message suitable for a transient user notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::EmptyMessage) => "Please enter a message".into(),
            Self::Validation(ValidationError::NotConnected) => "Server not connected".into(),
            Self::Validation(ValidationError::NoCiphertext { .. }) => {
                "No message to decrypt".into()
            }
            Self::Validation(ValidationError::ScenarioInFlight { .. }) => {
                "An exchange is already in progress".into()
            }
            other => other.code().user_message().into(),
        }
    }
}

pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
