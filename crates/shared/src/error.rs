use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unreachable,
    Validation,
    EncryptionFailed,
    DecryptionFailed,
}

impl ErrorCode {
    /// Generic wording shown to the user; diagnostic detail stays in the logs.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Unreachable => "Unable to reach the encryption service",
            Self::Validation => "The request was rejected before reaching the service",
            Self::EncryptionFailed => "Error while sending the message",
            Self::DecryptionFailed => "Error while decrypting the message",
        }
    }
}

/// Failure body returned by the crypto service alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
#[error("service responded with status {status}: {detail}")]
pub struct ServiceException {
    pub status: u16,
    pub detail: String,
}

impl ServiceException {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}
