//! UI events and error modeling for the console controller.

use exchange_core::{ExchangeError, ExchangeEvent, ExchangeSnapshot, ValidationError};
use shared::error::ErrorCode;

pub enum UiEvent {
    Exchange(ExchangeEvent),
    Notice(Notice),
    Error(UiError),
    Status(Box<ExchangeSnapshot>),
    Info(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Crypto,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Startup,
    SendMessage,
    DecryptMessage,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    detail: String,
}

impl UiError {
    pub fn from_exchange(context: UiErrorContext, error: &ExchangeError) -> Self {
        let category = match error.code() {
            ErrorCode::Unreachable => UiErrorCategory::Transport,
            ErrorCode::Validation => match error {
                ExchangeError::Validation(ValidationError::NotConnected) => {
                    UiErrorCategory::Transport
                }
                _ => UiErrorCategory::Validation,
            },
            ErrorCode::EncryptionFailed | ErrorCode::DecryptionFailed => UiErrorCategory::Crypto,
        };

        Self {
            category,
            context,
            message: error.user_message(),
            detail: error.to_string(),
        }
    }

    /// Transport failures are only recovered by fetching the service key again.
    pub fn requires_reconnect(&self) -> bool {
        self.category == UiErrorCategory::Transport
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
#[path = "../tests/events_tests.rs"]
mod tests;
