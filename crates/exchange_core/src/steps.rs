//! Static step catalogue for both exchange directions.

use serde::Serialize;
use shared::domain::{Direction, Participant};

/// Key retrieval, encryption, transmission, then the user-triggered decryption.
pub const EXPECTED_STEPS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    KeyRetrieval,
    Encryption,
    Transmission,
    Decryption,
}

impl StepKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::KeyRetrieval => "🔑",
            Self::Encryption => "🔒",
            Self::Transmission => "📨",
            Self::Decryption => "🔓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "participant")]
pub enum Actor {
    Participant(Participant),
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioStep {
    pub kind: StepKind,
    pub actor: Actor,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
}

impl ScenarioStep {
    fn new(kind: StepKind, actor: Actor, title: String, description: String) -> Self {
        Self {
            kind,
            actor,
            icon: kind.icon(),
            title,
            description,
        }
    }
}

/// Steps 1 to 3, executed in order by a send.
pub fn outbound_steps(direction: Direction) -> [ScenarioStep; 3] {
    let sender = direction.sender();
    let recipient = direction.recipient();
    [
        ScenarioStep::new(
            StepKind::KeyRetrieval,
            Actor::Participant(sender),
            format!("Retrieve {recipient}'s public key"),
            format!("{sender} obtains {recipient}'s public key to encrypt the message"),
        ),
        ScenarioStep::new(
            StepKind::Encryption,
            Actor::Participant(sender),
            "Encrypt the message".to_string(),
            format!("The message is encrypted with {recipient}'s public key (RSA-2048 OAEP)"),
        ),
        ScenarioStep::new(
            StepKind::Transmission,
            Actor::System,
            "Secure transmission".to_string(),
            format!("The encrypted message is sent to {recipient} over the secure channel"),
        ),
    ]
}

pub fn decryption_step(recipient: Participant) -> ScenarioStep {
    ScenarioStep::new(
        StepKind::Decryption,
        Actor::Participant(recipient),
        format!("Decryption by {recipient}"),
        format!("{recipient} uses the matching private key to decrypt the message"),
    )
}
