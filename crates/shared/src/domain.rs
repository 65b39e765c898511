use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const KEY_PREVIEW_CHARS: usize = 50;

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_newtype!(PublicKeyMaterial);
text_newtype!(Ciphertext);

impl PublicKeyMaterial {
    /// Truncated form used when displaying a PEM block inline.
    pub fn preview(&self) -> String {
        let mut chars = self.0.chars();
        let head: String = chars.by_ref().take(KEY_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

impl Ciphertext {
    /// Raw payload length, or `None` when the service returned something other than base64.
    pub fn decoded_len(&self) -> Option<usize> {
        STANDARD.decode(self.0.as_bytes()).ok().map(|bytes| bytes.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Alice,
    Bob,
}

impl Participant {
    pub const ALL: [Participant; 2] = [Participant::Alice, Participant::Bob];

    pub fn counterpart(self) -> Self {
        match self {
            Self::Alice => Self::Bob,
            Self::Bob => Self::Alice,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Alice => "Alice",
            Self::Bob => "Bob",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identifies a scenario: which participant sends to which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    AliceToBob,
    BobToAlice,
}

pub type ScenarioId = Direction;

impl Direction {
    pub fn from_sender(sender: Participant) -> Self {
        match sender {
            Participant::Alice => Self::AliceToBob,
            Participant::Bob => Self::BobToAlice,
        }
    }

    pub fn sender(self) -> Participant {
        match self {
            Self::AliceToBob => Participant::Alice,
            Self::BobToAlice => Participant::Bob,
        }
    }

    pub fn recipient(self) -> Participant {
        self.sender().counterpart()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AliceToBob => "alice-to-bob",
            Self::BobToAlice => "bob-to-alice",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioRunId(pub Uuid);

impl ScenarioRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScenarioRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScenarioRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_preview_truncates_long_pem() {
        let pem = PublicKeyMaterial::new(format!(
            "-----BEGIN PUBLIC KEY-----\n{}",
            "A".repeat(120)
        ));
        let preview = pem.preview();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), KEY_PREVIEW_CHARS + 3);
    }

    #[test]
    fn key_preview_keeps_short_key_intact() {
        assert_eq!(PublicKeyMaterial::new("short").preview(), "short");
    }

    #[test]
    fn ciphertext_length_reflects_decoded_bytes() {
        assert_eq!(Ciphertext::new("AQID").decoded_len(), Some(3));
        assert_eq!(Ciphertext::new("not base64!").decoded_len(), None);
    }

    #[test]
    fn direction_serializes_with_cli_names() {
        let json = serde_json::to_string(&Direction::BobToAlice).expect("serialize");
        assert_eq!(json, "\"bob-to-alice\"");
        assert_eq!(Direction::BobToAlice.sender(), Participant::Bob);
        assert_eq!(Direction::BobToAlice.recipient(), Participant::Alice);
        assert_eq!(Direction::from_sender(Participant::Alice), Direction::AliceToBob);
    }
}
