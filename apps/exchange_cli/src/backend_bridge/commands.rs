//! Console commands queued from the prompt to the exchange engine.

use shared::domain::{Direction, Participant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Send {
        sender: Participant,
        message: String,
    },
    Decrypt {
        recipient: Participant,
    },
    Status,
    Reconnect,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::Decrypt { .. } => "decrypt",
            Self::Status => "status",
            Self::Reconnect => "reconnect",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

pub const HELP_TEXT: &str = "\
commands:
  alice <message>   encrypt <message> for Bob and send it
  bob <message>     encrypt <message> for Alice and send it
  decrypt alice     decrypt the message waiting for Alice
  decrypt bob       decrypt the message waiting for Bob
  status            show keys, pending ciphertexts and the timeline
  reconnect         fetch the service key again
  help              show this help
  quit              leave";

pub fn parse_participant(raw: &str) -> Result<Participant, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "alice" | "a" => Ok(Participant::Alice),
        "bob" | "b" => Ok(Participant::Bob),
        other => Err(format!("unknown participant '{other}' (expected alice or bob)")),
    }
}

pub fn parse_direction(raw: &str) -> Result<Direction, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "alice-to-bob" => Ok(Direction::AliceToBob),
        "bob-to-alice" => Ok(Direction::BobToAlice),
        other => Err(format!(
            "unknown direction '{other}' (expected alice-to-bob or bob-to-alice)"
        )),
    }
}

/// Parses one prompt line. `Ok(None)` for blank input.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "alice" | "bob" => ConsoleCommand::Send {
            sender: parse_participant(head)?,
            // Empty messages are passed through; the engine owns that validation.
            message: rest.to_string(),
        },
        "decrypt" => {
            if rest.is_empty() {
                return Err("usage: decrypt <alice|bob>".to_string());
            }
            ConsoleCommand::Decrypt {
                recipient: parse_participant(rest)?,
            }
        }
        "status" => ConsoleCommand::Status,
        "reconnect" => ConsoleCommand::Reconnect,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };

    Ok(Some(command))
}

#[cfg(test)]
#[path = "../tests/commands_tests.rs"]
mod tests;
