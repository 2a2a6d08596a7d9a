use serde::Serialize;

use crate::models::Message;

/// Shown instead of an empty reply when the only output was flashcards.
pub const TOOL_ONLY_FALLBACK: &str =
    "I've generated flashcards for you. Open the flashcards panel to study them.";

/// Shown when a stream ended without any text or flashcards.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "I wasn't able to generate a response. Please try again.";

/// Where the current (or most recent) turn stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Request sent, no text received yet.
    Sending,
    /// Text deltas are arriving.
    StreamingText,
    Finalized,
    Errored,
}

impl TurnPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnPhase::Sending | TurnPhase::StreamingText)
    }
}

/// Bookkeeping for the turn that owns the active assistant message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveTurn {
    pub chat_id: String,
    pub assistant_id: String,
    pub produced_text: bool,
    pub flashcard_count: usize,
}

/// Handed back by a successful submit. `history` ends with the new user
/// message and excludes the empty assistant placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnTicket {
    pub chat_id: String,
    pub user_message_id: String,
    pub assistant_id: String,
    pub history: Vec<Message>,
}

/// What applying one frame did to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Ignored,
    Text,
    Flashcards(usize),
}

/// A transient toast raised by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub text: String,
}

/// Line appended to the assistant message after flashcards were created.
pub(crate) fn success_suffix(count: usize, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("\n\n{message}"),
        None => format!(
            "\n\nI've created {count} {} for you. Open the flashcards panel to study them.",
            if count == 1 { "flashcard" } else { "flashcards" }
        ),
    }
}

pub(crate) fn notification_text(count: usize) -> String {
    if count == 1 {
        "1 flashcard generated".to_string()
    } else {
        format!("{count} flashcards generated")
    }
}
