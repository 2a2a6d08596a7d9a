use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Flashcard, Message, MessageRole};

const TITLE_MAX_CHARS: usize = 40;
pub const UNTITLED_CHAT: &str = "New chat";

/// One conversation: its messages, the flashcards generated in it and which
/// assistant message produced each card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<Message>,
    flashcards: Vec<Flashcard>,
    card_owners: HashMap<String, Vec<String>>,
}

impl Chat {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: UNTITLED_CHAT.to_string(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            flashcards: Vec::new(),
            card_owners: HashMap::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub(crate) fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Every flashcard generated in this chat, oldest first.
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    /// Flashcards produced by the tool call of one assistant message.
    pub fn flashcards_for(&self, message_id: &str) -> Vec<&Flashcard> {
        let Some(ids) = self.card_owners.get(message_id) else {
            return Vec::new();
        };
        self.flashcards
            .iter()
            .filter(|card| ids.contains(&card.id))
            .collect()
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh();
    }

    pub(crate) fn attach_flashcards(&mut self, message_id: &str, cards: Vec<Flashcard>) {
        let owned = self.card_owners.entry(message_id.to_string()).or_default();
        owned.extend(cards.iter().map(|c| c.id.clone()));
        self.flashcards.extend(cards);
    }

    /// Recomputes the derived title and bumps the update time.
    pub(crate) fn refresh(&mut self) {
        self.title = derive_title(&self.messages);
        self.updated_at = Utc::now();
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// The first user message, trimmed and shortened.
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == MessageRole::User) else {
        return UNTITLED_CHAT.to_string();
    };
    let t = first.content.trim();
    if t.is_empty() {
        UNTITLED_CHAT.to_string()
    } else if t.chars().count() > TITLE_MAX_CHARS {
        format!("{}…", t.chars().take(TITLE_MAX_CHARS).collect::<String>())
    } else {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_user_message() {
        let messages = vec![
            Message::assistant("Welcome!"),
            Message::user("  Explain photosynthesis "),
            Message::user("second"),
        ];
        assert_eq!(derive_title(&messages), "Explain photosynthesis");
        assert_eq!(derive_title(&[]), UNTITLED_CHAT);
    }

    #[test]
    fn multi_line_message_is_not_cut_at_newline() {
        let title = derive_title(&[Message::user("Why is the sky blue?\nAnd sunsets red?")]);
        assert_eq!(title, "Why is the sky blue?\nAnd sunsets red?");

        let title = derive_title(&[Message::user("Short first line\nthen a much longer second line")]);
        assert_eq!(title, "Short first line\nthen a much longer seco…");
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = "a".repeat(55);
        let title = derive_title(&[Message::user(long)]);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 1);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn flashcards_are_keyed_by_message() {
        use crate::models::Subject;

        let mut chat = Chat::new();
        let card = |id: &str| Flashcard {
            id: id.to_string(),
            question: "Q".into(),
            answer: "A".into(),
            subject: Subject::Physics,
            created_at: Utc::now(),
        };
        chat.attach_flashcards("m1", vec![card("c1"), card("c2")]);
        chat.attach_flashcards("m2", vec![card("c3")]);

        assert_eq!(chat.flashcards().len(), 3);
        let ids: Vec<_> = chat.flashcards_for("m1").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2"]);
        assert!(chat.flashcards_for("missing").is_empty());
    }
}
