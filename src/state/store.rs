use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::errors::ChatError;
use crate::flashcards::normalize_tool_result;
use crate::models::{Feedback, Message, MessageRole};
use crate::protocol::Frame;
use crate::state::chat::Chat;
use crate::state::turn::{
    notification_text, success_suffix, ActiveTurn, Applied, Notification, TurnPhase, TurnTicket,
    EMPTY_RESPONSE_FALLBACK, TOOL_ONLY_FALLBACK,
};

/// Sidebar row for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub day_label: String,
    pub message_count: usize,
    pub is_current: bool,
}

/// All conversations plus the single in-flight turn.
///
/// Every mutation goes through the methods below; the active assistant message
/// is only ever written by `apply`, `finish` and `fail` for the turn that
/// created it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatStore {
    chats: Vec<Chat>,
    current: Option<String>,
    phase: TurnPhase,
    turn: Option<ActiveTurn>,
    error: Option<String>,
    notification: Option<Notification>,
    next_notification_id: u64,
    max_message_length: usize,
}

impl ChatStore {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            chats: Vec::new(),
            current: None,
            phase: TurnPhase::Idle,
            turn: None,
            error: None,
            notification: None,
            next_notification_id: 0,
            max_message_length: config.max_message_length,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Chats, most recently updated first.
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_chat(&self) -> Option<&Chat> {
        self.current.as_deref().and_then(|id| self.chat(id))
    }

    pub fn current_messages(&self) -> &[Message] {
        self.current_chat().map(Chat::messages).unwrap_or_default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// A turn is open; further submits are refused.
    pub fn is_busy(&self) -> bool {
        self.turn.is_some()
    }

    /// Request in flight, no text yet.
    pub fn is_loading(&self) -> bool {
        self.turn.is_some() && self.phase == TurnPhase::Sending
    }

    pub fn is_streaming(&self) -> bool {
        self.turn.is_some() && self.phase == TurnPhase::StreamingText
    }

    pub fn active_message_id(&self) -> Option<&str> {
        self.turn.as_ref().map(|t| t.assistant_id.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<ChatSummary> {
        self.chats
            .iter()
            .map(|chat| ChatSummary {
                id: chat.id.clone(),
                title: chat.title.clone(),
                day_label: day_label(chat.updated_at, now),
                message_count: chat.message_count(),
                is_current: self.current.as_deref() == Some(chat.id.as_str()),
            })
            .collect()
    }

    // ── Chat management ──────────────────────────────────────────────────────

    /// Starts a fresh chat, or stays on the current one if it has no messages.
    pub fn new_chat(&mut self) -> String {
        if let Some(chat) = self.current_chat().filter(|c| c.is_empty()) {
            return chat.id.clone();
        }
        let chat = Chat::new();
        let id = chat.id.clone();
        self.chats.insert(0, chat);
        self.current = Some(id.clone());
        self.error = None;
        id
    }

    pub fn select_chat(&mut self, id: &str) -> Result<(), ChatError> {
        if self.chat(id).is_none() {
            return Err(ChatError::ChatNotFound { id: id.to_string() });
        }
        self.current = Some(id.to_string());
        self.error = None;
        Ok(())
    }

    /// Removes a chat. If it was current, the chat that slides into its place
    /// becomes current, else the one before it, else nothing.
    pub fn delete_chat(&mut self, id: &str) -> Result<(), ChatError> {
        let index = self
            .chats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ChatError::ChatNotFound { id: id.to_string() })?;
        self.chats.remove(index);

        if self.turn.as_ref().is_some_and(|t| t.chat_id == id) {
            warn!("Abandoning in-flight turn of deleted chat {id}");
            self.turn = None;
            self.phase = TurnPhase::Idle;
        }

        if self.current.as_deref() == Some(id) {
            self.current = self
                .chats
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.chats.get(i)))
                .map(|c| c.id.clone());
            self.error = None;
        }
        Ok(())
    }

    /// Toggles feedback on an assistant message of the current chat.
    pub fn set_feedback(&mut self, message_id: &str, feedback: Feedback) -> Result<(), ChatError> {
        let current = self.current.clone().unwrap_or_default();
        let message = self
            .chats
            .iter_mut()
            .find(|c| c.id == current)
            .and_then(|c| c.message_mut(message_id))
            .filter(|m| m.role == MessageRole::Assistant)
            .ok_or_else(|| ChatError::InvalidHistory {
                message: format!("no assistant message '{message_id}' in the current chat"),
            })?;

        message.feedback = if message.feedback == Some(feedback) {
            None
        } else {
            Some(feedback)
        };
        Ok(())
    }

    /// Raises the banner without touching any open turn.
    pub fn show_error(&mut self, err: &ChatError) {
        warn!("{err}");
        self.error = Some(err.to_string());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Clears the notification only if it is still the one identified by `id`.
    pub fn dismiss_notification(&mut self, id: u64) {
        if self.notification.as_ref().is_some_and(|n| n.id == id) {
            self.notification = None;
        }
    }

    // ── Turn transitions ─────────────────────────────────────────────────────

    /// `Idle → Sending`: records the user message and an empty assistant
    /// placeholder that becomes the active message.
    pub fn submit(&mut self, text: &str) -> Result<TurnTicket, ChatError> {
        if self.turn.is_some() {
            return Err(ChatError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyField { field_name: "message".to_string() });
        }
        let length = text.chars().count();
        if length > self.max_message_length {
            return Err(ChatError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: self.max_message_length,
                actual_length: length,
            });
        }

        let existing = self.current_chat().map(|c| c.id.clone());
        let chat_id = match existing {
            Some(id) => id,
            None => self.new_chat(),
        };
        let index = self
            .chats
            .iter()
            .position(|c| c.id == chat_id)
            .ok_or_else(|| ChatError::ChatNotFound { id: chat_id.clone() })?;
        let mut chat = self.chats.remove(index);

        let user = Message::user(text);
        let assistant = Message::assistant("");
        let ticket = TurnTicket {
            chat_id: chat_id.clone(),
            user_message_id: user.id.clone(),
            assistant_id: assistant.id.clone(),
            history: chat.messages().iter().cloned().chain([user.clone()]).collect(),
        };
        chat.push_message(user);
        chat.push_message(assistant);
        self.chats.insert(0, chat);

        self.turn = Some(ActiveTurn {
            chat_id,
            assistant_id: ticket.assistant_id.clone(),
            produced_text: false,
            flashcard_count: 0,
        });
        self.phase = TurnPhase::Sending;
        self.error = None;
        self.notification = None;
        debug!("Turn opened for chat {}", ticket.chat_id);
        Ok(ticket)
    }

    /// True while the turn that created `assistant_id` is still open.
    pub fn owns_turn(&self, assistant_id: &str) -> bool {
        self.active_message_id() == Some(assistant_id)
    }

    /// Applies one decoded frame to the assistant message `assistant_id`.
    /// Frames from a turn that is no longer open are dropped.
    pub fn apply(&mut self, assistant_id: &str, frame: Frame) -> Applied {
        let Some(turn) = self.turn.as_mut().filter(|t| t.assistant_id == assistant_id) else {
            debug!("Dropping {} frame for closed turn {assistant_id}", frame.kind());
            return Applied::Ignored;
        };
        let Some(chat) = self.chats.iter_mut().find(|c| c.id == turn.chat_id) else {
            return Applied::Ignored;
        };

        match frame {
            Frame::TextDelta(delta) => {
                if delta.is_empty() {
                    return Applied::Ignored;
                }
                let Some(message) = chat.message_mut(&turn.assistant_id) else {
                    return Applied::Ignored;
                };
                message.content.push_str(&delta);
                turn.produced_text = true;
                self.phase = TurnPhase::StreamingText;
                Applied::Text
            }
            Frame::ToolInvocation(raw) => {
                debug!("Tool invoked: {raw}");
                Applied::Ignored
            }
            Frame::ToolResult(raw) => {
                let result = normalize_tool_result(&raw);
                if result.is_empty() {
                    return Applied::Ignored;
                }
                let count = result.flashcards.len();
                let suffix = success_suffix(count, result.message.as_deref());
                chat.attach_flashcards(&turn.assistant_id, result.flashcards);
                if let Some(message) = chat.message_mut(&turn.assistant_id) {
                    message.content.push_str(&suffix);
                }
                turn.flashcard_count += count;

                self.next_notification_id += 1;
                self.notification = Some(Notification {
                    id: self.next_notification_id,
                    text: notification_text(count),
                });
                debug!("Attached {count} flashcards to {}", turn.assistant_id);
                Applied::Flashcards(count)
            }
        }
    }

    /// `→ Finalized`: the stream ended normally. The active message is
    /// released and never written again. No-op unless `assistant_id` is the
    /// open turn.
    pub fn finish(&mut self, assistant_id: &str) {
        if !self.owns_turn(assistant_id) {
            debug!("Ignoring completion of closed turn {assistant_id}");
            return;
        }
        let Some(turn) = self.turn.take() else {
            return;
        };
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == turn.chat_id) {
            if let Some(message) = chat.message_mut(&turn.assistant_id) {
                if !turn.produced_text && turn.flashcard_count > 0 {
                    message.content = TOOL_ONLY_FALLBACK.to_string();
                } else if message.content.trim().is_empty() {
                    warn!("Stream ended without content");
                    message.content = EMPTY_RESPONSE_FALLBACK.to_string();
                }
            }
            chat.refresh();
        }
        self.phase = TurnPhase::Finalized;
    }

    /// `→ Errored`. Streamed content is never overwritten: a message that
    /// already has text keeps it and the error goes to the banner, while an
    /// empty placeholder shows the error in place. A failure reported for a
    /// turn that is no longer open changes nothing.
    pub fn fail(&mut self, assistant_id: &str, err: &ChatError) {
        if !self.owns_turn(assistant_id) {
            debug!("Ignoring failure of closed turn {assistant_id}: {err}");
            return;
        }
        let Some(turn) = self.turn.take() else {
            return;
        };
        error!("Turn failed: {err}");
        self.phase = TurnPhase::Errored;
        let message = self
            .chats
            .iter_mut()
            .find(|c| c.id == turn.chat_id)
            .and_then(|c| c.message_mut(&turn.assistant_id));

        match message {
            Some(message) if message.content.trim().is_empty() => {
                message.content = err.to_string();
            }
            _ => self.error = Some(err.to_string()),
        }
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

/// Relative day label used in the sidebar.
pub fn day_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - at).num_days();
    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => at.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn card_frame(count: usize) -> Frame {
        let cards: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"question":"Q{i}","answer":"A{i}","subject":"physics"}}"#))
            .collect();
        Frame::ToolResult(format!(r#"{{"result":{{"flashcards":[{}]}}}}"#, cards.join(",")))
    }

    fn active_content(store: &ChatStore, ticket: &TurnTicket) -> String {
        store
            .chat(&ticket.chat_id)
            .and_then(|c| c.message(&ticket.assistant_id))
            .map(|m| m.content.clone())
            .unwrap()
    }

    #[test]
    fn submit_opens_turn_with_placeholder() {
        let mut store = ChatStore::default();
        let ticket = store.submit("  What is inertia?  ").unwrap();

        assert_eq!(store.phase(), TurnPhase::Sending);
        assert!(store.is_busy() && store.is_loading() && !store.is_streaming());
        let messages = store.current_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "What is inertia?");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "");
        assert_eq!(ticket.history.len(), 1);
        assert_eq!(store.current_chat().unwrap().title, "What is inertia?");
    }

    #[test]
    fn duplicate_submit_is_refused() {
        let mut store = ChatStore::default();
        store.submit("first").unwrap();
        assert_eq!(store.submit("second"), Err(ChatError::Busy));
        assert_eq!(store.current_messages().len(), 2);
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let mut store = ChatStore::new(&ClientConfig { max_message_length: 5, ..ClientConfig::default() });
        assert!(matches!(store.submit("   "), Err(ChatError::EmptyField { .. })));
        assert!(matches!(store.submit("toolong"), Err(ChatError::FieldTooLong { actual_length: 7, .. })));
        assert!(store.chats().is_empty());
        assert_eq!(store.phase(), TurnPhase::Idle);
    }

    #[test]
    fn deltas_append_in_arrival_order() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();

        let id = ticket.assistant_id.as_str();

        assert_eq!(store.apply(id, Frame::TextDelta("Hello".into())), Applied::Text);
        assert_eq!(active_content(&store, &ticket), "Hello");
        assert_eq!(store.phase(), TurnPhase::StreamingText);

        store.apply(id, Frame::TextDelta(" ".into()));
        store.apply(id, Frame::TextDelta("world".into()));
        assert_eq!(active_content(&store, &ticket), "Hello world");

        store.finish(id);
        assert_eq!(store.phase(), TurnPhase::Finalized);
        assert!(!store.is_busy());
        assert_eq!(active_content(&store, &ticket), "Hello world");
    }

    #[test]
    fn tool_only_turn_gets_fallback_sentence() {
        let mut store = ChatStore::default();
        let ticket = store.submit("quiz me on optics").unwrap();

        assert_eq!(store.apply(&ticket.assistant_id, card_frame(2)), Applied::Flashcards(2));
        assert_eq!(store.notification().unwrap().text, "2 flashcards generated");
        assert_eq!(store.phase(), TurnPhase::Sending);
        store.finish(&ticket.assistant_id);

        assert_eq!(active_content(&store, &ticket), TOOL_ONLY_FALLBACK);
        let chat = store.chat(&ticket.chat_id).unwrap();
        assert_eq!(chat.flashcards_for(&ticket.assistant_id).len(), 2);
        assert_eq!(chat.flashcards().len(), 2);
    }

    #[test]
    fn flashcards_after_text_append_success_suffix() {
        let mut store = ChatStore::default();
        let ticket = store.submit("cards please").unwrap();
        let id = ticket.assistant_id.as_str();
        store.apply(id, Frame::TextDelta("Sure!".into()));
        store.apply(id, card_frame(1));
        store.finish(id);

        assert_eq!(
            active_content(&store, &ticket),
            "Sure!\n\nI've created 1 flashcard for you. Open the flashcards panel to study them."
        );
    }

    #[test]
    fn empty_tool_result_and_invocations_are_ignored() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();
        let id = ticket.assistant_id.as_str();
        assert_eq!(store.apply(id, Frame::ToolInvocation("{}".into())), Applied::Ignored);
        assert_eq!(store.apply(id, Frame::ToolResult(r#"{"other":1}"#.into())), Applied::Ignored);
        assert!(store.notification().is_none());
        store.finish(id);
        assert_eq!(active_content(&store, &ticket), EMPTY_RESPONSE_FALLBACK);
    }

    #[test]
    fn failure_keeps_partial_content_and_raises_banner() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();
        let id = ticket.assistant_id.as_str();
        store.apply(id, Frame::TextDelta("partial".into()));
        store.fail(id, &ChatError::stream("reset"));

        assert_eq!(store.phase(), TurnPhase::Errored);
        assert_eq!(active_content(&store, &ticket), "partial");
        assert_eq!(store.error(), Some("Stream interrupted: reset"));
        assert!(!store.is_busy());

        // Late frames after the turn closed are dropped.
        assert_eq!(store.apply(id, Frame::TextDelta("late".into())), Applied::Ignored);
        assert_eq!(active_content(&store, &ticket), "partial");
    }

    #[test]
    fn failure_before_text_is_shown_in_place() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();
        store.fail(&ticket.assistant_id, &ChatError::from_status(429));

        assert_eq!(store.error(), None);
        assert_eq!(
            active_content(&store, &ticket),
            "Too many requests to AI service. Please wait a moment and try again."
        );
    }

    #[test]
    fn error_outside_a_turn_goes_to_banner() {
        let mut store = ChatStore::default();
        store.show_error(&ChatError::network("offline"));
        assert_eq!(store.error(), Some("Network error: offline"));
        assert_eq!(store.phase(), TurnPhase::Idle);
        store.dismiss_error();
        assert_eq!(store.error(), None);
    }

    #[test]
    fn rejected_submit_banner_leaves_turn_open() {
        let mut store = ChatStore::default();
        let ticket = store.submit("first").unwrap();
        let err = store.submit("second").unwrap_err();
        store.show_error(&err);

        assert!(store.is_busy());
        assert_eq!(store.active_message_id(), Some(ticket.assistant_id.as_str()));
        assert_eq!(store.error(), Some("A response is still streaming; wait for it to finish"));
    }

    #[test]
    fn submit_clears_previous_error_and_notification() {
        let mut store = ChatStore::default();
        let ticket = store.submit("one").unwrap();
        store.apply(&ticket.assistant_id, card_frame(1));
        store.fail(&ticket.assistant_id, &ChatError::stream("x"));
        assert!(store.error().is_some() && store.notification().is_some());

        store.submit("two").unwrap();
        assert!(store.error().is_none() && store.notification().is_none());
        assert_eq!(store.current_messages().len(), 4);
    }

    #[test]
    fn stale_notification_dismissal_is_ignored() {
        let mut store = ChatStore::default();
        let ticket = store.submit("a").unwrap();
        store.apply(&ticket.assistant_id, card_frame(1));
        let first = store.notification().unwrap().id;
        store.apply(&ticket.assistant_id, card_frame(1));
        store.dismiss_notification(first);
        assert!(store.notification().is_some());
    }

    #[test]
    fn frames_follow_turn_when_user_switches_chat() {
        let mut store = ChatStore::default();
        let ticket = store.submit("streaming here").unwrap();
        let other = store.new_chat();
        assert_ne!(other, ticket.chat_id);

        store.apply(&ticket.assistant_id, Frame::TextDelta("still lands".into()));
        assert_eq!(active_content(&store, &ticket), "still lands");
        assert!(store.current_messages().is_empty());
    }

    #[test]
    fn new_chat_reuses_empty_current() {
        let mut store = ChatStore::default();
        let a = store.new_chat();
        let b = store.new_chat();
        assert_eq!(a, b);
        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn delete_falls_back_to_neighbour() {
        let mut store = ChatStore::default();
        let mut ids = Vec::new();
        for text in ["a", "b", "c"] {
            store.new_chat();
            let t = store.submit(text).unwrap();
            store.finish(&t.assistant_id);
            ids.push(t.chat_id);
        }
        // Order is most recent first: c, b, a.
        store.select_chat(&ids[1]).unwrap();
        store.delete_chat(&ids[1]).unwrap();
        assert_eq!(store.current_id(), Some(ids[0].as_str()));

        store.delete_chat(&ids[0]).unwrap();
        assert_eq!(store.current_id(), Some(ids[2].as_str()));

        store.delete_chat(&ids[2]).unwrap();
        assert_eq!(store.current_id(), None);
        assert!(matches!(store.delete_chat("nope"), Err(ChatError::ChatNotFound { .. })));
    }

    #[test]
    fn deleting_streaming_chat_abandons_turn() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();
        store.delete_chat(&ticket.chat_id).unwrap();
        assert!(!store.is_busy());
        assert_eq!(store.phase(), TurnPhase::Idle);
        assert_eq!(store.apply(&ticket.assistant_id, Frame::TextDelta("x".into())), Applied::Ignored);
        assert!(store.submit("again").is_ok());
    }

    #[test]
    fn abandoned_turn_cannot_touch_the_next_one() {
        let mut store = ChatStore::default();
        let old = store.submit("first question").unwrap();
        store.delete_chat(&old.chat_id).unwrap();
        let new = store.submit("second question").unwrap();

        // The deleted chat's stream is still delivering.
        let stale = old.assistant_id.as_str();
        assert_eq!(store.apply(stale, Frame::TextDelta("stale text from old turn".into())), Applied::Ignored);
        assert_eq!(store.apply(stale, card_frame(1)), Applied::Ignored);
        store.finish(stale);

        assert!(store.is_busy());
        assert!(store.owns_turn(&new.assistant_id) && !store.owns_turn(stale));
        assert_eq!(store.phase(), TurnPhase::Sending);
        assert_eq!(active_content(&store, &new), "");
        assert!(store.notification().is_none());

        assert_eq!(store.apply(&new.assistant_id, Frame::TextDelta("real answer".into())), Applied::Text);
        store.finish(&new.assistant_id);
        assert_eq!(active_content(&store, &new), "real answer");
        assert_eq!(store.phase(), TurnPhase::Finalized);
    }

    #[test]
    fn abandoned_turn_failure_is_ignored() {
        let mut store = ChatStore::default();
        let old = store.submit("hi").unwrap();
        store.delete_chat(&old.chat_id).unwrap();

        store.fail(&old.assistant_id, &ChatError::stream("reset"));
        assert_eq!(store.phase(), TurnPhase::Idle);
        assert_eq!(store.error(), None);

        let new = store.submit("again").unwrap();
        store.fail(&old.assistant_id, &ChatError::stream("reset"));
        assert!(store.owns_turn(&new.assistant_id));
        assert_eq!(store.phase(), TurnPhase::Sending);
        assert_eq!(store.error(), None);
        assert_eq!(active_content(&store, &new), "");
    }

    #[test]
    fn feedback_is_exclusive_and_toggles() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hi").unwrap();
        store.apply(&ticket.assistant_id, Frame::TextDelta("hello".into()));
        store.finish(&ticket.assistant_id);

        store.set_feedback(&ticket.assistant_id, Feedback::Liked).unwrap();
        let msg = |s: &ChatStore| s.current_chat().unwrap().message(&ticket.assistant_id).unwrap().clone();
        assert!(msg(&store).liked());

        store.set_feedback(&ticket.assistant_id, Feedback::Disliked).unwrap();
        assert!(msg(&store).disliked() && !msg(&store).liked());

        store.set_feedback(&ticket.assistant_id, Feedback::Disliked).unwrap();
        assert_eq!(msg(&store).feedback, None);

        assert!(store.set_feedback(&ticket.user_message_id, Feedback::Liked).is_err());
    }

    #[test]
    fn summaries_report_counts_and_current() {
        let mut store = ChatStore::default();
        let ticket = store.submit("hello there").unwrap();
        store.finish(&ticket.assistant_id);
        let summaries = store.summaries(Utc::now());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "hello there");
        assert_eq!(summaries[0].message_count, 2);
        assert_eq!(summaries[0].day_label, "Today");
        assert!(summaries[0].is_current);
    }

    #[test]
    fn day_labels() {
        let now = Utc::now();
        assert_eq!(day_label(now, now), "Today");
        assert_eq!(day_label(now - Duration::hours(30), now), "Yesterday");
        assert_eq!(day_label(now - Duration::days(3), now), "3 days ago");
        let old = now - Duration::days(30);
        assert_eq!(day_label(old, now), old.format("%Y-%m-%d").to_string());
        assert_eq!(day_label(now + Duration::hours(1), now), "Today");
    }
}
