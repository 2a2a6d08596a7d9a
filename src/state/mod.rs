//! Conversation state and the per-turn state machine.

pub mod chat;
pub mod store;
pub mod turn;

pub use chat::{derive_title, Chat, UNTITLED_CHAT};
pub use store::{day_label, ChatStore, ChatSummary};
pub use turn::{
    Applied, Notification, TurnPhase, TurnTicket, EMPTY_RESPONSE_FALLBACK, TOOL_ONLY_FALLBACK,
};
