//! Client core for the streaming tutor chat: wire protocol decoding,
//! flashcard extraction, conversation state, scroll policy, and the send
//! pipeline that ties them together.

pub mod config;
pub mod errors;
pub mod flashcards;
pub mod models;
pub mod protocol;
pub mod service;
pub mod state;
pub mod viewport;

pub use config::ClientConfig;
pub use errors::{ChatError, ErrorKind};
pub use models::{Feedback, Flashcard, Message, MessageRole, Subject};
pub use protocol::Frame;
pub use service::{SendPipeline, Transport, TurnSink};
pub use state::{ChatStore, TurnPhase};
