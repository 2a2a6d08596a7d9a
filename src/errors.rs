use serde::Deserialize;
use thiserror::Error;

/// Coarse category of a failure, as reported by the chat endpoint in its
/// `errorType` field or inferred from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    AiProcessing,
    Parsing,
    #[serde(other)]
    Unknown,
}

impl ErrorKind {
    /// Best-effort category for a status code when the body carried none.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 | 403 | 429 => ErrorKind::Auth,
            408 | 502 | 503 | 504 => ErrorKind::Network,
            422 => ErrorKind::AiProcessing,
            _ => ErrorKind::Unknown,
        }
    }
}

/// Every failure the client can observe, grouped the way the UI surfaces them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    // ── Transport ────────────────────────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("{message}")]
    Http {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    #[error("Stream interrupted: {message}")]
    Stream { message: String },

    // ── Protocol ─────────────────────────────────────────────────────────────
    #[error("Malformed frame: {message}")]
    Protocol { message: String },

    // ── Content ──────────────────────────────────────────────────────────────
    #[error("Flashcard {index} rejected: {reason}")]
    Content { index: usize, reason: String },

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Your message is too long ({actual_length} characters). Please keep messages under {max_length} characters.")]
    FieldTooLong {
        field_name: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Invalid message history: {message}")]
    InvalidHistory { message: String },

    // ── Conversation ─────────────────────────────────────────────────────────
    #[error("A response is still streaming; wait for it to finish")]
    Busy,

    #[error("Chat '{id}' not found")]
    ChatNotFound { id: String },
}

impl ChatError {
    pub fn network(message: impl Into<String>) -> Self {
        ChatError::Network { message: message.into() }
    }

    pub fn stream(message: impl Into<String>) -> Self {
        ChatError::Stream { message: message.into() }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        ChatError::Protocol { message: message.into() }
    }

    /// Builds the error for a non-2xx status that came without a usable body.
    pub fn from_status(status: u16) -> Self {
        ChatError::Http {
            status,
            kind: ErrorKind::from_status(status),
            message: status_message(status).to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Network { .. } | ChatError::Http { .. } | ChatError::Stream { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyField { .. }
                | ChatError::FieldTooLong { .. }
                | ChatError::InvalidHistory { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Network { .. } | ChatError::Stream { .. } => ErrorKind::Network,
            ChatError::Http { kind, .. } => *kind,
            ChatError::Protocol { .. } => ErrorKind::Parsing,
            ChatError::Content { .. } => ErrorKind::AiProcessing,
            ChatError::EmptyField { .. }
            | ChatError::FieldTooLong { .. }
            | ChatError::InvalidHistory { .. } => ErrorKind::Validation,
            ChatError::Busy | ChatError::ChatNotFound { .. } => ErrorKind::Unknown,
        }
    }
}

/// User-facing text for a bare status code.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid input provided. Please check your input and try again.",
        401 | 403 => "Unauthorized access to AI service. Please verify your credentials.",
        408 => "Request timed out. Please try again.",
        422 => "Error processing your request. Please try again.",
        429 => "Too many requests to AI service. Please wait a moment and try again.",
        502 | 503 | 504 => "Network error occurred. Please check your connection and try again.",
        _ => "Server error occurred. Please try again later.",
    }
}
