use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::errors::{ChatError, ErrorKind};
use crate::models::{Message, MessageRole};
use crate::protocol::{Frame, FrameStream};
use crate::service::transport::Transport;
use crate::state::{ChatStore, TurnTicket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
}

impl ChatRequest {
    /// Keeps the trailing `history_window` messages, in order. `history` must
    /// end with the new user message, which is always sent.
    pub fn from_history(history: &[Message], config: &ClientConfig) -> Result<Self, ChatError> {
        let start = history.len().saturating_sub(config.history_window.max(1));
        let messages = history[start..]
            .iter()
            .map(|m| validate(m, config.max_message_length))
            .collect::<Result<Vec<_>, _>>()?;

        match messages.last() {
            Some(last) if last.role == MessageRole::User => Ok(Self { messages }),
            Some(_) => Err(ChatError::InvalidHistory {
                message: "the last message must come from the user".to_string(),
            }),
            None => Err(ChatError::InvalidHistory {
                message: "no messages to send".to_string(),
            }),
        }
    }
}

fn validate(message: &Message, max_length: usize) -> Result<WireMessage, ChatError> {
    let content = message.content.trim();
    if content.is_empty() {
        return Err(ChatError::InvalidHistory {
            message: format!("{} message '{}' has no content", message.role, message.id),
        });
    }
    if message.role == MessageRole::User {
        let length = content.chars().count();
        if length > max_length {
            return Err(ChatError::FieldTooLong {
                field_name: "content".to_string(),
                max_length,
                actual_length: length,
            });
        }
    }
    Ok(WireMessage {
        role: message.role,
        content: content.to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<ErrorKind>,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Turns a non-2xx body into an error, preferring the structured payload and
/// falling back to a message derived from the status.
pub fn error_from_body(status: u16, body: &str) -> ChatError {
    let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) else {
        warn!("HTTP {status} with non-JSON body ({} bytes)", body.len());
        return ChatError::from_status(status);
    };
    debug!(
        "HTTP {status} error payload (statusCode={:?}, timestamp={:?})",
        payload.status_code, payload.timestamp
    );

    let message = payload
        .error
        .into_iter()
        .chain(payload.message)
        .map(|m| m.trim().to_string())
        .find(|m| !m.is_empty());
    match message {
        Some(message) => ChatError::Http {
            status,
            kind: payload.error_type.unwrap_or_else(|| ErrorKind::from_status(status)),
            message,
        },
        None => ChatError::from_status(status),
    }
}

async fn read_body<S>(mut body: S) -> String
where
    S: Stream<Item = Result<bytes::Bytes, ChatError>> + Unpin,
{
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(e) => {
                warn!("Error body truncated: {e}");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Receives the outcome of a turn. Exactly one of `on_complete` or `on_error`
/// is called, after every frame.
pub trait TurnSink {
    fn on_frame(&mut self, frame: Frame);
    fn on_complete(&mut self);
    fn on_error(&mut self, error: &ChatError);

    /// Whether the turn still wants frames. Once this is false the stream is
    /// dropped unread.
    fn is_open(&self) -> bool {
        true
    }
}

/// Feeds one ticket's turn into a store.
pub struct StoreSink<'a> {
    store: &'a mut ChatStore,
    assistant_id: String,
}

impl<'a> StoreSink<'a> {
    pub fn new(store: &'a mut ChatStore, ticket: &TurnTicket) -> Self {
        Self {
            store,
            assistant_id: ticket.assistant_id.clone(),
        }
    }
}

impl TurnSink for StoreSink<'_> {
    fn on_frame(&mut self, frame: Frame) {
        self.store.apply(&self.assistant_id, frame);
    }

    fn on_complete(&mut self) {
        self.store.finish(&self.assistant_id);
    }

    fn on_error(&mut self, error: &ChatError) {
        self.store.fail(&self.assistant_id, error);
    }

    fn is_open(&self) -> bool {
        self.store.owns_turn(&self.assistant_id)
    }
}

/// Frame counts for one finished turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub text_deltas: usize,
    pub tool_invocations: usize,
    pub tool_results: usize,
}

impl TurnReport {
    fn record(&mut self, frame: &Frame) {
        match frame {
            Frame::TextDelta(_) => self.text_deltas += 1,
            Frame::ToolInvocation(_) => self.tool_invocations += 1,
            Frame::ToolResult(_) => self.tool_results += 1,
        }
    }
}

/// Runs request/response cycles against one endpoint.
pub struct SendPipeline<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> SendPipeline<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Submits `text` to the store and streams the reply into it.
    pub async fn send(&self, store: &mut ChatStore, text: &str) -> Result<TurnReport, ChatError> {
        let ticket = store.submit(text)?;
        self.drive(&ticket.history, &mut StoreSink::new(store, &ticket)).await
    }

    /// Streams one turn into `sink`. The sink is always closed, whether the
    /// stream ends cleanly, breaks off, or never opens.
    pub async fn drive<S>(&self, history: &[Message], sink: &mut S) -> Result<TurnReport, ChatError>
    where
        S: TurnSink + ?Sized,
    {
        match self.run(history, sink).await {
            Ok(report) => {
                info!(
                    "Turn complete: {} text deltas, {} tool results",
                    report.text_deltas, report.tool_results
                );
                sink.on_complete();
                Ok(report)
            }
            Err(e) => {
                sink.on_error(&e);
                Err(e)
            }
        }
    }

    async fn run<S>(&self, history: &[Message], sink: &mut S) -> Result<TurnReport, ChatError>
    where
        S: TurnSink + ?Sized,
    {
        let request = ChatRequest::from_history(history, &self.config)?;
        let response = self.transport.open(&request).await?;
        if !response.is_success() {
            let body = read_body(response.body).await;
            return Err(error_from_body(response.status, &body));
        }

        let mut frames = FrameStream::new(response.body);
        let mut report = TurnReport::default();
        while let Some(frame) = frames.next().await {
            if !sink.is_open() {
                warn!("Turn closed while streaming; dropping the rest of the response");
                break;
            }
            let frame = frame?;
            debug!("Applying {} frame", frame.kind());
            report.record(&frame);
            sink.on_frame(frame);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn request_keeps_trailing_window_in_order() {
        let mut messages = history(9);
        messages.push(Message::user("latest"));
        let request = ChatRequest::from_history(&messages, &ClientConfig::default()).unwrap();

        let contents: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["question 6", "answer 7", "question 8", "latest"]);
    }

    #[test]
    fn window_is_configurable() {
        let messages = history(7);
        let config = ClientConfig { history_window: 6, ..ClientConfig::default() };
        let request = ChatRequest::from_history(&messages, &config).unwrap();
        assert_eq!(request.messages.len(), 6);
        assert_eq!(request.messages[0].content, "answer 1");
    }

    #[test]
    fn zero_window_still_sends_latest_question() {
        let mut messages = history(3);
        messages.push(Message::user("latest"));
        let config = ClientConfig { history_window: 0, ..ClientConfig::default() };
        let request = ChatRequest::from_history(&messages, &config).unwrap();
        assert_eq!(request.messages, [WireMessage { role: MessageRole::User, content: "latest".into() }]);
    }

    #[test]
    fn short_history_is_sent_whole() {
        let request = ChatRequest::from_history(&history(1), &ClientConfig::default()).unwrap();
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = ChatRequest::from_history(&[Message::user("hi")], &ClientConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "messages": [{ "role": "user", "content": "hi" }] })
        );
    }

    #[test]
    fn malformed_history_is_rejected() {
        let config = ClientConfig::default();
        assert!(ChatRequest::from_history(&[], &config).unwrap_err().is_validation());
        assert!(ChatRequest::from_history(&history(2), &config).unwrap_err().is_validation());

        let blank = vec![Message::assistant("  "), Message::user("q")];
        assert!(ChatRequest::from_history(&blank, &config).is_err());

        let long = vec![Message::user("x".repeat(config.max_message_length + 1))];
        assert!(matches!(
            ChatRequest::from_history(&long, &config),
            Err(ChatError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn structured_error_body_is_used() {
        let body = r#"{"success":false,"error":"AI Gateway authentication failed.","errorType":"AUTH","statusCode":401,"timestamp":"2024-01-01T00:00:00Z"}"#;
        assert_eq!(
            error_from_body(401, body),
            ChatError::Http {
                status: 401,
                kind: ErrorKind::Auth,
                message: "AI Gateway authentication failed.".to_string(),
            }
        );
    }

    #[test]
    fn message_field_is_accepted_when_error_missing() {
        let err = error_from_body(400, r#"{"message":"Topic cannot be empty."}"#);
        assert_eq!(err.to_string(), "Topic cannot be empty.");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn non_json_error_body_falls_back_to_status() {
        assert_eq!(error_from_body(503, "<html>Bad gateway</html>"), ChatError::from_status(503));
        assert_eq!(error_from_body(500, r#"{"error":"  "}"#), ChatError::from_status(500));
    }
}
