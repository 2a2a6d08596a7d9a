//! Extracts flashcards from tool-result payloads.
//!
//! The tool-calling layer has shipped the result under several nestings over
//! time. Each known nesting is an extractor; they are probed in order and the
//! first one holding a `flashcards` array wins.

pub mod deck;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ChatError;
use crate::models::{Flashcard, Subject};

pub use deck::{Deck, ViewMode};

/// Cards recovered from one tool result plus the tool's own status line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResultCards {
    pub flashcards: Vec<Flashcard>,
    pub message: Option<String>,
}

impl ToolResultCards {
    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty()
    }
}

type Extractor = fn(&Value) -> Option<&Value>;

fn output(v: &Value) -> Option<&Value> {
    v.get("output")
}

fn tool_result(v: &Value) -> Option<&Value> {
    v.get("toolResult")?.get("result")
}

fn result(v: &Value) -> Option<&Value> {
    v.get("result")
}

fn top_level(v: &Value) -> Option<&Value> {
    Some(v)
}

/// Probe order matters: wrappers first, bare payload last.
const EXTRACTORS: [(&str, Extractor); 4] = [
    ("output.flashcards", output),
    ("toolResult.result.flashcards", tool_result),
    ("result.flashcards", result),
    ("flashcards", top_level),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCard {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default, alias = "created_at")]
    created_at: Option<String>,
}

/// Normalizes a raw `2:` payload. Unrecognized shapes produce an empty result,
/// never an error.
pub fn normalize_tool_result(raw: &str) -> ToolResultCards {
    let value = match parse_payload(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{e}");
            return ToolResultCards::default();
        }
    };

    let Some((shape, container, cards)) = EXTRACTORS.iter().find_map(|(shape, extract)| {
        let container = extract(&value)?;
        let cards = container.get("flashcards")?.as_array()?;
        Some((*shape, container, cards))
    }) else {
        debug!("Tool result carried no flashcards");
        return ToolResultCards::default();
    };
    debug!("Tool result matched shape {shape} with {} cards", cards.len());

    let default_subject = container
        .get("subject")
        .or_else(|| value.get("subject"))
        .and_then(Value::as_str);
    let now = Utc::now();

    let flashcards = cards
        .iter()
        .enumerate()
        .filter_map(|(index, card)| match normalize_card(index, card, default_subject, now) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("{e}");
                None
            }
        })
        .collect();

    let message = container
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    ToolResultCards { flashcards, message }
}

/// Accepts an object directly or one that was JSON-encoded a second time.
fn parse_payload(raw: &str) -> Result<Value, ChatError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ChatError::protocol(format!("tool result is not JSON: {e}")))?;
    match value {
        Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| ChatError::protocol(format!("tool result string is not JSON: {e}"))),
        other => Ok(other),
    }
}

fn normalize_card(
    index: usize,
    value: &Value,
    default_subject: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Flashcard, ChatError> {
    let reject = |reason: &str| ChatError::Content {
        index,
        reason: reason.to_string(),
    };

    let raw: RawCard = serde_json::from_value(value.clone())
        .map_err(|e| reject(&format!("unreadable card: {e}")))?;

    let question = raw.question.as_deref().map(str::trim).unwrap_or_default();
    if question.is_empty() {
        return Err(reject("missing question"));
    }
    let answer = raw.answer.as_deref().map(str::trim).unwrap_or_default();
    if answer.is_empty() {
        return Err(reject("missing answer"));
    }

    let subject: Subject = raw
        .subject
        .as_deref()
        .or(default_subject)
        .ok_or_else(|| reject("missing subject"))?
        .parse()
        .map_err(|e: String| reject(&e))?;

    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("flashcard-{}", Uuid::new_v4()),
    };

    let created_at = raw
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(now);

    Ok(Flashcard {
        id,
        question: question.to_string(),
        answer: answer.to_string(),
        subject,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_shape_yields_card_with_generated_id() {
        let raw = r#"{"output":{"flashcards":[{"question":"Q","answer":"A","subject":"physics"}],"message":"ok"}}"#;
        let result = normalize_tool_result(raw);

        assert_eq!(result.flashcards.len(), 1);
        let card = &result.flashcards[0];
        assert_eq!(card.question, "Q");
        assert_eq!(card.answer, "A");
        assert_eq!(card.subject, Subject::Physics);
        assert!(card.id.starts_with("flashcard-"));
        assert_eq!(result.message.as_deref(), Some("ok"));
    }

    #[test]
    fn each_known_shape_is_recognized() {
        let card = r#"{"question":"Q","answer":"A","subject":"biology"}"#;
        let shapes = [
            format!(r#"{{"toolResult":{{"result":{{"flashcards":[{card}]}}}}}}"#),
            format!(r#"{{"result":{{"flashcards":[{card}]}}}}"#),
            format!(r#"{{"flashcards":[{card}]}}"#),
        ];
        for raw in shapes {
            assert_eq!(normalize_tool_result(&raw).flashcards.len(), 1, "{raw}");
        }
    }

    #[test]
    fn earlier_shape_wins_over_later() {
        let raw = r#"{
            "output": {"flashcards": [{"question":"from output","answer":"A","subject":"physics"}]},
            "flashcards": [{"question":"from top","answer":"A","subject":"physics"}]
        }"#;
        let result = normalize_tool_result(raw);
        assert_eq!(result.flashcards[0].question, "from output");
    }

    #[test]
    fn null_array_falls_through_to_next_shape() {
        let raw = r#"{"output":{"flashcards":null},"result":{"flashcards":[{"question":"Q","answer":"A","subject":"chemistry"}]}}"#;
        assert_eq!(normalize_tool_result(raw).flashcards.len(), 1);
    }

    #[test]
    fn unknown_shapes_normalize_to_empty() {
        for raw in [
            r#"{"cards":[]}"#,
            r#"{"flashcards":"not an array"}"#,
            "[]",
            "not json at all",
            "42",
        ] {
            let result = normalize_tool_result(raw);
            assert!(result.is_empty(), "{raw}");
            assert_eq!(result.message, None);
        }
    }

    #[test]
    fn double_encoded_payload_is_accepted() {
        let inner = r#"{"result":{"flashcards":[{"question":"Q","answer":"A","subject":"physics"}]}}"#;
        let raw = serde_json::to_string(inner).unwrap();
        assert_eq!(normalize_tool_result(&raw).flashcards.len(), 1);
    }

    #[test]
    fn keeps_supplied_id_and_timestamp() {
        let raw = r#"{"flashcards":[{"id":"card-7","question":"Q","answer":"A","subject":"physics","createdAt":"2024-03-01T10:00:00Z"}]}"#;
        let card = &normalize_tool_result(raw).flashcards[0];
        assert_eq!(card.id, "card-7");
        assert_eq!(card.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn invalid_cards_are_dropped_individually() {
        let raw = r#"{"result":{"subject":"chemistry","flashcards":[
            {"question":"  ","answer":"A"},
            {"question":"Q","answer":""},
            {"question":"Q","answer":"A","subject":"astronomy"},
            {"question":" Kept ","answer":" yes "}
        ]}}"#;
        let result = normalize_tool_result(raw);
        assert_eq!(result.flashcards.len(), 1);
        assert_eq!(result.flashcards[0].question, "Kept");
        assert_eq!(result.flashcards[0].answer, "yes");
        assert_eq!(result.flashcards[0].subject, Subject::Chemistry);
    }
}
