use serde_json::Value;
use tracing::{debug, warn};

/// One decoded record of the line protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `0:` assistant text, already unwrapped from its JSON string.
    TextDelta(String),
    /// `8:` notice that the server invoked a tool. Informational only.
    ToolInvocation(String),
    /// `2:` raw tool result payload, handed to the flashcard normalizer.
    ToolResult(String),
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::TextDelta(_) => "text_delta",
            Frame::ToolInvocation(_) => "tool_invocation",
            Frame::ToolResult(_) => "tool_result",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Text,
    FunctionCall,
    ToolResult,
    ToolInvocation,
}

const TAGS: [(u8, Tag); 4] = [
    (b'0', Tag::Text),
    (b'1', Tag::FunctionCall),
    (b'2', Tag::ToolResult),
    (b'8', Tag::ToolInvocation),
];

fn lookup_tag(byte: u8) -> Option<Tag> {
    TAGS.iter().find(|(b, _)| *b == byte).map(|(_, tag)| *tag)
}

/// Result of decoding the JSON half of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The payload was valid JSON. Strings are unwrapped, anything else is
    /// kept as its raw text.
    Parsed(String),
    /// The payload was not valid JSON; surrounding quotes were stripped.
    Recovered(String),
}

impl Payload {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Payload::Recovered(_))
    }

    pub fn into_inner(self) -> String {
        match self {
            Payload::Parsed(s) | Payload::Recovered(s) => s,
        }
    }
}

/// Tries a structured parse first and falls back to stripping one leading and
/// one trailing quote.
pub fn decode_payload(raw: &str) -> Payload {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(s)) => Payload::Parsed(s),
        Ok(_) => Payload::Parsed(raw.to_string()),
        Err(_) => {
            let s = raw.strip_prefix('"').unwrap_or(raw);
            let s = s.strip_suffix('"').unwrap_or(s);
            Payload::Recovered(s.to_string())
        }
    }
}

/// Classifies one complete line. Empty, unknown and reserved lines yield `None`.
pub fn parse_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let bytes = line.as_bytes();
    if bytes.len() < 2 || bytes[1] != b':' {
        if !line.trim().is_empty() {
            debug!("Skipping untagged line ({} bytes)", line.len());
        }
        return None;
    }

    let Some(tag) = lookup_tag(bytes[0]) else {
        debug!("Skipping line with unknown tag '{}'", char::from(bytes[0]));
        return None;
    };

    // Both prefix bytes are ASCII, so index 2 is a char boundary.
    let raw = &line[2..];
    let payload = decode_payload(raw);
    if payload.is_recovered() {
        warn!("Recovered non-JSON payload for tag '{}'", char::from(bytes[0]));
    }

    match tag {
        Tag::Text => Some(Frame::TextDelta(payload.into_inner())),
        Tag::ToolResult => Some(Frame::ToolResult(payload.into_inner())),
        Tag::ToolInvocation => Some(Frame::ToolInvocation(payload.into_inner())),
        Tag::FunctionCall => {
            debug!("Ignoring reserved function-call notice");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_is_unwrapped_from_json() {
        assert_eq!(
            parse_line(r#"0:"Hello \"there\"\n""#),
            Some(Frame::TextDelta("Hello \"there\"\n".to_string()))
        );
    }

    #[test]
    fn malformed_json_falls_back_to_quote_stripping() {
        let payload = decode_payload(r#""broken \x escape""#);
        assert!(payload.is_recovered());
        assert_eq!(payload.into_inner(), r"broken \x escape");

        assert_eq!(
            parse_line(r#"0:"half open"#),
            Some(Frame::TextDelta("half open".to_string()))
        );
    }

    #[test]
    fn tool_result_object_keeps_raw_text() {
        let line = r#"2:{"result":{"flashcards":[]}}"#;
        assert_eq!(
            parse_line(line),
            Some(Frame::ToolResult(r#"{"result":{"flashcards":[]}}"#.to_string()))
        );
    }

    #[test]
    fn tool_invocation_is_decoded() {
        let frame = parse_line(r#"8:{"toolName":"generateFlashcards"}"#);
        assert!(matches!(frame, Some(Frame::ToolInvocation(_))));
    }

    #[test]
    fn unknown_reserved_and_empty_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("\r"), None);
        assert_eq!(parse_line("x"), None);
        assert_eq!(parse_line(r#"1:{"name":"f"}"#), None);
        assert_eq!(parse_line(r#"9:"nope""#), None);
        assert_eq!(parse_line("no tag here"), None);
        assert_eq!(parse_line("é:\"x\""), None);
    }

    #[test]
    fn carriage_return_is_trimmed() {
        assert_eq!(
            parse_line("0:\"hi\"\r"),
            Some(Frame::TextDelta("hi".to_string()))
        );
    }
}
