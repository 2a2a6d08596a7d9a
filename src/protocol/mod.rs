//! The line-delimited streaming protocol spoken by the chat endpoint.
//!
//! Each record is `<tag>:<json>` followed by a newline:
//! - `0` text delta (JSON string)
//! - `2` tool result (JSON object)
//! - `8` tool invocation notice
//! - `1` reserved function-call notice, ignored

pub mod decoder;
pub mod frame;

pub use decoder::{FrameStream, LineDecoder};
pub use frame::{decode_payload, parse_line, Frame, Payload};
