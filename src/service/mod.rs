//! Sending a turn: request shaping, transport, and streaming into state.

pub mod send_pipeline;
pub mod transport;

pub use send_pipeline::{
    error_from_body, ChatRequest, SendPipeline, StoreSink, TurnReport, TurnSink, WireMessage,
};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::ReqwestTransport;
pub use transport::{HttpResponse, Transport};
