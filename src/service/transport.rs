use bytes::Bytes;
use futures_util::Stream;

use crate::errors::ChatError;
use crate::service::send_pipeline::ChatRequest;

/// Status line plus a still-open body.
pub struct HttpResponse<B> {
    pub status: u16,
    pub body: B,
}

impl<B> HttpResponse<B> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opens the streaming chat request. Implemented over `reqwest` natively and
/// over `fetch` in the browser.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Body: Stream<Item = Result<Bytes, ChatError>> + Unpin;

    /// Resolves as soon as the response headers are in; the body is read
    /// lazily afterwards.
    async fn open(&self, request: &ChatRequest) -> Result<HttpResponse<Self::Body>, ChatError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::pin::Pin;

    use bytes::Bytes;
    use futures_util::{Stream, StreamExt};
    use tracing::debug;

    use super::{HttpResponse, Transport};
    use crate::errors::ChatError;
    use crate::service::send_pipeline::ChatRequest;

    pub type ReqwestBody = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        url: String,
    }

    impl ReqwestTransport {
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                url: url.into(),
            }
        }
    }

    impl Transport for ReqwestTransport {
        type Body = ReqwestBody;

        async fn open(&self, request: &ChatRequest) -> Result<HttpResponse<Self::Body>, ChatError> {
            debug!("POST {} with {} messages", self.url, request.messages.len());
            let response = self
                .client
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| ChatError::network(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| ChatError::stream(e.to_string())));
            Ok(HttpResponse {
                status,
                body: Box::pin(body),
            })
        }
    }
}
