use bytes::Bytes;
use futures_util::stream::{self, LocalBoxStream, StreamExt};
use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use tutor_chat::config::ClientConfig;
use tutor_chat::errors::ChatError;
use tutor_chat::service::{ChatRequest, HttpResponse, Transport};

/// Chat endpoint, served from the same origin as the app.
const API_URL: &str = "/api/chat";

pub fn client_config() -> ClientConfig {
    ClientConfig::default().with_api_url(API_URL)
}

pub type FetchBody = LocalBoxStream<'static, Result<Bytes, ChatError>>;

/// Streams the chat response through `fetch` and the body's `ReadableStream`.
pub struct FetchTransport {
    url: String,
}

impl FetchTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Transport for FetchTransport {
    type Body = FetchBody;

    async fn open(&self, request: &ChatRequest) -> Result<HttpResponse<Self::Body>, ChatError> {
        let resp = Request::post(&self.url)
            .json(request)
            .map_err(|e| ChatError::network(format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| ChatError::network(e.to_string()))?;

        let status = resp.status();
        let body = match resp.body() {
            Some(stream) => read_chunks(stream.get_reader().unchecked_into()),
            None => stream::empty().boxed_local(),
        };
        Ok(HttpResponse { status, body })
    }
}

fn js_field(obj: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(obj, &JsValue::from_str(name)).ok()
}

/// Pulls `Uint8Array` chunks until the reader reports `done` or rejects.
fn read_chunks(reader: ReadableStreamDefaultReader) -> FetchBody {
    stream::unfold(Some(reader), |reader| async move {
        let reader = reader?;
        match JsFuture::from(reader.read()).await {
            Ok(result) => {
                let done = js_field(&result, "done")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                if done {
                    return None;
                }
                let chunk = js_field(&result, "value")
                    .map(|v| Uint8Array::new(&v).to_vec())
                    .unwrap_or_default();
                Some((Ok(Bytes::from(chunk)), Some(reader)))
            }
            Err(e) => {
                log::warn!("Response body read failed: {e:?}");
                Some((Err(ChatError::stream(format!("{e:?}"))), None))
            }
        }
    })
    .boxed_local()
}
