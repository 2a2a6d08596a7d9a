use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/chat";
/// Prior messages (including the new one) sent with each request.
pub const DEFAULT_HISTORY_WINDOW: usize = 4;
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    pub history_window: usize,
    pub max_message_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}
