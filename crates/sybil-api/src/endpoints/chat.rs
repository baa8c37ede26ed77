// Chat with the Sybil agent

use serde::Serialize;

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::{ChatMessage, ChatResponse};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatMessage],
}

impl SybilClient {
    /// Send one message with the conversation so far.
    ///
    /// `POST /admin/chat`
    pub async fn send_chat_message(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse, Error> {
        let url = self.url("/admin/chat")?;
        self.post(url, Some(&ChatRequest { message, history })).await
    }

    /// Backend chat health check; the payload is passed through untyped.
    ///
    /// `GET /admin/chat/health`
    pub async fn chat_health(&self) -> Result<serde_json::Value, Error> {
        let url = self.url("/admin/chat/health")?;
        self.get(url).await
    }
}
