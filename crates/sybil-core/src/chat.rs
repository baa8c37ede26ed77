// ── Assistant chat ──
//
// A bounded, per-user transcript and the send loop on top of it. The
// transcript is an advisory local cache; the backend never reads it
// except as the `history` of the next message.

use std::collections::VecDeque;

use chrono::Utc;
use sybil_api::{ChatMessage, ChatRole, SybilClient};
use tracing::debug;

use crate::error::CoreError;

/// Messages kept per user.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Shown when a conversation starts; never sent to the backend.
pub const GREETING: &str = "Hello! I'm Sybil, Climate Hub's AI assistant. I can help you find \
information about our meetings, environmental initiatives, policy decisions, and team \
activities. What would you like to know?";

// ── ChatHistory ─────────────────────────────────────────────────────

/// Ring buffer of the most recent messages for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatHistory {
    user: String,
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatHistory {
    pub fn new(user: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            user: user.into(),
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild from cached messages, keeping only the newest `capacity`.
    pub fn from_messages(
        user: impl Into<String>,
        capacity: usize,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> Self {
        let mut history = Self::new(user, capacity);
        for message in messages {
            history.push(message);
        }
        history
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append, evicting the oldest message when full.
    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Contiguous copy, oldest first.
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

// ── ChatSession ─────────────────────────────────────────────────────

/// A conversation with the assistant.
#[derive(Debug)]
pub struct ChatSession {
    client: SybilClient,
    history: ChatHistory,
}

impl ChatSession {
    pub fn new(client: SybilClient, history: ChatHistory) -> Self {
        Self { client, history }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn into_history(self) -> ChatHistory {
        self.history
    }

    /// Send `text` with the prior history and record the reply.
    ///
    /// The user's message stays in the transcript even if the call fails,
    /// so the failed turn remains visible.
    pub async fn send(&mut self, text: &str) -> Result<&ChatMessage, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "message".into(),
                reason: "message is empty".into(),
            });
        }

        let prior = self.history.to_vec();
        self.history.push(ChatMessage {
            role: ChatRole::User,
            content: text.to_owned(),
            timestamp: Utc::now().to_rfc3339(),
        });

        debug!(history = prior.len(), "sending chat message");
        let reply = self.client.send_chat_message(text, &prior).await?;

        self.history.push(ChatMessage {
            role: ChatRole::Assistant,
            content: reply.response,
            timestamp: reply.timestamp,
        });
        self.history
            .messages
            .back()
            .ok_or_else(|| CoreError::Internal("chat history is empty after push".into()))
    }
}
