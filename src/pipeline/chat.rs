//! Chat thread over a meeting's transcript.
//!
//! The thread is append-only. A question is recorded immediately as a
//! pending user message; when the backend answers (or fails), the pending
//! message resolves and exactly one assistant message is appended.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::ApiError;

/// Shown in place of an answer when the chat request fails.
pub const CHAT_FAILURE_FALLBACK: &str = "Sorry, there was an error processing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Resolved,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub delivery: Delivery,
}

#[derive(Debug, Default)]
pub struct ChatThread {
    messages: Vec<ChatMessage>,
}

impl ChatThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record a question as pending and return its id for later completion.
    pub fn begin(&mut self, question: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.push(ChatMessage {
            id,
            role: ChatRole::User,
            content: question.to_string(),
            timestamp: Utc::now(),
            delivery: Delivery::Pending,
        });
        id
    }

    /// Resolve a pending question. On success the reply is appended as an
    /// assistant message; on failure the fallback text is appended instead
    /// and the question is marked failed.
    pub fn complete(&mut self, id: Uuid, result: Result<String, ApiError>) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return;
        };
        let reply = match result {
            Ok(reply) => {
                message.delivery = Delivery::Resolved;
                reply
            }
            Err(_) => {
                message.delivery = Delivery::Failed;
                CHAT_FAILURE_FALLBACK.to_string()
            }
        };
        self.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content: reply,
            timestamp: Utc::now(),
            delivery: Delivery::Resolved,
        });
    }
}
