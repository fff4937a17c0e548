//! Wire types and the backend seam.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BackendError;
use crate::transcript::Role;

/// Opaque chat identifier. The server may send it as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Int(n) => Self(n.to_string()),
            RawId::Float(n) => Self(n.to_string()),
        })
    }
}

/// One row of `GET /api/chats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: ChatId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub is_current: bool,
}

impl ChatSummary {
    /// Parse `updated_at`. Accepts RFC 3339 and naive ISO timestamps with
    /// or without fractional seconds.
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        let raw = self.updated_at.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    /// "Today 14:05", "Yesterday 09:12" or "2024-03-01", relative to `today`.
    pub fn age_label(&self, today: NaiveDate) -> String {
        let Some(updated) = self.updated_at() else {
            return self.updated_at.clone();
        };
        let days = (today - updated.date()).num_days();
        match days {
            0 => format!("Today {}", updated.format("%H:%M")),
            1 => format!("Yesterday {}", updated.format("%H:%M")),
            _ => updated.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A message as stored by the server for a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl StoredMessage {
    /// `None` for roles the transcript does not show (e.g. `system`).
    pub fn role(&self) -> Option<Role> {
        match self.role.as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatDetail {
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

/// The chat server as seen by the client.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat`. Returns the assistant's reply.
    async fn send_chat(&self, message: &str) -> Result<String, BackendError>;

    /// `GET /api/chats`, most recent first.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError>;

    /// `POST /api/chat/{id}/load`. Makes `id` the active chat.
    async fn load_chat(&self, id: &ChatId) -> Result<(), BackendError>;

    /// `POST /api/chat/{id}/delete`.
    async fn delete_chat(&self, id: &ChatId) -> Result<(), BackendError>;

    /// `POST /api/chat/new`. Fails with [`BackendError::Unauthorized`] on 401.
    async fn new_chat(&self) -> Result<(), BackendError>;

    /// `GET /api/chat/{id}`. Messages of one chat, oldest first.
    async fn chat_messages(&self, id: &ChatId) -> Result<Vec<StoredMessage>, BackendError>;
}
