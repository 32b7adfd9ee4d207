//! In-memory conversation history, keyed by session id.
//!
//! Sessions live for the lifetime of the process; unlike the chunk index
//! there is no persistence, a restart starts every conversation fresh.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

#[derive(Default)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh session and returns its id.
    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Vec::new());
        session_id
    }

    /// Appends a message. Unknown session ids are created on the fly so
    /// callers can bring their own ids without registering them first.
    pub async fn add_message(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let message = Message {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    /// Returns the last `limit` messages in chronological order, or the
    /// whole history when `limit` is `None`. Unknown sessions yield an
    /// empty list.
    pub async fn get_history(&self, session_id: &str, limit: Option<usize>) -> Vec<Message> {
        let sessions = self.sessions.read().await;
        let Some(messages) = sessions.get(session_id) else {
            return Vec::new();
        };
        let take = limit.unwrap_or(messages.len()).min(messages.len());
        messages[messages.len() - take..].to_vec()
    }

    /// Renders the last `max_messages` messages as prompt text, one
    /// `Human:`/`Assistant:` line per message with a blank line between
    /// turns. Empty history renders as an empty string.
    pub async fn format_history_for_prompt(&self, session_id: &str, max_messages: usize) -> String {
        let history = self.get_history(session_id, Some(max_messages)).await;
        let mut formatted = String::new();
        for message in &history {
            formatted.push_str(&format!(
                "{}: {}\n\n",
                message.role.prompt_label(),
                message.content
            ));
        }
        formatted.trim().to_string()
    }
}
