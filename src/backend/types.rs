use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stream::Citation;

/// Server-side identifier of a chat session (one uploaded document).
pub type SessionId = i64;

/// Correlation token minted when a question is submitted. Every event of the
/// resulting stream is routed to the assistant message carrying this id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    /// The history endpoint stores answers as `"ai"`.
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// One entry of the conversation log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    /// Present on assistant turns produced in this view; absent for user
    /// turns and for history fetched from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TurnId>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    /// An empty assistant message waiting for stream events.
    pub fn pending_answer(id: TurnId) -> Self {
        Self {
            id: Some(id),
            role: Role::Assistant,
            content: String::new(),
            sources: Vec::new(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Signed-in account, as returned by `/login`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub username: String,
}

/// Row of the session list (`/sessions/{user_id}`), newest first.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub pdf_name: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
}

/// Response of `/upload`. `session_id` is only present for signed-in uploads.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub filename: String,
}
