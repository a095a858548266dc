use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::Sender;

use super::types::{Credentials, Message, SessionId, SessionSummary, UploadReceipt, User};
use crate::stream::{StreamChunk, StreamError, StreamStats};

/// Errors that can occur talking to the document-chat server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend misconfigured (bad URL, client could not be built).
    #[error("config error: {0}")]
    Config(String),
    /// Network-level failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// Server answered with a non-success status. `message` is the server's
    /// `detail` text when it sent one.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// Local file could not be read (upload).
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
    /// The answer stream broke after it started.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ApiError {
    /// Text suitable for a toast: the server's own words when available.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Body of the streaming chat endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub question: String,
    /// Conversation as it was before this question.
    pub history: Vec<Message>,
    pub session_id: Option<SessionId>,
}

/// Everything the client needs from the server.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError>;

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, ApiError>;

    async fn history(&self, session_id: SessionId) -> Result<Vec<Message>, ApiError>;

    async fn delete_session(&self, session_id: SessionId) -> Result<(), ApiError>;

    async fn upload(&self, path: &Path, user_id: Option<i64>) -> Result<UploadReceipt, ApiError>;

    /// Streams an answer, sending chunks to the provided channel in arrival
    /// order. Returns once the response body has ended.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        sender: Sender<StreamChunk>,
    ) -> Result<StreamStats, ApiError>;
}
