//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::backend::{
    ApiError, ChatBackend, ChatRequest, Credentials, Message, SessionId, SessionSummary,
    UploadReceipt, User,
};
use crate::core::config::ResolvedConfig;
use crate::stream::{StreamChunk, StreamStats};

/// A no-op backend for tests that don't need real API calls.
pub struct NoopBackend;

#[async_trait]
impl ChatBackend for NoopBackend {
    fn name(&self) -> &str {
        "noop"
    }

    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        Ok(User {
            user_id: 1,
            username: credentials.username.clone(),
        })
    }

    async fn register(&self, _credentials: &Credentials) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_sessions(&self, _user_id: i64) -> Result<Vec<SessionSummary>, ApiError> {
        Ok(Vec::new())
    }

    async fn history(&self, _session_id: SessionId) -> Result<Vec<Message>, ApiError> {
        Ok(Vec::new())
    }

    async fn delete_session(&self, _session_id: SessionId) -> Result<(), ApiError> {
        Ok(())
    }

    async fn upload(&self, path: &Path, _user_id: Option<i64>) -> Result<UploadReceipt, ApiError> {
        Ok(UploadReceipt {
            session_id: None,
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }

    async fn stream_chat(
        &self,
        _request: &ChatRequest,
        _sender: Sender<StreamChunk>,
    ) -> Result<StreamStats, ApiError> {
        Ok(StreamStats::default())
    }
}

/// Creates a test App with a NoopBackend and default settings.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::from_config(Arc::new(NoopBackend), &ResolvedConfig::default())
}
