//! HTTP implementation of [`ChatBackend`] for the document-chat server.
//!
//! Endpoints:
//! - `POST /login`, `POST /register` with `{username, password}`
//! - `GET /sessions/{user_id}`, `DELETE /sessions/{id}`, `GET /history/{id}`
//! - `POST /upload` (multipart: `file`, optional `user_id`)
//! - `POST /chat` answering with newline-delimited JSON events

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::Sender;

use super::client::{ApiError, ChatBackend, ChatRequest};
use super::types::{Credentials, Message, SessionId, SessionSummary, UploadReceipt, User};
use crate::stream::{self, StreamChunk, StreamStats};

/// FastAPI error body: `{"detail": "..."}`.
#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// reqwest-backed client for the document-chat server.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Builds a client with a connect timeout. Streams are long-lived, so no
    /// overall request timeout is set.
    pub fn with_connect_timeout(
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-success response into `ApiError::Api`, preferring the
/// server's `detail` text over the raw body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = serde_json::from_str::<ErrorDetail>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    warn!("Server error: {} - {}", status, message);
    Err(ApiError::Api { status, message })
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

fn network(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        info!("Logging in as {}", credentials.username);
        let response = self
            .client
            .post(self.url("/login"))
            .json(credentials)
            .send()
            .await
            .map_err(network)?;
        parse(check(response).await?).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        info!("Registering {}", credentials.username);
        let response = self
            .client
            .post(self.url("/register"))
            .json(credentials)
            .send()
            .await
            .map_err(network)?;
        check(response).await?;
        Ok(())
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/sessions/{user_id}")))
            .send()
            .await
            .map_err(network)?;
        let sessions: Vec<SessionSummary> = parse(check(response).await?).await?;
        debug!("Loaded {} sessions for user {}", sessions.len(), user_id);
        Ok(sessions)
    }

    async fn history(&self, session_id: SessionId) -> Result<Vec<Message>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/history/{session_id}")))
            .send()
            .await
            .map_err(network)?;
        let messages: Vec<Message> = parse(check(response).await?).await?;
        debug!("Loaded {} history messages for session {}", messages.len(), session_id);
        Ok(messages)
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<(), ApiError> {
        info!("Deleting session {}", session_id);
        let response = self
            .client
            .delete(self.url(&format!("/sessions/{session_id}")))
            .send()
            .await
            .map_err(network)?;
        check(response).await?;
        Ok(())
    }

    async fn upload(&self, path: &Path, user_id: Option<i64>) -> Result<UploadReceipt, ApiError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Config(format!("not a file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        info!("Uploading {} ({} bytes)", filename, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")
            .map_err(|e| ApiError::Config(e.to_string()))?;
        let mut form = Form::new().part("file", part);
        if let Some(user_id) = user_id {
            form = form.text("user_id", user_id.to_string());
        }

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        parse(check(response).await?).await
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        sender: Sender<StreamChunk>,
    ) -> Result<StreamStats, ApiError> {
        info!(
            "Chat request: history_len={}, session={:?}",
            request.history.len(),
            request.session_id
        );

        let response = self
            .client
            .post(self.url("/chat"))
            .json(request)
            .send()
            .await
            .map_err(network)?;

        debug!("Chat response status: {}", response.status());
        let response = check(response).await?;

        Ok(stream::pump(response.bytes_stream(), &sender).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/chat"), "http://localhost:8000/chat");
    }

    #[test]
    fn test_api_error_user_message_prefers_detail() {
        let err = ApiError::Api {
            status: 400,
            message: "Username taken".to_string(),
        };
        assert_eq!(err.user_message(), "Username taken");
        assert_eq!(err.to_string(), "API error (HTTP 400): Username taken");
    }
}
