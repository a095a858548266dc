//! # Application State
//!
//! Core business state for one document-chat view. This module contains
//! domain logic only - no TUI-specific types. Presentation state lives in
//! the `tui` module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn ChatBackend>     // server collaborator
//! ├── conversation: Conversation        // message log + turn phase
//! ├── navigator: NavigationBridge       // viewer locator + pending seeks
//! ├── user: Option<User>                // signed-in account
//! ├── sessions: Vec<SessionSummary>     // sidebar list, newest first
//! ├── current_session_id: Option<..>    // session the log belongs to
//! ├── loading_history: bool             // history fetch in flight
//! ├── toast: Option<Toast>              // transient notification
//! ├── status_message: String            // status bar text
//! └── quick_actions: Vec<QuickAction>   // F1..F3 prompts
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{ChatBackend, SessionId, SessionSummary, User};
use crate::core::config::{QuickAction, ResolvedConfig};
use crate::core::conversation::Conversation;
use crate::core::navigation::NavigationBridge;

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_TTL
    }
}

pub struct App {
    pub backend: Arc<dyn ChatBackend>,
    pub conversation: Conversation,
    pub navigator: NavigationBridge,
    pub user: Option<User>,
    pub sessions: Vec<SessionSummary>,
    pub current_session_id: Option<SessionId>,
    pub loading_history: bool,
    pub toast: Option<Toast>,
    pub status_message: String,
    pub quick_actions: Vec<QuickAction>,
}

impl App {
    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &ResolvedConfig) -> Self {
        Self {
            backend,
            conversation: Conversation::new(),
            navigator: NavigationBridge::new(config.base_url.clone(), config.seek_delay),
            user: None,
            sessions: Vec::new(),
            current_session_id: None,
            loading_history: false,
            toast: None,
            status_message: String::from("Welcome to docchat!"),
            quick_actions: config.quick_actions.clone(),
        }
    }

    /// True while an answer is being requested or streamed.
    pub fn is_loading(&self) -> bool {
        self.conversation.is_busy()
    }

    pub fn current_session(&self) -> Option<&SessionSummary> {
        let id = self.current_session_id?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast::new(kind, message));
    }

    /// Drops the toast once its time is up. Returns true if one was removed.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
            return true;
        }
        false
    }
}
