//! # Actions
//!
//! Everything that can happen in docchat becomes an `Action`.
//! User presses Enter? That's `Action::Submit(question)`.
//! A stream chunk arrives? That's `Action::StreamEvent { token, event }`.
//!
//! The `update()` function applies an action to the state and returns the
//! effects the adapter must perform. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Vec<Effect>
//! ```
//!
//! Stream actions carry the turn token; actions for a turn that is no longer
//! open are discarded without touching the log.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};

use crate::backend::{
    ChatRequest, Credentials, Message, SessionId, SessionSummary, TurnId, UploadReceipt, User,
};
use crate::core::navigation::{Navigation, PageSeek};
use crate::core::state::{App, ToastKind};
use crate::stream::StreamEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(String),
    /// Submit the configured quick-action prompt at this index.
    QuickAction(usize),
    StreamOpened(TurnId),
    StreamEvent { token: TurnId, event: StreamEvent },
    StreamFinished { token: TurnId },
    StreamFailed { token: TurnId, error: String },
    ClearConversation,
    CitationClicked { document_id: String, page: u32 },
    PageSeekDue(PageSeek),
    Login(Credentials),
    Register(Credentials),
    LoggedIn(User),
    Registered,
    AuthFailed(String),
    SignOut,
    SessionsLoaded(Vec<SessionSummary>),
    SelectSession(SessionSummary),
    HistoryLoaded {
        session_id: SessionId,
        messages: Vec<Message>,
    },
    HistoryFailed {
        session_id: SessionId,
        error: String,
    },
    DeleteSession(SessionId),
    SessionDeleted(SessionId),
    DeleteFailed(String),
    Upload(PathBuf),
    UploadCompleted(UploadReceipt),
    UploadFailed(String),
    DismissToast,
    Quit,
}

/// Side effects requested by `update()`, executed by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SpawnChat { token: TurnId, request: ChatRequest },
    /// Abort the in-flight chat stream, if any.
    CancelStream,
    /// Deliver `Action::PageSeekDue(seek)` after `delay`.
    SchedulePageSeek { seek: PageSeek, delay: Duration },
    Authenticate {
        credentials: Credentials,
        register: bool,
    },
    FetchSessions(i64),
    FetchHistory(SessionId),
    RemoveSession(SessionId),
    UploadDocument {
        path: PathBuf,
        user_id: Option<i64>,
    },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Vec<Effect> {
    match action {
        Action::Submit(question) => submit(app, question),
        Action::QuickAction(index) => match app.quick_actions.get(index) {
            Some(quick) => {
                let prompt = quick.prompt.clone();
                info!("Quick action {}: {}", index, quick.label);
                submit(app, prompt)
            }
            None => Vec::new(),
        },

        Action::StreamOpened(token) => {
            if app.conversation.mark_streaming(token) {
                app.status_message = String::from("Streaming...");
            }
            Vec::new()
        }
        Action::StreamEvent { token, event } => {
            app.conversation.apply(token, event);
            Vec::new()
        }
        Action::StreamFinished { token } => {
            if app.conversation.finish(token) {
                info!("Turn {} complete", token);
                app.status_message = String::from("Ready");
            }
            Vec::new()
        }
        Action::StreamFailed { token, error } => {
            if app.conversation.finish(token) {
                warn!("Turn {} failed: {}", token, error);
                app.status_message = String::from("Answer interrupted");
                app.notify(ToastKind::Error, format!("Connection error: {error}"));
            } else {
                debug!("Ignoring failure of stale turn {}: {}", token, error);
            }
            Vec::new()
        }

        Action::ClearConversation => {
            app.conversation.clear();
            app.status_message = String::from("Conversation cleared");
            vec![Effect::CancelStream]
        }

        Action::CitationClicked { document_id, page } => {
            debug!("Citation clicked: {} page {}", document_id, page);
            match app.navigator.navigate_to(&document_id, page) {
                Navigation::Applied => Vec::new(),
                Navigation::Deferred(seek) => vec![Effect::SchedulePageSeek {
                    seek,
                    delay: app.navigator.seek_delay(),
                }],
            }
        }
        Action::PageSeekDue(seek) => {
            app.navigator.complete_seek(&seek);
            Vec::new()
        }

        Action::Login(credentials) => authenticate(app, credentials, false),
        Action::Register(credentials) => authenticate(app, credentials, true),
        Action::LoggedIn(user) => {
            info!("Signed in as {} ({})", user.username, user.user_id);
            app.notify(ToastKind::Success, format!("Welcome, {}", user.username));
            app.status_message = format!("Signed in as {}", user.username);
            let user_id = user.user_id;
            app.user = Some(user);
            vec![Effect::FetchSessions(user_id)]
        }
        Action::Registered => {
            app.notify(ToastKind::Success, "Account created. Please log in.");
            Vec::new()
        }
        Action::AuthFailed(message) => {
            let message = if message.trim().is_empty() {
                String::from("Auth failed")
            } else {
                message
            };
            app.notify(ToastKind::Error, message);
            Vec::new()
        }
        Action::SignOut => {
            info!("Signing out");
            app.user = None;
            app.sessions.clear();
            app.current_session_id = None;
            app.loading_history = false;
            app.conversation.clear();
            app.navigator.close();
            app.status_message = String::from("Signed out");
            vec![Effect::CancelStream]
        }

        Action::SessionsLoaded(sessions) => {
            if app.user.is_some() {
                app.sessions = sessions;
            } else {
                debug!("Ignoring session list after sign-out");
            }
            Vec::new()
        }
        Action::SelectSession(summary) => {
            info!("Opening session {} ({})", summary.id, summary.pdf_name);
            app.conversation.clear();
            app.current_session_id = Some(summary.id);
            app.loading_history = true;
            app.navigator.open(&summary.pdf_name);
            app.status_message = format!("Loading {}...", summary.pdf_name);
            vec![Effect::CancelStream, Effect::FetchHistory(summary.id)]
        }
        Action::HistoryLoaded {
            session_id,
            messages,
        } => {
            if app.current_session_id != Some(session_id) {
                debug!("Ignoring history for inactive session {}", session_id);
                return Vec::new();
            }
            debug!("History for session {}: {} messages", session_id, messages.len());
            app.loading_history = false;
            app.conversation.load_history(messages);
            app.status_message = String::from("Ready");
            Vec::new()
        }
        Action::HistoryFailed { session_id, error } => {
            if app.current_session_id == Some(session_id) {
                app.loading_history = false;
                app.notify(ToastKind::Error, format!("Failed to load chat: {error}"));
            }
            Vec::new()
        }

        Action::DeleteSession(session_id) => vec![Effect::RemoveSession(session_id)],
        Action::SessionDeleted(session_id) => {
            app.sessions.retain(|s| s.id != session_id);
            app.notify(ToastKind::Success, "Chat deleted");
            if app.current_session_id == Some(session_id) {
                app.current_session_id = None;
                app.loading_history = false;
                app.conversation.clear();
                app.navigator.close();
                return vec![Effect::CancelStream];
            }
            Vec::new()
        }
        Action::DeleteFailed(error) => {
            warn!("Delete failed: {}", error);
            app.notify(ToastKind::Error, "Failed to delete");
            Vec::new()
        }

        Action::Upload(path) => {
            app.notify(ToastKind::Info, "Uploading...");
            vec![Effect::UploadDocument {
                path,
                user_id: app.user.as_ref().map(|u| u.user_id),
            }]
        }
        Action::UploadCompleted(receipt) => upload_completed(app, receipt),
        Action::UploadFailed(error) => {
            app.notify(ToastKind::Error, format!("Upload failed: {error}"));
            Vec::new()
        }

        Action::DismissToast => {
            app.toast = None;
            Vec::new()
        }
        Action::Quit => vec![Effect::Quit],
    }
}

fn submit(app: &mut App, question: String) -> Vec<Effect> {
    let question = question.trim();
    if question.is_empty() {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if let Some(superseded) = app.conversation.finish_open() {
        info!("Turn {} superseded by new question", superseded);
        effects.push(Effect::CancelStream);
    }

    let (token, history) = app.conversation.begin_turn(question.to_string());
    info!("Submitting turn {} (history_len={})", token, history.len());
    app.status_message = String::from("Thinking...");
    effects.push(Effect::SpawnChat {
        token,
        request: ChatRequest {
            question: question.to_string(),
            history,
            session_id: app.current_session_id,
        },
    });
    effects
}

fn authenticate(app: &mut App, credentials: Credentials, register: bool) -> Vec<Effect> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        app.notify(ToastKind::Error, "Username and password are required");
        return Vec::new();
    }
    vec![Effect::Authenticate {
        credentials,
        register,
    }]
}

fn upload_completed(app: &mut App, receipt: UploadReceipt) -> Vec<Effect> {
    info!(
        "Uploaded {} (session {:?})",
        receipt.filename, receipt.session_id
    );
    app.notify(ToastKind::Success, format!("Uploaded {}", receipt.filename));
    app.conversation.clear();
    app.navigator.open(&receipt.filename);
    app.current_session_id = receipt.session_id;
    app.loading_history = false;
    app.status_message = format!("Ready: {}", receipt.filename);

    let mut effects = vec![Effect::CancelStream];
    if let Some(session_id) = receipt.session_id {
        if let Some(user) = &app.user {
            effects.push(Effect::FetchSessions(user.user_id));
        }
        app.loading_history = true;
        effects.push(Effect::FetchHistory(session_id));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Role;
    use crate::core::conversation::TurnPhase;
    use crate::stream::Citation;
    use crate::test_support::test_app;

    fn spawned_token(effects: &[Effect]) -> TurnId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::SpawnChat { token, .. } => Some(*token),
                _ => None,
            })
            .expect("expected SpawnChat effect")
    }

    fn content(token: TurnId, text: &str) -> Action {
        Action::StreamEvent {
            token,
            event: StreamEvent::Content(text.to_string()),
        }
    }

    fn summary(id: SessionId, name: &str) -> SessionSummary {
        SessionSummary {
            id,
            pdf_name: name.to_string(),
            date: None,
        }
    }

    fn signed_in() -> App {
        let mut app = test_app();
        app.user = Some(User {
            user_id: 1,
            username: "ada".to_string(),
        });
        app
    }

    #[test]
    fn test_whitespace_submit_is_noop() {
        let mut app = test_app();
        assert!(update(&mut app, Action::Submit("   \n\t".to_string())).is_empty());
        assert!(app.conversation.is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_submit_spawns_chat_with_prior_history() {
        let mut app = test_app();
        app.current_session_id = Some(12);
        let effects = update(&mut app, Action::Submit("  What is the rent?  ".to_string()));

        let [Effect::SpawnChat { token, request }] = effects.as_slice() else {
            panic!("expected a single SpawnChat, got {effects:?}");
        };
        assert_eq!(request.question, "What is the rent?");
        assert!(request.history.is_empty());
        assert_eq!(request.session_id, Some(12));
        assert_eq!(app.conversation.phase(), TurnPhase::Requesting(*token));
        assert_eq!(app.conversation.messages()[0].content, "What is the rent?");
    }

    #[test]
    fn test_full_turn_lifecycle() {
        let mut app = test_app();
        let token = spawned_token(&update(&mut app, Action::Submit("q".to_string())));

        update(&mut app, Action::StreamOpened(token));
        assert_eq!(app.conversation.phase(), TurnPhase::Streaming(token));

        update(
            &mut app,
            Action::StreamEvent {
                token,
                event: StreamEvent::Sources(vec![Citation::new("lease.pdf", 3)]),
            },
        );
        update(&mut app, content(token, "A"));
        update(&mut app, content(token, "B"));
        update(&mut app, Action::StreamFinished { token });

        assert!(!app.is_loading());
        let answer = app.conversation.messages().last().unwrap();
        assert_eq!(answer.role, Role::Assistant);
        assert_eq!(answer.content, "AB");
        assert_eq!(answer.sources, vec![Citation::new("lease.pdf", 3)]);

        update(&mut app, content(token, "late"));
        assert_eq!(app.conversation.messages().last().unwrap().content, "AB");
    }

    #[test]
    fn test_clear_mid_stream_cancels_and_discards() {
        let mut app = test_app();
        let token = spawned_token(&update(&mut app, Action::Submit("q".to_string())));
        update(&mut app, content(token, "partial"));

        assert_eq!(
            update(&mut app, Action::ClearConversation),
            vec![Effect::CancelStream]
        );
        update(&mut app, content(token, "more"));
        update(&mut app, Action::StreamFinished { token });
        assert!(app.conversation.is_empty());
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_failure_keeps_partial_answer_and_toasts() {
        let mut app = test_app();
        let token = spawned_token(&update(&mut app, Action::Submit("q".to_string())));
        update(&mut app, content(token, "half"));
        update(
            &mut app,
            Action::StreamFailed {
                token,
                error: "connection reset".to_string(),
            },
        );

        assert!(!app.is_loading());
        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(app.conversation.messages()[1].content, "half");
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("connection reset"));
    }

    #[test]
    fn test_stale_failure_is_silent() {
        let mut app = test_app();
        let token = spawned_token(&update(&mut app, Action::Submit("q".to_string())));
        update(&mut app, Action::ClearConversation);
        update(
            &mut app,
            Action::StreamFailed {
                token,
                error: "aborted".to_string(),
            },
        );
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_overlapping_submit_supersedes_open_turn() {
        let mut app = test_app();
        let first = spawned_token(&update(&mut app, Action::Submit("one".to_string())));
        update(&mut app, content(first, "1"));

        let effects = update(&mut app, Action::Submit("two".to_string()));
        assert_eq!(effects[0], Effect::CancelStream);
        let second = spawned_token(&effects);
        assert_ne!(first, second);

        let Effect::SpawnChat { request, .. } = &effects[1] else {
            panic!("expected SpawnChat");
        };
        assert_eq!(request.history.len(), 2);

        update(&mut app, content(first, " stale"));
        update(&mut app, content(second, "2"));
        assert_eq!(app.conversation.messages()[1].content, "1");
        assert_eq!(app.conversation.messages()[3].content, "2");
    }

    #[test]
    fn test_quick_action_submits_prompt() {
        let mut app = test_app();
        let effects = update(&mut app, Action::QuickAction(0));
        let [Effect::SpawnChat { request, .. }] = effects.as_slice() else {
            panic!("expected SpawnChat");
        };
        assert_eq!(
            request.question,
            "Summarize this document in 5 concise bullet points."
        );
        assert!(update(&mut app, Action::QuickAction(99)).is_empty());
    }

    #[test]
    fn test_citation_on_open_document_applies_immediately() {
        let mut app = test_app();
        app.navigator.open("doc1.pdf");
        let effects = update(
            &mut app,
            Action::CitationClicked {
                document_id: "doc1.pdf".to_string(),
                page: 5,
            },
        );
        assert!(effects.is_empty());
        assert!(
            app.navigator
                .viewer()
                .locator
                .as_deref()
                .unwrap()
                .ends_with("#page=5")
        );
    }

    #[test]
    fn test_citation_on_other_document_schedules_seek() {
        let mut app = test_app();
        app.navigator.open("doc2.pdf");
        let effects = update(
            &mut app,
            Action::CitationClicked {
                document_id: "doc1.pdf".to_string(),
                page: 5,
            },
        );
        let [Effect::SchedulePageSeek { seek, delay }] = effects.as_slice() else {
            panic!("expected SchedulePageSeek, got {effects:?}");
        };
        assert_eq!(*delay, Duration::from_millis(100));
        assert!(app.navigator.viewer().locator.as_deref().unwrap().ends_with("/static/doc1.pdf"));

        update(&mut app, Action::PageSeekDue(seek.clone()));
        assert_eq!(app.navigator.viewer().pending_page, Some(5));
        assert!(app.navigator.viewer().locator.as_deref().unwrap().ends_with("doc1.pdf#page=5"));
    }

    #[test]
    fn test_login_flow_fetches_sessions() {
        let mut app = test_app();
        let creds = Credentials {
            username: "ada".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(
            update(&mut app, Action::Login(creds.clone())),
            vec![Effect::Authenticate {
                credentials: creds,
                register: false
            }]
        );

        let effects = update(
            &mut app,
            Action::LoggedIn(User {
                user_id: 42,
                username: "ada".to_string(),
            }),
        );
        assert_eq!(effects, vec![Effect::FetchSessions(42)]);
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);

        update(&mut app, Action::SessionsLoaded(vec![summary(3, "a.pdf")]));
        assert_eq!(app.sessions.len(), 1);
    }

    #[test]
    fn test_empty_credentials_rejected_locally() {
        let mut app = test_app();
        let effects = update(
            &mut app,
            Action::Register(Credentials {
                username: " ".to_string(),
                password: "pw".to_string(),
            }),
        );
        assert!(effects.is_empty());
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn test_auth_failure_shows_server_detail() {
        let mut app = test_app();
        update(&mut app, Action::AuthFailed("Invalid credentials".to_string()));
        assert_eq!(app.toast.as_ref().unwrap().message, "Invalid credentials");
        update(&mut app, Action::AuthFailed(String::new()));
        assert_eq!(app.toast.as_ref().unwrap().message, "Auth failed");
    }

    #[test]
    fn test_select_session_clears_and_fetches_history() {
        let mut app = signed_in();
        update(&mut app, Action::Submit("q".to_string()));

        let effects = update(&mut app, Action::SelectSession(summary(9, "lease.pdf")));
        assert_eq!(
            effects,
            vec![Effect::CancelStream, Effect::FetchHistory(9)]
        );
        assert!(app.conversation.is_empty());
        assert!(app.loading_history);
        assert_eq!(
            app.navigator.viewer().active_document.as_deref(),
            Some("lease.pdf")
        );

        update(
            &mut app,
            Action::HistoryLoaded {
                session_id: 9,
                messages: vec![Message::user("old")],
            },
        );
        assert!(!app.loading_history);
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[test]
    fn test_history_for_previous_session_ignored() {
        let mut app = signed_in();
        update(&mut app, Action::SelectSession(summary(1, "a.pdf")));
        update(&mut app, Action::SelectSession(summary(2, "b.pdf")));
        update(
            &mut app,
            Action::HistoryLoaded {
                session_id: 1,
                messages: vec![Message::user("from a")],
            },
        );
        assert!(app.conversation.is_empty());
        assert!(app.loading_history);
    }

    #[test]
    fn test_deleting_current_session_resets_view() {
        let mut app = signed_in();
        app.sessions = vec![summary(1, "a.pdf"), summary(2, "b.pdf")];
        update(&mut app, Action::SelectSession(summary(2, "b.pdf")));

        assert_eq!(
            update(&mut app, Action::DeleteSession(2)),
            vec![Effect::RemoveSession(2)]
        );
        assert_eq!(
            update(&mut app, Action::SessionDeleted(2)),
            vec![Effect::CancelStream]
        );
        assert_eq!(app.sessions, vec![summary(1, "a.pdf")]);
        assert_eq!(app.current_session_id, None);
        assert_eq!(app.navigator.viewer().active_document, None);
        assert_eq!(app.toast.as_ref().unwrap().message, "Chat deleted");
    }

    #[test]
    fn test_deleting_other_session_keeps_view() {
        let mut app = signed_in();
        app.sessions = vec![summary(1, "a.pdf"), summary(2, "b.pdf")];
        update(&mut app, Action::SelectSession(summary(2, "b.pdf")));
        assert!(update(&mut app, Action::SessionDeleted(1)).is_empty());
        assert_eq!(app.current_session_id, Some(2));
    }

    #[test]
    fn test_upload_carries_user_id() {
        let mut app = signed_in();
        let effects = update(&mut app, Action::Upload(PathBuf::from("/tmp/lease.pdf")));
        assert_eq!(
            effects,
            vec![Effect::UploadDocument {
                path: PathBuf::from("/tmp/lease.pdf"),
                user_id: Some(1),
            }]
        );
        assert_eq!(app.toast.as_ref().unwrap().message, "Uploading...");
    }

    #[test]
    fn test_upload_completed_opens_document_and_session() {
        let mut app = signed_in();
        let effects = update(
            &mut app,
            Action::UploadCompleted(UploadReceipt {
                session_id: Some(5),
                filename: "lease.pdf".to_string(),
            }),
        );
        assert_eq!(
            effects,
            vec![
                Effect::CancelStream,
                Effect::FetchSessions(1),
                Effect::FetchHistory(5)
            ]
        );
        assert_eq!(app.current_session_id, Some(5));
        assert_eq!(
            app.navigator.viewer().locator.as_deref(),
            Some("http://localhost:8000/static/lease.pdf")
        );
    }

    #[test]
    fn test_anonymous_upload_without_session_still_opens_viewer() {
        let mut app = test_app();
        let effects = update(
            &mut app,
            Action::UploadCompleted(UploadReceipt {
                session_id: None,
                filename: "x.pdf".to_string(),
            }),
        );
        assert_eq!(effects, vec![Effect::CancelStream]);
        assert_eq!(app.current_session_id, None);
        assert_eq!(
            app.navigator.viewer().active_document.as_deref(),
            Some("x.pdf")
        );
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let mut app = signed_in();
        app.sessions = vec![summary(1, "a.pdf")];
        update(&mut app, Action::SelectSession(summary(1, "a.pdf")));
        update(&mut app, Action::Submit("q".to_string()));

        assert_eq!(update(&mut app, Action::SignOut), vec![Effect::CancelStream]);
        assert!(app.user.is_none());
        assert!(app.sessions.is_empty());
        assert!(app.conversation.is_empty());
        assert!(!app.is_loading());
        assert_eq!(app.navigator.viewer().locator, None);

        update(&mut app, Action::SessionsLoaded(vec![summary(1, "a.pdf")]));
        assert!(app.sessions.is_empty());
    }

    #[test]
    fn test_quit_returns_quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), vec![Effect::Quit]);
    }
}
