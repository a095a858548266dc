//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates key events into `core::Action` values, and executes the
//! `Effect`s the reducer returns.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! ```text
//! terminal event ─► dispatch() ─► Action ─┐
//!                                          ├─► update() ─► Vec<Effect> ─► EffectRunner
//! background task ─► mpsc::Sender<Action> ─┘                              (tokio tasks)
//! ```
//!
//! Background tasks report back over a std mpsc channel that the loop
//! drains after each batch of terminal events.
//!
//! ## Redraw Strategy
//!
//! Frames are drawn only after an event, a background action, or a toast
//! expiring. While an answer streams the poll timeout is short so chunks
//! show up promptly; idle, the loop sleeps up to 500ms.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;
mod view;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tokio::task::AbortHandle;

use crate::backend::{ChatBackend, ChatRequest, HttpBackend, TurnId};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::stream::StreamChunk;
use crate::tui::component::EventHandler;
use crate::tui::components::message_list::{citation_at, citation_count};
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::view::{Focus, ViewState};

const ACTIVE_POLL: Duration = Duration::from_millis(50);
const IDLE_POLL: Duration = Duration::from_millis(500);

/// TUI-specific state (not part of core business logic)
pub(crate) struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub view: ViewState,
}

impl TuiState {
    pub fn new(width: u16) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            view: ViewState::new(width),
        }
    }
}

/// RAII guard for terminal modes that `ratatui::init()` does not manage.
struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

fn build_backend(config: &ResolvedConfig) -> Arc<dyn ChatBackend> {
    match HttpBackend::with_connect_timeout(&config.base_url, config.connect_timeout) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!("Falling back to default HTTP client: {}", e);
            Arc::new(HttpBackend::new(&config.base_url))
        }
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend = build_backend(&config);
    info!("Using backend {} at {}", backend.name(), config.base_url);
    let mut app = App::from_config(backend.clone(), &config);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut tui = TuiState::new(terminal.size()?.width);

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut runner = EffectRunner::new(backend, tx);

    let mut needs_redraw = true;

    loop {
        if app.expire_toast(Instant::now()) {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if app.is_loading() || app.loading_history {
            ACTIVE_POLL
        } else if let Some(toast) = &app.toast {
            let left = crate::core::state::TOAST_TTL
                .saturating_sub(Instant::now().saturating_duration_since(toast.shown_at));
            left.min(IDLE_POLL)
        } else {
            IDLE_POLL
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let TuiEvent::Resize(width, _) = event {
                tui.view.on_resize(width);
                continue;
            }
            if let Some(action) = dispatch(event, &app, &mut tui) {
                should_quit |= apply(&mut app, &mut tui, &mut runner, action);
            }
        }

        // Handle background task actions
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            should_quit |= apply(&mut app, &mut tui, &mut runner, action);
        }

        if should_quit {
            break;
        }
    }

    runner.cancel_stream();
    ratatui::restore();
    info!("docchat shut down");
    Ok(())
}

/// Runs one action through the reducer and executes its effects.
/// Returns true when the app should quit.
fn apply(app: &mut App, tui: &mut TuiState, runner: &mut EffectRunner, action: Action) -> bool {
    debug!("Applying {:?}", action);
    tui.view.observe(&action);
    if matches!(
        action,
        Action::ClearConversation
            | Action::SelectSession(_)
            | Action::SignOut
            | Action::UploadCompleted(_)
    ) {
        tui.message_list = MessageListState::new();
    }
    let effects = update(app, action);
    runner.execute(effects)
}

/// Translates a terminal event into an action, applying purely visual
/// changes (focus, overlays, scrolling, cursors) on the way.
fn dispatch(event: TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    if event == TuiEvent::ForceQuit {
        return Some(Action::Quit);
    }
    if tui.view.has_overlay() {
        return tui.view.handle_overlay_event(&event);
    }

    match event {
        TuiEvent::ClearConversation => return Some(Action::ClearConversation),
        TuiEvent::QuickAction(index) => return Some(Action::QuickAction(index)),
        TuiEvent::SignOut => return app.user.is_some().then_some(Action::SignOut),
        TuiEvent::ToggleSidebar => {
            tui.view.toggle_sidebar();
            return None;
        }
        TuiEvent::ToggleDocumentView => {
            tui.view.toggle_document_layout();
            return None;
        }
        TuiEvent::OpenUpload => {
            tui.view.open_upload();
            return None;
        }
        TuiEvent::OpenAuth => {
            if app.user.is_none() {
                tui.view.open_auth();
            }
            return None;
        }
        TuiEvent::Tab => {
            let citations = citation_count(app.conversation.messages());
            tui.view.cycle_focus(app.sessions.len(), citations);
            return None;
        }
        TuiEvent::Escape => {
            tui.view.focus_input();
            return None;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(&event);
            return None;
        }
        _ => {}
    }

    match tui.view.focus {
        Focus::Input => match tui.input_box.handle_event(&event)? {
            InputEvent::Submit(text) => Some(Action::Submit(text)),
            InputEvent::ContentChanged => None,
        },
        Focus::Sessions => match event {
            TuiEvent::CursorUp => {
                tui.view.move_session_cursor(-1, app.sessions.len());
                None
            }
            TuiEvent::CursorDown => {
                tui.view.move_session_cursor(1, app.sessions.len());
                None
            }
            TuiEvent::Submit => app
                .sessions
                .get(tui.view.session_cursor)
                .cloned()
                .map(Action::SelectSession),
            TuiEvent::InputChar('d') => {
                let id = app.sessions.get(tui.view.session_cursor)?.id;
                tui.view.request_delete(id).map(Action::DeleteSession)
            }
            other => type_into_input(other, tui),
        },
        Focus::Citations => {
            let messages = app.conversation.messages();
            let count = citation_count(messages);
            match event {
                TuiEvent::CursorUp | TuiEvent::CursorLeft => {
                    tui.view.move_citation_cursor(-1, count);
                    reveal_citation(app, tui);
                    None
                }
                TuiEvent::CursorDown | TuiEvent::CursorRight => {
                    tui.view.move_citation_cursor(1, count);
                    reveal_citation(app, tui);
                    None
                }
                TuiEvent::Submit => citation_at(messages, tui.view.citation_cursor).map(
                    |(_, _, citation)| Action::CitationClicked {
                        document_id: citation.document_id.clone(),
                        page: citation.page,
                    },
                ),
                other => type_into_input(other, tui),
            }
        }
    }
}

/// Typing while a list has focus moves focus back to the input.
fn type_into_input(event: TuiEvent, tui: &mut TuiState) -> Option<Action> {
    if matches!(event, TuiEvent::InputChar(_) | TuiEvent::Paste(_)) {
        tui.view.focus_input();
        tui.input_box.handle_event(&event);
    }
    None
}

fn reveal_citation(app: &App, tui: &mut TuiState) {
    if let Some((message, _, _)) = citation_at(app.conversation.messages(), tui.view.citation_cursor) {
        tui.message_list.scroll_to_message(message);
    }
}

/// Executes effects as tokio tasks that report back as actions.
struct EffectRunner {
    backend: Arc<dyn ChatBackend>,
    tx: mpsc::Sender<Action>,
    /// The in-flight chat stream, if any
    chat: Option<AbortHandle>,
}

impl EffectRunner {
    fn new(backend: Arc<dyn ChatBackend>, tx: mpsc::Sender<Action>) -> Self {
        Self {
            backend,
            tx,
            chat: None,
        }
    }

    /// Returns true if one of the effects asks to quit.
    fn execute(&mut self, effects: Vec<Effect>) -> bool {
        let mut quit = false;
        for effect in effects {
            match effect {
                Effect::Quit => quit = true,
                Effect::CancelStream => self.cancel_stream(),
                Effect::SpawnChat { token, request } => {
                    self.cancel_stream();
                    self.chat = Some(spawn_chat(self.backend.clone(), token, request, self.tx.clone()));
                }
                Effect::SchedulePageSeek { seek, delay } => {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        send(&tx, Action::PageSeekDue(seek));
                    });
                }
                Effect::Authenticate {
                    credentials,
                    register,
                } => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let action = if register {
                            match backend.register(&credentials).await {
                                Ok(()) => Action::Registered,
                                Err(e) => Action::AuthFailed(e.user_message()),
                            }
                        } else {
                            match backend.login(&credentials).await {
                                Ok(user) => Action::LoggedIn(user),
                                Err(e) => Action::AuthFailed(e.user_message()),
                            }
                        };
                        send(&tx, action);
                    });
                }
                Effect::FetchSessions(user_id) => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        match backend.list_sessions(user_id).await {
                            Ok(sessions) => send(&tx, Action::SessionsLoaded(sessions)),
                            Err(e) => warn!("Failed to list sessions for user {}: {}", user_id, e),
                        }
                    });
                }
                Effect::FetchHistory(session_id) => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let action = match backend.history(session_id).await {
                            Ok(messages) => Action::HistoryLoaded {
                                session_id,
                                messages,
                            },
                            Err(e) => Action::HistoryFailed {
                                session_id,
                                error: e.user_message(),
                            },
                        };
                        send(&tx, action);
                    });
                }
                Effect::RemoveSession(session_id) => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let action = match backend.delete_session(session_id).await {
                            Ok(()) => Action::SessionDeleted(session_id),
                            Err(e) => Action::DeleteFailed(e.to_string()),
                        };
                        send(&tx, action);
                    });
                }
                Effect::UploadDocument { path, user_id } => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let action = match backend.upload(&path, user_id).await {
                            Ok(receipt) => Action::UploadCompleted(receipt),
                            Err(e) => Action::UploadFailed(e.user_message()),
                        };
                        send(&tx, action);
                    });
                }
            }
        }
        quit
    }

    fn cancel_stream(&mut self) {
        if let Some(handle) = self.chat.take() {
            debug!("Aborting chat stream");
            handle.abort();
        }
    }
}

fn send(tx: &mpsc::Sender<Action>, action: Action) {
    if tx.send(action).is_err() {
        warn!("Failed to deliver background action: receiver dropped");
    }
}

/// Streams one answer. Every chunk is forwarded before the finish or
/// failure action, so the reducer sees them in order.
fn spawn_chat(
    backend: Arc<dyn ChatBackend>,
    token: TurnId,
    request: ChatRequest,
    tx: mpsc::Sender<Action>,
) -> AbortHandle {
    info!("Spawning chat stream for turn {}", token);

    let handle = tokio::spawn(async move {
        let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::channel::<StreamChunk>(100);

        let forward = async {
            let mut forwarded = 0usize;
            while let Some(chunk) = chunk_rx.recv().await {
                let action = match chunk {
                    StreamChunk::Opened => Action::StreamOpened(token),
                    StreamChunk::Event(event) => Action::StreamEvent { token, event },
                };
                if tx.send(action).is_err() {
                    warn!("Failed to forward stream chunk: receiver dropped");
                    break;
                }
                forwarded += 1;
            }
            forwarded
        };

        let (result, forwarded) = tokio::join!(backend.stream_chat(&request, chunk_tx), forward);

        let action = match result {
            Ok(stats) => {
                info!(
                    "Turn {} stream complete: {} actions forwarded, {} bytes, {} dropped records",
                    token, forwarded, stats.bytes, stats.dropped
                );
                Action::StreamFinished { token }
            }
            Err(e) => {
                warn!("Turn {} stream failed after {} actions: {}", token, forwarded, e);
                Action::StreamFailed {
                    token,
                    error: e.to_string(),
                }
            }
        };
        send(&tx, action);
    });

    handle.abort_handle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Message, Role, SessionSummary, User};
    use crate::stream::Citation;
    use crate::test_support::test_app;
    use crate::tui::view::Overlay;

    fn signed_in_with_sessions() -> App {
        let mut app = test_app();
        app.user = Some(User {
            user_id: 1,
            username: "alice".to_string(),
        });
        app.sessions = vec![
            SessionSummary {
                id: 2,
                pdf_name: "lease.pdf".to_string(),
                date: None,
            },
            SessionSummary {
                id: 1,
                pdf_name: "nda.pdf".to_string(),
                date: None,
            },
        ];
        app
    }

    fn with_citations(app: &mut App) {
        app.current_session_id = Some(2);
        update(
            app,
            Action::HistoryLoaded {
                session_id: 2,
                messages: vec![
                    Message::user("Rent?"),
                    Message {
                        id: None,
                        role: Role::Assistant,
                        content: "$900".to_string(),
                        sources: vec![Citation::new("lease.pdf", 3), Citation::new("nda.pdf", 1)],
                    },
                ],
            },
        );
    }

    #[test]
    fn test_typing_then_enter_submits() {
        let app = test_app();
        let mut tui = TuiState::new(120);
        for c in "Rent?".chars() {
            assert_eq!(dispatch(TuiEvent::InputChar(c), &app, &mut tui), None);
        }
        assert_eq!(
            dispatch(TuiEvent::Submit, &app, &mut tui),
            Some(Action::Submit("Rent?".to_string()))
        );
    }

    #[test]
    fn test_global_keys_map_to_actions() {
        let app = test_app();
        let mut tui = TuiState::new(120);
        assert_eq!(dispatch(TuiEvent::ForceQuit, &app, &mut tui), Some(Action::Quit));
        assert_eq!(
            dispatch(TuiEvent::QuickAction(1), &app, &mut tui),
            Some(Action::QuickAction(1))
        );
        assert_eq!(
            dispatch(TuiEvent::ClearConversation, &app, &mut tui),
            Some(Action::ClearConversation)
        );
        // Signed out: nothing to sign out of
        assert_eq!(dispatch(TuiEvent::SignOut, &app, &mut tui), None);
    }

    #[test]
    fn test_overlay_captures_keys() {
        let app = test_app();
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::OpenAuth, &app, &mut tui);
        assert!(matches!(tui.view.overlay, Overlay::Auth(_)));

        // Quick action keys don't leak through the form
        assert_eq!(dispatch(TuiEvent::QuickAction(0), &app, &mut tui), None);
        dispatch(TuiEvent::InputChar('a'), &app, &mut tui);
        assert!(tui.input_box.buffer.is_empty());

        dispatch(TuiEvent::Escape, &app, &mut tui);
        assert_eq!(tui.view.overlay, Overlay::None);
    }

    #[test]
    fn test_auth_not_offered_when_signed_in() {
        let app = signed_in_with_sessions();
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::OpenAuth, &app, &mut tui);
        assert_eq!(tui.view.overlay, Overlay::None);
        assert_eq!(dispatch(TuiEvent::SignOut, &app, &mut tui), Some(Action::SignOut));
    }

    #[test]
    fn test_sessions_focus_select_and_delete() {
        let app = signed_in_with_sessions();
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::Tab, &app, &mut tui);
        assert_eq!(tui.view.focus, Focus::Sessions);

        dispatch(TuiEvent::CursorDown, &app, &mut tui);
        assert_eq!(
            dispatch(TuiEvent::Submit, &app, &mut tui),
            Some(Action::SelectSession(app.sessions[1].clone()))
        );

        assert_eq!(dispatch(TuiEvent::InputChar('d'), &app, &mut tui), None);
        assert_eq!(tui.view.overlay, Overlay::ConfirmDelete(1));
        assert_eq!(
            dispatch(TuiEvent::InputChar('d'), &app, &mut tui),
            Some(Action::DeleteSession(1))
        );
    }

    #[test]
    fn test_typing_in_sessions_returns_to_input() {
        let app = signed_in_with_sessions();
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::Tab, &app, &mut tui);
        dispatch(TuiEvent::InputChar('w'), &app, &mut tui);
        assert_eq!(tui.view.focus, Focus::Input);
        assert_eq!(tui.input_box.buffer, "w");
    }

    #[test]
    fn test_citation_focus_clicks_selected_chip() {
        let mut app = signed_in_with_sessions();
        with_citations(&mut app);
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::Tab, &app, &mut tui);
        dispatch(TuiEvent::Tab, &app, &mut tui);
        assert_eq!(tui.view.focus, Focus::Citations);

        dispatch(TuiEvent::CursorRight, &app, &mut tui);
        assert_eq!(
            dispatch(TuiEvent::Submit, &app, &mut tui),
            Some(Action::CitationClicked {
                document_id: "nda.pdf".to_string(),
                page: 1,
            })
        );
    }

    #[test]
    fn test_escape_returns_focus_to_input() {
        let mut app = signed_in_with_sessions();
        with_citations(&mut app);
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::Tab, &app, &mut tui);
        dispatch(TuiEvent::Escape, &app, &mut tui);
        assert_eq!(tui.view.focus, Focus::Input);
    }

    #[test]
    fn test_upload_prompt_flow() {
        let app = test_app();
        let mut tui = TuiState::new(120);
        dispatch(TuiEvent::OpenUpload, &app, &mut tui);
        dispatch(TuiEvent::Paste("/tmp/a.pdf".to_string()), &app, &mut tui);
        assert_eq!(
            dispatch(TuiEvent::Submit, &app, &mut tui),
            Some(Action::Upload(std::path::PathBuf::from("/tmp/a.pdf")))
        );
    }

    #[tokio::test]
    async fn test_quit_effect_stops_loop() {
        let mut app = test_app();
        let mut tui = TuiState::new(120);
        let (tx, _rx) = mpsc::channel();
        let mut runner = EffectRunner::new(app.backend.clone(), tx);
        assert!(!apply(&mut app, &mut tui, &mut runner, Action::DismissToast));
        assert!(apply(&mut app, &mut tui, &mut runner, Action::Quit));
    }

    #[tokio::test]
    async fn test_page_seek_is_delivered_after_delay() {
        let mut app = test_app();
        let mut tui = TuiState::new(120);
        let (tx, rx) = mpsc::channel();
        let mut runner = EffectRunner::new(app.backend.clone(), tx);

        apply(
            &mut app,
            &mut tui,
            &mut runner,
            Action::CitationClicked {
                document_id: "lease.pdf".to_string(),
                page: 4,
            },
        );
        tokio::time::sleep(app.navigator.seek_delay() + Duration::from_millis(200)).await;

        match rx.try_recv() {
            Ok(Action::PageSeekDue(seek)) => assert_eq!(seek.page, 4),
            other => panic!("Expected PageSeekDue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_noop_chat_reports_finish() {
        let mut app = test_app();
        let mut tui = TuiState::new(120);
        let (tx, rx) = mpsc::channel();
        let mut runner = EffectRunner::new(app.backend.clone(), tx);

        apply(&mut app, &mut tui, &mut runner, Action::Submit("hi".to_string()));
        let token = app.conversation.open_turn().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let received: Vec<Action> = rx.try_iter().collect();
        assert_eq!(received.last(), Some(&Action::StreamFinished { token }));
    }
}
