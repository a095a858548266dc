//! # View State
//!
//! Presentation state of the terminal adapter as one value: which pane has
//! focus, which overlay is open, how the body is laid out, and the cursors
//! of the sessions and citations lists.
//!
//! ```text
//! ViewState
//! ├── focus: Focus              // Input | Sessions | Citations
//! ├── overlay: Overlay          // None | Auth | Upload | ConfirmDelete
//! ├── layout: PaneLayout        // Split | DocumentOnly
//! ├── sidebar_open: bool        // follows terminal width, Ctrl+B overrides
//! ├── session_cursor: usize
//! └── citation_cursor: usize
//! ```
//!
//! Fields are read freely but only changed through the named transitions
//! below, so every mode switch has one place to look.

use std::path::PathBuf;

use crate::backend::{Credentials, SessionId};
use crate::core::action::Action;
use crate::tui::event::TuiEvent;

/// Below this width the sidebar is hidden automatically.
pub const NARROW_WIDTH: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sessions,
    Citations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub field: AuthField,
    pub mode: AuthMode,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            field: AuthField::Username,
            mode,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }

    fn active_field(&mut self) -> &mut String {
        match self.field {
            AuthField::Username => &mut self.username,
            AuthField::Password => &mut self.password,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            AuthField::Username => AuthField::Password,
            AuthField::Password => AuthField::Username,
        };
    }

    fn submit(&mut self) -> Option<Action> {
        if self.field == AuthField::Username {
            self.field = AuthField::Password;
            return None;
        }
        let credentials = self.credentials();
        Some(match self.mode {
            AuthMode::Login => Action::Login(credentials),
            AuthMode::Register => Action::Register(credentials),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Auth(AuthForm),
    /// Path being typed for upload
    Upload(String),
    /// Waiting for a second `d` to delete this session
    ConfirmDelete(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneLayout {
    /// Chat and document side by side
    Split,
    DocumentOnly,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub focus: Focus,
    pub overlay: Overlay,
    pub layout: PaneLayout,
    pub sidebar_open: bool,
    pub last_width: u16,
    pub session_cursor: usize,
    pub citation_cursor: usize,
}

impl ViewState {
    pub fn new(width: u16) -> Self {
        Self {
            focus: Focus::Input,
            overlay: Overlay::None,
            layout: PaneLayout::Split,
            sidebar_open: width >= NARROW_WIDTH,
            last_width: width,
            session_cursor: 0,
            citation_cursor: 0,
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay != Overlay::None
    }

    /// Input → Sessions → Citations → Input, skipping panes with nothing
    /// to select.
    pub fn cycle_focus(&mut self, sessions: usize, citations: usize) {
        let sessions_available = self.sidebar_open && sessions > 0;
        let citations_available = citations > 0;
        self.focus = match self.focus {
            Focus::Input if sessions_available => Focus::Sessions,
            Focus::Input | Focus::Sessions if citations_available => Focus::Citations,
            _ => Focus::Input,
        };
        self.session_cursor = self.session_cursor.min(sessions.saturating_sub(1));
        if self.focus == Focus::Citations {
            self.citation_cursor = self.citation_cursor.min(citations.saturating_sub(1));
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = Focus::Input;
    }

    pub fn open_auth(&mut self) {
        self.overlay = Overlay::Auth(AuthForm::new(AuthMode::Login));
    }

    pub fn toggle_auth_mode(&mut self) {
        if let Overlay::Auth(form) = &mut self.overlay {
            form.mode = match form.mode {
                AuthMode::Login => AuthMode::Register,
                AuthMode::Register => AuthMode::Login,
            };
        }
    }

    pub fn open_upload(&mut self) {
        self.overlay = Overlay::Upload(String::new());
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
        if !self.sidebar_open && self.focus == Focus::Sessions {
            self.focus = Focus::Input;
        }
    }

    pub fn toggle_document_layout(&mut self) {
        self.layout = match self.layout {
            PaneLayout::Split => PaneLayout::DocumentOnly,
            PaneLayout::DocumentOnly => PaneLayout::Split,
        };
    }

    /// Shows or hides the sidebar when the width crosses the breakpoint.
    /// Resizes that stay on one side keep a manual Ctrl+B choice.
    pub fn on_resize(&mut self, width: u16) {
        let was_wide = self.last_width >= NARROW_WIDTH;
        let is_wide = width >= NARROW_WIDTH;
        self.last_width = width;
        if was_wide != is_wide {
            self.sidebar_open = is_wide;
            if !is_wide && self.focus == Focus::Sessions {
                self.focus = Focus::Input;
            }
        }
    }

    /// First call arms the confirmation; a second call for the same session
    /// returns it for deletion.
    pub fn request_delete(&mut self, id: SessionId) -> Option<SessionId> {
        if self.overlay == Overlay::ConfirmDelete(id) {
            self.overlay = Overlay::None;
            return Some(id);
        }
        self.overlay = Overlay::ConfirmDelete(id);
        None
    }

    pub fn move_session_cursor(&mut self, delta: isize, len: usize) {
        self.session_cursor = step(self.session_cursor, delta, len);
    }

    pub fn move_citation_cursor(&mut self, delta: isize, len: usize) {
        self.citation_cursor = step(self.citation_cursor, delta, len);
    }

    /// Keeps the view consistent with an action about to be applied.
    pub fn observe(&mut self, action: &Action) {
        match action {
            Action::Registered => {
                if let Overlay::Auth(form) = &mut self.overlay {
                    form.mode = AuthMode::Login;
                    form.password.clear();
                    form.field = AuthField::Password;
                }
            }
            Action::LoggedIn(_) => {
                if matches!(self.overlay, Overlay::Auth(_)) {
                    self.overlay = Overlay::None;
                }
            }
            Action::SignOut => {
                self.focus = Focus::Input;
                self.session_cursor = 0;
                self.citation_cursor = 0;
            }
            Action::ClearConversation | Action::SelectSession(_) => {
                self.citation_cursor = 0;
                if self.focus == Focus::Citations {
                    self.focus = Focus::Input;
                }
            }
            Action::SessionsLoaded(sessions) => {
                self.session_cursor = self.session_cursor.min(sessions.len().saturating_sub(1));
            }
            _ => {}
        }
    }

    /// Routes a key to the open overlay. Returns the action the overlay
    /// produced, if any.
    pub fn handle_overlay_event(&mut self, event: &TuiEvent) -> Option<Action> {
        if matches!(event, TuiEvent::Escape) {
            self.close_overlay();
            return None;
        }
        if matches!(event, TuiEvent::ToggleAuthMode) {
            self.toggle_auth_mode();
            return None;
        }

        match &mut self.overlay {
            Overlay::None => None,
            Overlay::Auth(form) => match event {
                TuiEvent::InputChar(c) if *c != '\n' => {
                    form.active_field().push(*c);
                    None
                }
                TuiEvent::Paste(text) => {
                    form.active_field().push_str(text.trim_end_matches('\n'));
                    None
                }
                TuiEvent::Backspace => {
                    form.active_field().pop();
                    None
                }
                TuiEvent::Tab | TuiEvent::CursorUp | TuiEvent::CursorDown => {
                    form.toggle_field();
                    None
                }
                TuiEvent::Submit => form.submit(),
                _ => None,
            },
            Overlay::Upload(path) => match event {
                TuiEvent::InputChar(c) if *c != '\n' => {
                    path.push(*c);
                    None
                }
                TuiEvent::Paste(text) => {
                    path.push_str(text.trim());
                    None
                }
                TuiEvent::Backspace => {
                    path.pop();
                    None
                }
                TuiEvent::Submit => {
                    let typed = path.trim().to_string();
                    if typed.is_empty() {
                        return None;
                    }
                    self.overlay = Overlay::None;
                    Some(Action::Upload(expand_upload_path(&typed)))
                }
                _ => None,
            },
            Overlay::ConfirmDelete(id) => {
                let id = *id;
                match event {
                    TuiEvent::InputChar('d') | TuiEvent::InputChar('y') | TuiEvent::Submit => {
                        self.overlay = Overlay::None;
                        Some(Action::DeleteSession(id))
                    }
                    _ => {
                        self.overlay = Overlay::None;
                        None
                    }
                }
            }
        }
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

/// Expands a leading `~/` to the home directory.
pub fn expand_upload_path(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SessionSummary, User};

    fn type_str(view: &mut ViewState, s: &str) {
        for c in s.chars() {
            view.handle_overlay_event(&TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn test_sidebar_follows_breakpoint() {
        let mut view = ViewState::new(120);
        assert!(view.sidebar_open);

        view.on_resize(80);
        assert!(!view.sidebar_open);

        // Manual override survives resizes on the same side
        view.toggle_sidebar();
        view.on_resize(90);
        assert!(view.sidebar_open);

        view.on_resize(130);
        assert!(view.sidebar_open);
        view.on_resize(99);
        assert!(!view.sidebar_open);
    }

    #[test]
    fn test_cycle_focus_skips_empty_panes() {
        let mut view = ViewState::new(120);
        view.cycle_focus(0, 0);
        assert_eq!(view.focus, Focus::Input);

        view.cycle_focus(2, 0);
        assert_eq!(view.focus, Focus::Sessions);
        view.cycle_focus(2, 0);
        assert_eq!(view.focus, Focus::Input);

        view.cycle_focus(2, 3);
        assert_eq!(view.focus, Focus::Sessions);
        view.cycle_focus(2, 3);
        assert_eq!(view.focus, Focus::Citations);
        view.cycle_focus(2, 3);
        assert_eq!(view.focus, Focus::Input);
    }

    #[test]
    fn test_cycle_focus_skips_hidden_sidebar() {
        let mut view = ViewState::new(80);
        view.cycle_focus(5, 1);
        assert_eq!(view.focus, Focus::Citations);
    }

    #[test]
    fn test_hiding_sidebar_moves_focus_back_to_input() {
        let mut view = ViewState::new(120);
        view.cycle_focus(1, 0);
        view.toggle_sidebar();
        assert_eq!(view.focus, Focus::Input);
    }

    #[test]
    fn test_auth_form_two_step_submit() {
        let mut view = ViewState::new(120);
        view.open_auth();
        type_str(&mut view, "alice");
        assert_eq!(view.handle_overlay_event(&TuiEvent::Submit), None);
        type_str(&mut view, "pw");

        let action = view.handle_overlay_event(&TuiEvent::Submit);
        assert_eq!(
            action,
            Some(Action::Login(Credentials {
                username: "alice".to_string(),
                password: "pw".to_string(),
            }))
        );
        // Form stays open until the login succeeds
        assert!(view.has_overlay());
    }

    #[test]
    fn test_auth_mode_toggle_submits_register() {
        let mut view = ViewState::new(120);
        view.open_auth();
        view.handle_overlay_event(&TuiEvent::ToggleAuthMode);
        type_str(&mut view, "bob");
        view.handle_overlay_event(&TuiEvent::Tab);
        type_str(&mut view, "secret");
        assert!(matches!(
            view.handle_overlay_event(&TuiEvent::Submit),
            Some(Action::Register(_))
        ));
    }

    #[test]
    fn test_registered_switches_to_login_and_logged_in_closes() {
        let mut view = ViewState::new(120);
        view.open_auth();
        view.toggle_auth_mode();
        type_str(&mut view, "bob");

        view.observe(&Action::Registered);
        match &view.overlay {
            Overlay::Auth(form) => {
                assert_eq!(form.mode, AuthMode::Login);
                assert_eq!(form.username, "bob");
                assert!(form.password.is_empty());
            }
            other => panic!("Expected auth overlay, got {other:?}"),
        }

        view.observe(&Action::LoggedIn(User {
            user_id: 1,
            username: "bob".to_string(),
        }));
        assert_eq!(view.overlay, Overlay::None);
    }

    #[test]
    fn test_upload_overlay_produces_action() {
        let mut view = ViewState::new(120);
        view.open_upload();
        assert_eq!(view.handle_overlay_event(&TuiEvent::Submit), None);

        view.handle_overlay_event(&TuiEvent::Paste("/tmp/lease.pdf\n".to_string()));
        assert_eq!(
            view.handle_overlay_event(&TuiEvent::Submit),
            Some(Action::Upload(PathBuf::from("/tmp/lease.pdf")))
        );
        assert!(!view.has_overlay());
    }

    #[test]
    fn test_escape_closes_overlay() {
        let mut view = ViewState::new(120);
        view.open_upload();
        view.handle_overlay_event(&TuiEvent::Escape);
        assert_eq!(view.overlay, Overlay::None);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut view = ViewState::new(120);
        assert_eq!(view.request_delete(4), None);
        assert_eq!(view.overlay, Overlay::ConfirmDelete(4));
        assert_eq!(view.request_delete(4), Some(4));
        assert_eq!(view.overlay, Overlay::None);
    }

    #[test]
    fn test_confirm_overlay_cancels_on_other_key() {
        let mut view = ViewState::new(120);
        view.request_delete(4);
        assert_eq!(view.handle_overlay_event(&TuiEvent::InputChar('n')), None);
        assert_eq!(view.overlay, Overlay::None);

        view.request_delete(4);
        assert_eq!(
            view.handle_overlay_event(&TuiEvent::InputChar('d')),
            Some(Action::DeleteSession(4))
        );
    }

    #[test]
    fn test_cursors_clamp() {
        let mut view = ViewState::new(120);
        view.move_session_cursor(-1, 3);
        assert_eq!(view.session_cursor, 0);
        view.move_session_cursor(5, 3);
        assert_eq!(view.session_cursor, 2);

        view.observe(&Action::SessionsLoaded(vec![SessionSummary {
            id: 1,
            pdf_name: "a.pdf".to_string(),
            date: None,
        }]));
        assert_eq!(view.session_cursor, 0);
    }

    #[test]
    fn test_clear_resets_citation_focus() {
        let mut view = ViewState::new(80);
        view.cycle_focus(0, 2);
        view.move_citation_cursor(1, 2);
        view.observe(&Action::ClearConversation);
        assert_eq!(view.focus, Focus::Input);
        assert_eq!(view.citation_cursor, 0);
    }

    #[test]
    fn test_expand_upload_path() {
        assert_eq!(expand_upload_path("docs/a.pdf"), PathBuf::from("docs/a.pdf"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_upload_path("~/a.pdf"), home.join("a.pdf"));
        }
    }
}
