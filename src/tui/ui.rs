use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::message_list::citation_at;
use crate::tui::components::{MessageList, OverlayView, Sidebar, TitleBar, Viewer};
use crate::tui::view::{Focus, Overlay, PaneLayout};

const SIDEBAR_WIDTH: u16 = 28;

/// Draws one frame.
///
/// ```text
/// ┌ title bar ─────────────────────────────────────────────┐
/// │ sidebar │ messages              │ document viewer       │
/// │         ├───────────────────────┤                       │
/// │         │ input                 │                       │
/// └─────────┴───────────────────────┴───────────────────────┘
/// ```
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min, Percentage};

    let [title_area, body_area] = Layout::vertical([Length(1), Min(0)]).areas(frame.area());

    TitleBar::new(
        app.user.as_ref().map(|u| u.username.clone()),
        app.current_session().map(|s| s.pdf_name.clone()),
        app.status_message.clone(),
        app.toast.clone(),
    )
    .render(frame, title_area);

    let main_area = if tui.view.sidebar_open {
        let [sidebar_area, rest] = Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(body_area);
        let cursor = (tui.view.focus == Focus::Sessions).then_some(tui.view.session_cursor);
        Sidebar::new(&app.sessions, app.current_session_id, cursor, app.user.is_some())
            .render(frame, sidebar_area);
        rest
    } else {
        body_area
    };

    match tui.view.layout {
        PaneLayout::DocumentOnly => {
            Viewer::new(app.navigator.viewer(), true).render(frame, main_area);
        }
        PaneLayout::Split => {
            let [chat_area, viewer_area] =
                Layout::horizontal([Percentage(55), Percentage(45)]).areas(main_area);
            draw_chat(frame, chat_area, app, tui);
            Viewer::new(app.navigator.viewer(), false).render(frame, viewer_area);
        }
    }

    if tui.view.overlay != Overlay::None {
        let delete_target = match tui.view.overlay {
            Overlay::ConfirmDelete(id) => app
                .sessions
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.pdf_name.as_str()),
            _ => None,
        };
        OverlayView::new(&tui.view.overlay, delete_target).render(frame, frame.area());
    }
}

fn draw_chat(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    tui.input_box.title = input_title(app);
    tui.input_box.focused = tui.view.focus == Focus::Input && tui.view.overlay == Overlay::None;

    let input_height = tui.input_box.calculate_height(area.width);
    let [messages_area, input_area] = Layout::vertical([Min(0), Length(input_height)]).areas(area);

    let messages = app.conversation.messages();
    let selected_citation = if tui.view.focus == Focus::Citations {
        citation_at(messages, tui.view.citation_cursor).map(|(m, c, _)| (m, c))
    } else {
        None
    };

    MessageList::new(
        &mut tui.message_list,
        messages,
        app.conversation.open_turn(),
        selected_citation,
    )
    .render(frame, messages_area);

    tui.input_box.render(frame, input_area);
}

fn input_title(app: &App) -> String {
    if app.is_loading() {
        return String::from("Ask (answering... Ctrl+L clears)");
    }
    if app.loading_history {
        return String::from("Ask (loading chat...)");
    }
    let shortcuts: Vec<String> = app
        .quick_actions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("F{} {}", i + 1, q.label))
        .collect();
    if shortcuts.is_empty() {
        String::from("Ask")
    } else {
        format!("Ask ({})", shortcuts.join(" · "))
    }
}
