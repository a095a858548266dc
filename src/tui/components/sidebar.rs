//! # Sidebar Component
//!
//! Past chat sessions of the signed-in user, newest first. The current
//! session is marked; the session cursor is highlighted while the sidebar
//! has focus.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState, Paragraph, Wrap};

use crate::backend::{SessionId, SessionSummary};
use crate::tui::component::Component;

pub struct Sidebar<'a> {
    pub sessions: &'a [SessionSummary],
    pub current: Option<SessionId>,
    /// Highlighted row, `None` when the sidebar is not focused
    pub cursor: Option<usize>,
    pub signed_in: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        sessions: &'a [SessionSummary],
        current: Option<SessionId>,
        cursor: Option<usize>,
        signed_in: bool,
    ) -> Self {
        Self {
            sessions,
            current,
            cursor,
            signed_in,
        }
    }

    fn item(&self, session: &SessionSummary) -> ListItem<'static> {
        let is_current = self.current == Some(session.id);
        let marker = if is_current { "● " } else { "  " };
        let name_style = if is_current {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let date = session
            .date
            .map(|d| d.format("%b %d %H:%M").to_string())
            .unwrap_or_default();

        ListItem::new(vec![
            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(session.pdf_name.clone(), name_style),
            ]),
            Line::from(Span::styled(
                format!("  {date}"),
                Style::default().fg(Color::DarkGray),
            )),
        ])
    }
}

impl<'a> Component for Sidebar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = if self.cursor.is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title("Chats");

        if !self.signed_in || self.sessions.is_empty() {
            let hint = if self.signed_in {
                "No chats yet. Ctrl+U uploads a PDF."
            } else {
                "Sign in (Ctrl+A) to see your chats."
            };
            let paragraph = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self.sessions.iter().map(|s| self.item(s)).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(self.cursor);
        frame.render_stateful_widget(list, area, &mut state);
    }
}
