//! # TitleBar Component
//!
//! Top status bar: who is signed in, which document the chat belongs to,
//! the status message, and the current toast (if any).
//!
//! Stateless. All fields are props copied from `App` each frame.
//!
//! ```text
//! docchat | alice | lease.pdf | Streaming... | Uploaded lease.pdf
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::state::{Toast, ToastKind};
use crate::tui::component::Component;

pub struct TitleBar {
    /// Signed-in username, `None` when anonymous
    pub username: Option<String>,
    /// Document name of the current session
    pub document: Option<String>,
    pub status_message: String,
    pub toast: Option<Toast>,
}

impl TitleBar {
    pub fn new(
        username: Option<String>,
        document: Option<String>,
        status_message: String,
        toast: Option<Toast>,
    ) -> Self {
        Self {
            username,
            document,
            status_message,
            toast,
        }
    }

    fn line(&self) -> Line<'static> {
        let sep = || Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![Span::styled(
            "docchat",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )];

        spans.push(sep());
        match &self.username {
            Some(name) => spans.push(Span::styled(name.clone(), Style::default().fg(Color::Cyan))),
            None => spans.push(Span::styled(
                "not signed in (Ctrl+A)",
                Style::default().fg(Color::DarkGray),
            )),
        }

        if let Some(doc) = &self.document {
            spans.push(sep());
            spans.push(Span::raw(doc.clone()));
        }

        if !self.status_message.is_empty() {
            spans.push(sep());
            spans.push(Span::raw(self.status_message.clone()));
        }

        if let Some(toast) = &self.toast {
            spans.push(sep());
            spans.push(Span::styled(toast.message.clone(), toast_style(toast.kind)));
        }

        Line::from(spans)
    }
}

fn toast_style(kind: ToastKind) -> Style {
    match kind {
        ToastKind::Info => Style::default().fg(Color::Yellow),
        ToastKind::Success => Style::default().fg(Color::Green),
        ToastKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(100, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_title_bar_signed_in_with_document() {
        let mut title_bar = TitleBar::new(
            Some("alice".to_string()),
            Some("lease.pdf".to_string()),
            "Streaming...".to_string(),
            None,
        );
        let text = draw(&mut title_bar);
        assert!(text.contains("docchat"));
        assert!(text.contains("alice"));
        assert!(text.contains("lease.pdf"));
        assert!(text.contains("Streaming..."));
    }

    #[test]
    fn test_title_bar_anonymous_shows_hint() {
        let mut title_bar = TitleBar::new(None, None, String::new(), None);
        let text = draw(&mut title_bar);
        assert!(text.contains("not signed in"));
        assert_eq!(text.matches('|').count(), 1);
    }

    #[test]
    fn test_error_toast_is_red() {
        let title_bar = TitleBar::new(
            None,
            None,
            String::new(),
            Some(Toast::new(ToastKind::Error, "Failed to delete")),
        );
        let line = title_bar.line();
        let span = line
            .spans
            .iter()
            .find(|s| s.content == "Failed to delete")
            .unwrap();
        assert_eq!(span.style.fg, Some(Color::Red));
    }
}
