//! # Viewer Component
//!
//! Stand-in for the document surface. The terminal cannot render the PDF,
//! so the pane shows what a viewer would be loading: the active document,
//! its locator, the page it was asked to show, and how many locator updates
//! have been issued.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::navigation::ViewerState;
use crate::tui::component::Component;

pub struct Viewer<'a> {
    pub viewer: &'a ViewerState,
    /// Pane fills the body (document-only layout)
    pub expanded: bool,
}

impl<'a> Viewer<'a> {
    pub fn new(viewer: &'a ViewerState, expanded: bool) -> Self {
        Self { viewer, expanded }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));

        let Some(document) = &self.viewer.active_document else {
            return vec![Line::from(label(
                "No document open. Upload a PDF (Ctrl+U) or pick a chat.",
            ))];
        };

        let page = self
            .viewer
            .pending_page
            .map(|p| p.to_string())
            .unwrap_or_else(|| String::from("1"));

        vec![
            Line::from(Span::styled(
                document.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(vec![label("Page      "), Span::raw(page)]),
            Line::from(vec![
                label("Locator   "),
                Span::styled(
                    self.viewer.locator.clone().unwrap_or_default(),
                    Style::default().fg(Color::Cyan),
                ),
            ]),
            Line::from(vec![
                label("Reloads   "),
                Span::raw(self.viewer.revision.to_string()),
            ]),
        ]
    }
}

impl<'a> Component for Viewer<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title = if self.expanded {
            "Document (Ctrl+F to return)"
        } else {
            "Document"
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM))
            .title(title);
        let paragraph = Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, area);
    }
}
