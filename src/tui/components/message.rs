use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::backend::{Message as ChatMessage, Role};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const PENDING_PLACEHOLDER: &str = "Thinking...";

/// A stateless component that renders one conversation message.
///
/// Assistant answers are rendered as markdown. When the answer carries
/// citations, a row of "Pg N" chips follows the text; `selected_chip`
/// highlights one of them while the citation cursor is active.
///
/// [`calculate_height`](Self::calculate_height) builds the same paragraph the
/// widget renders and asks ratatui for its wrapped line count, so the parent
/// `MessageList` can lay out the scroll canvas without rendering.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
    /// The open turn's answer (shows a placeholder until text arrives)
    pub is_pending: bool,
    pub selected_chip: Option<usize>,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage, is_pending: bool, selected_chip: Option<usize>) -> Self {
        Self {
            message,
            is_pending,
            selected_chip,
        }
    }

    pub fn calculate_height(message: &ChatMessage, is_pending: bool, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = Paragraph::new(body(message, is_pending, None))
            .wrap(Wrap { trim: false })
            .line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

pub(crate) fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "docchat",
    }
}

fn body(message: &ChatMessage, is_pending: bool, selected_chip: Option<usize>) -> Text<'static> {
    let content = message.content.trim();
    let style = role_style(message.role);

    let mut text = if content.is_empty() && is_pending {
        Text::from(Line::from(Span::styled(
            PENDING_PLACEHOLDER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )))
    } else {
        match message.role {
            Role::Assistant => markdown::render(content, Color::Blue),
            Role::User => Text::styled(content.to_string(), style),
        }
    };

    if !message.sources.is_empty() {
        text.lines.push(Line::default());
        text.lines.push(chip_line(message, selected_chip));
    }
    text
}

fn chip_line(message: &ChatMessage, selected_chip: Option<usize>) -> Line<'static> {
    let mut spans = Vec::with_capacity(message.sources.len() * 2);
    for (i, citation) in message.sources.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if selected_chip == Some(i) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!("[Pg {}]", citation.page), style));
    }
    Line::from(spans)
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = role_style(self.message.role).add_modifier(Modifier::DIM);

        let block = Block::bordered()
            .title(role_title(self.message.role))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(body(self.message, self.is_pending, self.selected_chip))
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
