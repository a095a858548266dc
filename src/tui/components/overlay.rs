//! # Overlay Component
//!
//! Modal dialogs drawn over the body: the sign-in/register form, the upload
//! path prompt, and the delete confirmation. Rendered into a centered rect
//! after clearing it.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::tui::component::Component;
use crate::tui::view::{AuthField, AuthForm, AuthMode, Overlay};

const OVERLAY_WIDTH: u16 = 56;

pub struct OverlayView<'a> {
    pub overlay: &'a Overlay,
    /// Document name of the session awaiting delete confirmation
    pub delete_target: Option<&'a str>,
}

impl<'a> OverlayView<'a> {
    pub fn new(overlay: &'a Overlay, delete_target: Option<&'a str>) -> Self {
        Self {
            overlay,
            delete_target,
        }
    }

    fn content(&self) -> Option<(String, Vec<Line<'static>>)> {
        let hint = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(Color::DarkGray)));
        match self.overlay {
            Overlay::None => None,
            Overlay::Auth(form) => {
                let title = match form.mode {
                    AuthMode::Login => "Sign in",
                    AuthMode::Register => "Create account",
                };
                Some((
                    title.to_string(),
                    vec![
                        field_line("Username", &form.username, form.field == AuthField::Username),
                        field_line(
                            "Password",
                            &"•".repeat(form.password.chars().count()),
                            form.field == AuthField::Password,
                        ),
                        Line::default(),
                        hint("Enter next/submit · Tab switch field · Ctrl+T login/register · Esc close"),
                    ],
                ))
            }
            Overlay::Upload(path) => Some((
                String::from("Upload PDF"),
                vec![
                    field_line("Path", path, true),
                    Line::default(),
                    hint("Enter upload · Esc cancel"),
                ],
            )),
            Overlay::ConfirmDelete(id) => {
                let name = self
                    .delete_target
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("chat {id}"));
                Some((
                    String::from("Delete chat"),
                    vec![
                        Line::from(format!("Delete {name}?")),
                        Line::default(),
                        hint("d/y/Enter delete · any other key cancels"),
                    ],
                ))
            }
        }
    }
}

fn field_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let value_style = if active {
        Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    };
    let marker = if active { "› " } else { "  " };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{label:<10}"), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), value_style),
    ])
}

/// Centered rect of `width` x `height`, clipped to `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

impl<'a> Component for OverlayView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some((title, lines)) = self.content() else {
            return;
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
            .padding(Padding::horizontal(1));
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
        let height = paragraph.line_count(OVERLAY_WIDTH.saturating_sub(4)) as u16;

        let rect = centered(area, OVERLAY_WIDTH, height);
        frame.render_widget(Clear, rect);
        frame.render_widget(paragraph, rect);
    }
}
