//! Answer text → ratatui `Text`.
//!
//! Answers arrive as short markdown bullet lists, a fragment at a time, and
//! the whole partial answer is re-rendered every frame. Mentions of pages in
//! prose ("page 4", "p. 12", "pages 3-5") are tinted like the citation chips,
//! and a paragraph opening with ⚠ (the server's quota notice) is drawn as a
//! warning.

use std::ops::Range;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

const PAGE_MENTION: Color = Color::Cyan;
const NOTICE: Color = Color::Yellow;

/// Render `content` with `base_fg` as the body color.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut renderer = AnswerRenderer::new(base_fg);
    for event in Parser::new_ext(content, Options::ENABLE_STRIKETHROUGH) {
        renderer.event(event);
    }
    Text::from(renderer.lines)
}

/// Open block containers, innermost last.
enum Block {
    Quote,
    Code,
    /// `None` for bullets, `Some(n)` for the next ordinal.
    List(Option<u64>),
}

impl Block {
    fn gutter(&self) -> Option<Span<'static>> {
        match self {
            Block::Quote | Block::Code => {
                Some(Span::styled("│ ", Style::default().fg(Color::DarkGray)))
            }
            Block::List(_) => None,
        }
    }
}

struct AnswerRenderer {
    lines: Vec<Line<'static>>,
    base: Style,
    inline: Vec<Style>,
    blocks: Vec<Block>,
    link: Option<String>,
    /// A blank line goes before the next block.
    gap: bool,
    /// Nothing but gutter and list marker on the current line yet.
    line_empty: bool,
    /// The current item's marker is written; its first paragraph continues that line.
    item_open: bool,
    notice: bool,
}

impl AnswerRenderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base: Style::default().fg(base_fg),
            inline: Vec::new(),
            blocks: Vec::new(),
            link: None,
            gap: false,
            line_empty: true,
            item_open: false,
            notice: false,
        }
    }

    fn style(&self) -> Style {
        let style = self.inline.last().copied().unwrap_or(self.base);
        if self.notice {
            style.fg(NOTICE)
        } else {
            style
        }
    }

    fn push_inline(&mut self, overlay: Style) {
        self.inline.push(self.style().patch(overlay));
    }

    fn new_line(&mut self) {
        let gutter: Vec<Span<'static>> = self.blocks.iter().filter_map(Block::gutter).collect();
        self.lines.push(Line::from(gutter));
        self.line_empty = true;
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.lines.last_mut() {
            line.push_span(span);
        }
        self.line_empty = false;
    }

    fn start_block(&mut self) {
        if self.gap {
            self.lines.push(Line::default());
            self.gap = false;
        }
    }

    fn list_depth(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::List(_)))
            .count()
    }

    fn in_code(&self) -> bool {
        matches!(self.blocks.last(), Some(Block::Code))
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(code) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.push_span(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.push_span(Span::styled(" ", self.style())),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.start_block();
                self.new_line();
                self.push_span(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                ));
                self.gap = true;
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.item_open {
                    self.item_open = false;
                } else {
                    self.start_block();
                    self.new_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.new_line();
                self.push_inline(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.blocks.push(Block::Quote);
                self.push_inline(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.blocks.push(Block::Code);
            }
            Tag::List(start) => {
                if self.list_depth() == 0 {
                    self.start_block();
                }
                self.blocks.push(Block::List(start));
            }
            Tag::Item => {
                self.gap = false;
                let indent = "  ".repeat(self.list_depth().saturating_sub(1));
                let marker = match self.blocks.last_mut() {
                    Some(Block::List(Some(n))) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.new_line();
                self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                self.line_empty = true;
                self.item_open = true;
            }
            Tag::Emphasis => self.push_inline(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_inline(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_inline(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_inline(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.notice = false;
                self.gap = true;
            }
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.blocks.pop();
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.blocks.pop();
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.blocks.pop();
                self.gap = true;
            }
            TagEnd::Item => {
                self.item_open = false;
                self.notice = false;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(url) = self.link.take() {
                    self.push_span(Span::styled(
                        format!(" ({url})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, cow: CowStr<'_>) {
        // ratatui renders \t as zero-width
        let text = cow.replace('\t', "    ");

        if self.in_code() {
            for line in text.lines() {
                self.new_line();
                self.push_span(Span::styled(line.to_owned(), Style::default().fg(Color::White)));
            }
            return;
        }

        if self.line_empty && text.trim_start().starts_with('⚠') {
            self.notice = true;
        }
        self.item_open = false;

        let style = self.style();
        let mut last = 0;
        for range in page_mentions(&text) {
            if range.start > last {
                self.push_span(Span::styled(text[last..range.start].to_owned(), style));
            }
            self.push_span(Span::styled(
                text[range.clone()].to_owned(),
                style.fg(PAGE_MENTION),
            ));
            last = range.end;
        }
        if last < text.len() {
            self.push_span(Span::styled(text[last..].to_owned(), style));
        }
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

/// Byte ranges of "page N", "pages N-M", "pg N" and "p. N" in `text`.
///
/// Matching is ASCII case-insensitive and anchored at word starts; every
/// range starts and ends on an ASCII byte, so slicing is always valid.
fn page_mentions(text: &str) -> Vec<Range<usize>> {
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let word_start = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        if word_start && let Some(end) = page_mention_at(bytes, i) {
            found.push(i..end);
            i = end;
        } else {
            i += 1;
        }
    }
    found
}

fn page_mention_at(bytes: &[u8], start: usize) -> Option<usize> {
    const WORDS: [&[u8]; 5] = [b"pages", b"page", b"pg.", b"pg", b"p."];

    let rest = &bytes[start..];
    let word = WORDS.iter().find(|w| rest.starts_with(w))?;
    let mut i = start + word.len();
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    let digits = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits {
        return None;
    }
    if bytes.get(i) == Some(&b'-') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    Some(i)
}
