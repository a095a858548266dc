//! Scrollable view of the conversation log.
//!
//! The list pins itself to the bottom while an answer streams in and lets go
//! as soon as the user scrolls up. Message heights are cached per
//! [`LayoutKey`], so a streaming answer only re-measures the one message that
//! grew. Moving the citation cursor scrolls its message into view via
//! [`MessageListState::scroll_to_message`].
//!
//! `MessageList` is rebuilt every frame around `&mut MessageListState`, which
//! outlives it in `TuiState`.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::backend::{Message as ChatMessage, Role, TurnId};
use crate::stream::Citation;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        let total: u16 = self.layout.heights.iter().sum();
        total.saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll so message `idx` is fully visible. Messages taller than the
    /// viewport are aligned to their bottom edge, where the chips are.
    pub fn scroll_to_message(&mut self, idx: usize) {
        if idx >= self.layout.prefix_heights.len() {
            return;
        }
        let item_top = if idx == 0 {
            0
        } else {
            self.layout.prefix_heights[idx - 1]
        };
        let item_bottom = self.layout.prefix_heights[idx];
        let offset_y = self.scroll_state.offset().y;

        if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            self.stick_to_bottom = new_y >= self.max_offset();
        } else if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        }
    }

    /// Re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

/// Resolve a flat citation cursor to (message index, chip index, citation),
/// counting chips across the whole log in display order.
pub fn citation_at(messages: &[ChatMessage], cursor: usize) -> Option<(usize, usize, &Citation)> {
    messages
        .iter()
        .enumerate()
        .flat_map(|(m, msg)| msg.sources.iter().enumerate().map(move |(c, cit)| (m, c, cit)))
        .nth(cursor)
}

pub fn citation_count(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| m.sources.len()).sum()
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [ChatMessage],
    /// Id of the answer currently being requested or streamed
    pub open_turn: Option<TurnId>,
    /// (message index, chip index) under the citation cursor
    pub selected_citation: Option<(usize, usize)>,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [ChatMessage],
        open_turn: Option<TurnId>,
        selected_citation: Option<(usize, usize)>,
    ) -> Self {
        Self {
            state,
            messages,
            open_turn,
            selected_citation,
        }
    }

    fn is_pending(&self, message: &ChatMessage) -> bool {
        self.open_turn.is_some() && message.id == self.open_turn
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Update layout cache
        let keys: Vec<LayoutKey> = self
            .messages
            .iter()
            .map(|m| LayoutKey::of(m, self.is_pending(m)))
            .collect();
        let reusable = self.state.layout.reusable_count(&keys, content_width);
        self.state.layout.heights.truncate(reusable);
        for (message, key) in self.messages.iter().zip(&keys).skip(reusable) {
            let height = Message::calculate_height(message, key.pending, content_width);
            self.state.layout.heights.push(height);
        }
        self.state.layout.rebuild_prefix_heights();
        self.state.layout.update_metadata(keys, content_width);

        let total_height: u16 = self.state.layout.heights.iter().sum();

        // 2. Clamp scroll offset
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible messages into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let message = &self.messages[i];
            let height = self.state.layout.heights[i];
            let chip = self
                .selected_citation
                .and_then(|(m, c)| (m == i).then_some(c));
            let widget = Message::new(message, self.is_pending(message), chip);
            scroll_view.render_widget(widget, Rect::new(0, y_offset, content_width, height));
            y_offset += height;
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// What a message's height depends on, besides the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutKey {
    role: Role,
    content_len: usize,
    sources: usize,
    pending: bool,
}

impl LayoutKey {
    pub fn of(message: &ChatMessage, pending: bool) -> Self {
        Self {
            role: message.role,
            content_len: message.content.len(),
            sources: message.sources.len(),
            pending,
        }
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    keys: Vec<LayoutKey>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            keys: Vec::new(),
            content_width: 0,
        }
    }

    /// Number of leading heights still valid for `keys` at `content_width`.
    /// Content only grows at the tail of a turn, so the first changed key
    /// invalidates everything after it.
    pub fn reusable_count(&self, keys: &[LayoutKey], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        self.keys
            .iter()
            .zip(keys)
            .take(self.heights.len())
            .take_while(|(cached, current)| cached == current)
            .count()
    }

    pub fn update_metadata(&mut self, keys: Vec<LayoutKey>, content_width: u16) {
        self.keys = keys;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
