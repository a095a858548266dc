//! # Conversation Log
//!
//! Ordered message log plus the phase of the current turn.
//!
//! ```text
//!   Idle ──begin_turn──► Requesting ──mark_streaming──► Streaming
//!    ▲                       │                              │
//!    └───── finish / clear ──┴──────────────────────────────┘
//! ```
//!
//! Stream events carry the [`TurnId`] minted by `begin_turn`. Only the open
//! turn's assistant message is ever mutated; events for any other token are
//! discarded, including events that arrive after `clear` or `finish`.

use log::debug;

use crate::backend::{Message, TurnId};
use crate::stream::StreamEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// Request issued, no byte received yet.
    Requesting(TurnId),
    Streaming(TurnId),
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    phase: TurnPhase,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Token of the turn currently accepting events.
    pub fn open_turn(&self) -> Option<TurnId> {
        match self.phase {
            TurnPhase::Idle => None,
            TurnPhase::Requesting(id) | TurnPhase::Streaming(id) => Some(id),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.open_turn().is_some()
    }

    /// Appends the user question and an empty assistant message tagged with a
    /// fresh token. Returns the token and the log as it was before the
    /// question, which is the history sent with the request.
    ///
    /// Callers finalize any open turn first; this overwrites the phase.
    pub fn begin_turn(&mut self, question: String) -> (TurnId, Vec<Message>) {
        let history = self.messages.clone();
        let token = TurnId::mint();
        self.messages.push(Message::user(question));
        self.messages.push(Message::pending_answer(token));
        self.phase = TurnPhase::Requesting(token);
        debug!("Turn {} requesting (history_len={})", token, history.len());
        (token, history)
    }

    /// Requesting → Streaming. Returns false for a stale token.
    pub fn mark_streaming(&mut self, token: TurnId) -> bool {
        if self.phase == TurnPhase::Requesting(token) {
            self.phase = TurnPhase::Streaming(token);
            true
        } else {
            debug!("Ignoring open signal for stale turn {}", token);
            false
        }
    }

    /// Applies one event to the open turn's message. `sources` replaces the
    /// citation list, `content` appends. Returns whether anything changed.
    pub fn apply(&mut self, token: TurnId, event: StreamEvent) -> bool {
        if self.open_turn() != Some(token) {
            debug!("Discarding event for stale turn {}", token);
            return false;
        }
        if event == StreamEvent::Unrecognized {
            return false;
        }
        let Some(message) = self.messages.iter_mut().rev().find(|m| m.id == Some(token)) else {
            debug!("No message for turn {}", token);
            return false;
        };

        // The first event doubles as the open signal when it raced ahead of it.
        self.phase = TurnPhase::Streaming(token);

        match event {
            StreamEvent::Sources(citations) => {
                debug!("Turn {}: {} sources", token, citations.len());
                message.sources = citations;
            }
            StreamEvent::Content(text) => message.content.push_str(&text),
            StreamEvent::Unrecognized => {}
        }
        true
    }

    /// Closes the open turn; its message is immutable from here on.
    /// Returns false when `token` is not the open turn.
    pub fn finish(&mut self, token: TurnId) -> bool {
        if self.open_turn() == Some(token) {
            self.phase = TurnPhase::Idle;
            debug!("Turn {} finalized", token);
            true
        } else {
            false
        }
    }

    /// Finalizes whatever turn is open, returning its token.
    pub fn finish_open(&mut self) -> Option<TurnId> {
        let token = self.open_turn()?;
        self.phase = TurnPhase::Idle;
        Some(token)
    }

    /// Empties the log unconditionally.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.phase = TurnPhase::Idle;
    }

    /// Places fetched history ahead of whatever is already in the log.
    pub fn load_history(&mut self, history: Vec<Message>) {
        let newer = std::mem::replace(&mut self.messages, history);
        self.messages.extend(newer);
    }
}
