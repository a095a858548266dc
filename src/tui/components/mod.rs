//! # TUI Components
//!
//! UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as struct fields:
//! - `TitleBar`: user, document, status, toast
//! - `Message`: one conversation message with its citation chips
//! - `Sidebar`: past chat sessions
//! - `Viewer`: what the document surface is showing
//! - `OverlayView`: auth form, upload prompt, delete confirmation
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: question input with cursor and internal scroll
//! - `MessageList`: scrollable conversation view with layout caching
//!
//! Components receive external data as props rather than reading `App`
//! directly, so each can be rendered against a `TestBackend` in isolation.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── sidebar.rs
//! ├── viewer.rs
//! ├── overlay.rs
//! └── input_box/
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod overlay;
pub use overlay::OverlayView;
pub mod sidebar;
pub use sidebar::Sidebar;
pub mod viewer;
pub use viewer::Viewer;
