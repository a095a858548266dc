//! Business logic of one document-chat view.
//!
//! Everything here is synchronous and free of I/O. The terminal adapter turns
//! key presses and backend replies into [`action::Action`]s, feeds them to
//! [`action::update`], and executes the [`action::Effect`]s it gets back:
//!
//! ```text
//!   key press ─┐                          ┌─► SpawnChat / FetchHistory / ...
//!              ├─► Action ─► update(App) ─┤
//!   backend ───┘      ▲                   └─► SchedulePageSeek ─┐
//!                     └──────── PageSeekDue (after delay) ◄─────┘
//! ```
//!
//! - [`conversation`]: message log and turn phase, token-gated
//! - [`navigation`]: citation → viewer locator sequencing
//! - [`state`]: `App`, everything `update` reads and writes
//! - [`config`]: settings resolution

pub mod action;
pub mod config;
pub mod conversation;
pub mod navigation;
pub mod state;
