pub mod client;
pub mod http;
pub mod types;

pub use client::{ApiError, ChatBackend, ChatRequest};
pub use http::HttpBackend;
pub use types::{
    Credentials, Message, Role, SessionId, SessionSummary, TurnId, UploadReceipt, User,
};
