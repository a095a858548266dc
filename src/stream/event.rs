//! # Event Interpreter
//!
//! Each framed record is a JSON object with a `type` discriminator:
//!
//! ```text
//! {"type":"sources","data":[{"filename":"report.pdf","page":3}]}
//! {"type":"content","data":"- First bullet"}
//! ```
//!
//! Anything else (bad JSON, unknown `type`, wrong payload shape) becomes
//! [`StreamEvent::Unrecognized`], which the caller drops. One bad record
//! never ends the stream.

use log::debug;
use serde::{Deserialize, Serialize};

/// A (document, page) reference attached to an assistant answer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Citation {
    #[serde(rename = "filename")]
    pub document_id: String,
    pub page: u32,
}

impl Citation {
    pub fn new(document_id: impl Into<String>, page: u32) -> Self {
        Self {
            document_id: document_id.into(),
            page,
        }
    }
}

/// A typed event decoded from one framed record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Full citation list for the current answer. Replaces any earlier list.
    Sources(Vec<Citation>),
    /// Text fragment appended to the current answer.
    Content(String),
    /// Malformed or unknown record.
    Unrecognized,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum WireEvent {
    Sources(Vec<Citation>),
    Content(String),
}

/// Interpret one framed record.
pub fn interpret(record: &str) -> StreamEvent {
    match serde_json::from_str::<WireEvent>(record) {
        Ok(WireEvent::Sources(citations)) => {
            let total = citations.len();
            let navigable: Vec<Citation> =
                citations.into_iter().filter(|c| c.page > 0).collect();
            if navigable.len() != total {
                debug!(
                    "Dropped {} citation(s) without a page number",
                    total - navigable.len()
                );
            }
            StreamEvent::Sources(navigable)
        }
        Ok(WireEvent::Content(text)) => StreamEvent::Content(text),
        Err(e) => {
            debug!("Unrecognized stream record ({e}): {record}");
            StreamEvent::Unrecognized
        }
    }
}
