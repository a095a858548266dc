//! # Event Framer
//!
//! Splits decoded text into newline-delimited records. Text that has not yet
//! seen its terminating `\n` stays in the carry-over buffer until a later
//! fragment completes it.

/// Newline framer with carry-over between fragments.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a decoded fragment and return every record it completes, in order.
    /// Blank lines are dropped; a trailing `\r` is stripped.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let records = self.buffer[..last_newline]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        self.buffer.drain(..=last_newline);
        records
    }

    /// Bytes of text waiting for a delimiter.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// End of stream. A non-empty leftover is a truncated record; it is
    /// returned to the caller for logging and must not be interpreted.
    pub fn finish(self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}
