//! # Chunk Decoder
//!
//! Turns raw network chunks into UTF-8 text without assuming that chunk
//! boundaries line up with character boundaries.
//!
//! ```text
//! chunk 1: [.. 'a' 0xE2 0x82]      → "…a"     (0xE2 0x82 carried over)
//! chunk 2: [0xAC 'b' ..]           → "€b…"
//! ```
//!
//! Bytes that can never become valid UTF-8 are replaced with U+FFFD, the
//! same way a non-fatal text decoder behaves. Bytes that are merely
//! *incomplete* are held back until the next chunk arrives.

/// Incremental UTF-8 decoder with carry-over of incomplete trailing bytes.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, prefixed by any bytes carried over from the
    /// previous one. Returns all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;

        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending[start..valid_end]) {
                        out.push_str(valid);
                    }
                    match e.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        None => {
                            // Incomplete sequence at the end: keep it for the next chunk
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Number of bytes currently held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End of stream. Returns the number of incomplete bytes that had to be
    /// discarded (0 on a clean end).
    pub fn finish(self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert_eq!(decoder.finish(), 0);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let euro = "€".as_bytes(); // E2 82 AC
        let mut decoder = ChunkDecoder::new();

        let first = [b'a', euro[0], euro[1]];
        assert_eq!(decoder.decode(&first), "a");
        assert_eq!(decoder.pending_len(), 2);

        let second = [euro[2], b'b'];
        assert_eq!(decoder.decode(&second), "€b");
        assert_eq!(decoder.finish(), 0);
    }

    #[test]
    fn test_every_split_point_yields_same_text() {
        let text = "Pg 3 — “café” ✓ 日本";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = ChunkDecoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            assert_eq!(out, text, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "naïve ✓";
        let mut decoder = ChunkDecoder::new();
        let out: String = text
            .as_bytes()
            .iter()
            .map(|b| decoder.decode(std::slice::from_ref(b)))
            .collect();
        assert_eq!(out, text);
    }

    #[test]
    fn test_invalid_byte_becomes_replacement_char() {
        let mut decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_truncated_character_reported_on_finish() {
        let mut decoder = ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), 2);
    }
}
