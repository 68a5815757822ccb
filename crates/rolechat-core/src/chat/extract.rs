//! Incremental extraction of assistant text from an event-stream body.
//!
//! Bytes arrive in arbitrary chunks. The extractor keeps two pieces of state
//! between chunks: undecoded bytes of a UTF-8 sequence cut by a chunk boundary,
//! and the text of the current unterminated line. Complete `data:` lines are
//! parsed as JSON and the assistant delta is pulled from
//! `choices[0].delta.content` or `content`.

use rolechat_types::error::DecodeError;
use serde_json::Value;

/// Payload that marks the end of an upstream stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One useful record found in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// A fragment of assistant text.
    Text(String),
    /// The producer's explicit end-of-stream marker.
    Done,
}

/// Stateful UTF-8 decoder plus line scanner for `data:` records.
#[derive(Debug, Default)]
pub struct SseTextExtractor {
    pending: Vec<u8>,
    line: String,
}

impl SseTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk. Returns the records completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Extracted> {
        self.decode(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.line.find('\n') {
            let line: String = self.line.drain(..=pos).collect();
            if let Some(item) = parse_line(&line[..line.len() - 1]) {
                out.push(item);
            }
        }
        out
    }

    /// Flush state at end of stream.
    ///
    /// A dangling partial UTF-8 sequence becomes U+FFFD and a final line
    /// without a trailing newline is still parsed.
    pub fn finish(&mut self) -> Option<Extracted> {
        if !self.pending.is_empty() {
            self.line.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        let line = std::mem::take(&mut self.line);
        if line.is_empty() {
            None
        } else {
            parse_line(&line)
        }
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.line.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.line
                        .push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            self.line.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        // Incomplete sequence at the tail: wait for the next chunk.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn parse_line(line: &str) -> Option<Extracted> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == DONE_SENTINEL {
        return Some(Extracted::Done);
    }

    match parse_payload(payload) {
        Ok(Some(text)) => Some(Extracted::Text(text)),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "skipping event record");
            None
        }
    }
}

/// Pull the assistant delta out of one `data:` payload.
///
/// `Ok(None)` means well-formed JSON without a text field.
pub fn parse_payload(payload: &str) -> Result<Option<String>, DecodeError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DecodeError(e.to_string()))?;

    let text = value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| value.get("content").and_then(Value::as_str));

    Ok(text.filter(|s| !s.is_empty()).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[Extracted]) -> String {
        items
            .iter()
            .filter_map(|i| match i {
                Extracted::Text(t) => Some(t.as_str()),
                Extracted::Done => None,
            })
            .collect()
    }

    #[test]
    fn test_extracts_both_payload_shapes() {
        let mut ex = SseTextExtractor::new();
        let items = ex.push(
            b"data: {\"content\":\"he\"}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
        );
        assert_eq!(
            items,
            vec![Extracted::Text("he".into()), Extracted::Text("llo".into())]
        );
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut ex = SseTextExtractor::new();
        assert!(ex.push(b"data: {\"cont").is_empty());
        assert!(ex.push(b"ent\":\"abc\"}").is_empty());
        assert_eq!(ex.push(b"\n\n"), vec![Extracted::Text("abc".into())]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        // "€" is E2 82 AC.
        let full = "data: {\"content\":\"€\"}\n".as_bytes();
        let split = full.iter().position(|&b| b == 0xE2).unwrap() + 2;

        let mut ex = SseTextExtractor::new();
        assert!(ex.push(&full[..split]).is_empty());
        assert_eq!(ex.push(&full[split..]), vec![Extracted::Text("€".into())]);
    }

    #[test]
    fn test_invalid_bytes_become_replacement_char() {
        let mut ex = SseTextExtractor::new();
        let mut chunk = b"data: {\"content\":\"a".to_vec();
        chunk.push(0xFF);
        chunk.extend_from_slice(b"b\"}\n");
        assert_eq!(ex.push(&chunk), vec![Extracted::Text("a\u{FFFD}b".into())]);
    }

    #[test]
    fn test_done_sentinel_and_crlf() {
        let mut ex = SseTextExtractor::new();
        let items = ex.push(b"data:{\"content\":\"x\"}\r\n\r\ndata: [DONE]\r\n");
        assert_eq!(items, vec![Extracted::Text("x".into()), Extracted::Done]);
    }

    #[test]
    fn test_malformed_and_foreign_lines_are_skipped() {
        let mut ex = SseTextExtractor::new();
        let items = ex.push(
            b": keepalive\nevent: message\ndata: {not json\ndata: {\"message_type\":\"usage\"}\ndata: {\"content\":\"ok\"}\n",
        );
        assert_eq!(texts(&items), "ok");
    }

    #[test]
    fn test_empty_delta_falls_back_to_content() {
        let payload = r#"{"choices":[{"delta":{"content":""}}],"content":"c"}"#;
        assert_eq!(parse_payload(payload).unwrap(), Some("c".to_string()));
        assert_eq!(parse_payload(r#"{"content":""}"#).unwrap(), None);
        assert!(parse_payload("nope").is_err());
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut ex = SseTextExtractor::new();
        assert!(ex.push(b"data: {\"content\":\"tail\"}").is_empty());
        assert_eq!(ex.finish(), Some(Extracted::Text("tail".into())));
        assert_eq!(ex.finish(), None);
    }
}
