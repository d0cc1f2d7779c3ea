/// Incremental decoder for a `text/event-stream` body.
///
/// Bytes may be split anywhere, including inside a UTF-8 sequence; only
/// complete events are returned.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // Bytes of `buffer` already searched for an event boundary.
    scanned: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns the `data` payload of every completed event.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_event_end(&self.buffer, self.scanned.saturating_sub(1)) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            self.scanned = 0;
            if let Some(data) = event_data(&block[..end]) {
                events.push(data);
            }
        }
        self.scanned = self.buffer.len();
        events
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        event_data(&block)
    }
}

fn find_event_end(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|window| window == b"\n\n")
        .map(|offset| from + offset)
}

fn event_data(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    let joined = data.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_split_across_pushes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let events = decoder.push(b"1}\r\n\r\ndata: {\"b\":2}\n\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_multibyte_split() {
        let payload = "data: {\"t\":\"漫画\"}\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        let (head, tail) = payload.split_at(14);
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["{\"t\":\"漫画\"}".to_string()]);
    }

    #[test]
    fn test_large_event_in_small_pieces() {
        let payload = "A".repeat(8 * 1024 * 1024);
        let body = format!("data: {{\"d\":\"{}\"}}\n\ndata: {{}}\n", payload);
        let mut decoder = SseDecoder::new();

        let started = std::time::Instant::now();
        let mut events = Vec::new();
        for piece in body.as_bytes().chunks(8 * 1024) {
            events.extend(decoder.push(piece));
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].len(), payload.len() + 8);
        assert!(events[0].ends_with("A\"}"));
        assert_eq!(decoder.finish(), Some("{}".to_string()));
    }

    #[test]
    fn test_boundary_split_between_pushes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: 1\n").is_empty());
        assert_eq!(decoder.push(b"\ndata: 2\n"), vec!["1".to_string()]);
        assert_eq!(decoder.push(b"\n"), vec!["2".to_string()]);
    }

    #[test]
    fn test_comments_and_trailing_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b": keep-alive\n\n").is_empty());
        assert!(decoder.push(b"event: message\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some("{}".to_string()));
    }
}
