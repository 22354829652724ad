//! Newline framing for the serial byte stream
//!
//! Serial reads return whatever bytes happen to be available, so a line can
//! arrive in several pieces across read timeouts. The framer accumulates bytes
//! and hands back complete lines only.

use bytes::BytesMut;

/// Splits a byte stream into trimmed text lines
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line_len: usize,
    /// Inside an overlong line; bytes are dropped until its newline
    discarding: bool,
    discarded: u64,
}

impl LineFramer {
    /// Create a framer that keeps at most `max_line_len` bytes of an
    /// unterminated line
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            max_line_len: max_line_len.max(1),
            discarding: false,
            discarded: 0,
        }
    }

    /// Append bytes read from the device
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Take the next complete line, without its terminator or surrounding
    /// whitespace
    ///
    /// Invalid UTF-8 is replaced rather than rejected. An unterminated line
    /// longer than the limit is dropped, along with the rest of it up to the
    /// next newline, so a device that never sends a newline cannot grow the
    /// buffer without bound and the tail of a dropped line never comes out as
    /// a line of its own.
    pub fn next_line(&mut self) -> Option<String> {
        if self.discarding {
            match self.newline() {
                Some(pos) => {
                    let _ = self.buf.split_to(pos + 1);
                    self.discarding = false;
                }
                None => {
                    self.buf.clear();
                    return None;
                }
            }
        }

        match self.newline() {
            Some(pos) => {
                let raw = self.buf.split_to(pos + 1);
                Some(decode(&raw[..pos]))
            }
            None => {
                if self.buf.len() > self.max_line_len {
                    tracing::debug!(
                        bytes = self.buf.len(),
                        limit = self.max_line_len,
                        "Discarding overlong unterminated line"
                    );
                    self.discarded += 1;
                    self.discarding = true;
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// Take whatever is left as a final line (at end of stream)
    pub fn finish(&mut self) -> Option<String> {
        if self.discarding {
            self.discarding = false;
            self.buf.clear();
            return None;
        }
        if self.buf.is_empty() {
            return None;
        }
        let raw = self.buf.split();
        Some(decode(&raw))
    }

    /// Number of overlong lines dropped
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn newline(&self) -> Option<usize> {
        self.buf.iter().position(|&b| b == b'\n')
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(4096)
    }
}

fn decode(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{parse_line, Reading};

    #[test]
    fn test_single_line() {
        let mut framer = LineFramer::default();
        framer.push(b"ID: 1 | Time: 0.5 seconds\r\n");

        assert_eq!(framer.next_line().unwrap(), "ID: 1 | Time: 0.5 seconds");
        assert!(framer.next_line().is_none());
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut framer = LineFramer::default();

        framer.push(b"ID: 4");
        assert!(framer.next_line().is_none());
        framer.push(b"2 | Time: 1.2");
        assert!(framer.next_line().is_none());
        framer.push(b"34 seconds\nID: 43");

        assert_eq!(framer.next_line().unwrap(), "ID: 42 | Time: 1.234 seconds");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.finish().unwrap(), "ID: 43");
    }

    #[test]
    fn test_multiple_lines_in_one_read() {
        let mut framer = LineFramer::default();
        framer.push(b"a\nb\n\nc\n");

        let lines: Vec<String> = std::iter::from_fn(|| framer.next_line()).collect();
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut framer = LineFramer::default();
        framer.push(b"ID: 1\xff | Time: 2 seconds\n");

        let line = framer.next_line().unwrap();
        assert!(line.starts_with("ID: 1"));
        assert!(line.ends_with("seconds"));
    }

    #[test]
    fn test_overlong_line_discarded() {
        let mut framer = LineFramer::new(8);
        framer.push(b"0123456789abcdef");

        assert!(framer.next_line().is_none());
        assert_eq!(framer.discarded(), 1);

        // The rest of the dropped line, then a good one
        framer.push(b"ghij\nok\n");
        assert_eq!(framer.next_line().unwrap(), "ok");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.discarded(), 1);
    }

    #[test]
    fn test_tail_of_overlong_line_never_parses() {
        let mut framer = LineFramer::new(8);
        framer.push(b"garbage-garbage");
        assert!(framer.next_line().is_none());

        framer.push(b"ID: 9 | Time: 1 seconds\n");
        let tail = framer.next_line();
        assert!(tail.as_deref().and_then(parse_line).is_none());
        assert!(tail.is_none());

        framer.push(b"ID: 10 | Time: 2 seconds\n");
        let line = framer.next_line().unwrap();
        assert_eq!(parse_line(&line), Some(Reading::new(10, 2.0)));
    }

    #[test]
    fn test_overlong_line_spanning_many_reads() {
        let mut framer = LineFramer::new(4);
        for chunk in [&b"aaaaaa"[..], b"bbbbbb", b"ID: 1 | Time: 1 seconds"] {
            framer.push(chunk);
            assert!(framer.next_line().is_none());
        }
        assert!(framer.finish().is_none());
        assert_eq!(framer.discarded(), 1);

        framer.push(b"ID: 2 | Time: 1 seconds\n");
        assert_eq!(framer.next_line().unwrap(), "ID: 2 | Time: 1 seconds");
    }

    #[test]
    fn test_finish_flushes_partial() {
        let mut framer = LineFramer::default();
        framer.push(b"tail without newline");

        assert!(framer.next_line().is_none());
        assert_eq!(framer.finish().unwrap(), "tail without newline");
        assert!(framer.finish().is_none());
    }
}
