//! Incremental NDJSON frame decoding
//!
//! Response chunks arrive with arbitrary boundaries; frames are only decoded
//! once their terminating newline has been seen. A line that grows past the
//! frame limit without a newline is rejected instead of buffered.

use super::ClientError;
use crate::models::StreamFrame;

/// Largest accepted frame, in bytes
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Buffers chunks and yields complete frames
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame_len,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete frame, skipping blank lines
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] for a complete line that is not a
    /// frame, and [`ClientError::FrameTooLong`] once the unterminated tail
    /// exceeds the frame limit. Complete frames ahead of an oversized tail
    /// are still returned first.
    pub fn next_frame(&mut self) -> Option<Result<StreamFrame, ClientError>> {
        loop {
            let Some(end) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.buf.len() > self.max_frame_len {
                    self.buf.clear();
                    return Some(Err(ClientError::FrameTooLong {
                        limit: self.max_frame_len,
                    }));
                }
                return None;
            };
            if end > self.max_frame_len {
                self.buf.drain(..=end);
                return Some(Err(ClientError::FrameTooLong {
                    limit: self.max_frame_len,
                }));
            }

            let line: Vec<u8> = self.buf.drain(..=end).collect();
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_slice(line).map_err(ClientError::from));
        }
    }

    /// Bytes received after the last newline
    pub fn remainder(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EndFrame, Outcome};

    const END: &str = r#"{"end":{"outcome":"completed","pages":1}}"#;

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let (head, tail) = END.split_at(10);

        decoder.push(head.as_bytes());
        assert!(decoder.next_frame().is_none());

        decoder.push(tail.as_bytes());
        assert!(decoder.next_frame().is_none());

        decoder.push(b"\n");
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(
            frame,
            StreamFrame::End(EndFrame {
                outcome: Outcome::Completed,
                pages: 1,
            })
        );
        assert!(decoder.remainder().is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let page = r#"{"page":{"url":"https://example.com/","status":200,"text":"hi","timestamp":"2024-01-15T14:30:00Z"}}"#;
        decoder.push(format!("{page}\n\n{END}\n{{\"end\"").as_bytes());

        assert!(matches!(decoder.next_frame(), Some(Ok(StreamFrame::Page(_)))));
        assert!(matches!(decoder.next_frame(), Some(Ok(StreamFrame::End(_)))));
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.remainder(), b"{\"end\"");
    }

    #[test]
    fn test_malformed_line() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"{\"bogus\":1}\n");
        assert!(matches!(decoder.next_frame(), Some(Err(_))));
    }

    #[test]
    fn test_unterminated_line_over_limit() {
        let mut decoder = FrameDecoder::with_max_frame_len(64);
        decoder.push(END.as_bytes());
        decoder.push(b"\n");
        decoder.push(&[b'x'; 40]);
        assert!(matches!(decoder.next_frame(), Some(Ok(StreamFrame::End(_)))));
        assert!(decoder.next_frame().is_none());

        decoder.push(&[b'x'; 40]);
        assert!(matches!(
            decoder.next_frame(),
            Some(Err(ClientError::FrameTooLong { limit: 64 }))
        ));
        assert!(decoder.remainder().is_empty());
    }

    #[test]
    fn test_terminated_line_over_limit() {
        let mut decoder = FrameDecoder::with_max_frame_len(8);
        decoder.push(format!("{END}\n").as_bytes());
        assert!(matches!(
            decoder.next_frame(),
            Some(Err(ClientError::FrameTooLong { limit: 8 }))
        ));
        assert!(decoder.next_frame().is_none());
    }
}
