//! Newline-delimited framing for game connections.

use derive_more::{Display, Error};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Longest line accepted from a connection, in bytes.
pub const MAX_LINE_LEN: usize = 4096;

/// A line that could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum FrameError {
    /// The bytes were not UTF-8.
    #[display("Line is not valid UTF-8")]
    NotUtf8,
    /// The line ran past the limit. The rest of it is discarded.
    #[display("Line longer than {} bytes", limit)]
    TooLong {
        /// The limit that was exceeded.
        limit: usize,
    },
}

/// Reads lines of at most `max_len` bytes.
///
/// Unlike [`tokio::io::Lines`], a bad line is reported and skipped instead of
/// ending the stream. [`next_line`](Self::next_line) is cancel safe, so it
/// can sit in a `select!` loop.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wraps `reader` with the [`MAX_LINE_LEN`] limit.
    pub fn new(reader: R) -> Self {
        Self::with_max_len(reader, MAX_LINE_LEN)
    }

    /// Wraps `reader` with a custom limit.
    pub fn with_max_len(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_len,
            discarding: false,
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// The outer error is an I/O failure of the underlying reader. The inner
    /// one is a line that was read but cannot be used; reading may continue.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Result<String, FrameError>>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                self.discarding = false;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let end = newline.unwrap_or(available.len());
            if !self.discarding {
                self.buf.extend_from_slice(&available[..end]);
            }
            self.reader.consume(newline.map_or(end, |i| i + 1));

            if !self.discarding && self.buf.len() > self.max_len {
                self.buf.clear();
                self.discarding = newline.is_none();
                return Ok(Some(Err(FrameError::TooLong {
                    limit: self.max_len,
                })));
            }
            if newline.is_some() {
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                return Ok(Some(self.take_line()));
            }
        }
    }

    fn take_line(&mut self) -> Result<String, FrameError> {
        let mut bytes = std::mem::take(&mut self.buf);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|_| FrameError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    fn reader(data: &'static [u8], max_len: usize) -> LineReader<BufReader<&'static [u8]>> {
        LineReader::with_max_len(BufReader::with_capacity(4, data), max_len)
    }

    #[tokio::test]
    async fn test_splits_lines_across_chunks() {
        let mut lines = reader(b"first line\r\nsecond\nno newline", 64);
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("first line".into())));
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("second".into())));
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("no newline".into())));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let mut lines = reader(b"\xff\xfe garbage\nok\n", 64);
        assert_eq!(lines.next_line().await.unwrap(), Some(Err(FrameError::NotUtf8)));
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("ok".into())));
    }

    #[tokio::test]
    async fn test_long_line_reported_once_and_dropped() {
        let mut lines = reader(b"0123456789abcdefghij\nshort\n", 8);
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(Err(FrameError::TooLong { limit: 8 }))
        );
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("short".into())));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_at_the_limit_passes() {
        let mut lines = reader(b"12345678\n", 8);
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("12345678".into())));
    }
}
