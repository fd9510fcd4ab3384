//! Line and fixed-length frame reader.
//!
//! Frame layout:
//!
//! ```text
//! +-----+------------------+------+
//! | tag | header text      | CRLF |   read_line()
//! +-----+------------------+------+
//! | payload (n bytes)      | CRLF |   read_exact(n)
//! +------------------------+------+
//! ```
//!
//! The reader has no notion of reply tags; it only guarantees that lines are
//! CRLF-terminated, bounded in length, and that payload reads are never
//! truncated.

use crate::error::DecodeError;
use crate::{CRLF, DEFAULT_MAX_LINE_LEN};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Reads frames from a buffered async source.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_line_len: usize,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self::with_max_line_len(inner, DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_line_len(inner: R, max_line_len: usize) -> Self {
        Self {
            inner,
            max_line_len,
        }
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    /// Reads up to and including the next `\n`.
    ///
    /// Lines longer than the source's internal buffer are gathered segment
    /// by segment. The returned bytes end in CRLF. A line growing past
    /// `max_line_len` fails as malformed; the bytes read so far are consumed.
    pub async fn read_line(&mut self) -> Result<Bytes, DecodeError> {
        let mut line = BytesMut::new();
        loop {
            let (found, used) = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed mid-reply",
                    )
                    .into());
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        line.extend_from_slice(&available[..=pos]);
                        (true, pos + 1)
                    }
                    None => {
                        // Buffer exhausted before the terminator; keep going.
                        line.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.inner.consume(used);
            if line.len() > self.max_line_len {
                return Err(DecodeError::malformed(&line));
            }
            if found {
                break;
            }
        }

        if line.len() <= 2 || !line.ends_with(CRLF) {
            return Err(DecodeError::malformed(&line));
        }
        Ok(line.freeze())
    }

    /// Reads exactly `n` payload bytes plus the trailing CRLF.
    pub async fn read_exact(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        let mut buf = BytesMut::zeroed(n + CRLF.len());
        self.inner.read_exact(&mut buf).await?;
        Ok(buf.freeze())
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
