//! Recursive reply decoder.
//!
//! The decoder never builds a value tree. It walks one reply, checks that its
//! framing is complete and well formed, and appends the exact wire bytes to a
//! caller-supplied sink. A successful call leaves the sink holding a
//! self-contained copy of the reply that a typed decoder, a logger or a proxy
//! can consume without touching the socket again.
//!
//! On error the sink may hold a prefix of the reply. The stream itself is
//! left positioned right after the last frame that was read.

use crate::config::DecoderConfig;
use crate::error::{DecodeError, ServerError};
use crate::reader::FrameReader;
use crate::tag::{Shape, Tag};
use crate::CRLF;
use bytes::{BufMut, Bytes, BytesMut};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader};

type DecodeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DecodeError>> + Send + 'a>>;

/// Decodes replies from a buffered async source.
#[derive(Debug)]
pub struct ReplyDecoder<R> {
    reader: FrameReader<R>,
    config: DecoderConfig,
}

impl<R> ReplyDecoder<BufReader<R>>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps an unbuffered source using `config.read_buffer_size`.
    pub fn from_reader(inner: R, config: DecoderConfig) -> Self {
        let config = config.clamped();
        let buffered = BufReader::with_capacity(config.read_buffer_size, inner);
        Self::with_config(buffered, config)
    }
}

impl<R> ReplyDecoder<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    pub fn with_config(inner: R, config: DecoderConfig) -> Self {
        let config = config.clamped();
        Self {
            reader: FrameReader::with_max_line_len(inner, config.max_line_len),
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes one reply, appending its wire bytes to `sink`.
    ///
    /// An attribute reply writes two units: the attribute map and the reply
    /// it annotates.
    pub async fn decode_reply<B>(&mut self, sink: &mut B) -> Result<(), DecodeError>
    where
        B: BufMut + Send,
    {
        self.decode_nested(sink, 0).await
    }

    /// Decodes one reply into a fresh buffer.
    pub async fn decode_reply_bytes(&mut self) -> Result<Bytes, DecodeError> {
        let mut sink = BytesMut::new();
        self.decode_reply(&mut sink).await?;
        Ok(sink.freeze())
    }

    pub fn reader_mut(&mut self) -> &mut FrameReader<R> {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn decode_nested<'a, B>(&'a mut self, sink: &'a mut B, depth: usize) -> DecodeFuture<'a>
    where
        B: BufMut + Send,
    {
        Box::pin(async move {
            if depth > self.config.max_depth {
                return Err(DecodeError::NestingTooDeep {
                    max: self.config.max_depth,
                });
            }

            let line = self.reader.read_line().await?;
            let tag = match Tag::from_byte(line[0]) {
                Some(tag) => tag,
                None => return unknown_reply(&line, sink),
            };

            match tag.shape() {
                Shape::Scalar => {
                    if tag == Tag::Error {
                        return Err(ServerError::from_bytes(body(&line)).into());
                    }
                    sink.put_slice(&line);
                    Ok(())
                }
                Shape::Blob => {
                    let len = declared_len(&line)?;
                    if let Some(len) = len {
                        if len > self.config.max_bulk_len {
                            return Err(DecodeError::FrameTooLarge {
                                size: len,
                                max: self.config.max_bulk_len,
                            });
                        }
                    }
                    let payload = match len {
                        Some(len) => Some(self.read_payload(&line, len).await?),
                        None => None,
                    };

                    match (tag, payload) {
                        (Tag::BulkError, payload) => {
                            let text = payload.as_deref().map(strip_crlf).unwrap_or_default();
                            Err(ServerError::from_bytes(text).into())
                        }
                        (Tag::Verbatim, Some(payload)) if !is_verbatim(&payload) => {
                            Err(DecodeError::malformed(&line))
                        }
                        (_, payload) => {
                            sink.put_slice(&line);
                            if let Some(payload) = payload {
                                sink.put_slice(&payload);
                            }
                            Ok(())
                        }
                    }
                }
                Shape::Aggregate | Shape::Pairs | Shape::Attribute => {
                    let count = declared_len(&line)?.unwrap_or(0);
                    let elements = if tag.shape() == Shape::Aggregate {
                        count
                    } else {
                        count
                            .checked_mul(2)
                            .ok_or_else(|| DecodeError::malformed(&line))?
                    };

                    sink.put_slice(&line);
                    for _ in 0..elements {
                        self.decode_nested(sink, depth + 1).await?;
                    }

                    if tag == Tag::Attribute {
                        // The annotated reply follows its attribute map.
                        self.decode_nested(sink, depth + 1).await?;
                    }
                    Ok(())
                }
            }
        })
    }

    async fn read_payload(&mut self, line: &[u8], len: usize) -> Result<Bytes, DecodeError> {
        let payload = self.reader.read_exact(len).await?;
        if !payload.ends_with(CRLF) {
            return Err(DecodeError::malformed(line));
        }
        Ok(payload)
    }
}

/// Handles a line whose tag byte is not recognized.
fn unknown_reply<B: BufMut>(line: &[u8], sink: &mut B) -> Result<(), DecodeError> {
    if is_null_sentinel(line) {
        tracing::trace!(tag = line[0], "treating legacy null sentinel as nil");
        sink.put_slice(line);
        return Ok(());
    }
    Err(DecodeError::unknown_tag(line))
}

/// Whether a line is a legacy null such as `$-1` or `*-1` under any tag.
pub fn is_null_sentinel(line: &[u8]) -> bool {
    line.len() == 5 && &line[1..] == b"-1\r\n"
}

/// Header text between the tag byte and the CRLF.
fn body(line: &[u8]) -> &[u8] {
    &line[1..line.len() - CRLF.len()]
}

fn strip_crlf(payload: &[u8]) -> &[u8] {
    payload.strip_suffix(CRLF).unwrap_or(payload)
}

/// Verbatim payloads start with a 3-byte format code and a colon.
fn is_verbatim(payload: &[u8]) -> bool {
    let data = strip_crlf(payload);
    data.len() >= 4 && data[3] == b':'
}

/// Parses the length or count in a header line.
///
/// Returns `None` for the `-1` null marker.
fn declared_len(line: &[u8]) -> Result<Option<usize>, DecodeError> {
    let n: i64 = std::str::from_utf8(body(line))
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| DecodeError::malformed(line))?;

    match n {
        -1 => Ok(None),
        n if n < -1 => Err(DecodeError::malformed(line)),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| DecodeError::malformed(line)),
    }
}
