//! Decoder error types.

use std::fmt;
use thiserror::Error;

/// Longest slice of an offending line kept in error messages.
const PREVIEW_LEN: usize = 100;

/// Errors raised while reading or decoding a reply.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid reply: {0}")]
    Malformed(String),

    #[error("can't parse reply: {0}")]
    UnknownTag(String),

    #[error("server error: {0}")]
    Server(ServerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bulk reply too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("reply nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },
}

impl DecodeError {
    pub(crate) fn malformed(line: &[u8]) -> Self {
        DecodeError::Malformed(preview(line))
    }

    pub(crate) fn unknown_tag(line: &[u8]) -> Self {
        DecodeError::UnknownTag(preview(line))
    }

    /// Returns whether the store itself answered with an error reply.
    pub fn is_server_error(&self) -> bool {
        matches!(self, DecodeError::Server(_))
    }

    /// Returns the server error, if this is one.
    pub fn as_server_error(&self) -> Option<&ServerError> {
        match self {
            DecodeError::Server(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServerError> for DecodeError {
    fn from(err: ServerError) -> Self {
        DecodeError::Server(err)
    }
}

/// Error text sent by the store in a `-` or `!` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    message: String,
}

impl ServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn from_bytes(text: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(text))
    }

    /// Full error text as sent by the store.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Leading error code, e.g. `ERR`, `WRONGTYPE` or `MOVED`.
    pub fn kind(&self) -> &str {
        self.message
            .split_once(' ')
            .map(|(kind, _)| kind)
            .unwrap_or(&self.message)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServerError {}

/// Escaped, truncated rendering of raw line bytes.
fn preview(line: &[u8]) -> String {
    let shown = &line[..line.len().min(PREVIEW_LEN)];
    let mut out = shown.escape_ascii().to_string();
    if line.len() > PREVIEW_LEN {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_escapes_line() {
        let err = DecodeError::malformed(b"$abc\r\n");
        assert_eq!(err.to_string(), "invalid reply: $abc\\r\\n");
    }

    #[test]
    fn test_preview_truncates() {
        let line = vec![b'+'; 300];
        let err = DecodeError::unknown_tag(&line);
        let msg = err.to_string();
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 150);
    }

    #[test]
    fn test_server_error_kind() {
        let err = ServerError::new("WRONGTYPE Operation against a key holding the wrong kind");
        assert_eq!(err.kind(), "WRONGTYPE");

        let err = ServerError::new("LOADING");
        assert_eq!(err.kind(), "LOADING");
        assert_eq!(err.message(), "LOADING");
    }

    #[test]
    fn test_server_error_conversion() {
        let err: DecodeError = ServerError::new("ERR unknown command").into();
        assert!(err.is_server_error());
        assert_eq!(err.as_server_error().unwrap().kind(), "ERR");
        assert_eq!(err.to_string(), "server error: ERR unknown command");
    }

    #[test]
    fn test_error_display() {
        let err = DecodeError::FrameTooLarge { size: 100, max: 50 };
        assert!(err.to_string().contains("100"));

        let err = DecodeError::NestingTooDeep { max: 32 };
        assert!(err.to_string().contains("32"));

        let err = DecodeError::Io(std::io::ErrorKind::UnexpectedEof.into());
        assert!(!err.is_server_error());
        assert!(err.as_server_error().is_none());
    }
}
