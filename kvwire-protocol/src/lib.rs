//! # kvwire-protocol
//!
//! Reply-side wire protocol for RESP2/RESP3 key-value stores.
//!
//! This crate provides:
//! - A frame reader yielding CRLF-terminated lines and fixed-length payloads
//! - Reply tag classification for both protocol generations
//! - A recursive reply decoder that validates framing and mirrors the exact
//!   wire bytes into a caller-supplied sink
//! - Protocol version negotiation values and error types

pub mod config;
pub mod decoder;
pub mod error;
pub mod reader;
pub mod tag;
pub mod version;

pub use config::DecoderConfig;
pub use decoder::ReplyDecoder;
pub use error::{DecodeError, ServerError};
pub use reader::FrameReader;
pub use tag::{Shape, Tag};
pub use version::Protocol;

/// Line terminator for every frame.
pub const CRLF: &[u8; 2] = b"\r\n";

/// Default maximum bulk payload size (512 MiB).
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum header line length (64 KiB).
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Default maximum reply nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;
