//! Decoder configuration.

use crate::{DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINE_LEN};
use serde::{Deserialize, Serialize};

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Hard ceiling for the nesting limit.
pub const MAX_DEPTH_LIMIT: usize = 4096;

/// Shortest header line limit accepted (16 bytes).
pub const MIN_LINE_LEN: usize = 16;

/// Limits applied while decoding replies.
///
/// Deserialized values pass through the same clamps as the `with_*`
/// builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDecoderConfig")]
pub struct DecoderConfig {
    /// Deepest aggregate nesting accepted before failing.
    pub max_depth: usize,
    /// Largest bulk payload accepted, in bytes.
    pub max_bulk_len: usize,
    /// Longest header line accepted, CRLF included.
    pub max_line_len: usize,
    /// Buffer size used when wrapping an unbuffered reader.
    pub read_buffer_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawDecoderConfig {
    max_depth: usize,
    max_bulk_len: usize,
    max_line_len: usize,
    read_buffer_size: usize,
}

impl Default for RawDecoderConfig {
    fn default() -> Self {
        let config = DecoderConfig::default();
        Self {
            max_depth: config.max_depth,
            max_bulk_len: config.max_bulk_len,
            max_line_len: config.max_line_len,
            read_buffer_size: config.read_buffer_size,
        }
    }
}

impl From<RawDecoderConfig> for DecoderConfig {
    fn from(raw: RawDecoderConfig) -> Self {
        DecoderConfig::new()
            .with_max_depth(raw.max_depth)
            .with_max_bulk_len(raw.max_bulk_len)
            .with_max_line_len(raw.max_line_len)
            .with_read_buffer_size(raw.read_buffer_size)
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, MAX_DEPTH_LIMIT);
        self
    }

    pub fn with_max_bulk_len(mut self, len: usize) -> Self {
        self.max_bulk_len = len;
        self
    }

    pub fn with_max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len.max(MIN_LINE_LEN);
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }

    /// Brings fields set directly back into their accepted ranges.
    pub fn clamped(self) -> Self {
        let (depth, bulk, line, buffer) = (
            self.max_depth,
            self.max_bulk_len,
            self.max_line_len,
            self.read_buffer_size,
        );
        self.with_max_depth(depth)
            .with_max_bulk_len(bulk)
            .with_max_line_len(line)
            .with_read_buffer_size(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DecoderConfig::new();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_bulk_len, 512 * 1024 * 1024);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_config_clamping() {
        let config = DecoderConfig::new()
            .with_max_depth(0)
            .with_read_buffer_size(100);
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);

        let config = DecoderConfig::new()
            .with_max_depth(1_000_000)
            .with_read_buffer_size(10 * 1024 * 1024);
        assert_eq!(config.max_depth, MAX_DEPTH_LIMIT);
        assert_eq!(config.read_buffer_size, MAX_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: DecoderConfig = serde_json::from_str(r#"{"max_depth": 16}"#).unwrap();
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_bulk_len, DEFAULT_MAX_BULK_LEN);
        assert_eq!(config.max_line_len, DEFAULT_MAX_LINE_LEN);
    }

    #[test]
    fn test_deserialize_clamps_out_of_range() {
        let config: DecoderConfig = serde_json::from_str(
            r#"{"read_buffer_size": 0, "max_depth": 0, "max_line_len": 0}"#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);
        assert_eq!(config.max_line_len, MIN_LINE_LEN);

        let config: DecoderConfig =
            serde_json::from_str(r#"{"read_buffer_size": 1073741824, "max_depth": 99999999}"#)
                .unwrap();
        assert_eq!(config.max_depth, MAX_DEPTH_LIMIT);
        assert_eq!(config.read_buffer_size, MAX_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_clamped_fixes_direct_fields() {
        let config = DecoderConfig {
            max_depth: 0,
            max_bulk_len: 7,
            max_line_len: 1,
            read_buffer_size: 0,
        }
        .clamped();
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.max_bulk_len, 7);
        assert_eq!(config.max_line_len, MIN_LINE_LEN);
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = DecoderConfig::new().with_max_depth(32).with_max_line_len(1024);
        let json = serde_json::to_string(&config).unwrap();
        let back: DecoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
