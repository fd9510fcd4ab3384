//! Protocol generations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol generation negotiated for a connection.
///
/// RESP2 peers only ever emit `+ - : $ *` replies. RESP3 adds maps, sets,
/// attributes, push messages, verbatim strings, doubles, booleans, big
/// numbers, nulls and blob errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Protocol {
    Resp2 = 2,
    Resp3 = 3,
}

impl Protocol {
    /// Oldest supported generation, also the fallback.
    pub const MIN: Protocol = Protocol::Resp2;
    /// Newest supported generation.
    pub const MAX: Protocol = Protocol::Resp3;

    /// Maps a raw version number into the supported range.
    ///
    /// Values below 2 become RESP2 and values above 3 become RESP3.
    pub fn clamped(raw: i64) -> Self {
        if raw >= Protocol::MAX.as_i64() {
            Protocol::Resp3
        } else {
            Protocol::Resp2
        }
    }

    /// Resolves an optional raw version, defaulting to RESP2.
    pub fn resolve(raw: Option<i64>) -> Self {
        raw.map(Self::clamped).unwrap_or_default()
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::MIN
    }
}

impl From<Protocol> for i64 {
    fn from(protocol: Protocol) -> Self {
        protocol.as_i64()
    }
}

impl TryFrom<i64> for Protocol {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            2 => Ok(Protocol::Resp2),
            3 => Ok(Protocol::Resp3),
            other => Err(format!("unsupported protocol version: {}", other)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RESP{}", self.as_i64())
    }
}
