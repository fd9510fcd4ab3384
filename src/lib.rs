//! kvwire - reply decoding and connection routing for key-value store clients
//!
//! Re-exports the two halves of the client plumbing:
//! - [`protocol`]: RESP2/RESP3 frame reading and byte-exact reply decoding
//! - [`pool`]: per-protocol connection pools behind a single router

pub use kvwire_pool as pool;
pub use kvwire_protocol as protocol;

pub use kvwire_pool::{Context, PoolConn, PoolError, PoolId, PoolStats, Pooler, ProtocolRouter};
pub use kvwire_protocol::{DecodeError, DecoderConfig, Protocol, ReplyDecoder, ServerError};
