//! # kvwire-pool
//!
//! Connection routing for kvwire.
//!
//! This crate provides:
//! - The `Pooler` capability a single-protocol connection pool exposes
//! - Call contexts carrying the negotiated protocol version and a deadline
//! - `ProtocolRouter`, which keeps one pool per protocol version, creates
//!   pools lazily and exactly once, and routes connections back to the pool
//!   that owns them

pub mod context;
pub mod error;
pub mod pool;
pub mod router;

pub use context::Context;
pub use error::PoolError;
pub use kvwire_protocol::Protocol;
pub use pool::{PoolConn, PoolId, PoolStats, Pooler};
pub use router::ProtocolRouter;
