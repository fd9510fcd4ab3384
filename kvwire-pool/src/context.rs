//! Per-call context.

use kvwire_protocol::Protocol;
use std::time::Duration;
use tokio::time::Instant;

/// Values carried alongside a single call.
///
/// The protocol version is stored raw, as the caller supplied it, and only
/// resolved when a pool is picked. Absent values select RESP2; anything
/// outside `[2, 3]` is clamped into that range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    protocol: Option<i64>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context pinned to a protocol version.
    pub fn with_protocol(mut self, version: i64) -> Self {
        self.protocol = Some(version);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Protocol version the call should run under.
    pub fn protocol(&self) -> Protocol {
        Protocol::resolve(self.protocol)
    }

    /// Raw version value, as set by the caller.
    pub fn raw_protocol(&self) -> Option<i64> {
        self.protocol
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline, if any, has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
