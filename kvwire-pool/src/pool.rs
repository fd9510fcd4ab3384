//! Connection pool capability.
//!
//! `Pooler` is what the router needs from a single-protocol connection pool.
//! Dialing, health checks, idle reaping and capacity limits all live behind
//! it. Only acquiring and dialing may suspend; every other operation is
//! synchronous so the router can call it while holding its group lock.

use crate::context::Context;
use crate::error::PoolError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a pool instance.
///
/// Connections remember the id of the pool that created them so they can be
/// handed back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        PoolId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// Pool counters.
///
/// Counters wrap on overflow, so sums over long-lived pools never fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Times a free connection was found in the pool.
    pub hits: u32,
    /// Times a free connection was not found in the pool.
    pub misses: u32,
    /// Times a wait for a connection timed out.
    pub timeouts: u32,
    /// Connections currently open.
    pub total_conns: u32,
    /// Idle connections currently open.
    pub idle_conns: u32,
    /// Idle connections removed from the pool.
    pub stale_conns: u32,
}

impl Add for PoolStats {
    type Output = PoolStats;

    fn add(mut self, other: PoolStats) -> PoolStats {
        self += other;
        self
    }
}

impl AddAssign for PoolStats {
    fn add_assign(&mut self, other: PoolStats) {
        self.hits = self.hits.wrapping_add(other.hits);
        self.misses = self.misses.wrapping_add(other.misses);
        self.timeouts = self.timeouts.wrapping_add(other.timeouts);
        self.total_conns = self.total_conns.wrapping_add(other.total_conns);
        self.idle_conns = self.idle_conns.wrapping_add(other.idle_conns);
        self.stale_conns = self.stale_conns.wrapping_add(other.stale_conns);
    }
}

impl Sum for PoolStats {
    fn sum<I: Iterator<Item = PoolStats>>(iter: I) -> Self {
        iter.fold(PoolStats::default(), Add::add)
    }
}

/// A pooled connection.
pub trait PoolConn: Send + 'static {
    /// Id of the pool that created this connection.
    fn pool_id(&self) -> PoolId;

    /// Closes the connection without going through a pool.
    fn close(self) -> Result<(), PoolError>
    where
        Self: Sized;
}

/// A connection pool serving a single protocol version.
#[async_trait]
pub trait Pooler: Send + Sync + 'static {
    type Conn: PoolConn;

    fn id(&self) -> PoolId;

    /// Dials a connection that is accounted to the pool but not taken from it.
    async fn new_conn(&self, ctx: &Context) -> Result<Self::Conn, PoolError>;

    fn close_conn(&self, conn: Self::Conn) -> Result<(), PoolError>;

    /// Takes an idle connection, or dials one, waiting for capacity if needed.
    async fn acquire(&self, ctx: &Context) -> Result<Self::Conn, PoolError>;

    /// Returns a healthy connection for reuse.
    fn release(&self, ctx: &Context, conn: Self::Conn);

    /// Drops a failed connection from the pool.
    fn remove(&self, ctx: &Context, conn: Self::Conn, reason: &(dyn std::error::Error + Send + Sync));

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn idle_len(&self) -> usize;

    fn stats(&self) -> PoolStats;

    fn close(&self) -> Result<(), PoolError>;

    /// Closes every pooled connection matching `predicate`.
    fn filter(&self, predicate: &(dyn Fn(&Self::Conn) -> bool + Send + Sync)) -> Result<(), PoolError>;
}
