//! Protocol-partitioned connection routing.
//!
//! ```text
//!            acquire(ctx) ──► ctx.protocol() ──► RESP2 ─► Pool #1
//!                                           └──► RESP3 ─► Pool #2
//!  release(conn) ──► conn.pool_id() ──► pool with that id
//! ```
//!
//! The pool group is an immutable map behind an `Arc`. Lookups clone the
//! `Arc` under a shared lock and work on that snapshot; installing a pool
//! copies the map under the exclusive lock and swaps the `Arc`. No pool work
//! ever runs while the shared lock is held.

use crate::context::Context;
use crate::error::PoolError;
use crate::pool::{PoolConn, PoolStats, Pooler};
use kvwire_protocol::Protocol;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type PoolGroup<P> = HashMap<Protocol, Arc<P>>;

type PoolFactory<P> = dyn Fn(Protocol) -> P + Send + Sync;

/// Routes connections to one pool per protocol version.
pub struct ProtocolRouter<P: Pooler> {
    group: RwLock<Arc<PoolGroup<P>>>,
    factory: Box<PoolFactory<P>>,
    closed: AtomicBool,
}

impl<P: Pooler> ProtocolRouter<P> {
    /// Creates a router that builds pools on demand with `factory`.
    ///
    /// The factory may be called more than once for the same protocol when
    /// callers race; all but one of those pools are closed unused.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Protocol) -> P + Send + Sync + 'static,
    {
        Self {
            group: RwLock::new(Arc::new(HashMap::new())),
            factory: Box::new(factory),
            closed: AtomicBool::new(false),
        }
    }

    /// Dials a fresh connection through the pool for the context's protocol.
    pub async fn new_conn(&self, ctx: &Context) -> Result<P::Conn, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        let pool = self.load_pool(ctx.protocol())?;
        with_deadline(ctx, pool.new_conn(ctx)).await
    }

    /// Closes a connection through its owning pool, or directly if that pool
    /// is unknown.
    pub fn close_conn(&self, conn: P::Conn) -> Result<(), PoolError> {
        match self.find_pool(&conn) {
            Some(pool) => pool.close_conn(conn),
            None => conn.close(),
        }
    }

    /// Acquires a connection for the context's protocol.
    pub async fn acquire(&self, ctx: &Context) -> Result<P::Conn, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        let pool = self.load_pool(ctx.protocol())?;
        with_deadline(ctx, pool.acquire(ctx)).await
    }

    /// Hands a connection back to the pool that created it.
    pub fn release(&self, ctx: &Context, conn: P::Conn) {
        match self.find_pool(&conn) {
            Some(pool) => pool.release(ctx, conn),
            None => tracing::error!(
                pool_id = %conn.pool_id(),
                "owning pool not found on release, dropping connection"
            ),
        }
    }

    /// Removes a failed connection from the pool that created it.
    pub fn remove(
        &self,
        ctx: &Context,
        conn: P::Conn,
        reason: &(dyn std::error::Error + Send + Sync),
    ) {
        match self.find_pool(&conn) {
            Some(pool) => pool.remove(ctx, conn, reason),
            None => tracing::error!(
                pool_id = %conn.pool_id(),
                %reason,
                "owning pool not found on remove, dropping connection"
            ),
        }
    }

    /// Total connections across all pools.
    pub fn len(&self) -> usize {
        self.snapshot().values().map(|pool| pool.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Idle connections across all pools.
    pub fn idle_len(&self) -> usize {
        self.snapshot().values().map(|pool| pool.idle_len()).sum()
    }

    /// Counters summed over all pools.
    pub fn stats(&self) -> PoolStats {
        self.snapshot().values().map(|pool| pool.stats()).sum()
    }

    /// Applies `predicate` in every pool, closing the connections it matches.
    pub fn filter(
        &self,
        predicate: &(dyn Fn(&P::Conn) -> bool + Send + Sync),
    ) -> Result<(), PoolError> {
        let group = self.snapshot();
        PoolError::join(
            group
                .values()
                .filter_map(|pool| pool.filter(predicate).err()),
        )
    }

    /// Closes every pooled connection while leaving the router open.
    pub fn close_all_conns(&self) -> Result<(), PoolError> {
        self.filter(&|_: &P::Conn| true)
    }

    /// Protocol versions that currently have a pool, in ascending order.
    pub fn protocols(&self) -> Vec<Protocol> {
        let mut protocols: Vec<Protocol> = self.snapshot().keys().copied().collect();
        protocols.sort();
        protocols
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Shuts the router down and closes every pool.
    ///
    /// Only the first call does any work; later calls fail with
    /// `AlreadyClosed`.
    pub fn close(&self) -> Result<(), PoolError> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PoolError::AlreadyClosed);
        }

        let group = self.group.write();
        tracing::debug!(pools = group.len(), "closing protocol router");
        PoolError::join(group.values().filter_map(|pool| pool.close().err()))
    }

    fn snapshot(&self) -> Arc<PoolGroup<P>> {
        Arc::clone(&self.group.read())
    }

    fn find_pool(&self, conn: &P::Conn) -> Option<Arc<P>> {
        let pool_id = conn.pool_id();
        let group = self.snapshot();
        let pool = group.values().find(|pool| pool.id() == pool_id);
        pool.cloned()
    }

    /// Returns the pool for `protocol`, building it on first use.
    fn load_pool(&self, protocol: Protocol) -> Result<Arc<P>, PoolError> {
        if let Some(pool) = self.snapshot().get(&protocol) {
            return Ok(Arc::clone(pool));
        }

        // Built outside the lock; may turn out to be redundant.
        let candidate = Arc::new((self.factory)(protocol));

        let mut group = self.group.write();
        if let Some(existing) = group.get(&protocol) {
            let existing = Arc::clone(existing);
            drop(group);
            tracing::debug!(%protocol, "lost pool creation race");
            discard(&*candidate);
            return Ok(existing);
        }
        if self.is_closed() {
            drop(group);
            discard(&*candidate);
            return Err(PoolError::Closed);
        }

        let mut next = PoolGroup::clone(&group);
        next.insert(protocol, Arc::clone(&candidate));
        *group = Arc::new(next);
        drop(group);

        tracing::debug!(%protocol, pool_id = %candidate.id(), "created connection pool");
        Ok(candidate)
    }
}

/// Closes a pool that was never installed.
fn discard<P: Pooler>(pool: &P) {
    if let Err(e) = pool.close() {
        tracing::warn!(pool_id = %pool.id(), "failed to close unused pool: {}", e);
    }
}

async fn with_deadline<T>(
    ctx: &Context,
    fut: impl Future<Output = Result<T, PoolError>>,
) -> Result<T, PoolError> {
    match ctx.deadline() {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| PoolError::Timeout)?,
        None => fut.await,
    }
}
