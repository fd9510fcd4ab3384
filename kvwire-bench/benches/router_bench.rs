//! Protocol router benchmarks.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kvwire_pool::{Context, PoolConn, PoolError, PoolId, PoolStats, Pooler, ProtocolRouter};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Runtime;

struct BenchConn {
    pool_id: PoolId,
}

impl PoolConn for BenchConn {
    fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    fn close(self) -> Result<(), PoolError> {
        Ok(())
    }
}

/// Pool that never dials; idle connections are recycled in place.
struct BenchPool {
    id: PoolId,
    idle: Mutex<Vec<BenchConn>>,
}

impl BenchPool {
    fn new() -> Self {
        Self {
            id: PoolId::next(),
            idle: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Pooler for BenchPool {
    type Conn = BenchConn;

    fn id(&self) -> PoolId {
        self.id
    }

    async fn new_conn(&self, _ctx: &Context) -> Result<BenchConn, PoolError> {
        Ok(BenchConn { pool_id: self.id })
    }

    fn close_conn(&self, _conn: BenchConn) -> Result<(), PoolError> {
        Ok(())
    }

    async fn acquire(&self, _ctx: &Context) -> Result<BenchConn, PoolError> {
        let conn = self.idle.lock().pop();
        Ok(conn.unwrap_or(BenchConn { pool_id: self.id }))
    }

    fn release(&self, _ctx: &Context, conn: BenchConn) {
        self.idle.lock().push(conn);
    }

    fn remove(
        &self,
        _ctx: &Context,
        _conn: BenchConn,
        _reason: &(dyn std::error::Error + Send + Sync),
    ) {
    }

    fn len(&self) -> usize {
        self.idle.lock().len()
    }

    fn idle_len(&self) -> usize {
        self.idle.lock().len()
    }

    fn stats(&self) -> PoolStats {
        PoolStats::default()
    }

    fn close(&self) -> Result<(), PoolError> {
        Ok(())
    }

    fn filter(
        &self,
        predicate: &(dyn Fn(&BenchConn) -> bool + Send + Sync),
    ) -> Result<(), PoolError> {
        self.idle.lock().retain(|conn| !predicate(conn));
        Ok(())
    }
}

fn bench_acquire_release(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let router = &ProtocolRouter::new(|_| BenchPool::new());
    let mut group = c.benchmark_group("router_acquire_release");

    for version in [2i64, 3] {
        let ctx = Context::new().with_protocol(version);
        rt.block_on(router.acquire(&ctx)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(version), &ctx, |b, ctx| {
            b.to_async(&rt).iter(|| async move {
                let conn = router.acquire(ctx).await.unwrap();
                router.release(ctx, black_box(conn));
            });
        });
    }

    group.finish();
}

fn bench_contended_acquire(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let router = Arc::new(ProtocolRouter::new(|_| BenchPool::new()));
    let mut group = c.benchmark_group("router_contended_acquire");

    for tasks in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            b.to_async(&rt).iter(|| {
                let router = router.clone();
                async move {
                    let mut handles = Vec::with_capacity(tasks);
                    for i in 0..tasks {
                        let router = router.clone();
                        handles.push(tokio::spawn(async move {
                            let ctx = Context::new().with_protocol(2 + (i % 2) as i64);
                            let conn = router.acquire(&ctx).await.unwrap();
                            router.release(&ctx, conn);
                        }));
                    }
                    for handle in handles {
                        handle.await.unwrap();
                    }
                }
            });
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let router = ProtocolRouter::new(|_| BenchPool::new());
    rt.block_on(router.acquire(&Context::new())).unwrap();
    rt.block_on(router.acquire(&Context::new().with_protocol(3)))
        .unwrap();

    c.bench_function("router_stats", |b| {
        b.iter(|| black_box(router.stats()));
    });
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_contended_acquire,
    bench_stats,
);

criterion_main!(benches);
