//! 有界并发工作池
//!
//! 每个任务独立 spawn，用 Semaphore 限制同时运行的数量，
//! 结果按完成顺序收集，并带回调用方给的键用于重新关联

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::config::PoolWidth;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    width: PoolWidth,
    limit: Option<Arc<Semaphore>>,
}

impl WorkerPool {
    pub fn new(width: PoolWidth) -> Self {
        let limit = match width {
            PoolWidth::Bounded(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
            PoolWidth::Unbounded => None,
        };
        Self { width, limit }
    }

    pub fn width(&self) -> PoolWidth {
        self.width
    }

    /// 并发运行所有任务，按完成顺序返回 `(键, 结果)`
    ///
    /// 任务 panic 时对应结果为 `Err(JoinError)`，不影响其他任务
    pub async fn run_all<K, T, F>(&self, tasks: Vec<(K, F)>) -> Vec<(K, Result<T, JoinError>)>
    where
        K: Send,
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let mut pending = FuturesUnordered::new();

        for (key, task) in tasks {
            let limit = self.limit.clone();
            let handle = tokio::spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                task.await
            });
            pending.push(async move { (key, handle.await) });
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(item) = pending.next().await {
            results.push(item);
        }
        results
    }
}
