pub mod rates;

use async_trait::async_trait;
use std::collections::HashMap;

use super::RuntimeError;

#[async_trait]
pub trait Worker: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn start(&self) -> Result<(), RuntimeError>;
    async fn stop(&self) -> Result<(), RuntimeError>;
    fn is_running(&self) -> bool;
}

#[derive(Default)]
pub struct WorkerPool {
    workers: HashMap<String, Box<dyn Worker>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_worker<W: Worker + 'static>(&mut self, worker: W) {
        self.workers.insert(worker.name().to_string(), Box::new(worker));
    }

    pub async fn start_all(&self) -> Result<(), RuntimeError> {
        for worker in self.workers.values() {
            worker.start().await?;
        }
        Ok(())
    }

    /// Signals every running worker; failures are logged, not returned.
    pub async fn stop_all(&self) {
        for worker in self.workers.values().filter(|w| w.is_running()) {
            if let Err(e) = worker.stop().await {
                warn!("Failed to stop worker {}: {}", worker.name(), e);
            }
        }
    }

    pub fn running(&self) -> usize {
        self.workers.values().filter(|w| w.is_running()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::rates::RatesWorker;
    use super::*;
    use crate::{
        catalog::fixtures::storefront,
        service::rates::fixtures::refreshed,
        storage::MemoryStore,
    };
    use std::{sync::Arc, time::Duration};

    #[tokio::test]
    async fn test_rates_worker_stops_promptly() {
        let rates = refreshed(Arc::new(storefront()), Arc::new(MemoryStore::new(4)), &[("bitcoin", 2.0)]).await;
        let mut pool = WorkerPool::new();
        pool.add_worker(RatesWorker::new("rates", Arc::new(rates)));

        pool.start_all().await.unwrap();
        // starting twice is a no-op
        pool.start_all().await.unwrap();
        assert_eq!(pool.running(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.stop_all().await;

        let stopped = tokio::time::timeout(Duration::from_secs(2), async {
            while pool.running() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(stopped.is_ok(), "worker did not observe shutdown");
    }
}
