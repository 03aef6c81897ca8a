mod error;
mod worker;

pub use error::RuntimeError;
pub use worker::{rates::RatesWorker, WorkerPool};

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::service::ServiceRegistry;

/// Background workers owned by the process.
#[derive(Clone)]
pub struct RuntimeManager {
    pool: Arc<Mutex<WorkerPool>>,
}

impl RuntimeManager {
    pub fn new(services: &ServiceRegistry) -> Self {
        let mut pool = WorkerPool::new();
        pool.add_worker(RatesWorker::new("exchange_rates", Arc::clone(&services.rates)));

        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    pub async fn start(&self) -> Result<(), RuntimeError> {
        info!("Starting background workers...");
        self.pool.lock().await.start_all().await
    }

    pub async fn stop(&self) {
        let pool = self.pool.lock().await;
        info!("Stopping {} background workers...", pool.running());
        pool.stop_all().await;
    }
}
