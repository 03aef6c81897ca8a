use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{runtime::RuntimeError, service::rates::ExchangeRateService};

use super::Worker;

/// Keeps the exchange-rate table fresh in the background.
#[derive(Clone)]
pub struct RatesWorker {
    name: String,
    rates: Arc<ExchangeRateService>,
    shutdown: broadcast::Sender<()>,
    running: Arc<AtomicBool>,
}

impl RatesWorker {
    pub fn new(name: &str, rates: Arc<ExchangeRateService>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            name: name.to_string(),
            rates,
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Worker for RatesWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let rates = Arc::clone(&self.rates);
        let running = Arc::clone(&self.running);
        let rx = self.shutdown.subscribe();
        let name = self.name.clone();

        tokio::spawn(async move {
            info!("Worker {} started", name);
            rates.run_periodic(rx).await;
            running.store(false, Ordering::SeqCst);
            info!("Worker {} stopped", name);
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        self.shutdown
            .send(())
            .map(|_| ())
            .map_err(|_| RuntimeError::Other(format!("worker {} is not running", self.name)))
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
