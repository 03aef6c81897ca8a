mod error;
mod source;

pub use error::RateError;
pub use source::{CoinGeckoSource, RateSource};

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{broadcast, RwLock};

use crate::{
    catalog::Catalog,
    storage::{get_json, set_json, DocumentStore},
};

const SNAPSHOT_KEY: &str = "rates:snapshot";
const UPDATED_AT_KEY: &str = "rates:updated_at";
const CHECK_TICK: Duration = Duration::from_millis(500);
const CHECK_EVERY: Duration = Duration::from_secs(300);

/// Payment method name -> RUB per unit of the payment currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    pub rates: HashMap<String, f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RateTable {
    pub fn rate_for(&self, method: &str) -> f64 {
        match self.rates.get(method) {
            Some(rate) if rate.is_finite() && *rate > 0.0 => *rate,
            _ => 1.0,
        }
    }
}

pub struct ExchangeRateService {
    catalog: Arc<Catalog>,
    source: Arc<dyn RateSource>,
    store: Arc<dyn DocumentStore>,
    refresh_interval: chrono::Duration,
    lookup_timeout: Duration,
    table: RwLock<Arc<RateTable>>,
}

impl ExchangeRateService {
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn RateSource>,
        store: Arc<dyn DocumentStore>,
        refresh_interval: Duration,
        lookup_timeout: Duration,
    ) -> Self {
        info!("Initializing ExchangeRateService...");
        Self {
            catalog,
            source,
            store,
            refresh_interval: chrono::Duration::from_std(refresh_interval).unwrap_or(chrono::Duration::hours(1)),
            lookup_timeout,
            table: RwLock::new(Arc::new(RateTable::default())),
        }
    }

    pub async fn rates_snapshot(&self) -> Arc<RateTable> {
        Arc::clone(&*self.table.read().await)
    }

    pub async fn rate_for(&self, method: &str) -> f64 {
        self.rates_snapshot().await.rate_for(method)
    }

    fn convertible_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .catalog
            .payment_methods()
            .iter()
            .filter_map(|method| method.rate_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Never fails: a broken lookup leaves every method at rate 1.
    pub async fn refresh_now(&self) {
        let ids = self.convertible_ids();
        let lookup = tokio::time::timeout(self.lookup_timeout, self.source.fetch(&ids)).await;

        match lookup.unwrap_or(Err(RateError::Timeout)) {
            Ok(prices) => {
                let current = self.rates_snapshot().await;
                let mut rates = current.rates.clone();

                for method in self.catalog.payment_methods() {
                    if let Some(price) = method.rate_id.as_ref().and_then(|id| prices.get(id)) {
                        rates.insert(method.name.clone(), *price);
                    }
                    rates.entry(method.name.clone()).or_insert(1.0);
                }

                let table = RateTable {
                    rates,
                    updated_at: Some(Utc::now()),
                };
                self.persist(&table).await;
                *self.table.write().await = Arc::new(table);
                info!("Exchange rates refreshed for {} currencies", prices.len());
            }
            Err(e) => {
                warn!("Exchange rate lookup failed, falling back to rate 1: {}", e);
                let current = self.rates_snapshot().await;
                let rates = self
                    .catalog
                    .payment_methods()
                    .iter()
                    .map(|method| (method.name.clone(), 1.0))
                    .collect();
                *self.table.write().await = Arc::new(RateTable {
                    rates,
                    updated_at: current.updated_at,
                });
            }
        }
    }

    async fn persist(&self, table: &RateTable) {
        if let Err(e) = set_json(self.store.as_ref(), SNAPSHOT_KEY, &table.rates).await {
            warn!("Failed to persist rate snapshot: {}", e);
            return;
        }
        if let Some(updated_at) = table.updated_at {
            if let Err(e) = set_json(self.store.as_ref(), UPDATED_AT_KEY, &updated_at).await {
                warn!("Failed to persist rate snapshot timestamp: {}", e);
            }
        }
    }

    /// Returns false when no usable snapshot is stored.
    pub async fn load_snapshot(&self) -> bool {
        let rates = get_json::<HashMap<String, f64>>(self.store.as_ref(), SNAPSHOT_KEY).await;
        let updated_at = get_json::<DateTime<Utc>>(self.store.as_ref(), UPDATED_AT_KEY).await;

        match (rates, updated_at) {
            (Ok(Some(rates)), Ok(updated_at)) => {
                info!("Loaded rate snapshot with {} entries", rates.len());
                *self.table.write().await = Arc::new(RateTable { rates, updated_at });
                true
            }
            (Ok(None), _) => false,
            (Err(e), _) | (_, Err(e)) => {
                warn!("Ignoring unreadable rate snapshot: {}", e);
                false
            }
        }
    }

    pub async fn is_stale(&self) -> bool {
        match self.rates_snapshot().await.updated_at {
            Some(updated_at) => Utc::now() - updated_at > self.refresh_interval,
            None => true,
        }
    }

    /// Long-lived refresh loop. Returns promptly once `shutdown` fires or its
    /// sender is dropped.
    pub async fn run_periodic(&self, mut shutdown: broadcast::Receiver<()>) {
        if !self.load_snapshot().await {
            self.refresh_now().await;
        }

        let ticks = (CHECK_EVERY.as_millis() / CHECK_TICK.as_millis()).max(1);
        loop {
            if self.is_stale().await {
                self.refresh_now().await;
            }

            for _ in 0..ticks {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Exchange rate refresher stopped");
                        return;
                    }
                    _ = tokio::time::sleep(CHECK_TICK) => {}
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use async_trait::async_trait;

    /// Always answers with the same prices.
    pub struct FixedSource(pub HashMap<String, f64>);

    #[async_trait]
    impl RateSource for FixedSource {
        async fn fetch(&self, _ids: &[String]) -> Result<HashMap<String, f64>, RateError> {
            Ok(self.0.clone())
        }
    }

    pub async fn refreshed(catalog: Arc<Catalog>, store: Arc<dyn DocumentStore>, prices: &[(&str, f64)]) -> ExchangeRateService {
        let source = FixedSource(prices.iter().map(|(id, price)| (id.to_string(), *price)).collect());
        let service = ExchangeRateService::new(
            catalog,
            Arc::new(source),
            store,
            Duration::from_secs(3600),
            Duration::from_secs(10),
        );
        service.refresh_now().await;
        service
    }
}
