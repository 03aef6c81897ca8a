use std::sync::Arc;

use availability::AvailabilityService;
use order::OrderService;
use rates::{CoinGeckoSource, ExchangeRateService};
use shop::ShopService;
use user::UserService;

use crate::{catalog::Catalog, config::AppConfig, storage::DocumentStore};

pub mod availability;
pub mod dialogue;
mod error;
pub mod order;
pub mod pricing;
pub mod rates;
pub mod shop;
pub mod user;

pub use error::ServiceError;

#[derive(Clone)]
pub struct ServiceRegistry {
    pub availability: Arc<AvailabilityService>,
    pub rates: Arc<ExchangeRateService>,
    pub users: UserService,
    pub orders: OrderService,
    pub shop: ShopService,
}

impl ServiceRegistry {
    pub fn new(config: &AppConfig, catalog: Arc<Catalog>, store: Arc<dyn DocumentStore>) -> Result<Self, ServiceError> {
        info!("Initializing service registry");

        let availability = Arc::new(AvailabilityService::new(
            Arc::clone(&catalog),
            config.availability.refresh_interval,
        ));

        let source = CoinGeckoSource::new(&config.rates.api_url, config.rates.request_timeout)?;
        let rates = Arc::new(ExchangeRateService::new(
            Arc::clone(&catalog),
            Arc::new(source),
            Arc::clone(&store),
            config.rates.refresh_interval,
            config.rates.request_timeout,
        ));

        let users = UserService::new(Arc::clone(&store));
        let orders = OrderService::new(store, users.clone(), config.order.recent_orders_limit);
        let shop = ShopService::new(catalog, Arc::clone(&availability), Arc::clone(&rates), orders.clone());

        info!("Service registry initialized");

        Ok(Self {
            availability,
            rates,
            users,
            orders,
            shop,
        })
    }
}
