use std::sync::Arc;

use crate::{
    catalog::Catalog,
    config::AppConfig,
    error::BotResult,
    runtime::RuntimeManager,
    service::ServiceRegistry,
    storage::open_store,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service_registry: ServiceRegistry,
    pub runtime: RuntimeManager,
}

impl AppState {
    pub async fn new(config: AppConfig) -> BotResult<Self> {
        let catalog = Arc::new(Catalog::load(&config.catalog.dir)?);

        let store = open_store(&config.storage).await?;

        let service_registry = ServiceRegistry::new(&config, catalog, store)?;

        let runtime = RuntimeManager::new(&service_registry);

        Ok(Self {
            config: Arc::new(config),
            service_registry,
            runtime,
        })
    }
}
