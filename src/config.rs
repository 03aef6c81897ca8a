use shuttle_runtime::SecretStore;
use std::{path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing secret: {0}")]
    MissingKey(&'static str),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub dialogue: DialogueConfig,
    pub catalog: CatalogConfig,
    pub availability: AvailabilityConfig,
    pub rates: RatesConfig,
    pub order: OrderConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub token: String,
    pub support_username: String,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    /// Telegram username without the leading `@`.
    pub login: String,
    pub password: String,
}

impl AdminConfig {
    pub fn is_admin_login(&self, username: Option<&str>) -> bool {
        username.is_some_and(|name| name.eq_ignore_ascii_case(&self.login))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redis,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "redis" => Ok(StorageBackend::Redis),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: Option<String>,
    pub memory_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct DialogueConfig {
    pub use_redis: bool,
    pub redis_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AvailabilityConfig {
    pub refresh_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct RatesConfig {
    pub api_url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct OrderConfig {
    pub recent_orders_limit: usize,
}

const DEFAULT_RATES_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

fn required(store: &SecretStore, key: &'static str) -> Result<String, ConfigError> {
    store.get(key).ok_or(ConfigError::MissingKey(key))
}

fn parsed_or<T: FromStr>(store: &SecretStore, key: &'static str, default: T) -> Result<T, ConfigError> {
    match store.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

pub fn build_config(secret_store: &SecretStore) -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let redis_url = secret_store.get("REDIS_URL");

    let backend = match secret_store.get("STORAGE_BACKEND") {
        Some(raw) => raw
            .parse::<StorageBackend>()
            .map_err(|v| ConfigError::InvalidValue("STORAGE_BACKEND", v))?,
        None => StorageBackend::Memory,
    };

    let login = required(secret_store, "ADMIN_LOGIN")?;

    let config = AppConfig {
        telegram: TelegramConfig {
            token: required(secret_store, "TELEGRAM_BOT_TOKEN")?,
            support_username: required(secret_store, "SUPPORT_USERNAME")?
                .trim_start_matches('@')
                .to_string(),
        },
        admin: AdminConfig {
            login: login.trim_start_matches('@').to_string(),
            password: required(secret_store, "ADMIN_PASSWORD")?,
        },
        storage: StorageConfig {
            backend,
            redis_url: redis_url.clone(),
            memory_capacity: parsed_or(secret_store, "STORAGE_MEMORY_CAPACITY", 10_000)?,
        },
        dialogue: DialogueConfig {
            use_redis: parsed_or(secret_store, "DIALOGUE_USE_REDIS", false)?,
            redis_url,
        },
        catalog: CatalogConfig {
            dir: PathBuf::from(secret_store.get("CATALOG_DIR").unwrap_or_else(|| "data".to_string())),
        },
        availability: AvailabilityConfig {
            refresh_interval: Duration::from_secs(parsed_or(secret_store, "AVAILABILITY_REFRESH_SECS", 6 * 60 * 60)?),
        },
        rates: RatesConfig {
            api_url: secret_store
                .get("RATES_API_URL")
                .unwrap_or_else(|| DEFAULT_RATES_API_URL.to_string()),
            refresh_interval: Duration::from_secs(parsed_or(secret_store, "RATES_REFRESH_SECS", 60 * 60)?),
            request_timeout: Duration::from_secs(parsed_or(secret_store, "RATES_TIMEOUT_SECS", 10)?),
        },
        order: OrderConfig {
            recent_orders_limit: parsed_or(secret_store, "RECENT_ORDERS_LIMIT", 10)?,
        },
    };

    info!("AppConfig built");

    Ok(config)
}
