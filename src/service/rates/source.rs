use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::{collections::HashMap, time::Duration};

use super::RateError;

/// External price lookup: currency id -> RUB price of one unit.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, f64>, RateError>;
}

pub struct CoinGeckoSource {
    client: Client,
    url: String,
}

impl CoinGeckoSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RateSource for CoinGeckoSource {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, f64>, RateError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "rub".to_string())])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(RateError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_simple_price(&body)
    }
}

/// Expects `{"bitcoin": {"rub": 1234.5}, ...}`. Entries without a numeric
/// `rub` price are skipped; any other top-level shape is an error.
pub(crate) fn parse_simple_price(body: &str) -> Result<HashMap<String, f64>, RateError> {
    let data: HashMap<String, HashMap<String, serde_json::Value>> =
        serde_json::from_str(body).map_err(|e| RateError::Malformed(e.to_string()))?;

    Ok(data
        .into_iter()
        .filter_map(|(id, prices)| prices.get("rub").and_then(|v| v.as_f64()).map(|rub| (id, rub)))
        .collect())
}
