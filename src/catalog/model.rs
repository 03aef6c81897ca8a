use serde::{Deserialize, Serialize};

/// Products whose id starts with this marker are never constrained by availability.
pub const SPECIAL_PRODUCT_MARKER: &str = "!";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub name: String,
    /// 1 = small, 3 = large. Drives availability density.
    #[serde(default = "default_size")]
    pub size: u8,
    /// Percentage added on top of base prices.
    #[serde(default)]
    pub markup: f64,
    #[serde(default)]
    pub districts: Vec<String>,
}

fn default_size() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceTier {
    pub label: String,
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub prices: Vec<PriceTier>,
}

impl Product {
    pub fn is_special(&self) -> bool {
        self.id.starts_with(SPECIAL_PRODUCT_MARKER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentMethod {
    pub name: String,
    /// Currency label shown next to the payment amount.
    pub currency: String,
    /// Identifier at the rate source. `None` means the amount is paid in RUB as-is.
    #[serde(default)]
    pub rate_id: Option<String>,
    #[serde(default)]
    pub wallets: Vec<String>,
}
