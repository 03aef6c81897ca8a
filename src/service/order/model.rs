use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Paid,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Created => write!(f, "Created"),
            OrderStatus::Paid => write!(f, "Paid"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Everything the flow collects before an order id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: u64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub city: String,
    pub product: String,
    pub weight: String,
    pub product_type: String,
    pub district: Option<String>,
    pub price: u64,
    pub payment_method: String,
    pub payment_amount: f64,
    pub wallet_address: String,
}

/// Persisted under `order:{order_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub user_id: u64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub city: String,
    pub product: String,
    pub weight: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub district: Option<String>,
    pub price: u64,
    pub payment_method: String,
    pub payment_amount: f64,
    pub wallet_address: String,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub payment_message_id: Option<i32>,
}

impl Order {
    pub fn from_new(order_id: String, new: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            order_id,
            user_id: new.user_id,
            chat_id: new.chat_id,
            username: new.username,
            city: new.city,
            product: new.product,
            weight: new.weight,
            product_type: new.product_type,
            district: new.district,
            price: new.price,
            payment_method: new.payment_method,
            payment_amount: new.payment_amount,
            wallet_address: new.wallet_address,
            status: OrderStatus::Created,
            date: now,
            updated: now,
            payment_message_id: None,
        }
    }

    /// Case-insensitive substring match over the searchable fields.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let fields = [
            self.order_id.clone(),
            self.city.clone(),
            self.product.clone(),
            self.weight.clone(),
            self.product_type.clone(),
            self.district.clone().unwrap_or_default(),
            self.price.to_string(),
            self.payment_method.clone(),
            self.payment_amount.to_string(),
            self.wallet_address.clone(),
            self.status.to_string(),
            self.username.clone().unwrap_or_default(),
        ];

        fields.iter().any(|field| field.to_lowercase().contains(&query))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}
