use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted under `user:{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Recent order ids, oldest first.
    #[serde(default)]
    pub orders: Vec<String>,
    /// Lifetime count of paid orders.
    #[serde(default)]
    pub total_orders: u64,
    /// Lifetime spend over paid orders, in RUB.
    #[serde(default)]
    pub total_spent: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "Utc::now")]
    pub registration_date: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            orders: Vec::new(),
            total_orders: 0,
            total_spent: 0,
            username: String::new(),
            full_name: String::new(),
            registration_date: now,
        }
    }

    /// Case-insensitive substring match over the id, names and aggregates.
    pub fn matches(&self, user_id: u64, query: &str) -> bool {
        let query = query.to_lowercase();
        let fields = [
            user_id.to_string(),
            self.username.to_lowercase(),
            self.full_name.to_lowercase(),
            self.total_orders.to_string(),
            self.total_spent.to_string(),
        ];

        fields.iter().any(|field| field.contains(&query))
    }

    /// Appends `order_id`, evicting the oldest ids beyond `limit`.
    pub fn push_order(&mut self, order_id: &str, limit: usize) {
        self.orders.push(order_id.to_string());
        if self.orders.len() > limit {
            let excess = self.orders.len() - limit;
            self.orders.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub user_id: u64,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    pub profiles: Vec<ProfileEntry>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}
