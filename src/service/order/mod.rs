mod error;
mod model;

pub use error::OrderError;
pub use model::*;

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use crate::{
    service::user::UserService,
    storage::{get_json, set_json, DocumentStore, StorageError},
};

const ORDER_ID_ATTEMPTS: usize = 5;

pub fn order_key(order_id: &str) -> String {
    format!("order:{}", order_id)
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
    users: UserService,
    recent_limit: usize,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>, users: UserService, recent_limit: usize) -> Self {
        info!("Initializing OrderService...");
        Self {
            store,
            users,
            recent_limit: recent_limit.max(1),
        }
    }

    async fn unused_order_id(&self) -> Result<String, OrderError> {
        for _ in 0..ORDER_ID_ATTEMPTS {
            let candidate = rand::thread_rng().gen_range(1_000_000_000u64..=9_999_999_999).to_string();
            if self.store.get(&order_key(&candidate)).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(StorageError::Other("could not allocate an unused order id".to_string()).into())
    }

    /// Persists the order as `Created` and links it to the user's recent orders.
    /// If the user document cannot be written the order document is removed again.
    pub async fn create_order(&self, new: NewOrder) -> Result<Order, OrderError> {
        let order_id = self.unused_order_id().await?;
        let key = order_key(&order_id);
        let order = Order::from_new(order_id, new, Utc::now());

        set_json(self.store.as_ref(), &key, &order).await?;

        if let Err(e) = self
            .users
            .append_order(order.user_id, &order.order_id, self.recent_limit)
            .await
        {
            error!("Failed to link order {} to user {}: {}", order.order_id, order.user_id, e);
            if let Err(e) = self.store.del(&key).await {
                error!("Failed to roll back order {}: {}", order.order_id, e);
            }
            return Err(e.into());
        }

        info!("Order {} created for user {}", order.order_id, order.user_id);
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>, OrderError> {
        Ok(get_json(self.store.as_ref(), &order_key(order_id)).await?)
    }

    /// Entering `Paid` from any other status adds the price to the owner's
    /// lifetime aggregates. Repeating the same transition changes nothing but
    /// the timestamp. If the aggregates cannot be written the order keeps its
    /// previous status.
    pub async fn transition_status(&self, order_id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let mut order = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        let before = order.clone();
        let previous = order.status;
        order.status = status;
        order.updated = order.updated.max(Utc::now());
        set_json(self.store.as_ref(), &order_key(order_id), &order).await?;

        match status {
            OrderStatus::Paid if previous != OrderStatus::Paid => {
                if let Err(e) = self.users.record_payment(order.user_id, order.price).await {
                    error!("Failed to record payment of order {}: {}", order_id, e);
                    if let Err(e) = set_json(self.store.as_ref(), &order_key(order_id), &before).await {
                        error!("Failed to restore order {} to {}: {}", order_id, previous, e);
                    }
                    return Err(e.into());
                }
                info!("Order {} paid", order_id);
            }
            OrderStatus::Cancelled if previous != OrderStatus::Cancelled => {
                info!("Order {} cancelled", order_id);
            }
            _ => debug!("Order {} already {}", order_id, status),
        }

        Ok(order)
    }

    pub async fn attach_payment_message(&self, order_id: &str, message_id: i32) -> Result<Order, OrderError> {
        let mut order = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        order.payment_message_id = Some(message_id);
        set_json(self.store.as_ref(), &order_key(order_id), &order).await?;

        Ok(order)
    }

    /// Recent orders that still exist, oldest first. Dangling ids are dropped
    /// from the user document.
    pub async fn list_for_user(&self, user_id: u64) -> Result<Vec<Order>, OrderError> {
        let Some(mut profile) = self.users.get(user_id).await? else {
            return Ok(Vec::new());
        };

        let mut orders = Vec::with_capacity(profile.orders.len());
        for order_id in &profile.orders {
            match self.get_order(order_id).await {
                Ok(Some(order)) => orders.push(order),
                Ok(None) => warn!("Order {} of user {} no longer exists", order_id, user_id),
                Err(e) => warn!("Skipping unreadable order {}: {}", order_id, e),
            }
        }

        if orders.len() != profile.orders.len() {
            profile.orders = orders.iter().map(|order| order.order_id.clone()).collect();
            self.users.save(user_id, &profile).await?;
        }

        Ok(orders)
    }

    /// Most recent first, ties broken by id descending. `page` is clamped to
    /// the last page.
    pub async fn search(&self, page: usize, page_size: usize, query: Option<&str>) -> Result<OrderPage, OrderError> {
        let page_size = page_size.max(1);
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let mut orders = Vec::new();
        for key in self.store.keys("order:*").await? {
            match get_json::<Order>(self.store.as_ref(), &key).await {
                Ok(Some(order)) if query.map_or(true, |q| order.matches(q)) => orders.push(order),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable document {}: {}", key, e),
            }
        }

        orders.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.order_id.cmp(&a.order_id)));

        let total = orders.len();
        let total_pages = total.div_ceil(page_size).max(1);
        let page = page.min(total_pages - 1);
        let orders = orders.into_iter().skip(page * page_size).take(page_size).collect();

        Ok(OrderPage {
            orders,
            total,
            page,
            total_pages,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_order(user_id: u64, price: u64) -> NewOrder {
        NewOrder {
            user_id,
            chat_id: user_id as i64,
            username: Some("alice".to_string()),
            city: "Moscow".to_string(),
            product: "Blend 1".to_string(),
            weight: "1kg".to_string(),
            product_type: "Ground".to_string(),
            district: Some("Center".to_string()),
            price,
            payment_method: "Bitcoin".to_string(),
            payment_amount: price as f64 / 2.0,
            wallet_address: "bc1-wallet-a".to_string(),
        }
    }
}
