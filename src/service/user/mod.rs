mod model;

pub use model::{ProfileEntry, ProfilePage, UserProfile};

use chrono::Utc;
use std::sync::Arc;

use crate::storage::{get_json, set_json, DocumentStore, StorageError};

const KEY_PREFIX: &str = "user:";

pub fn user_key(user_id: u64) -> String {
    format!("{}{}", KEY_PREFIX, user_id)
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        info!("Initializing UserService...");
        Self { store }
    }

    pub async fn get(&self, user_id: u64) -> Result<Option<UserProfile>, StorageError> {
        get_json(self.store.as_ref(), &user_key(user_id)).await
    }

    pub async fn get_or_default(&self, user_id: u64) -> Result<UserProfile, StorageError> {
        Ok(self.get(user_id).await?.unwrap_or_else(|| UserProfile::new(Utc::now())))
    }

    pub async fn save(&self, user_id: u64, profile: &UserProfile) -> Result<(), StorageError> {
        set_json(self.store.as_ref(), &user_key(user_id), profile).await
    }

    /// First contact creates the profile; later calls only refresh the display identity.
    pub async fn register(&self, user_id: u64, username: &str, full_name: &str) -> Result<UserProfile, StorageError> {
        let mut profile = match self.get(user_id).await? {
            Some(profile) => profile,
            None => {
                info!("Registering user {}", user_id);
                UserProfile::new(Utc::now())
            }
        };

        profile.username = username.to_string();
        profile.full_name = full_name.to_string();
        self.save(user_id, &profile).await?;

        Ok(profile)
    }

    pub async fn append_order(&self, user_id: u64, order_id: &str, limit: usize) -> Result<(), StorageError> {
        let mut profile = self.get_or_default(user_id).await?;
        profile.push_order(order_id, limit);
        self.save(user_id, &profile).await
    }

    pub async fn record_payment(&self, user_id: u64, amount: u64) -> Result<UserProfile, StorageError> {
        let mut profile = self.get_or_default(user_id).await?;
        profile.total_orders += 1;
        profile.total_spent += amount;
        self.save(user_id, &profile).await?;
        Ok(profile)
    }

    /// Newest registrations first, ties broken by user id descending. `page`
    /// is clamped to the last page.
    pub async fn search(&self, page: usize, page_size: usize, query: Option<&str>) -> Result<ProfilePage, StorageError> {
        let page_size = page_size.max(1);
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let mut profiles = Vec::new();
        for key in self.store.keys(&format!("{}*", KEY_PREFIX)).await? {
            let Some(user_id) = key.strip_prefix(KEY_PREFIX).and_then(|id| id.parse::<u64>().ok()) else {
                warn!("Skipping user document with unexpected key {}", key);
                continue;
            };
            match get_json::<UserProfile>(self.store.as_ref(), &key).await {
                Ok(Some(profile)) if query.map_or(true, |q| profile.matches(user_id, q)) => {
                    profiles.push(ProfileEntry { user_id, profile })
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable document {}: {}", key, e),
            }
        }

        profiles.sort_by(|a, b| {
            b.profile
                .registration_date
                .cmp(&a.profile.registration_date)
                .then_with(|| b.user_id.cmp(&a.user_id))
        });

        let total = profiles.len();
        let total_pages = total.div_ceil(page_size).max(1);
        let page = page.min(total_pages - 1);
        let profiles = profiles.into_iter().skip(page * page_size).take(page_size).collect();

        Ok(ProfilePage {
            profiles,
            total,
            page,
            total_pages,
        })
    }
}
