mod model;

pub use model::*;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{Mutex, RwLock};

use crate::catalog::{Catalog, City, PriceTier, Product};

/// Simulated per-city stock. All masks are regenerated together once the
/// current set is older than the refresh interval.
pub struct AvailabilityService {
    catalog: Arc<Catalog>,
    policy: AvailabilityPolicy,
    refresh_interval: chrono::Duration,
    rng: Mutex<StdRng>,
    current: RwLock<Option<Arc<MaskSet>>>,
}

impl AvailabilityService {
    pub fn new(catalog: Arc<Catalog>, refresh_interval: Duration) -> Self {
        Self::with_rng(catalog, refresh_interval, AvailabilityPolicy::default(), StdRng::from_entropy())
    }

    pub fn with_rng(catalog: Arc<Catalog>, refresh_interval: Duration, policy: AvailabilityPolicy, rng: StdRng) -> Self {
        info!("Initializing AvailabilityService...");
        Self {
            catalog,
            policy,
            refresh_interval: chrono::Duration::from_std(refresh_interval).unwrap_or(chrono::Duration::hours(6)),
            rng: Mutex::new(rng),
            current: RwLock::new(None),
        }
    }

    pub async fn refresh_if_stale(&self) -> Arc<MaskSet> {
        self.refresh_if_stale_at(Utc::now()).await
    }

    pub async fn refresh_if_stale_at(&self, now: DateTime<Utc>) -> Arc<MaskSet> {
        if let Some(set) = self.fresh_set(now).await {
            return set;
        }

        // Holding the rng serialises regeneration; a waiting caller rechecks.
        let mut rng = self.rng.lock().await;
        if let Some(set) = self.fresh_set(now).await {
            return set;
        }

        let set = Arc::new(self.generate(&mut rng, now));
        *self.current.write().await = Some(Arc::clone(&set));
        info!("Availability regenerated for {} cities", set.masks.len());
        set
    }

    async fn fresh_set(&self, now: DateTime<Utc>) -> Option<Arc<MaskSet>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|set| now - set.generated_at < self.refresh_interval)
            .map(Arc::clone)
    }

    fn generate(&self, rng: &mut StdRng, now: DateTime<Utc>) -> MaskSet {
        let masks = self
            .catalog
            .cities()
            .iter()
            .map(|city| (city.name.clone(), self.generate_city(rng, city)))
            .collect::<HashMap<_, _>>();

        MaskSet {
            generated_at: now,
            masks,
        }
    }

    fn generate_city(&self, rng: &mut StdRng, city: &City) -> AvailabilityMask {
        let mut mask = AvailabilityMask::default();

        let regular: Vec<&Product> = self.catalog.products().iter().filter(|p| !p.is_special()).collect();
        let fraction = draw_fraction(rng, self.policy.density_for(city.size));
        let take = (regular.len() as f64 * fraction).floor() as usize;
        let available: Vec<&Product> = regular.choose_multiple(rng, take).copied().collect();

        mask.unavailable_products = regular
            .iter()
            .filter(|p| !available.iter().any(|a| a.id == p.id))
            .map(|p| p.id.clone())
            .collect();

        let type_count = self.catalog.types().len();
        for product in available {
            if rng.gen_bool(self.policy.weight_knockout_probability) && product.prices.len() > 1 {
                if let Some(tier) = product.prices.choose(rng) {
                    mask.unavailable_weights.insert(product.id.clone(), tier.label.clone());
                }
            }
            if rng.gen_bool(self.policy.type_knockout_probability) && type_count > 1 {
                mask.unavailable_types
                    .insert(product.id.clone(), rng.gen_range(0..type_count));
            }
        }

        if !city.districts.is_empty() {
            let fraction = draw_fraction(rng, self.policy.unavailable_district_fraction);
            let take = (city.districts.len() as f64 * fraction).floor() as usize;
            mask.unavailable_districts = city.districts.choose_multiple(rng, take).cloned().collect();
        }

        mask
    }

    /// Products on sale in `city`, in catalog order.
    pub async fn products_for(&self, city: &str) -> Vec<Product> {
        let set = self.refresh_if_stale().await;
        let Some(mask) = set.masks.get(city) else {
            return Vec::new();
        };

        self.catalog
            .products()
            .iter()
            .filter(|p| p.is_special() || !mask.unavailable_products.contains(&p.id))
            .cloned()
            .collect()
    }

    pub async fn weights_for(&self, city: &str, product_id: &str) -> Vec<PriceTier> {
        let set = self.refresh_if_stale().await;
        let (Some(mask), Some(product)) = (set.masks.get(city), self.catalog.product(product_id)) else {
            return Vec::new();
        };

        if product.is_special() {
            return product.prices.clone();
        }

        let excluded = mask.unavailable_weights.get(product_id);
        product
            .prices
            .iter()
            .filter(|tier| Some(&tier.label) != excluded)
            .cloned()
            .collect()
    }

    /// Type indices with their labels.
    pub async fn types_for(&self, city: &str, product_id: &str) -> Vec<(usize, String)> {
        let set = self.refresh_if_stale().await;
        let (Some(mask), Some(product)) = (set.masks.get(city), self.catalog.product(product_id)) else {
            return Vec::new();
        };

        let excluded = if product.is_special() {
            None
        } else {
            mask.unavailable_types.get(product_id).copied()
        };

        self.catalog
            .types()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != excluded)
            .map(|(i, label)| (i, label.clone()))
            .collect()
    }

    /// An empty result means the city has no selectable districts.
    pub async fn districts_for(&self, city: &str) -> Vec<String> {
        let set = self.refresh_if_stale().await;
        let (Some(mask), Some(city)) = (set.masks.get(city), self.catalog.city(city)) else {
            return Vec::new();
        };

        city.districts
            .iter()
            .filter(|d| !mask.unavailable_districts.contains(*d))
            .cloned()
            .collect()
    }
}

fn draw_fraction(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    if low >= high {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{city, product, storefront};

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    fn service(seed: u64) -> AvailabilityService {
        AvailabilityService::with_rng(
            Arc::new(storefront()),
            SIX_HOURS,
            AvailabilityPolicy::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    #[tokio::test]
    async fn test_products_are_subset_and_special_always_present() {
        for seed in 0..20 {
            let service = service(seed);
            let catalog = storefront();
            for city in catalog.cities() {
                let products = service.products_for(&city.name).await;
                assert!(products.iter().all(|p| catalog.product(&p.id).is_some()));
                assert!(products.iter().any(|p| p.id == "!gift"));
            }
        }
    }

    #[tokio::test]
    async fn test_density_follows_city_size() {
        let service = service(7);
        // 10 regular products: size 1 keeps 3..=4, size 3 keeps 7..=8.
        let small = service.products_for("Tver").await.len() - 1;
        let large = service.products_for("Moscow").await.len() - 1;
        assert!((3..=4).contains(&small), "small city kept {small}");
        assert!((7..=8).contains(&large), "large city kept {large}");
    }

    #[tokio::test]
    async fn test_catalog_order_is_preserved() {
        let service = service(3);
        let catalog = storefront();
        let position = |id: &str| catalog.products().iter().position(|p| p.id == id).unwrap();

        let ids: Vec<usize> = service
            .products_for("Moscow")
            .await
            .iter()
            .map(|p| position(&p.id))
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);

        let districts = service.districts_for("Moscow").await;
        let all = &catalog.city("Moscow").unwrap().districts;
        let expected: Vec<String> = all.iter().filter(|d| districts.contains(d)).cloned().collect();
        assert_eq!(districts, expected);
    }

    #[tokio::test]
    async fn test_at_most_one_weight_and_type_excluded() {
        for seed in 0..20 {
            let service = service(seed);
            let catalog = storefront();
            for city in catalog.cities() {
                for product in service.products_for(&city.name).await {
                    let weights = service.weights_for(&city.name, &product.id).await;
                    let types = service.types_for(&city.name, &product.id).await;
                    if product.is_special() {
                        assert_eq!(weights.len(), product.prices.len());
                        assert_eq!(types.len(), catalog.types().len());
                    } else {
                        assert!(weights.len() + 1 >= product.prices.len());
                        assert!(types.len() + 1 >= catalog.types().len());
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent_within_interval() {
        let service = service(11);
        let now = Utc::now();

        let first = service.refresh_if_stale_at(now).await;
        let second = service
            .refresh_if_stale_at(now + chrono::Duration::hours(5))
            .await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);

        let third = service
            .refresh_if_stale_at(now + chrono::Duration::hours(6))
            .await;
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.generated_at, now + chrono::Duration::hours(6));
    }

    #[tokio::test]
    async fn test_city_without_districts() {
        let service = service(5);
        assert!(service.districts_for("Tver").await.is_empty());
        let set = service.refresh_if_stale().await;
        assert!(set.masks["Tver"].unavailable_districts.is_empty());
    }

    #[tokio::test]
    async fn test_some_districts_always_remain() {
        for seed in 0..20 {
            let service = service(seed);
            let kazan = service.districts_for("Kazan").await.len();
            let moscow = service.districts_for("Moscow").await.len();
            // floor(3 * 0.5) = 1 removed at most, floor(6 * 0.5) = 3.
            assert!(kazan >= 2);
            assert!(moscow >= 3);
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_gives_empty_menus() {
        let catalog = Catalog::new(vec![city("Tver", 1, 0.0, &["Center"])], vec![], vec![], vec![]).unwrap();
        let service = AvailabilityService::with_rng(
            Arc::new(catalog),
            SIX_HOURS,
            AvailabilityPolicy::default(),
            StdRng::seed_from_u64(1),
        );
        assert!(service.products_for("Tver").await.is_empty());
        assert!(service.products_for("Nowhere").await.is_empty());
    }

    #[tokio::test]
    async fn test_single_item_catalog_floors_to_zero() {
        let catalog = Catalog::new(
            vec![city("Tver", 1, 0.0, &["Center"])],
            vec![product("p1", "Only", &[("250g", 100)])],
            vec!["Whole bean".into()],
            vec![],
        )
        .unwrap();
        let service = AvailabilityService::with_rng(
            Arc::new(catalog),
            SIX_HOURS,
            AvailabilityPolicy::default(),
            StdRng::seed_from_u64(1),
        );
        // floor(1 * 0.4) = 0 products and floor(1 * 0.5) = 0 districts removed.
        assert!(service.products_for("Tver").await.is_empty());
        assert_eq!(service.districts_for("Tver").await, vec!["Center".to_string()]);
    }
}
