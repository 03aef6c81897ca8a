mod action;
mod error;
mod screen;

pub use action::{ShopAction, NO_DISTRICT_KEY};
pub use error::ShopError;
pub use screen::{Paged, Screen};

use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::{
    catalog::{Catalog, PriceTier},
    service::{
        availability::AvailabilityService,
        dialogue::model::{DialogueState, OrderDraft, PricedItem, TypedItem},
        order::{NewOrder, OrderService, OrderStatus},
        pricing::{apply_markup, payment_amount},
        rates::ExchangeRateService,
    },
};

/// City and district listings are paged at this size.
pub const PAGE_SIZE: usize = 20;

/// Who is acting, as far as orders are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub user_id: u64,
    pub chat_id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: DialogueState,
    pub screen: Screen,
}

/// The purchase flow. Every step is a pure function of the current state and
/// one action; persistence of the returned state is up to the caller.
#[derive(Clone)]
pub struct ShopService {
    catalog: Arc<Catalog>,
    availability: Arc<AvailabilityService>,
    rates: Arc<ExchangeRateService>,
    orders: OrderService,
}

impl ShopService {
    pub fn new(
        catalog: Arc<Catalog>,
        availability: Arc<AvailabilityService>,
        rates: Arc<ExchangeRateService>,
        orders: OrderService,
    ) -> Self {
        info!("Initializing ShopService...");
        Self {
            catalog,
            availability,
            rates,
            orders,
        }
    }

    pub async fn handle(
        &self,
        state: DialogueState,
        action: ShopAction,
        customer: &Customer,
    ) -> Result<Transition, ShopError> {
        use DialogueState as S;
        use ShopAction as A;

        if action == A::Enter {
            info!("User {} entered the shop", customer.user_id);
            return self.show(S::SelectCity { page: 0 }).await;
        }

        match (state, action) {
            (S::SelectCity { .. }, A::Page(page)) => self.show(S::SelectCity { page }).await,
            (S::SelectCity { .. }, A::Search) => self.show(S::SearchCity { prompt_message_id: None }).await,
            (S::SelectCity { .. }, A::Choose(city)) => self.choose_city(city, customer).await,
            (S::SelectCity { .. }, A::Back | A::Cancel) => self.show(S::Start).await,

            (S::SearchCity { .. }, A::Text(query)) => Ok(self.search_cities(&query)),
            (S::SearchCity { .. }, A::Back) => self.show(S::SelectCity { page: 0 }).await,

            (S::SelectProduct { city }, A::Choose(product_id)) => self.choose_product(city, product_id, customer).await,
            (S::SelectProduct { .. }, A::Back) => self.show(S::SelectCity { page: 0 }).await,

            (S::SelectPrice { city, product_id }, A::Choose(label)) => {
                self.choose_weight(city, product_id, &label, customer).await
            }
            (S::SelectPrice { city, .. }, A::Back) => self.show(S::SelectProduct { city }).await,

            (S::SelectType { item }, A::Choose(key)) => self.choose_type(item, &key, customer).await,
            (S::SelectType { item }, A::Back) => {
                self.show(S::SelectPrice {
                    city: item.city,
                    product_id: item.product_id,
                })
                .await
            }

            (S::SelectDistrict { item, .. }, A::Page(page)) => self.show(S::SelectDistrict { item, page }).await,
            (S::SelectDistrict { item, .. }, A::Search) => self.open_district_search(item).await,
            (S::SelectDistrict { item, .. }, A::Choose(key)) => self.choose_district(item, &key, customer).await,
            (S::SelectDistrict { item, .. }, A::Back) => self.show(S::SelectType { item: item.item }).await,

            (S::SearchDistrict { item, .. }, A::Text(query)) => Ok(self.search_districts(item, &query).await),
            (S::SearchDistrict { item, .. }, A::Back) => self.show(S::SelectDistrict { item, page: 0 }).await,

            (S::ConfirmOrder { draft }, A::Confirm) => self.show(S::SelectPayment { draft }).await,
            (S::ConfirmOrder { .. }, A::Cancel) => self.show(S::Start).await,
            (S::ConfirmOrder { draft }, A::Back) => {
                self.show(S::SelectDistrict {
                    item: draft.item,
                    page: 0,
                })
                .await
            }

            (S::SelectPayment { draft }, A::Choose(method)) => self.place_order(draft, &method, customer).await,
            (S::SelectPayment { draft }, A::Back | A::Cancel) => self.show(S::ConfirmOrder { draft }).await,

            (S::PaymentPending { order_id, .. }, A::Cancel) => self.cancel_payment(&order_id, customer).await,

            (state, _) if !state.in_purchase_flow() => Err(ShopError::NotFound("purchase session".to_string())),
            _ => Err(ShopError::StaleSelection),
        }
    }

    /// The screen for a state as it stands now, consulting current availability.
    pub async fn render(&self, state: &DialogueState) -> Result<Screen, ShopError> {
        use DialogueState as S;

        let screen = match state {
            S::Start => Screen::MainMenu,
            S::SelectCity { page } => {
                let names: Vec<String> = self.catalog.cities().iter().map(|c| c.name.clone()).collect();
                Screen::Cities(Paged::of(&names, *page, PAGE_SIZE))
            }
            S::SearchCity { .. } => Screen::CitySearchPrompt { retry: false },
            S::SelectProduct { city } => Screen::Products {
                city: city.clone(),
                products: self.availability.products_for(city).await,
            },
            S::SelectPrice { city, product_id } => {
                let product = self
                    .catalog
                    .product(product_id)
                    .ok_or_else(|| ShopError::NotFound(format!("product {}", product_id)))?;
                let markup = self.markup_for(city)?;
                let tiers = self
                    .availability
                    .weights_for(city, product_id)
                    .await
                    .into_iter()
                    .map(|tier| PriceTier {
                        price: apply_markup(tier.price, markup),
                        label: tier.label,
                    })
                    .collect();

                Screen::Prices {
                    product_name: product.name.clone(),
                    tiers,
                }
            }
            S::SelectType { item } => Screen::Types {
                product_name: item.product_name.clone(),
                types: self.availability.types_for(&item.city, &item.product_id).await,
            },
            S::SelectDistrict { item, page } => {
                let districts = self.availability.districts_for(&item.item.city).await;
                Screen::Districts(Paged::of(&districts, *page, PAGE_SIZE))
            }
            S::SearchDistrict { .. } => Screen::DistrictSearchPrompt { retry: false },
            S::ConfirmOrder { draft } => Screen::Confirm(draft.clone()),
            S::SelectPayment { .. } => Screen::PaymentMethods(
                self.catalog
                    .payment_methods()
                    .iter()
                    .map(|method| method.name.clone())
                    .collect(),
            ),
            S::PaymentPending { order_id, .. } => {
                let order = self
                    .orders
                    .get_order(order_id)
                    .await?
                    .ok_or_else(|| ShopError::NotFound(format!("order {}", order_id)))?;
                Screen::PaymentInstructions {
                    currency: self.catalog.currency_for(&order.payment_method).to_string(),
                    order,
                }
            }
            S::AdminPassword { .. }
            | S::AdminMenu { .. }
            | S::AdminSearchOrders { .. }
            | S::AdminProfiles { .. }
            | S::AdminSearchProfiles { .. } => {
                return Err(ShopError::NotFound("purchase session".to_string()))
            }
        };

        Ok(screen)
    }

    async fn show(&self, state: DialogueState) -> Result<Transition, ShopError> {
        let screen = self.render(&state).await?;
        Ok(Transition { state, screen })
    }

    fn markup_for(&self, city: &str) -> Result<f64, ShopError> {
        self.catalog
            .city(city)
            .map(|city| city.markup)
            .ok_or_else(|| ShopError::NotFound(format!("city {}", city)))
    }

    async fn choose_city(&self, city: String, customer: &Customer) -> Result<Transition, ShopError> {
        if self.catalog.city(&city).is_none() {
            return Err(ShopError::StaleSelection);
        }
        info!("User {} selected city {}", customer.user_id, city);
        self.show(DialogueState::SelectProduct { city }).await
    }

    fn search_cities(&self, query: &str) -> Transition {
        let query = query.trim().to_lowercase();
        let found: Vec<String> = self
            .catalog
            .cities()
            .iter()
            .filter(|city| city.name.to_lowercase().contains(&query))
            .map(|city| city.name.clone())
            .collect();

        if query.is_empty() || found.is_empty() {
            return Transition {
                state: DialogueState::SearchCity { prompt_message_id: None },
                screen: Screen::CitySearchPrompt { retry: true },
            };
        }

        Transition {
            state: DialogueState::SelectCity { page: 0 },
            screen: Screen::CitySearchResults(found),
        }
    }

    async fn choose_product(
        &self,
        city: String,
        product_id: String,
        customer: &Customer,
    ) -> Result<Transition, ShopError> {
        let available = self.availability.products_for(&city).await;
        let product = available
            .iter()
            .find(|product| product.id == product_id)
            .ok_or(ShopError::StaleSelection)?;

        info!("User {} selected product {}", customer.user_id, product.name);
        self.show(DialogueState::SelectPrice { city, product_id }).await
    }

    async fn choose_weight(
        &self,
        city: String,
        product_id: String,
        label: &str,
        customer: &Customer,
    ) -> Result<Transition, ShopError> {
        let product = self.catalog.product(&product_id).ok_or(ShopError::StaleSelection)?;
        let markup = self.markup_for(&city)?;
        let tier = self
            .availability
            .weights_for(&city, &product_id)
            .await
            .into_iter()
            .find(|tier| tier.label == label)
            .ok_or(ShopError::StaleSelection)?;

        info!("User {} selected weight {}", customer.user_id, tier.label);

        // The marked-up price is computed once here and carried unchanged.
        let item = PricedItem {
            city,
            product_name: product.name.clone(),
            product_id,
            price: apply_markup(tier.price, markup),
            weight: tier.label,
        };
        self.show(DialogueState::SelectType { item }).await
    }

    async fn choose_type(&self, item: PricedItem, key: &str, customer: &Customer) -> Result<Transition, ShopError> {
        let index: usize = key.parse().map_err(|_| ShopError::StaleSelection)?;
        let (_, product_type) = self
            .availability
            .types_for(&item.city, &item.product_id)
            .await
            .into_iter()
            .find(|(i, _)| *i == index)
            .ok_or(ShopError::StaleSelection)?;

        info!("User {} selected type {}", customer.user_id, product_type);
        self.show(DialogueState::SelectDistrict {
            item: TypedItem { item, product_type },
            page: 0,
        })
        .await
    }

    async fn open_district_search(&self, item: TypedItem) -> Result<Transition, ShopError> {
        if self.availability.districts_for(&item.item.city).await.is_empty() {
            return Err(ShopError::StaleSelection);
        }
        self.show(DialogueState::SearchDistrict {
            item,
            prompt_message_id: None,
        })
        .await
    }

    async fn search_districts(&self, item: TypedItem, query: &str) -> Transition {
        let query = query.trim().to_lowercase();
        let found: Vec<String> = self
            .availability
            .districts_for(&item.item.city)
            .await
            .into_iter()
            .filter(|district| district.to_lowercase().contains(&query))
            .collect();

        if query.is_empty() || found.is_empty() {
            return Transition {
                state: DialogueState::SearchDistrict {
                    item,
                    prompt_message_id: None,
                },
                screen: Screen::DistrictSearchPrompt { retry: true },
            };
        }

        Transition {
            state: DialogueState::SelectDistrict { item, page: 0 },
            screen: Screen::DistrictSearchResults(found),
        }
    }

    async fn choose_district(&self, item: TypedItem, key: &str, customer: &Customer) -> Result<Transition, ShopError> {
        let districts = self.availability.districts_for(&item.item.city).await;

        let district = if districts.is_empty() && key == NO_DISTRICT_KEY {
            None
        } else if districts.iter().any(|district| district == key) {
            Some(key.to_string())
        } else {
            return Err(ShopError::StaleSelection);
        };

        info!(
            "User {} selected district {}",
            customer.user_id,
            district.as_deref().unwrap_or(NO_DISTRICT_KEY)
        );
        self.show(DialogueState::ConfirmOrder {
            draft: OrderDraft { item, district },
        })
        .await
    }

    async fn place_order(&self, draft: OrderDraft, method: &str, customer: &Customer) -> Result<Transition, ShopError> {
        let method = self.catalog.payment_method(method).ok_or(ShopError::StaleSelection)?;
        let wallet_address = method
            .wallets
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| ShopError::NoWalletConfigured(method.name.clone()))?;

        let rate = self.rates.rate_for(&method.name).await;
        let new = NewOrder {
            user_id: customer.user_id,
            chat_id: customer.chat_id,
            username: customer.username.clone(),
            city: draft.city().to_string(),
            product: draft.product_name().to_string(),
            weight: draft.weight().to_string(),
            product_type: draft.product_type().to_string(),
            district: draft.district.clone(),
            price: draft.price(),
            payment_method: method.name.clone(),
            payment_amount: payment_amount(draft.price(), rate),
            wallet_address,
        };

        let order = self.orders.create_order(new).await?;
        info!(
            "User {} placed order {} paying with {}",
            customer.user_id, order.order_id, method.name
        );

        Ok(Transition {
            state: DialogueState::PaymentPending {
                order_id: order.order_id.clone(),
                payment_message_id: None,
            },
            screen: Screen::PaymentInstructions {
                currency: method.currency.clone(),
                order,
            },
        })
    }

    /// Orders the administrator already settled are left as they are.
    async fn cancel_payment(&self, order_id: &str, customer: &Customer) -> Result<Transition, ShopError> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("order {}", order_id)))?;

        let order = if order.status == OrderStatus::Created {
            info!("User {} cancelled order {}", customer.user_id, order_id);
            self.orders.transition_status(order_id, OrderStatus::Cancelled).await?
        } else {
            order
        };

        Ok(Transition {
            state: DialogueState::Start,
            screen: Screen::PaymentClosed {
                order_id: order.order_id,
                status: order.status,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::fixtures::{city, payment, product},
        service::{
            availability::AvailabilityPolicy,
            rates::fixtures::refreshed,
            user::UserService,
        },
        storage::{DocumentStore, MemoryStore},
    };
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::Duration;

    struct Harness {
        shop: ShopService,
        availability: Arc<AvailabilityService>,
        orders: OrderService,
        users: UserService,
        store: Arc<dyn DocumentStore>,
        customer: Customer,
    }

    fn full_stock() -> AvailabilityPolicy {
        AvailabilityPolicy {
            density_by_size: [(1.0, 1.0); 3],
            weight_knockout_probability: 0.0,
            type_knockout_probability: 0.0,
            unavailable_district_fraction: (0.0, 0.0),
        }
    }

    /// Small cities stock nothing regular. Large cities lose one weight and
    /// one type per product and every district.
    fn knocked_out() -> AvailabilityPolicy {
        AvailabilityPolicy {
            density_by_size: [(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)],
            weight_knockout_probability: 1.0,
            type_knockout_probability: 1.0,
            unavailable_district_fraction: (1.0, 1.0),
        }
    }

    fn catalog() -> Catalog {
        let mut cities = vec![
            city("Moscow", 3, 10.0, &["Center", "North", "Riverside"]),
            city("Tver", 1, 0.0, &[]),
        ];
        cities.extend((1..=23).map(|i| city(&format!("Town {i:02}"), 1, 0.0, &[])));

        Catalog::new(
            cities,
            vec![
                product("p1", "House blend", &[("1g", 1000), ("2g", 1900)]),
                product("!gift", "Gift card", &[("card", 500)]),
            ],
            vec!["A".into(), "B".into()],
            vec![
                payment("Bitcoin", "BTC", Some("bitcoin"), &["bc1-wallet"]),
                payment("Monero", "XMR", Some("monero"), &[]),
            ],
        )
        .unwrap()
    }

    async fn harness() -> Harness {
        harness_with(full_stock()).await
    }

    async fn harness_with(policy: AvailabilityPolicy) -> Harness {
        let catalog = Arc::new(catalog());
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new(16));
        let users = UserService::new(Arc::clone(&store));
        let orders = OrderService::new(Arc::clone(&store), users.clone(), 10);
        let availability = Arc::new(AvailabilityService::with_rng(
            Arc::clone(&catalog),
            Duration::from_secs(6 * 60 * 60),
            policy,
            StdRng::seed_from_u64(1),
        ));
        let rates = Arc::new(refreshed(Arc::clone(&catalog), Arc::clone(&store), &[("bitcoin", 2.0)]).await);

        Harness {
            shop: ShopService::new(catalog, Arc::clone(&availability), rates, orders.clone()),
            availability,
            orders,
            users,
            store,
            customer: Customer {
                user_id: 7,
                chat_id: 70,
                username: Some("alice".into()),
            },
        }
    }

    impl Harness {
        async fn step(&self, state: DialogueState, action: ShopAction) -> Transition {
            self.shop.handle(state, action, &self.customer).await.unwrap()
        }

        async fn run(&self, actions: Vec<ShopAction>) -> Transition {
            let mut transition = self.step(DialogueState::Start, ShopAction::Enter).await;
            for action in actions {
                transition = self.step(transition.state, action).await;
            }
            transition
        }
    }

    fn pick(key: &str) -> ShopAction {
        ShopAction::Choose(key.to_string())
    }

    fn moscow_draft_actions() -> Vec<ShopAction> {
        vec![pick("Moscow"), pick("p1"), pick("1g"), pick("0"), pick("Center")]
    }

    #[tokio::test]
    async fn test_full_purchase_then_admin_pays() {
        let h = harness().await;

        let confirm = h.run(moscow_draft_actions()).await;
        let draft = match &confirm.screen {
            Screen::Confirm(draft) => draft.clone(),
            other => panic!("unexpected screen {other:?}"),
        };
        assert_eq!(draft.price(), 1100);
        assert_eq!(draft.product_type(), "A");
        assert_eq!(draft.district.as_deref(), Some("Center"));

        let methods = h.step(confirm.state, ShopAction::Confirm).await;
        assert_eq!(
            methods.screen,
            Screen::PaymentMethods(vec!["Bitcoin".into(), "Monero".into()])
        );

        let payment = h.step(methods.state, pick("Bitcoin")).await;
        let Screen::PaymentInstructions { order, currency } = payment.screen else {
            panic!("expected payment instructions");
        };
        assert_eq!(currency, "BTC");
        assert_eq!(order.price, 1100);
        assert_eq!(order.payment_amount, 550.0);
        assert_eq!(order.wallet_address, "bc1-wallet");
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.chat_id, 70);
        assert_eq!(
            payment.state,
            DialogueState::PaymentPending {
                order_id: order.order_id.clone(),
                payment_message_id: None,
            }
        );

        h.orders.transition_status(&order.order_id, OrderStatus::Paid).await.unwrap();
        let profile = h.users.get(7).await.unwrap().unwrap();
        assert_eq!(profile.total_spent, 1100);
        assert_eq!(profile.total_orders, 1);
        assert_eq!(profile.orders, vec![order.order_id]);
    }

    #[tokio::test]
    async fn test_prices_include_markup() {
        let h = harness().await;
        let prices = h.run(vec![pick("Moscow"), pick("p1")]).await;
        assert_eq!(
            prices.screen,
            Screen::Prices {
                product_name: "House blend".into(),
                tiers: vec![
                    PriceTier { label: "1g".into(), price: 1100 },
                    PriceTier { label: "2g".into(), price: 2090 },
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_city_search() {
        let h = harness().await;
        let prompt = h.run(vec![ShopAction::Search]).await;
        assert_eq!(prompt.screen, Screen::CitySearchPrompt { retry: false });

        let retry = h.step(prompt.state, ShopAction::Text("atlantis".into())).await;
        assert_eq!(retry.screen, Screen::CitySearchPrompt { retry: true });
        assert!(matches!(retry.state, DialogueState::SearchCity { .. }));

        let found = h.step(retry.state, ShopAction::Text(" MOS ".into())).await;
        assert_eq!(found.screen, Screen::CitySearchResults(vec!["Moscow".into()]));
        assert_eq!(found.state, DialogueState::SelectCity { page: 0 });

        let products = h.step(found.state, pick("Moscow")).await;
        assert!(matches!(products.state, DialogueState::SelectProduct { .. }));
    }

    #[tokio::test]
    async fn test_district_search_keeps_selections() {
        let h = harness().await;
        let districts = h.run(vec![pick("Moscow"), pick("p1"), pick("2g"), pick("1")]).await;
        let prompt = h.step(districts.state, ShopAction::Search).await;

        let retry = h.step(prompt.state, ShopAction::Text("harbor".into())).await;
        let DialogueState::SearchDistrict { item, .. } = &retry.state else {
            panic!("expected to stay in district search");
        };
        assert_eq!(item.product_type, "B");
        assert_eq!(item.item.price, 2090);

        let found = h.step(retry.state, ShopAction::Text("r".into())).await;
        assert_eq!(
            found.screen,
            Screen::DistrictSearchResults(vec!["Center".into(), "North".into(), "Riverside".into()])
        );
        let confirm = h.step(found.state, pick("North")).await;
        assert!(matches!(confirm.screen, Screen::Confirm(ref d) if d.district.as_deref() == Some("North")));
    }

    #[tokio::test]
    async fn test_back_chain_is_linear() {
        let h = harness().await;
        let mut transition = h.run(moscow_draft_actions()).await;

        let expected = [
            "SelectDistrict",
            "SelectType",
            "SelectPrice",
            "SelectProduct",
            "SelectCity",
            "Start",
        ];
        for name in expected {
            transition = h.step(transition.state, ShopAction::Back).await;
            assert!(format!("{:?}", transition.state).starts_with(name), "{:?}", transition.state);
        }
        assert_eq!(transition.screen, Screen::MainMenu);
    }

    #[tokio::test]
    async fn test_payment_back_returns_to_confirm_and_cancel_clears() {
        let h = harness().await;
        let confirm = h.run(moscow_draft_actions()).await;
        let methods = h.step(confirm.state.clone(), ShopAction::Confirm).await;

        let back = h.step(methods.state, ShopAction::Back).await;
        assert_eq!(back.state, confirm.state);

        let cancelled = h.step(back.state, ShopAction::Cancel).await;
        assert_eq!(cancelled.state, DialogueState::Start);
        assert_eq!(cancelled.screen, Screen::MainMenu);
    }

    #[tokio::test]
    async fn test_stale_selections_are_rejected() {
        let h = harness().await;
        let products = h.run(vec![pick("Moscow")]).await;

        let result = h.shop.handle(products.state.clone(), pick("p9"), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));

        let result = h
            .shop
            .handle(DialogueState::SelectCity { page: 0 }, pick("Atlantis"), &h.customer)
            .await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));

        let districts = h.run(vec![pick("Moscow"), pick("p1"), pick("1g"), pick("0")]).await;
        let result = h.shop.handle(districts.state.clone(), pick("Nowhere"), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));
        let result = h.shop.handle(districts.state, pick(NO_DISTRICT_KEY), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));

        let result = h.shop.handle(products.state, ShopAction::Confirm, &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));
    }

    #[tokio::test]
    async fn test_product_missing_in_small_city_is_stale() {
        let h = harness_with(knocked_out()).await;

        let products = h.run(vec![pick("Tver")]).await;
        let Screen::Products { products: listed, .. } = &products.screen else {
            panic!("expected products");
        };
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["!gift"]);

        let result = h.shop.handle(products.state, pick("p1"), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));
    }

    #[tokio::test]
    async fn test_knocked_out_weight_type_and_district_are_stale() {
        let h = harness_with(knocked_out()).await;
        let catalog = catalog();
        let all_weights: Vec<String> = catalog.product("p1").unwrap().prices.iter().map(|t| t.label.clone()).collect();

        let weights = h.availability.weights_for("Moscow", "p1").await;
        assert_eq!(weights.len(), 1);
        let kept_weight = weights[0].label.clone();
        let lost_weight = all_weights.iter().find(|label| **label != kept_weight).unwrap().clone();

        let prices = h.run(vec![pick("Moscow"), pick("p1")]).await;
        let result = h.shop.handle(prices.state.clone(), pick(&lost_weight), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));

        let types = h.step(prices.state, pick(&kept_weight)).await;
        let available_types = h.availability.types_for("Moscow", "p1").await;
        assert_eq!(available_types.len(), 1);
        let (kept_type, _) = available_types[0];
        let lost_type = 1 - kept_type;
        let result = h.shop.handle(types.state.clone(), pick(&lost_type.to_string()), &h.customer).await;
        assert!(matches!(result, Err(ShopError::StaleSelection)));

        let districts = h.step(types.state, pick(&kept_type.to_string())).await;
        assert!(h.availability.districts_for("Moscow").await.is_empty());
        for district in &catalog.city("Moscow").unwrap().districts {
            let result = h.shop.handle(districts.state.clone(), pick(district), &h.customer).await;
            assert!(matches!(result, Err(ShopError::StaleSelection)), "{district} should be masked");
        }

        let confirm = h.step(districts.state, pick(NO_DISTRICT_KEY)).await;
        assert!(matches!(confirm.screen, Screen::Confirm(ref d) if d.district.is_none()));
    }

    #[tokio::test]
    async fn test_actions_without_session_are_not_found() {
        let h = harness().await;
        let result = h.shop.handle(DialogueState::Start, ShopAction::Back, &h.customer).await;
        assert!(matches!(result, Err(ShopError::NotFound(_))));
        let result = h.shop.handle(DialogueState::AdminMenu { query: None }, pick("Moscow"), &h.customer).await;
        assert!(matches!(result, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_city_without_districts_offers_no_district() {
        let h = harness().await;
        let districts = h.run(vec![pick("Tver"), pick("!gift"), pick("card"), pick("1")]).await;
        assert_eq!(
            districts.screen,
            Screen::Districts(Paged {
                items: vec![],
                page: 0,
                total_pages: 1,
            })
        );

        let search = h.shop.handle(districts.state.clone(), ShopAction::Search, &h.customer).await;
        assert!(matches!(search, Err(ShopError::StaleSelection)));

        let confirm = h.step(districts.state, pick(NO_DISTRICT_KEY)).await;
        let Screen::Confirm(draft) = confirm.screen else {
            panic!("expected confirmation");
        };
        assert_eq!(draft.district, None);
        assert_eq!(draft.price(), 500);
    }

    #[tokio::test]
    async fn test_city_pages() {
        let h = harness().await;
        let second = h.run(vec![ShopAction::Page(1)]).await;
        let Screen::Cities(page) = second.screen else {
            panic!("expected cities");
        };
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 5);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(second.state, DialogueState::SelectCity { page: 1 });
    }

    #[tokio::test]
    async fn test_missing_wallet_creates_no_order() {
        let h = harness().await;
        let mut actions = moscow_draft_actions();
        actions.push(ShopAction::Confirm);
        let methods = h.run(actions).await;

        let result = h.shop.handle(methods.state, pick("Monero"), &h.customer).await;
        assert!(matches!(result, Err(ShopError::NoWalletConfigured(ref m)) if m == "Monero"));
        assert!(h.store.keys("order:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_from_payment() {
        let h = harness().await;
        let mut actions = moscow_draft_actions();
        actions.extend([ShopAction::Confirm, pick("Bitcoin")]);
        let pending = h.run(actions).await;
        let DialogueState::PaymentPending { order_id, .. } = pending.state.clone() else {
            panic!("expected pending payment");
        };

        let rendered = h.shop.render(&pending.state).await.unwrap();
        assert!(matches!(rendered, Screen::PaymentInstructions { ref order, .. } if order.order_id == order_id));

        let closed = h.step(pending.state, ShopAction::Cancel).await;
        assert_eq!(closed.state, DialogueState::Start);
        assert_eq!(
            closed.screen,
            Screen::PaymentClosed {
                order_id: order_id.clone(),
                status: OrderStatus::Cancelled,
            }
        );

        let profile = h.users.get(7).await.unwrap().unwrap();
        assert_eq!(profile.total_orders, 0);
        assert_eq!(profile.total_spent, 0);
    }

    #[tokio::test]
    async fn test_cancel_after_admin_paid_keeps_paid() {
        let h = harness().await;
        let mut actions = moscow_draft_actions();
        actions.extend([ShopAction::Confirm, pick("Bitcoin")]);
        let pending = h.run(actions).await;
        let DialogueState::PaymentPending { order_id, .. } = pending.state.clone() else {
            panic!("expected pending payment");
        };

        h.orders.transition_status(&order_id, OrderStatus::Paid).await.unwrap();
        let closed = h.step(pending.state, ShopAction::Cancel).await;
        assert!(matches!(closed.screen, Screen::PaymentClosed { status: OrderStatus::Paid, .. }));
        assert_eq!(h.users.get(7).await.unwrap().unwrap().total_orders, 1);
    }
}
