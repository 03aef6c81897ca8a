mod model;

pub use model::*;

use std::{collections::HashSet, fs, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Failed to parse {0}: {1}")]
    Parse(String, serde_json::Error),
    #[error("Duplicate {0}: {1}")]
    Duplicate(&'static str, String),
    #[error("{0} name does not fit in callback data: {1}")]
    CallbackTooLong(&'static str, String),
}

/// Telegram rejects inline keyboard callback data above this many bytes.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// Prefix of the callback data that carries a catalog name as a choice key.
pub const CHOICE_PREFIX: &str = "shop:pick:";

fn check_callback_fit(kind: &'static str, name: &str) -> Result<(), CatalogError> {
    if CHOICE_PREFIX.len() + name.len() > MAX_CALLBACK_BYTES {
        return Err(CatalogError::CallbackTooLong(kind, name.to_string()));
    }
    Ok(())
}

/// Static storefront data. Immutable for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cities: Vec<City>,
    products: Vec<Product>,
    types: Vec<String>,
    payment_methods: Vec<PaymentMethod>,
}

impl Catalog {
    pub fn new(
        mut cities: Vec<City>,
        products: Vec<Product>,
        types: Vec<String>,
        payment_methods: Vec<PaymentMethod>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for city in &mut cities {
            if !seen.insert(city.name.clone()) {
                return Err(CatalogError::Duplicate("city", city.name.clone()));
            }
            check_callback_fit("city", &city.name)?;
            for district in &city.districts {
                check_callback_fit("district", district)?;
            }
            city.size = city.size.clamp(1, 3);
        }

        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::Duplicate("product", product.id.clone()));
            }
            check_callback_fit("product", &product.id)?;
            for tier in &product.prices {
                check_callback_fit("weight", &tier.label)?;
            }
        }

        for method in &payment_methods {
            check_callback_fit("payment method", &method.name)?;
        }

        Ok(Self {
            cities,
            products,
            types,
            payment_methods,
        })
    }

    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        info!("Loading catalog from {}", dir.display());
        let catalog = Self::new(
            read_json(&dir.join("cities.json"))?,
            read_json(&dir.join("products.json"))?,
            read_json(&dir.join("types.json"))?,
            read_json(&dir.join("payment.json"))?,
        )?;
        info!(
            "Catalog loaded: {} cities, {} products, {} types, {} payment methods",
            catalog.cities.len(),
            catalog.products.len(),
            catalog.types.len(),
            catalog.payment_methods.len()
        );
        Ok(catalog)
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.name == name)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn payment_method(&self, name: &str) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|method| method.name == name)
    }

    pub fn currency_for(&self, method: &str) -> &str {
        self.payment_method(method)
            .map(|method| method.currency.as_str())
            .unwrap_or("RUB")
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let name = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|e| CatalogError::Io(name.clone(), e))?;
    serde_json::from_str(&raw).map_err(|e| CatalogError::Parse(name, e))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn city(name: &str, size: u8, markup: f64, districts: &[&str]) -> City {
        City {
            name: name.to_string(),
            size,
            markup,
            districts: districts.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn product(id: &str, name: &str, prices: &[(&str, u64)]) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            prices: prices
                .iter()
                .map(|(label, price)| PriceTier {
                    label: label.to_string(),
                    price: *price,
                })
                .collect(),
        }
    }

    pub fn payment(name: &str, currency: &str, rate_id: Option<&str>, wallets: &[&str]) -> PaymentMethod {
        PaymentMethod {
            name: name.to_string(),
            currency: currency.to_string(),
            rate_id: rate_id.map(str::to_string),
            wallets: wallets.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// A catalog large enough for availability sampling to matter.
    pub fn storefront() -> Catalog {
        let products = (1..=10)
            .map(|i| {
                product(
                    &format!("p{i}"),
                    &format!("Blend {i}"),
                    &[("250g", 400 * i), ("500g", 750 * i), ("1kg", 1400 * i)],
                )
            })
            .chain([product("!gift", "Gift card", &[("card", 1000)])])
            .collect();

        Catalog::new(
            vec![
                city("Moscow", 3, 10.0, &["Center", "North", "South", "East", "West", "Riverside"]),
                city("Tver", 1, 0.0, &[]),
                city("Kazan", 2, 5.0, &["Old Town", "Harbor", "Hills"]),
            ],
            products,
            vec!["Whole bean".into(), "Ground".into(), "Espresso grind".into()],
            vec![
                payment("Bitcoin", "BTC", Some("bitcoin"), &["bc1-wallet-a", "bc1-wallet-b"]),
                payment("Card", "RUB", None, &["4000-0000"]),
                payment("Monero", "XMR", Some("monero"), &[]),
            ],
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_duplicate_city_rejected() {
        let result = Catalog::new(
            vec![city("Tver", 1, 0.0, &[]), city("Tver", 2, 0.0, &[])],
            vec![],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(CatalogError::Duplicate("city", _))));
    }

    #[test]
    fn test_names_must_fit_callback_data() {
        // Cyrillic letters take two bytes each.
        let longest = "Ж".repeat((MAX_CALLBACK_BYTES - CHOICE_PREFIX.len()) / 2);
        let too_long = format!("{longest}Ж");

        let fits = Catalog::new(vec![city(&longest, 1, 0.0, &[])], vec![], vec![], vec![]);
        assert!(fits.is_ok());

        let result = Catalog::new(vec![city(&too_long, 1, 0.0, &[])], vec![], vec![], vec![]);
        assert!(matches!(result, Err(CatalogError::CallbackTooLong("city", _))));

        let result = Catalog::new(vec![city("Tver", 1, 0.0, &[&too_long])], vec![], vec![], vec![]);
        assert!(matches!(result, Err(CatalogError::CallbackTooLong("district", _))));

        let result = Catalog::new(vec![], vec![], vec![], vec![payment(&too_long, "BTC", None, &[])]);
        assert!(matches!(result, Err(CatalogError::CallbackTooLong("payment method", _))));
    }

    #[test]
    fn test_size_is_clamped() {
        let catalog = Catalog::new(vec![city("Big", 9, 0.0, &[]), city("Tiny", 0, 0.0, &[])], vec![], vec![], vec![]).unwrap();
        assert_eq!(catalog.city("Big").unwrap().size, 3);
        assert_eq!(catalog.city("Tiny").unwrap().size, 1);
    }

    #[test]
    fn test_special_products_and_lookup() {
        let catalog = storefront();
        assert!(catalog.product("!gift").unwrap().is_special());
        assert!(!catalog.product("p1").unwrap().is_special());
        let p2 = catalog.product("p2").unwrap();
        assert!(p2.prices.iter().any(|tier| tier.label == "500g" && tier.price == 1500));
        assert_eq!(catalog.currency_for("Bitcoin"), "BTC");
        assert_eq!(catalog.currency_for("Unknown"), "RUB");
    }

    #[test]
    fn test_parse_city_defaults() {
        let cities: Vec<City> = serde_json::from_str(r#"[{"name": "Tver"}]"#).unwrap();
        assert_eq!(cities[0].size, 1);
        assert_eq!(cities[0].markup, 0.0);
        assert!(cities[0].districts.is_empty());
    }
}
