use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Parameters of the stock simulation draw.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityPolicy {
    /// Fraction of regular products available, indexed by city size tier 1..=3.
    pub density_by_size: [(f64, f64); 3],
    pub weight_knockout_probability: f64,
    pub type_knockout_probability: f64,
    pub unavailable_district_fraction: (f64, f64),
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            density_by_size: [(0.3, 0.4), (0.5, 0.6), (0.7, 0.8)],
            weight_knockout_probability: 0.5,
            type_knockout_probability: 0.3,
            unavailable_district_fraction: (0.3, 0.5),
        }
    }
}

impl AvailabilityPolicy {
    pub fn density_for(&self, size: u8) -> (f64, f64) {
        let tier = usize::from(size.clamp(1, 3)) - 1;
        self.density_by_size[tier]
    }
}

/// What a single city cannot sell until the next regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMask {
    pub unavailable_products: HashSet<String>,
    /// At most one weight label per product.
    pub unavailable_weights: HashMap<String, String>,
    /// At most one type index per product.
    pub unavailable_types: HashMap<String, usize>,
    pub unavailable_districts: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    pub generated_at: DateTime<Utc>,
    pub masks: HashMap<String, AvailabilityMask>,
}
