use crate::{
    catalog::{PriceTier, Product},
    service::{
        dialogue::model::OrderDraft,
        order::{Order, OrderStatus},
    },
};

/// One page of a longer listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

impl<T: Clone> Paged<T> {
    /// `page` is clamped to the last page; an empty list has one empty page.
    pub fn of(all: &[T], page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = all.len().div_ceil(page_size).max(1);
        let page = page.min(total_pages - 1);
        let items = all.iter().skip(page * page_size).take(page_size).cloned().collect();

        Self {
            items,
            page,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// What the customer should see after a step. Rendering into messages and
/// keyboards is up to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    MainMenu,
    Cities(Paged<String>),
    CitySearchPrompt {
        retry: bool,
    },
    CitySearchResults(Vec<String>),
    Products {
        city: String,
        products: Vec<Product>,
    },
    /// Tier prices already include the city markup.
    Prices {
        product_name: String,
        tiers: Vec<PriceTier>,
    },
    Types {
        product_name: String,
        types: Vec<(usize, String)>,
    },
    /// An empty page means the only option is "no district".
    Districts(Paged<String>),
    DistrictSearchPrompt {
        retry: bool,
    },
    DistrictSearchResults(Vec<String>),
    Confirm(OrderDraft),
    PaymentMethods(Vec<String>),
    PaymentInstructions {
        order: Order,
        currency: String,
    },
    PaymentClosed {
        order_id: String,
        status: OrderStatus,
    },
}
