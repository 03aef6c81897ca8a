use teloxide::utils::html::{code_inline, escape};

use crate::service::{
    order::{Order, OrderPage, OrderStatus},
    pricing::{format_amount, format_price},
    shop::Screen,
    user::{ProfileEntry, ProfilePage, UserProfile},
};

use super::keyboard::profile_handle;

/// HTML body of a flow screen. Keyboards live in `keyboard`.
pub fn screen_text(screen: &Screen) -> String {
    let text = match screen {
        Screen::MainMenu => t!("menu.main"),
        Screen::Cities(paged) => t!(
            "shop.cities.title",
            page = paged.page + 1,
            total = paged.total_pages
        ),
        Screen::CitySearchPrompt { retry: false } => t!("shop.cities.search_prompt"),
        Screen::CitySearchPrompt { retry: true } => t!("shop.cities.search_retry"),
        Screen::CitySearchResults(found) => t!("shop.cities.search_results", count = found.len()),
        Screen::Products { city, .. } => t!("shop.products.title", city = escape(city)),
        Screen::Prices { product_name, .. } => t!("shop.prices.title", product = escape(product_name)),
        Screen::Types { product_name, .. } => t!("shop.types.title", product = escape(product_name)),
        Screen::Districts(paged) if paged.items.is_empty() => t!("shop.districts.none"),
        Screen::Districts(paged) => t!(
            "shop.districts.title",
            page = paged.page + 1,
            total = paged.total_pages
        ),
        Screen::DistrictSearchPrompt { retry: false } => t!("shop.districts.search_prompt"),
        Screen::DistrictSearchPrompt { retry: true } => t!("shop.districts.search_retry"),
        Screen::DistrictSearchResults(found) => t!("shop.districts.search_results", count = found.len()),
        Screen::Confirm(draft) => t!(
            "shop.confirm",
            city = escape(draft.city()),
            product = escape(draft.product_name()),
            weight = escape(draft.weight()),
            kind = escape(draft.product_type()),
            district = district_label(draft.district.as_deref()),
            price = format_price(draft.price())
        ),
        Screen::PaymentMethods(_) => t!("shop.payment_methods"),
        Screen::PaymentInstructions { order, currency } => t!(
            "payment.instructions",
            order_id = order.order_id,
            contents = order_contents(order),
            price = format_price(order.price),
            amount = format_amount(order.payment_amount),
            currency = escape(currency),
            method = escape(&order.payment_method),
            wallet = code_inline(&order.wallet_address)
        ),
        Screen::PaymentClosed {
            order_id,
            status: OrderStatus::Cancelled,
        } => t!("payment.cancelled", order_id = order_id),
        Screen::PaymentClosed { order_id, status } => t!(
            "payment.closed",
            order_id = order_id,
            status = status_label(*status)
        ),
    };

    text.to_string()
}

pub fn district_label(district: Option<&str>) -> String {
    match district {
        Some(district) => escape(district),
        None => t!("shop.districts.no_district").to_string(),
    }
}

pub fn status_label(status: OrderStatus) -> String {
    match status {
        OrderStatus::Created => t!("orders.status.created"),
        OrderStatus::Paid => t!("orders.status.paid"),
        OrderStatus::Cancelled => t!("orders.status.cancelled"),
    }
    .to_string()
}

fn order_contents(order: &Order) -> String {
    format!(
        "{}, {}, {} ({}, {})",
        escape(&order.product),
        escape(&order.weight),
        escape(&order.product_type),
        escape(&order.city),
        district_label(order.district.as_deref())
    )
}

pub fn profile_text(profile: &UserProfile) -> String {
    t!(
        "profile.summary",
        name = escape(&profile.full_name),
        total_orders = profile.total_orders,
        total_spent = format_price(profile.total_spent),
        since = profile.registration_date.format("%d.%m.%Y")
    )
    .to_string()
}

pub fn history_text(orders: &[Order]) -> String {
    if orders.is_empty() {
        return t!("history.empty").to_string();
    }

    let lines: Vec<String> = orders
        .iter()
        .map(|order| {
            t!(
                "history.line",
                order_id = order.order_id,
                date = order.date.format("%d.%m.%Y"),
                contents = order_contents(order),
                price = format_price(order.price),
                status = status_label(order.status)
            )
            .to_string()
        })
        .collect();

    format!("{}\n\n{}", t!("history.title"), lines.join("\n\n"))
}

pub fn order_list_text(page: &OrderPage, query: Option<&str>) -> String {
    let header = match query {
        Some(query) => t!("admin.orders.search_title", query = escape(query), total = page.total),
        None => t!("admin.orders.title", total = page.total),
    };

    if page.orders.is_empty() {
        return format!("{}\n\n{}", header, t!("admin.orders.empty"));
    }

    format!(
        "{}\n{}",
        header,
        t!(
            "admin.orders.page",
            page = page.page + 1,
            total = page.total_pages
        )
    )
}

pub fn order_details_text(order: &Order) -> String {
    t!(
        "admin.order.details",
        order_id = order.order_id,
        status = status_label(order.status),
        username = escape(order.username.as_deref().unwrap_or("-")),
        user_id = order.user_id,
        contents = order_contents(order),
        price = format_price(order.price),
        amount = format_amount(order.payment_amount),
        method = escape(&order.payment_method),
        wallet = code_inline(&order.wallet_address),
        date = order.date.format("%d.%m.%Y %H:%M"),
        updated = order.updated.format("%d.%m.%Y %H:%M")
    )
    .to_string()
}

pub fn profile_list_text(page: &ProfilePage, query: Option<&str>) -> String {
    let header = match query {
        Some(query) => t!("admin.profiles.search_title", query = escape(query), total = page.total),
        None => t!("admin.profiles.title", total = page.total),
    };

    if page.profiles.is_empty() {
        return format!("{}\n\n{}", header, t!("admin.orders.empty"));
    }

    format!(
        "{}\n{}",
        header,
        t!(
            "admin.orders.page",
            page = page.page + 1,
            total = page.total_pages
        )
    )
}

pub fn profile_details_text(entry: &ProfileEntry) -> String {
    let name = if entry.profile.full_name.is_empty() {
        "-".to_string()
    } else {
        escape(&entry.profile.full_name)
    };

    t!(
        "admin.profile.details",
        handle = escape(&profile_handle(entry)),
        user_id = entry.user_id,
        name = name,
        total_orders = entry.profile.total_orders,
        total_spent = format_price(entry.profile.total_spent),
        since = entry.profile.registration_date.format("%d.%m.%Y %H:%M")
    )
    .to_string()
}
