use teloxide::{adaptors::Throttle, types::MessageId, Bot};

use crate::{
    error::HandlerResult,
    service::{order::Order, user::ProfileEntry},
    state::AppState,
};

use super::{
    flow::{edit_or_send, Target},
    keyboard::{
        get_admin_menu_keyboard, get_admin_order_keyboard, get_admin_orders_keyboard, get_admin_profile_keyboard,
        get_admin_profiles_keyboard,
    },
    view::{order_details_text, order_list_text, profile_details_text, profile_list_text},
};

pub const ADMIN_PAGE_SIZE: usize = 10;

pub async fn show_admin_menu(bot: &Throttle<Bot>, target: Target) -> HandlerResult<MessageId> {
    edit_or_send(bot, target, t!("admin.menu").to_string(), get_admin_menu_keyboard()).await
}

pub async fn show_order_list(
    bot: &Throttle<Bot>,
    app_state: &AppState,
    target: Target,
    page: usize,
    query: Option<&str>,
) -> HandlerResult<MessageId> {
    let page = app_state
        .service_registry
        .orders
        .search(page, ADMIN_PAGE_SIZE, query)
        .await?;

    edit_or_send(
        bot,
        target,
        order_list_text(&page, query),
        get_admin_orders_keyboard(&page),
    )
    .await
}

pub async fn show_order_detail(bot: &Throttle<Bot>, target: Target, order: &Order) -> HandlerResult<MessageId> {
    edit_or_send(bot, target, order_details_text(order), get_admin_order_keyboard(order)).await
}

pub async fn show_profile_list(
    bot: &Throttle<Bot>,
    app_state: &AppState,
    target: Target,
    page: usize,
    query: Option<&str>,
) -> HandlerResult<MessageId> {
    let page = app_state
        .service_registry
        .users
        .search(page, ADMIN_PAGE_SIZE, query)
        .await?;

    edit_or_send(
        bot,
        target,
        profile_list_text(&page, query),
        get_admin_profiles_keyboard(&page, query.is_some()),
    )
    .await
}

pub async fn show_profile_detail(bot: &Throttle<Bot>, target: Target, entry: &ProfileEntry) -> HandlerResult<MessageId> {
    edit_or_send(bot, target, profile_details_text(entry), get_admin_profile_keyboard()).await
}
