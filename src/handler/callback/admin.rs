use teloxide::{
    adaptors::Throttle,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, MaybeInaccessibleMessage, MessageId},
    Bot,
};

use crate::{
    error::HandlerResult,
    handler::{
        admin::{show_admin_menu, show_order_detail, show_order_list, show_profile_detail, show_profile_list},
        flow::{delete_quietly, edit_or_send, present, Target},
        keyboard::{get_admin_back_keyboard, get_back_to_main_menu_keyboard},
        ShopDialogue,
    },
    service::{
        dialogue::model::DialogueState,
        order::{Order, OrderStatus},
        shop::Screen,
        user::ProfileEntry,
    },
    state::AppState,
};

pub(super) async fn handle_callback_admin(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    state: DialogueState,
    app_state: &AppState,
    message: MaybeInaccessibleMessage,
    data: &str,
) -> HandlerResult<Option<String>> {
    let (query, profile_query) = match state {
        DialogueState::AdminMenu { query } => (query, None),
        DialogueState::AdminProfiles { query } => (None, query),
        DialogueState::AdminSearchOrders { .. } | DialogueState::AdminSearchProfiles { .. } => (None, None),
        _ => {
            warn!("Admin callback {} outside of an admin session", data);
            return Ok(Some(t!("admin.not_authorized").to_string()));
        }
    };

    let target = Target {
        chat_id: message.chat().id,
        message_id: Some(message.id()),
    };

    let mut parts = data.splitn(3, ':').skip(1);
    match (parts.next(), parts.next()) {
        (Some("menu"), None) => {
            dialogue.update(DialogueState::AdminMenu { query: None }).await?;
            show_admin_menu(bot, target).await?;
        }
        (Some("all"), None) => {
            dialogue.update(DialogueState::AdminMenu { query: None }).await?;
            show_order_list(bot, app_state, target, 0, None).await?;
        }
        (Some("orders"), Some(page)) => {
            let page = page.parse().unwrap_or(0);
            show_order_list(bot, app_state, target, page, query.as_deref()).await?;
        }
        (Some("search"), None) => {
            let prompt = edit_or_send(
                bot,
                target,
                t!("admin.search_prompt").to_string(),
                get_admin_back_keyboard(),
            )
            .await?;
            dialogue
                .update(DialogueState::AdminSearchOrders {
                    prompt_message_id: Some(prompt.0),
                })
                .await?;
        }
        (Some("order"), Some(order_id)) => {
            let Some(order) = app_state.service_registry.orders.get_order(order_id).await? else {
                return Ok(Some(t!("admin.order_not_found", order_id = order_id).to_string()));
            };
            show_order_detail(bot, target, &order).await?;
        }
        (Some("users"), None) => {
            dialogue.update(DialogueState::AdminProfiles { query: None }).await?;
            show_profile_list(bot, app_state, target, 0, None).await?;
        }
        (Some("profiles"), Some(page)) => {
            let page = page.parse().unwrap_or(0);
            dialogue
                .update(DialogueState::AdminProfiles {
                    query: profile_query.clone(),
                })
                .await?;
            show_profile_list(bot, app_state, target, page, profile_query.as_deref()).await?;
        }
        (Some("find_profiles"), None) => {
            let prompt = edit_or_send(
                bot,
                target,
                t!("admin.profile_search_prompt").to_string(),
                get_admin_back_keyboard(),
            )
            .await?;
            dialogue
                .update(DialogueState::AdminSearchProfiles {
                    prompt_message_id: Some(prompt.0),
                })
                .await?;
        }
        (Some("profile"), Some(user_id)) => {
            let profile = match user_id.parse::<u64>() {
                Ok(id) => app_state.service_registry.users.get(id).await?.map(|profile| ProfileEntry {
                    user_id: id,
                    profile,
                }),
                Err(_) => None,
            };
            let Some(entry) = profile else {
                return Ok(Some(t!("admin.profile_not_found", user_id = user_id).to_string()));
            };
            show_profile_detail(bot, target, &entry).await?;
        }
        (Some("pay"), Some(order_id)) => {
            return change_status(bot, app_state, target, order_id, OrderStatus::Paid).await;
        }
        (Some("cancel"), Some(order_id)) => {
            return change_status(bot, app_state, target, order_id, OrderStatus::Cancelled).await;
        }
        (Some("exit"), None) => {
            info!("Administrator left the admin menu");
            dialogue.update(DialogueState::Start).await?;
            present(bot, target, &Screen::MainMenu, &app_state.config.telegram.support_username).await?;
        }
        _ => {
            warn!("Unknown admin callback: {}", data);
            return Ok(Some(t!("errors.unknown_action").to_string()));
        }
    }

    Ok(None)
}

async fn change_status(
    bot: &Throttle<Bot>,
    app_state: &AppState,
    target: Target,
    order_id: &str,
    status: OrderStatus,
) -> HandlerResult<Option<String>> {
    let orders = &app_state.service_registry.orders;

    let Some(current) = orders.get_order(order_id).await? else {
        return Ok(Some(t!("admin.order_not_found", order_id = order_id).to_string()));
    };
    if current.status != OrderStatus::Created {
        show_order_detail(bot, target, &current).await?;
        return Ok(Some(t!("admin.order_already_closed", order_id = order_id).to_string()));
    }

    let order = orders.transition_status(order_id, status).await?;
    info!("Administrator set order {} to {}", order.order_id, order.status);

    notify_customer(bot, &order).await;
    show_order_detail(bot, target, &order).await?;

    Ok(None)
}

/// The customer's session is not consulted: the notification goes straight
/// to the chat the order was placed from.
async fn notify_customer(bot: &Throttle<Bot>, order: &Order) {
    let chat_id = ChatId(order.chat_id);

    if let Some(message_id) = order.payment_message_id {
        delete_quietly(bot, chat_id, MessageId(message_id)).await;
    }

    let text = match order.status {
        OrderStatus::Paid => t!("notifications.paid", order_id = order.order_id),
        OrderStatus::Cancelled => t!("notifications.cancelled", order_id = order.order_id),
        OrderStatus::Created => return,
    };

    if let Err(e) = bot
        .send_message(chat_id, text)
        .reply_markup(get_back_to_main_menu_keyboard())
        .await
    {
        warn!("Failed to notify chat {} about order {}: {}", chat_id, order.order_id, e);
    }
}
