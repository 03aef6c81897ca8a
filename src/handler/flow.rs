use teloxide::{
    adaptors::Throttle,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode},
    ApiError, Bot, RequestError,
};

use crate::{
    error::HandlerResult,
    service::{
        dialogue::model::DialogueState,
        shop::{Customer, Screen, ShopAction, ShopError, Transition},
    },
    state::AppState,
};

use super::{keyboard::get_screen_keyboard, view::screen_text, ShopDialogue};

/// Where the next screen goes: the message to edit, or a fresh one.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub chat_id: ChatId,
    pub message_id: Option<MessageId>,
}

pub async fn delete_quietly(bot: &Throttle<Bot>, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, message_id).await {
        warn!("Failed to delete message {} in chat {}: {}", message_id.0, chat_id, e);
    }
}

pub async fn edit_or_send(
    bot: &Throttle<Bot>,
    target: Target,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> HandlerResult<MessageId> {
    if let Some(message_id) = target.message_id {
        match bot
            .edit_message_text(target.chat_id, message_id, text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(message_id),
            Err(e) => warn!("Failed to edit message {}, sending a new one: {}", message_id.0, e),
        }
    }

    let sent = bot
        .send_message(target.chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;

    Ok(sent.id)
}

/// Payment instructions always arrive as a new message so its id can be
/// stored with the order.
pub async fn present(
    bot: &Throttle<Bot>,
    target: Target,
    screen: &Screen,
    support_username: &str,
) -> HandlerResult<MessageId> {
    let target = match (screen, target.message_id) {
        (Screen::PaymentInstructions { .. }, Some(message_id)) => {
            delete_quietly(bot, target.chat_id, message_id).await;
            Target {
                message_id: None,
                ..target
            }
        }
        _ => target,
    };

    edit_or_send(
        bot,
        target,
        screen_text(screen),
        get_screen_keyboard(screen, support_username),
    )
    .await
}

/// Runs one action through the shop and shows the outcome. Returns the alert
/// to surface to the user when the action could not be applied.
pub async fn run_shop_action(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    app_state: &AppState,
    current: DialogueState,
    target: Target,
    customer: &Customer,
    action: ShopAction,
) -> HandlerResult<Option<String>> {
    let shop = &app_state.service_registry.shop;
    let support_username = &app_state.config.telegram.support_username;

    match shop.handle(current.clone(), action, customer).await {
        Ok(Transition { state, screen }) => {
            if let Some(tracked) = current.tracked_message().map(MessageId) {
                if target.message_id != Some(tracked) {
                    delete_quietly(bot, target.chat_id, tracked).await;
                }
            }

            let message_id = present(bot, target, &screen, support_username).await?;

            if let Screen::PaymentInstructions { order, .. } = &screen {
                if let Err(e) = app_state
                    .service_registry
                    .orders
                    .attach_payment_message(&order.order_id, message_id.0)
                    .await
                {
                    warn!("Failed to attach payment message to order {}: {}", order.order_id, e);
                }
            }

            dialogue.update(state.attach_message(message_id.0)).await?;
            Ok(None)
        }
        Err(ShopError::StaleSelection) => {
            info!("User {} picked an option that is no longer available", customer.user_id);
            match shop.render(&current).await {
                Ok(screen) => {
                    present(bot, target, &screen, support_username).await?;
                }
                Err(e) => warn!("Failed to re-render step for user {}: {}", customer.user_id, e),
            }
            Ok(Some(t!("errors.stale_selection").to_string()))
        }
        Err(ShopError::NotFound(what)) => {
            warn!("User {}: {} not found, returning to main menu", customer.user_id, what);
            dialogue.update(DialogueState::Start).await?;
            present(bot, target, &Screen::MainMenu, support_username).await?;
            Ok(Some(t!("errors.not_found").to_string()))
        }
        Err(ShopError::NoWalletConfigured(method)) => {
            warn!("Payment method {} has no wallets configured", method);
            Ok(Some(t!("errors.no_wallet", method = method).to_string()))
        }
        Err(ShopError::PersistenceFailure(reason)) => {
            error!("Failed to persist order for user {}: {}", customer.user_id, reason);
            Ok(Some(t!("errors.try_again").to_string()))
        }
    }
}
