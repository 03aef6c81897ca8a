mod admin;
mod navigation;
mod profile;
mod shop;

use crate::{
    error::{BotError, HandlerResult},
    service::dialogue::model::DialogueState,
    state::AppState,
};

use teloxide::{
    adaptors::Throttle,
    dispatching::UpdateHandler,
    prelude::*,
    types::{CallbackQuery, MaybeInaccessibleMessage},
};

use super::ShopDialogue;

async fn route_callback(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    state: DialogueState,
    app_state: &AppState,
    q: &CallbackQuery,
    message: MaybeInaccessibleMessage,
    data: &str,
) -> HandlerResult<Option<String>> {
    let alert = match data {
        // purchase flow
        s if s.starts_with("shop:") => shop::handle_callback_shop(bot, dialogue, state, app_state, &q.from, message, s).await?,

        // profile
        "menu:profile" => profile::handle_callback_profile(bot, app_state, &q.from, message).await?,
        "menu:history" => profile::handle_callback_history(bot, app_state, &q.from, message).await?,

        // navigation
        "menu:main" => navigation::handle_callback_back_to_main_menu(bot, dialogue, state, app_state, message).await?,

        // administration
        s if s.starts_with("admin:") => admin::handle_callback_admin(bot, dialogue, state, app_state, message, s).await?,

        other => {
            warn!("Unknown callback data: {}", other);
            Some(t!("errors.unknown_action").to_string())
        }
    };

    Ok(alert)
}

async fn handle_callback(
    bot: Throttle<Bot>,
    dialogue: ShopDialogue,
    state: DialogueState,
    app_state: AppState,
    q: CallbackQuery,
) -> HandlerResult<()> {
    let data = q
        .data
        .clone()
        .ok_or_else(|| BotError::DialogueStateError("No callback data".into()))?;

    let message = q
        .message
        .clone()
        .ok_or_else(|| BotError::DialogueStateError("No message".into()))?;

    let alert = match route_callback(&bot, &dialogue, state, &app_state, &q, message, &data).await {
        Ok(alert) => alert,
        Err(e) => {
            error!("Callback {} from user {} failed: {}", data, q.from.id, e);
            Some(t!("errors.try_again").to_string())
        }
    };

    match alert {
        Some(text) => bot.answer_callback_query(&q.id).text(text).show_alert(true).await?,
        None => bot.answer_callback_query(&q.id).cache_time(1).await?,
    };

    Ok(())
}

pub fn get_callback_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_callback_query().endpoint(handle_callback)
}
