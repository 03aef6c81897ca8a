use teloxide::{
    adaptors::Throttle,
    types::{MaybeInaccessibleMessage, User},
    Bot,
};

use crate::{
    error::HandlerResult,
    handler::{
        flow::{edit_or_send, Target},
        keyboard::get_back_to_main_menu_keyboard,
        view::{history_text, profile_text},
    },
    state::AppState,
};

fn target_of(message: &MaybeInaccessibleMessage) -> Target {
    Target {
        chat_id: message.chat().id,
        message_id: Some(message.id()),
    }
}

pub(super) async fn handle_callback_profile(
    bot: &Throttle<Bot>,
    app_state: &AppState,
    user: &User,
    message: MaybeInaccessibleMessage,
) -> HandlerResult<Option<String>> {
    let profile = app_state.service_registry.users.get_or_default(user.id.0).await?;

    edit_or_send(
        bot,
        target_of(&message),
        profile_text(&profile),
        get_back_to_main_menu_keyboard(),
    )
    .await?;

    Ok(None)
}

/// Recent orders, newest first.
pub(super) async fn handle_callback_history(
    bot: &Throttle<Bot>,
    app_state: &AppState,
    user: &User,
    message: MaybeInaccessibleMessage,
) -> HandlerResult<Option<String>> {
    let mut orders = app_state.service_registry.orders.list_for_user(user.id.0).await?;
    orders.reverse();

    edit_or_send(
        bot,
        target_of(&message),
        history_text(&orders),
        get_back_to_main_menu_keyboard(),
    )
    .await?;

    Ok(None)
}
