use teloxide::{
    adaptors::Throttle,
    types::{MaybeInaccessibleMessage, User},
    Bot,
};

use crate::{
    error::HandlerResult,
    handler::{
        flow::{run_shop_action, Target},
        ShopDialogue,
    },
    service::{
        dialogue::model::DialogueState,
        shop::{Customer, ShopAction},
    },
    state::AppState,
};

pub(super) async fn handle_callback_shop(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    state: DialogueState,
    app_state: &AppState,
    user: &User,
    message: MaybeInaccessibleMessage,
    data: &str,
) -> HandlerResult<Option<String>> {
    let Some(action) = ShopAction::parse(data) else {
        warn!("Malformed shop callback: {}", data);
        return Ok(Some(t!("errors.unknown_action").to_string()));
    };

    let chat_id = message.chat().id;
    let customer = Customer {
        user_id: user.id.0,
        chat_id: chat_id.0,
        username: user.username.clone(),
    };
    let target = Target {
        chat_id,
        message_id: Some(message.id()),
    };

    run_shop_action(bot, dialogue, app_state, state, target, &customer, action).await
}
