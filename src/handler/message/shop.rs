use teloxide::{adaptors::Throttle, prelude::Requester, types::Message, Bot};

use crate::{
    error::HandlerResult,
    handler::{
        flow::{delete_quietly, run_shop_action, Target},
        report_failure, ShopDialogue,
    },
    service::{
        dialogue::model::DialogueState,
        shop::{Customer, ShopAction},
    },
    state::AppState,
};

/// Free text typed while a city or district search prompt is open.
pub(super) async fn handle_message_search(
    bot: Throttle<Bot>,
    dialogue: ShopDialogue,
    state: DialogueState,
    app_state: AppState,
    msg: Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    delete_quietly(&bot, msg.chat.id, msg.id).await;

    let query = msg.text().unwrap_or_default().to_string();
    let customer = Customer {
        user_id: user.id.0,
        chat_id: msg.chat.id.0,
        username: user.username.clone(),
    };
    let target = Target {
        chat_id: msg.chat.id,
        message_id: None,
    };

    match run_shop_action(&bot, &dialogue, &app_state, state, target, &customer, ShopAction::Text(query)).await {
        Ok(Some(alert)) => {
            bot.send_message(msg.chat.id, alert).await?;
        }
        Ok(None) => {}
        Err(e) => report_failure(&bot, msg.chat.id, "Search", e.as_ref()).await,
    }

    Ok(())
}
