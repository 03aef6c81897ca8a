use teloxide::{
    adaptors::Throttle,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, MessageId},
    Bot,
};

use crate::{
    error::HandlerResult,
    handler::{
        admin::{show_admin_menu, show_order_list, show_profile_list},
        flow::{delete_quietly, Target},
        keyboard::get_main_menu_keyboard,
        report_failure, ShopDialogue,
    },
    service::dialogue::model::DialogueState,
    state::AppState,
};

async fn clear_prompt(bot: &Throttle<Bot>, msg: &Message, prompt_message_id: Option<i32>) {
    delete_quietly(bot, msg.chat.id, msg.id).await;
    if let Some(prompt) = prompt_message_id {
        delete_quietly(bot, msg.chat.id, MessageId(prompt)).await;
    }
}

pub(super) async fn handle_message_admin_password(
    bot: Throttle<Bot>,
    dialogue: ShopDialogue,
    app_state: AppState,
    msg: Message,
    prompt_message_id: Option<i32>,
) -> HandlerResult<()> {
    clear_prompt(&bot, &msg, prompt_message_id).await;

    let admin = &app_state.config.admin;
    let username = msg.from.as_ref().and_then(|user| user.username.as_deref());
    let target = Target {
        chat_id: msg.chat.id,
        message_id: None,
    };

    if admin.is_admin_login(username) && msg.text() == Some(admin.password.as_str()) {
        info!("Administrator {} logged in", username.unwrap_or_default());
        dialogue.update(DialogueState::AdminMenu { query: None }).await?;
        show_admin_menu(&bot, target).await?;
        return Ok(());
    }

    warn!("Rejected admin password from chat {}", msg.chat.id);
    dialogue.update(DialogueState::Start).await?;
    bot.send_message(msg.chat.id, t!("admin.wrong_password"))
        .reply_markup(get_main_menu_keyboard(&app_state.config.telegram.support_username))
        .await?;

    Ok(())
}

fn search_query(msg: &Message) -> Option<String> {
    msg.text().map(str::trim).filter(|q| !q.is_empty()).map(str::to_string)
}

pub(super) async fn handle_message_admin_search(
    bot: Throttle<Bot>,
    dialogue: ShopDialogue,
    app_state: AppState,
    msg: Message,
    prompt_message_id: Option<i32>,
) -> HandlerResult<()> {
    clear_prompt(&bot, &msg, prompt_message_id).await;

    let query = search_query(&msg);
    dialogue
        .update(DialogueState::AdminMenu { query: query.clone() })
        .await?;

    let target = Target {
        chat_id: msg.chat.id,
        message_id: None,
    };
    if let Err(e) = show_order_list(&bot, &app_state, target, 0, query.as_deref()).await {
        report_failure(&bot, msg.chat.id, "Order search", e.as_ref()).await;
    }

    Ok(())
}

pub(super) async fn handle_message_admin_profile_search(
    bot: Throttle<Bot>,
    dialogue: ShopDialogue,
    app_state: AppState,
    msg: Message,
    prompt_message_id: Option<i32>,
) -> HandlerResult<()> {
    clear_prompt(&bot, &msg, prompt_message_id).await;

    let query = search_query(&msg);
    dialogue
        .update(DialogueState::AdminProfiles { query: query.clone() })
        .await?;

    let target = Target {
        chat_id: msg.chat.id,
        message_id: None,
    };
    if let Err(e) = show_profile_list(&bot, &app_state, target, 0, query.as_deref()).await {
        report_failure(&bot, msg.chat.id, "Profile search", e.as_ref()).await;
    }

    Ok(())
}
