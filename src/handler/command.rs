use teloxide::adaptors::Throttle;
use teloxide::dispatching::{HandlerExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use teloxide::utils::html::escape;
use teloxide::{types::Message, Bot};

use crate::command::Command;
use crate::error::HandlerResult;
use crate::service::dialogue::model::DialogueState;
use crate::state::AppState;

use super::flow::delete_quietly;
use super::keyboard::get_main_menu_keyboard;
use super::{report_failure, ShopDialogue};

async fn handle_start(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    state: DialogueState,
    app_state: &AppState,
    msg: &Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    delete_quietly(bot, msg.chat.id, msg.id).await;
    if let Some(tracked) = state.tracked_message() {
        delete_quietly(bot, msg.chat.id, MessageId(tracked)).await;
    }

    let username = user.username.clone().unwrap_or_default();
    app_state
        .service_registry
        .users
        .register(user.id.0, &username, &user.full_name())
        .await?;

    info!("User {} (@{}) started the bot", user.id, username);

    if app_state.config.admin.is_admin_login(user.username.as_deref()) {
        let prompt = bot.send_message(msg.chat.id, t!("admin.password_prompt")).await?;
        dialogue
            .update(DialogueState::AdminPassword {
                prompt_message_id: Some(prompt.id.0),
            })
            .await?;
        return Ok(());
    }

    dialogue.update(DialogueState::Start).await?;

    bot.send_message(
        msg.chat.id,
        t!("commands.start", first_name = escape(&user.first_name)),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(get_main_menu_keyboard(&app_state.config.telegram.support_username))
    .await?;

    Ok(())
}

async fn handle_help(bot: &Throttle<Bot>, app_state: &AppState, msg: &Message) -> HandlerResult<()> {
    delete_quietly(bot, msg.chat.id, msg.id).await;
    bot.send_message(msg.chat.id, t!("commands.help"))
        .reply_markup(get_main_menu_keyboard(&app_state.config.telegram.support_username))
        .await?;

    Ok(())
}

async fn handle_command(
    bot: Throttle<Bot>,
    msg: Message,
    cmd: Command,
    dialogue: ShopDialogue,
    state: DialogueState,
    app_state: AppState,
) -> HandlerResult<()> {
    let result = match cmd {
        Command::Start => handle_start(&bot, &dialogue, state, &app_state, &msg).await,
        Command::Help => handle_help(&bot, &app_state, &msg).await,
    };

    if let Err(e) = result {
        report_failure(&bot, msg.chat.id, "Command", e.as_ref()).await;
    }

    Ok(())
}

pub fn get_command_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}
