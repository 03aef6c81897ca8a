use teloxide::{adaptors::Throttle, types::MaybeInaccessibleMessage, Bot};

use crate::{
    error::HandlerResult,
    handler::{
        flow::{delete_quietly, present, Target},
        ShopDialogue,
    },
    service::{dialogue::model::DialogueState, shop::Screen},
    state::AppState,
};

pub(super) async fn handle_callback_back_to_main_menu(
    bot: &Throttle<Bot>,
    dialogue: &ShopDialogue,
    state: DialogueState,
    app_state: &AppState,
    message: MaybeInaccessibleMessage,
) -> HandlerResult<Option<String>> {
    let chat_id = message.chat().id;

    if let Some(tracked) = state.tracked_message().map(teloxide::types::MessageId) {
        if tracked != message.id() {
            delete_quietly(bot, chat_id, tracked).await;
        }
    }

    let target = Target {
        chat_id,
        message_id: Some(message.id()),
    };
    present(bot, target, &Screen::MainMenu, &app_state.config.telegram.support_username).await?;

    dialogue.update(DialogueState::Start).await?;

    Ok(None)
}
