mod admin;
mod shop;

use teloxide::{
    adaptors::Throttle,
    dispatching::{UpdateFilterExt, UpdateHandler},
    dptree::{self},
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, Update},
    Bot,
};

use crate::{error::HandlerResult, service::dialogue::model::DialogueState, state::AppState};

use super::{flow::delete_quietly, keyboard::get_main_menu_keyboard, ShopDialogue};

pub fn get_message_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .branch(
            dptree::filter(|state: DialogueState| {
                matches!(
                    state,
                    DialogueState::SearchCity { .. } | DialogueState::SearchDistrict { .. }
                )
            })
            .endpoint(shop::handle_message_search),
        )
        .branch(
            dptree::case![DialogueState::AdminPassword { prompt_message_id }]
                .endpoint(admin::handle_message_admin_password),
        )
        .branch(
            dptree::case![DialogueState::AdminSearchOrders { prompt_message_id }]
                .endpoint(admin::handle_message_admin_search),
        )
        .branch(
            dptree::case![DialogueState::AdminSearchProfiles { prompt_message_id }]
                .endpoint(admin::handle_message_admin_profile_search),
        )
}

pub async fn handle_message_unknown(
    bot: Throttle<Bot>,
    message: Message,
    dialogue: ShopDialogue,
    state: DialogueState,
    app_state: AppState,
) -> HandlerResult<()> {
    delete_quietly(&bot, message.chat.id, message.id).await;
    bot.send_message(message.chat.id, t!("messages.unknown_message"))
        .reply_markup(get_main_menu_keyboard(&app_state.config.telegram.support_username))
        .await?;

    // A pending payment keeps its session so the order can still be cancelled.
    if !state.in_purchase_flow() {
        dialogue.update(DialogueState::Start).await?;
    }

    Ok(())
}
