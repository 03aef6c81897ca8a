mod admin;
mod callback;
mod command;
mod flow;
mod keyboard;
mod message;
mod view;

use callback::get_callback_handler;
use command::get_command_handler;
use message::{get_message_handler, handle_message_unknown};
use teloxide::{
    adaptors::Throttle,
    dispatching::{
        dialogue::{self, ErasedStorage},
        UpdateFilterExt, UpdateHandler,
    },
    prelude::{Dialogue, Requester},
    types::{ChatId, Update},
    Bot,
};

use crate::service::dialogue::model::DialogueState;

pub type ShopDialogue = Dialogue<DialogueState, ErasedStorage<DialogueState>>;

pub fn get_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dialogue::enter::<Update, ErasedStorage<DialogueState>, DialogueState, _>()
        .branch(get_command_handler())
        .branch(get_message_handler())
        .branch(get_callback_handler())
        .branch(Update::filter_message().endpoint(handle_message_unknown))
}

/// Failures that escape a handler are logged and the user gets a generic reply.
async fn report_failure(bot: &Throttle<Bot>, chat_id: ChatId, context: &str, e: &(dyn std::error::Error + Send + Sync)) {
    error!("{} failed in chat {}: {}", context, chat_id, e);
    if let Err(e) = bot.send_message(chat_id, t!("errors.try_again")).await {
        warn!("Failed to report failure to chat {}: {}", chat_id, e);
    }
}
